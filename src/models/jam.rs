use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::entities::jams;

const MAX_NAME_LEN: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Jam {
    pub slug: String,
    pub name: String,
    pub dates: JamDates,
    pub content: JamContent,
    pub options: JamOptions,
    pub featured: bool,
    pub meta: JamMeta,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JamDates {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voting_start: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voting_end: Option<DateTime<Utc>>,
}

impl JamDates {
    pub fn validate(&self) -> Result<(), String> {
        if self.start >= self.end {
            return Err("dates.start must be before dates.end".to_string());
        }
        if let (Some(voting_start), Some(voting_end)) = (self.voting_start, self.voting_end)
            && voting_start >= voting_end
        {
            return Err("dates.votingStart must be before dates.votingEnd".to_string());
        }
        Ok(())
    }
}

/// Descriptive content. `body` and `colors` are hidden while a jam is a mystery.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JamContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colors: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JamOptions {
    #[serde(default)]
    pub enable_mystery: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JamMeta {
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub updated_at: DateTime<Utc>,
    pub updated_by: String,
}

impl From<jams::Model> for Jam {
    fn from(model: jams::Model) -> Self {
        Self {
            slug: model.slug,
            name: model.name,
            dates: JamDates {
                start: model.date_start,
                end: model.date_end,
                voting_start: model.voting_start,
                voting_end: model.voting_end,
            },
            content: JamContent {
                body: model.body,
                colors: model.colors,
                header_image: model.header_image,
                description: model.description,
            },
            options: JamOptions {
                enable_mystery: model.enable_mystery,
            },
            featured: model.featured,
            meta: JamMeta {
                created_at: model.created_at,
                created_by: model.created_by,
                updated_at: model.updated_at,
                updated_by: model.updated_by,
            },
        }
    }
}

/// Payload for creating a jam.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewJam {
    pub name: String,
    pub dates: JamDates,
    #[serde(default)]
    pub content: JamContent,
    #[serde(default)]
    pub options: JamOptions,
    #[serde(default)]
    pub featured: bool,
}

impl NewJam {
    pub fn validate(&self) -> Result<(), String> {
        validate_name(&self.name)?;
        self.dates.validate()
    }
}

/// Partial update of a jam. Absent fields are left untouched; nullable fields
/// are cleared by an explicit `null`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct JamPatch {
    pub name: Option<String>,
    pub dates: Option<JamDatesPatch>,
    pub content: Option<JamContentPatch>,
    pub options: Option<JamOptionsPatch>,
    pub featured: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct JamDatesPatch {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "nullable")]
    pub voting_start: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "nullable")]
    pub voting_end: Option<Option<DateTime<Utc>>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct JamContentPatch {
    #[serde(default, deserialize_with = "nullable")]
    pub body: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub colors: Option<Option<serde_json::Value>>,
    #[serde(default, deserialize_with = "nullable")]
    pub header_image: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct JamOptionsPatch {
    pub enable_mystery: Option<bool>,
}

impl JamPatch {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.dates.is_none()
            && self.content.is_none()
            && self.options.is_none()
            && self.featured.is_none()
    }

    /// Merges the patch into `jam` and validates the result. `jam` is only
    /// modified when the merged record is valid.
    pub fn apply_to(&self, jam: &mut Jam) -> Result<(), String> {
        let mut merged = jam.clone();

        if let Some(name) = &self.name {
            validate_name(name)?;
            merged.name = name.trim().to_string();
        }

        if let Some(dates) = &self.dates {
            if let Some(start) = dates.start {
                merged.dates.start = start;
            }
            if let Some(end) = dates.end {
                merged.dates.end = end;
            }
            if let Some(voting_start) = dates.voting_start {
                merged.dates.voting_start = voting_start;
            }
            if let Some(voting_end) = dates.voting_end {
                merged.dates.voting_end = voting_end;
            }
            merged.dates.validate()?;
        }

        if let Some(content) = &self.content {
            if let Some(body) = &content.body {
                merged.content.body.clone_from(body);
            }
            if let Some(colors) = &content.colors {
                if let Some(value) = colors
                    && !value.is_object()
                {
                    return Err("content.colors must be an object".to_string());
                }
                merged.content.colors.clone_from(colors);
            }
            if let Some(header_image) = &content.header_image {
                merged.content.header_image.clone_from(header_image);
            }
            if let Some(description) = &content.description {
                merged.content.description.clone_from(description);
            }
        }

        if let Some(options) = &self.options
            && let Some(enable_mystery) = options.enable_mystery
        {
            merged.options.enable_mystery = enable_mystery;
        }

        if let Some(featured) = self.featured {
            merged.featured = featured;
        }

        *jam = merged;
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<(), String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("Jam name cannot be empty".to_string());
    }
    if trimmed.len() > MAX_NAME_LEN {
        return Err(format!("Jam name must be {MAX_NAME_LEN} characters or less"));
    }
    if crate::domain::slugify(trimmed).is_empty() {
        return Err("Jam name must contain at least one letter or digit".to_string());
    }
    Ok(())
}

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn sample_jam() -> Jam {
        let start = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        Jam {
            slug: "winter-jam".to_string(),
            name: "Winter Jam".to_string(),
            dates: JamDates {
                start,
                end: start + Duration::days(7),
                voting_start: None,
                voting_end: None,
            },
            content: JamContent {
                body: Some("Make a game about snow".to_string()),
                colors: Some(serde_json::json!({"primary": "#ffffff"})),
                header_image: None,
                description: Some("Snowy".to_string()),
            },
            options: JamOptions::default(),
            featured: false,
            meta: JamMeta {
                created_at: start,
                created_by: "admin".to_string(),
                updated_at: start,
                updated_by: "admin".to_string(),
            },
        }
    }

    #[test]
    fn patch_leaves_absent_fields_untouched() {
        let mut jam = sample_jam();
        let patch: JamPatch = serde_json::from_str(r#"{"featured": true}"#).unwrap();
        patch.apply_to(&mut jam).unwrap();

        assert!(jam.featured);
        assert_eq!(jam.content.body.as_deref(), Some("Make a game about snow"));
        assert_eq!(jam.name, "Winter Jam");
    }

    #[test]
    fn explicit_null_clears_nullable_field() {
        let mut jam = sample_jam();
        let patch: JamPatch =
            serde_json::from_str(r#"{"content": {"description": null}}"#).unwrap();
        patch.apply_to(&mut jam).unwrap();

        assert_eq!(jam.content.description, None);
        assert!(jam.content.body.is_some());
    }

    #[test]
    fn invalid_dates_leave_jam_unchanged() {
        let mut jam = sample_jam();
        let before = jam.clone();
        let end = (jam.dates.start - Duration::days(1)).to_rfc3339();
        let patch: JamPatch =
            serde_json::from_value(serde_json::json!({"name": "Renamed", "dates": {"end": end}}))
                .unwrap();

        assert!(patch.apply_to(&mut jam).is_err());
        assert_eq!(jam, before);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result: Result<JamPatch, _> = serde_json::from_str(r#"{"slug": "hijack"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn colors_must_be_an_object() {
        let mut jam = sample_jam();
        let patch: JamPatch =
            serde_json::from_str(r#"{"content": {"colors": "red"}}"#).unwrap();
        assert!(patch.apply_to(&mut jam).is_err());
    }

    #[test]
    fn new_jam_requires_sluggable_name() {
        let start = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let jam = NewJam {
            name: "!!!".to_string(),
            dates: JamDates {
                start,
                end: start + Duration::days(1),
                voting_start: None,
                voting_end: None,
            },
            content: JamContent::default(),
            options: JamOptions::default(),
            featured: false,
        };
        assert!(jam.validate().is_err());
    }
}

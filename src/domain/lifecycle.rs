//! Temporal state and visibility of a jam, as a pure function of `(now, jam)`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::models::{Jam, JamDates};

/// `dates.start <= now < dates.end`.
#[must_use]
pub fn submission_open(dates: &JamDates, now: DateTime<Utc>) -> bool {
    dates.start <= now && now < dates.end
}

/// True once the submission window has ended. Winners only exist for closed jams.
#[must_use]
pub fn has_closed(dates: &JamDates, now: DateTime<Utc>) -> bool {
    dates.end <= now
}

/// A jam is a mystery before its start when the jam opted in.
#[must_use]
pub fn is_mystery(jam: &Jam, now: DateTime<Utc>) -> bool {
    jam.dates.start > now && jam.options.enable_mystery
}

/// Strips the content hidden by mystery mode. The header image stays visible.
#[must_use]
pub fn redact(mut jam: Jam) -> Jam {
    jam.content.body = None;
    jam.content.colors = None;
    jam
}

/// Caller asked for an unredacted view without admin or manager rights.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("bypassing mystery requires admin or manager rights")]
pub struct MysteryBypassDenied;

/// A jam as returned to a caller, with its derived state.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JamView {
    #[serde(flatten)]
    pub jam: Jam,
    pub mystery: bool,
    pub submission_open: bool,
}

/// Builds the caller-specific view of a jam.
///
/// `privileged` is true when the caller is an admin or manages this jam.
/// A bypass request from an unprivileged caller is rejected outright rather
/// than silently redacted.
pub fn present_jam(
    jam: Jam,
    now: DateTime<Utc>,
    privileged: bool,
    bypass_mystery: bool,
) -> Result<JamView, MysteryBypassDenied> {
    if bypass_mystery && !privileged {
        return Err(MysteryBypassDenied);
    }

    let mystery = is_mystery(&jam, now);
    let submission_open = submission_open(&jam.dates, now);
    let jam = if mystery && !privileged { redact(jam) } else { jam };

    Ok(JamView {
        jam,
        mystery,
        submission_open,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{JamContent, JamMeta, JamOptions};
    use chrono::{Duration, TimeZone};

    fn jam_starting_at(start: DateTime<Utc>, enable_mystery: bool) -> Jam {
        Jam {
            slug: "spring".to_string(),
            name: "Spring".to_string(),
            dates: JamDates {
                start,
                end: start + Duration::days(3),
                voting_start: None,
                voting_end: None,
            },
            content: JamContent {
                body: Some("secret theme".to_string()),
                colors: Some(serde_json::json!({"primary": "#00ff00"})),
                header_image: Some("https://img.example/header.png".to_string()),
                description: Some("A jam".to_string()),
            },
            options: JamOptions { enable_mystery },
            featured: false,
            meta: JamMeta {
                created_at: start,
                created_by: "admin".to_string(),
                updated_at: start,
                updated_by: "admin".to_string(),
            },
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn submission_window_is_half_open() {
        let jam = jam_starting_at(now(), false);
        assert!(submission_open(&jam.dates, jam.dates.start));
        assert!(submission_open(&jam.dates, jam.dates.end - Duration::seconds(1)));
        assert!(!submission_open(&jam.dates, jam.dates.end));
        assert!(!submission_open(&jam.dates, jam.dates.start - Duration::seconds(1)));
    }

    #[test]
    fn closed_exactly_at_end() {
        let jam = jam_starting_at(now(), false);
        assert!(!has_closed(&jam.dates, jam.dates.end - Duration::seconds(1)));
        assert!(has_closed(&jam.dates, jam.dates.end));
    }

    #[test]
    fn mystery_requires_option_and_future_start() {
        let future = jam_starting_at(now() + Duration::days(1), true);
        assert!(is_mystery(&future, now()));

        let opted_out = jam_starting_at(now() + Duration::days(1), false);
        assert!(!is_mystery(&opted_out, now()));

        let started = jam_starting_at(now() - Duration::days(1), true);
        assert!(!is_mystery(&started, now()));
    }

    #[test]
    fn mystery_hides_body_and_colors_from_unprivileged() {
        let jam = jam_starting_at(now() + Duration::days(1), true);
        let view = present_jam(jam, now(), false, false).unwrap();

        assert!(view.mystery);
        assert_eq!(view.jam.content.body, None);
        assert_eq!(view.jam.content.colors, None);
        assert!(view.jam.content.header_image.is_some());
        assert!(view.jam.content.description.is_some());
    }

    #[test]
    fn privileged_callers_see_everything() {
        let jam = jam_starting_at(now() + Duration::days(1), true);
        let view = present_jam(jam, now(), true, false).unwrap();

        assert!(view.mystery);
        assert!(view.jam.content.body.is_some());
        assert!(view.jam.content.colors.is_some());
    }

    #[test]
    fn unprivileged_bypass_is_rejected() {
        let jam = jam_starting_at(now() + Duration::days(1), true);
        assert_eq!(
            present_jam(jam, now(), false, true).unwrap_err(),
            MysteryBypassDenied
        );
    }
}

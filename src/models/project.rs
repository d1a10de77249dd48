use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::entities::{projects, upvotes};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub jam: String,
    pub project_id: i64,
    pub meta: ProjectMeta,
    pub selected: bool,
    pub selected_by_the_community: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMeta {
    pub submitted_by: String,
    pub submitted: DateTime<Utc>,
}

impl Project {
    #[must_use]
    pub const fn is_winner(&self) -> bool {
        self.selected || self.selected_by_the_community
    }
}

impl From<projects::Model> for Project {
    fn from(model: projects::Model) -> Self {
        Self {
            jam: model.jam,
            project_id: model.project_id,
            meta: ProjectMeta {
                submitted_by: model.submitted_by,
                submitted: model.submitted_at,
            },
            selected: model.selected,
            selected_by_the_community: model.selected_by_the_community,
        }
    }
}

/// A project as listed to a caller, with its current upvote tally.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectEntry {
    #[serde(flatten)]
    pub project: Project,
    pub upvotes: u64,
    /// Whether the caller upvoted this project; absent for anonymous callers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upvoted: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Upvote {
    pub jam: String,
    pub project_id: i64,
    pub upvoted_by: String,
    pub upvoted_at: DateTime<Utc>,
}

impl From<upvotes::Model> for Upvote {
    fn from(model: upvotes::Model) -> Self {
        Self {
            jam: model.jam,
            project_id: model.project_id,
            upvoted_by: model.upvoted_by,
            upvoted_at: model.upvoted_at,
        }
    }
}

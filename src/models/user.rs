use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::entities::users;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub name: String,
    pub avatar_url: Option<String>,
    pub admin: bool,
    pub banned: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<String>,
}

impl User {
    /// Case-insensitive comparison against another user name.
    #[must_use]
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            name: model.name,
            avatar_url: model.avatar_url,
            admin: model.admin,
            banned: model.banned,
            created_at: model.created_at,
            updated_at: model.updated_at,
            updated_by: model.updated_by,
        }
    }
}

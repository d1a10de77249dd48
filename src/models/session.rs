use crate::entities::sessions;

/// An issued session. `one_time_token` is `None` once it has been exchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub name: String,
    pub token: String,
    pub one_time_token: Option<String>,
}

impl From<sessions::Model> for Session {
    fn from(model: sessions::Model) -> Self {
        Self {
            name: model.name,
            token: model.token,
            one_time_token: model.one_time_token,
        }
    }
}

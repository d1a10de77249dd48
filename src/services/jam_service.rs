//! Domain service for jams and their managers.

use serde::Serialize;
use thiserror::Error;

use crate::domain::{JamView, MysteryBypassDenied};
use crate::models::{JamPatch, NewJam, User};

#[derive(Debug, Error)]
pub enum JamError {
    #[error("Jam not found: {0}")]
    NotFound(String),

    #[error("A jam with slug '{0}' already exists")]
    SlugTaken(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{0}")]
    Forbidden(String),

    #[error(transparent)]
    MysteryBypassDenied(#[from] MysteryBypassDenied),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("{0} is an admin and already manages every jam")]
    AlreadyAdmin(String),

    #[error("{0} already manages this jam")]
    ManagerExists(String),

    #[error("{0} does not manage this jam")]
    ManagerNotFound(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sea_orm::DbErr> for JamError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for JamError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Listing refinements.
#[derive(Debug, Clone, Copy, Default)]
pub struct JamQuery {
    pub featured_only: bool,
    pub limit: u64,
    pub offset: u64,
    pub bypass_mystery: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct JamPage {
    pub items: Vec<JamView>,
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
}

#[async_trait::async_trait]
pub trait JamService: Send + Sync {
    /// One page of jams, each redacted for `viewer` as needed.
    ///
    /// # Errors
    ///
    /// Returns [`JamError::MysteryBypassDenied`] if a non-admin asks to bypass.
    async fn list(&self, viewer: Option<&User>, query: JamQuery) -> Result<JamPage, JamError>;

    async fn get(
        &self,
        viewer: Option<&User>,
        slug: &str,
        bypass_mystery: bool,
    ) -> Result<JamView, JamError>;

    /// Creates a jam with a slug derived from its name. Admin only.
    async fn create(&self, actor: &User, jam: NewJam) -> Result<JamView, JamError>;

    /// Applies a partial update. A name change that changes the slug moves
    /// every dependent record to the new slug. Manager or admin.
    async fn update(&self, actor: &User, slug: &str, patch: JamPatch) -> Result<JamView, JamError>;

    /// Deletes a jam with its managers, projects and upvotes. Admin only.
    async fn delete(&self, actor: &User, slug: &str) -> Result<(), JamError>;

    async fn list_managers(&self, slug: &str) -> Result<Vec<String>, JamError>;

    /// Grants manager rights on one jam. Admin only; the target must be a
    /// known, non-admin user.
    async fn add_manager(&self, actor: &User, slug: &str, name: &str) -> Result<String, JamError>;

    async fn remove_manager(&self, actor: &User, slug: &str, name: &str) -> Result<(), JamError>;
}

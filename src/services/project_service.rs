//! Domain service for jam submissions and manual winners.

use thiserror::Error;

use crate::models::{Project, ProjectEntry, User};

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Jam not found: {0}")]
    JamNotFound(String),

    #[error("Project {0} is not part of this jam")]
    NotFound(i64),

    #[error("Project {0} does not exist on the community site")]
    ExternalProjectNotFound(i64),

    #[error("This jam is not accepting submissions right now")]
    JamNotOpen,

    #[error("Project {0} was already submitted to this jam")]
    AlreadySubmitted(i64),

    #[error("Only the author of project {0} can submit it")]
    NotProjectOwner(i64),

    #[error("{0}")]
    Forbidden(String),

    #[error("Project service unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sea_orm::DbErr> for ProjectError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for ProjectError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

#[async_trait::async_trait]
pub trait ProjectService: Send + Sync {
    /// Projects of a jam in submission order, with tallies. Recomputes the
    /// community winner first.
    async fn list(&self, viewer: Option<&User>, jam: &str) -> Result<Vec<ProjectEntry>, ProjectError>;

    /// Submits an external project to a jam.
    ///
    /// # Errors
    ///
    /// - [`ProjectError::JamNotOpen`] outside `[start, end)`.
    /// - [`ProjectError::AlreadySubmitted`] for a repeated project id.
    /// - [`ProjectError::NotProjectOwner`] if `actor` did not author the project.
    async fn submit(&self, actor: &User, jam: &str, project_id: i64) -> Result<Project, ProjectError>;

    /// Removes a submission and its upvotes. Owner, manager or admin.
    async fn withdraw(&self, actor: &User, jam: &str, project_id: i64) -> Result<(), ProjectError>;

    /// Marks or clears a manual winner. Manager or admin.
    async fn set_selected(
        &self,
        actor: &User,
        jam: &str,
        project_id: i64,
        selected: bool,
    ) -> Result<Project, ProjectError>;

    /// Manual and community winners of a jam.
    async fn winners(&self, jam: &str) -> Result<Vec<ProjectEntry>, ProjectError>;
}

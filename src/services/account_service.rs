//! Domain service for user accounts.
//!
//! Handles profile lookup, admin provisioning, bans and admin rights. Bans and
//! removals revoke every session of the target user.

use thiserror::Error;

use crate::models::User;

/// Errors specific to account operations.
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("User already exists: {0}")]
    UserExists(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Admin rights required")]
    Forbidden,

    #[error("Profile service unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AccountError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AccountError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<crate::services::SessionError> for AccountError {
    fn from(err: crate::services::SessionError) -> Self {
        Self::Database(err.to_string())
    }
}

/// Domain service trait for accounts.
#[async_trait::async_trait]
pub trait AccountService: Send + Sync {
    /// Gets a user by case-insensitive name.
    async fn get_user(&self, name: &str) -> Result<User, AccountError>;

    /// Creates a user ahead of their first login. The name is resolved to its
    /// canonical casing through the profile service.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::UserNotFound`] if the community site has no such user.
    async fn provision(&self, actor: &User, name: &str, admin: bool) -> Result<User, AccountError>;

    /// Bans or unbans a user. Banning revokes all of the user's sessions.
    async fn set_banned(&self, actor: &User, name: &str, banned: bool) -> Result<User, AccountError>;

    /// Grants or revokes global admin rights.
    async fn set_admin(&self, actor: &User, name: &str, admin: bool) -> Result<User, AccountError>;

    /// Removes a user, their manager rows and their sessions.
    async fn delete(&self, actor: &User, name: &str) -> Result<(), AccountError>;
}

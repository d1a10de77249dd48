//! `SeaORM` implementation of the `AccountService` trait.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::clients::ProfileDirectory;
use crate::db::Store;
use crate::models::User;
use crate::services::account_service::{AccountError, AccountService};
use crate::services::authorization::{Authorizer, Role, Scope};
use crate::services::session_store::SessionStore;

pub struct SeaOrmAccountService {
    store: Store,
    authorizer: Authorizer,
    sessions: Arc<SessionStore>,
    profiles: Arc<dyn ProfileDirectory>,
}

impl SeaOrmAccountService {
    #[must_use]
    pub fn new(
        store: Store,
        authorizer: Authorizer,
        sessions: Arc<SessionStore>,
        profiles: Arc<dyn ProfileDirectory>,
    ) -> Self {
        Self {
            store,
            authorizer,
            sessions,
            profiles,
        }
    }

    async fn require_admin(&self, actor: &User) -> Result<(), AccountError> {
        match self.authorizer.resolve(Some(actor), Scope::Global, None).await? {
            Role::Admin => Ok(()),
            _ => Err(AccountError::Forbidden),
        }
    }

    fn refuse_self(actor: &User, name: &str, action: &str) -> Result<(), AccountError> {
        if actor.is_named(name) {
            return Err(AccountError::Validation(format!("You cannot {action} yourself")));
        }
        Ok(())
    }
}

#[async_trait]
impl AccountService for SeaOrmAccountService {
    async fn get_user(&self, name: &str) -> Result<User, AccountError> {
        self.store
            .get_user(name)
            .await?
            .ok_or_else(|| AccountError::UserNotFound(name.to_string()))
    }

    async fn provision(&self, actor: &User, name: &str, admin: bool) -> Result<User, AccountError> {
        self.require_admin(actor).await?;

        let name = name.trim();
        if name.is_empty() {
            return Err(AccountError::Validation("Name is required".to_string()));
        }

        if self.store.get_user(name).await?.is_some() {
            return Err(AccountError::UserExists(name.to_string()));
        }

        let profile = self
            .profiles
            .lookup(name)
            .await
            .map_err(|e| AccountError::UpstreamUnavailable(e.to_string()))?
            .ok_or_else(|| AccountError::UserNotFound(name.to_string()))?;

        let user = self
            .store
            .create_user(
                &profile.username,
                profile.avatar_url.as_deref(),
                admin,
                &actor.name,
            )
            .await?
            .ok_or_else(|| AccountError::UserExists(profile.username.clone()))?;

        info!(user = %user.name, admin, by = %actor.name, "User provisioned");
        Ok(user)
    }

    async fn set_banned(&self, actor: &User, name: &str, banned: bool) -> Result<User, AccountError> {
        self.require_admin(actor).await?;
        Self::refuse_self(actor, name, "ban")?;

        let user = self
            .store
            .set_user_banned(name, banned, &actor.name)
            .await?
            .ok_or_else(|| AccountError::UserNotFound(name.to_string()))?;

        if banned {
            let revoked = self.sessions.revoke_all_for(&user.name).await?;
            info!(user = %user.name, revoked, by = %actor.name, "User banned");
        } else {
            info!(user = %user.name, by = %actor.name, "User unbanned");
        }

        Ok(user)
    }

    async fn set_admin(&self, actor: &User, name: &str, admin: bool) -> Result<User, AccountError> {
        self.require_admin(actor).await?;
        if !admin {
            Self::refuse_self(actor, name, "demote")?;
        }

        let user = self
            .store
            .set_user_admin(name, admin, &actor.name)
            .await?
            .ok_or_else(|| AccountError::UserNotFound(name.to_string()))?;

        info!(user = %user.name, admin, by = %actor.name, "Admin rights changed");
        Ok(user)
    }

    async fn delete(&self, actor: &User, name: &str) -> Result<(), AccountError> {
        self.require_admin(actor).await?;
        Self::refuse_self(actor, name, "remove")?;

        let user = self.get_user(name).await?;
        if !self.store.delete_user(&user.name).await? {
            return Err(AccountError::UserNotFound(name.to_string()));
        }

        let revoked = self.sessions.revoke_all_for(&user.name).await?;
        info!(user = %user.name, revoked, by = %actor.name, "User removed");
        Ok(())
    }
}

//! `SeaORM` implementation of the `JamService` trait.

use async_trait::async_trait;
use chrono::Utc;
use tracing::info;

use crate::db::{JamWrite, Store};
use crate::domain::{JamView, MysteryBypassDenied, present_jam, slugify};
use crate::models::{JamPatch, NewJam, User};
use crate::services::authorization::{Authorizer, Role, Scope};
use crate::services::jam_service::{JamError, JamPage, JamQuery, JamService};

pub struct SeaOrmJamService {
    store: Store,
    authorizer: Authorizer,
}

impl SeaOrmJamService {
    #[must_use]
    pub const fn new(store: Store, authorizer: Authorizer) -> Self {
        Self { store, authorizer }
    }

    async fn require_admin(&self, actor: &User) -> Result<(), JamError> {
        let role = self.authorizer.resolve(Some(actor), Scope::Global, None).await?;
        if role == Role::Admin {
            Ok(())
        } else {
            Err(JamError::Forbidden("Admin rights required".to_string()))
        }
    }

    async fn is_privileged(&self, viewer: Option<&User>, slug: &str) -> Result<bool, JamError> {
        Ok(self
            .authorizer
            .resolve(viewer, Scope::Jam(slug), None)
            .await?
            .is_privileged())
    }

    async fn ensure_exists(&self, slug: &str) -> Result<(), JamError> {
        if self.store.get_jam(slug).await?.is_none() {
            return Err(JamError::NotFound(slug.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl JamService for SeaOrmJamService {
    async fn list(&self, viewer: Option<&User>, query: JamQuery) -> Result<JamPage, JamError> {
        // Per-item manager rights cannot cover a whole listing.
        if query.bypass_mystery {
            let role = self.authorizer.resolve(viewer, Scope::Global, None).await?;
            if role != Role::Admin {
                return Err(MysteryBypassDenied.into());
            }
        }

        let (jams, total) = self
            .store
            .list_jams(query.featured_only, query.limit, query.offset)
            .await?;

        let now = Utc::now();
        let mut items = Vec::with_capacity(jams.len());
        for jam in jams {
            let privileged = self.is_privileged(viewer, &jam.slug).await?;
            items.push(present_jam(jam, now, privileged, query.bypass_mystery)?);
        }

        Ok(JamPage {
            items,
            total,
            limit: query.limit,
            offset: query.offset,
        })
    }

    async fn get(
        &self,
        viewer: Option<&User>,
        slug: &str,
        bypass_mystery: bool,
    ) -> Result<JamView, JamError> {
        let jam = self
            .store
            .get_jam(slug)
            .await?
            .ok_or_else(|| JamError::NotFound(slug.to_string()))?;

        let privileged = self.is_privileged(viewer, slug).await?;
        Ok(present_jam(jam, Utc::now(), privileged, bypass_mystery)?)
    }

    async fn create(&self, actor: &User, jam: NewJam) -> Result<JamView, JamError> {
        self.require_admin(actor).await?;
        jam.validate().map_err(JamError::Validation)?;

        if let Some(colors) = &jam.content.colors
            && !colors.is_object()
        {
            return Err(JamError::Validation(
                "content.colors must be an object".to_string(),
            ));
        }

        let slug = slugify(&jam.name);
        let created = self
            .store
            .insert_jam(&slug, &jam, &actor.name)
            .await?
            .ok_or_else(|| JamError::SlugTaken(slug.clone()))?;

        info!(jam = %slug, by = %actor.name, "Jam created");
        Ok(present_jam(created, Utc::now(), true, false)?)
    }

    async fn update(&self, actor: &User, slug: &str, patch: JamPatch) -> Result<JamView, JamError> {
        let mut jam = self
            .store
            .get_jam(slug)
            .await?
            .ok_or_else(|| JamError::NotFound(slug.to_string()))?;

        if !self.is_privileged(Some(actor), slug).await? {
            return Err(JamError::Forbidden(
                "Only managers and admins can edit this jam".to_string(),
            ));
        }

        if patch.is_empty() {
            return Err(JamError::Validation("Nothing to update".to_string()));
        }

        patch.apply_to(&mut jam).map_err(JamError::Validation)?;
        jam.slug = slugify(&jam.name);

        match self.store.save_jam(slug, &jam, &actor.name).await? {
            JamWrite::Saved => {}
            JamWrite::NotFound => return Err(JamError::NotFound(slug.to_string())),
            JamWrite::SlugTaken => return Err(JamError::SlugTaken(jam.slug)),
        }

        let saved = self
            .store
            .get_jam(&jam.slug)
            .await?
            .ok_or_else(|| JamError::NotFound(jam.slug.clone()))?;

        info!(jam = %saved.slug, by = %actor.name, "Jam updated");
        Ok(present_jam(saved, Utc::now(), true, false)?)
    }

    async fn delete(&self, actor: &User, slug: &str) -> Result<(), JamError> {
        self.require_admin(actor).await?;

        if !self.store.delete_jam(slug).await? {
            return Err(JamError::NotFound(slug.to_string()));
        }

        info!(jam = %slug, by = %actor.name, "Jam deleted");
        Ok(())
    }

    async fn list_managers(&self, slug: &str) -> Result<Vec<String>, JamError> {
        self.ensure_exists(slug).await?;
        Ok(self.store.list_managers(slug).await?)
    }

    async fn add_manager(&self, actor: &User, slug: &str, name: &str) -> Result<String, JamError> {
        self.require_admin(actor).await?;
        self.ensure_exists(slug).await?;

        let user = self
            .store
            .get_user(name)
            .await?
            .ok_or_else(|| JamError::UserNotFound(name.to_string()))?;

        if user.admin {
            return Err(JamError::AlreadyAdmin(user.name));
        }

        if !self.store.add_manager(slug, &user.name).await? {
            return Err(JamError::ManagerExists(user.name));
        }

        info!(jam = %slug, manager = %user.name, by = %actor.name, "Manager added");
        Ok(user.name)
    }

    async fn remove_manager(&self, actor: &User, slug: &str, name: &str) -> Result<(), JamError> {
        self.require_admin(actor).await?;
        self.ensure_exists(slug).await?;

        if !self.store.remove_manager(slug, name).await? {
            return Err(JamError::ManagerNotFound(name.to_string()));
        }

        info!(jam = %slug, manager = %name, by = %actor.name, "Manager removed");
        Ok(())
    }
}

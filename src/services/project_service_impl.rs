//! `SeaORM` implementation of the `ProjectService` trait.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, warn};

use crate::clients::ProjectDirectory;
use crate::db::Store;
use crate::domain::lifecycle::submission_open;
use crate::models::{Project, ProjectEntry, User};
use crate::services::authorization::{Authorizer, Scope};
use crate::services::key_lock::KeyedLocks;
use crate::services::project_service::{ProjectError, ProjectService};
use crate::services::winner_resolver::WinnerResolver;

pub struct SeaOrmProjectService {
    store: Store,
    authorizer: Authorizer,
    resolver: Arc<WinnerResolver>,
    projects: Arc<dyn ProjectDirectory>,
    locks: KeyedLocks,
}

impl SeaOrmProjectService {
    #[must_use]
    pub fn new(
        store: Store,
        authorizer: Authorizer,
        resolver: Arc<WinnerResolver>,
        projects: Arc<dyn ProjectDirectory>,
    ) -> Self {
        Self {
            store,
            authorizer,
            resolver,
            projects,
            locks: KeyedLocks::new(),
        }
    }

    async fn require_project(&self, jam: &str, project_id: i64) -> Result<Project, ProjectError> {
        if self.store.get_jam(jam).await?.is_none() {
            return Err(ProjectError::JamNotFound(jam.to_string()));
        }
        self.store
            .get_project(jam, project_id)
            .await?
            .ok_or(ProjectError::NotFound(project_id))
    }

    async fn refresh_winner(&self, jam: &str) {
        if let Err(e) = self.resolver.resolve(jam).await {
            warn!(jam = %jam, error = %e, "Failed to recompute community winner");
        }
    }

    /// Projects with tallies, after bringing the community flag up to date.
    async fn entries(&self, viewer: Option<&User>, jam: &str) -> Result<Vec<ProjectEntry>, ProjectError> {
        if self.store.get_jam(jam).await?.is_none() {
            return Err(ProjectError::JamNotFound(jam.to_string()));
        }

        self.resolver.resolve(jam).await?;

        let projects = self.store.list_projects(jam).await?;
        let upvotes = self.store.list_upvotes(jam).await?;

        let mut tally: HashMap<i64, u64> = HashMap::new();
        let mut mine: HashSet<i64> = HashSet::new();
        for upvote in upvotes {
            *tally.entry(upvote.project_id).or_default() += 1;
            if viewer.is_some_and(|v| v.is_named(&upvote.upvoted_by)) {
                mine.insert(upvote.project_id);
            }
        }

        Ok(projects
            .into_iter()
            .map(|project| ProjectEntry {
                upvotes: tally.get(&project.project_id).copied().unwrap_or(0),
                upvoted: viewer.map(|_| mine.contains(&project.project_id)),
                project,
            })
            .collect())
    }
}

#[async_trait]
impl ProjectService for SeaOrmProjectService {
    async fn list(&self, viewer: Option<&User>, jam: &str) -> Result<Vec<ProjectEntry>, ProjectError> {
        self.entries(viewer, jam).await
    }

    async fn submit(&self, actor: &User, jam: &str, project_id: i64) -> Result<Project, ProjectError> {
        let record = self
            .store
            .get_jam(jam)
            .await?
            .ok_or_else(|| ProjectError::JamNotFound(jam.to_string()))?;

        if !submission_open(&record.dates, Utc::now()) {
            return Err(ProjectError::JamNotOpen);
        }

        if self.store.get_project(jam, project_id).await?.is_some() {
            return Err(ProjectError::AlreadySubmitted(project_id));
        }

        // Ownership is checked against the community site before any lock is taken.
        let author = self
            .projects
            .project_author(project_id)
            .await
            .map_err(|e| ProjectError::UpstreamUnavailable(e.to_string()))?
            .ok_or(ProjectError::ExternalProjectNotFound(project_id))?;

        if !actor.is_named(&author) {
            return Err(ProjectError::NotProjectOwner(project_id));
        }

        let project = {
            let _guard = self.locks.lock(jam).await;

            let now = Utc::now();
            if !submission_open(&record.dates, now) {
                return Err(ProjectError::JamNotOpen);
            }

            self.store
                .insert_project(jam, project_id, &actor.name, now)
                .await?
                .ok_or(ProjectError::AlreadySubmitted(project_id))?
        };

        metrics::counter!("projects_submitted_total").increment(1);
        info!(jam = %jam, project_id, by = %actor.name, "Project submitted");

        Ok(project)
    }

    async fn withdraw(&self, actor: &User, jam: &str, project_id: i64) -> Result<(), ProjectError> {
        let project = self.require_project(jam, project_id).await?;

        let role = self
            .authorizer
            .resolve(Some(actor), Scope::Jam(jam), Some(&project.meta.submitted_by))
            .await?;
        if !role.can_act_as_owner() {
            return Err(ProjectError::Forbidden(
                "Only the submitter, a manager or an admin can remove this project".to_string(),
            ));
        }

        if !self.store.delete_project(jam, project_id).await? {
            return Err(ProjectError::NotFound(project_id));
        }

        info!(jam = %jam, project_id, by = %actor.name, "Project withdrawn");
        self.refresh_winner(jam).await;
        Ok(())
    }

    async fn set_selected(
        &self,
        actor: &User,
        jam: &str,
        project_id: i64,
        selected: bool,
    ) -> Result<Project, ProjectError> {
        self.require_project(jam, project_id).await?;

        let role = self.authorizer.resolve(Some(actor), Scope::Jam(jam), None).await?;
        if !role.is_privileged() {
            return Err(ProjectError::Forbidden(
                "Only managers and admins can pick winners".to_string(),
            ));
        }

        self.store
            .set_project_selected(jam, project_id, selected)
            .await?;
        self.refresh_winner(jam).await;

        info!(jam = %jam, project_id, selected, by = %actor.name, "Manual winner updated");

        self.store
            .get_project(jam, project_id)
            .await?
            .ok_or(ProjectError::NotFound(project_id))
    }

    async fn winners(&self, jam: &str) -> Result<Vec<ProjectEntry>, ProjectError> {
        Ok(self
            .entries(None, jam)
            .await?
            .into_iter()
            .filter(|entry| entry.project.is_winner())
            .collect())
    }
}

use anyhow::Result;
use chrono::{DateTime, Utc};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::models::{Jam, NewJam, Project, Session, Upvote, User};

pub mod migrator;
pub mod repositories;

pub use repositories::jam::JamWrite;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        let in_memory = db_url.contains(":memory:");

        if !in_memory {
            let path_str = db_url.trim_start_matches("sqlite://").trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        // An in-memory database lives as long as its connection, and sharing
        // it across a pool invites table locks, so it gets exactly one.
        let (max_connections, min_connections) = if in_memory {
            (1, 1)
        } else {
            (max_connections, min_connections)
        };

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .sqlx_logging(false);
        if !in_memory {
            opt.idle_timeout(Duration::from_secs(300))
                .max_lifetime(Duration::from_secs(600));
        }

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn session_repo(&self) -> repositories::session::SessionRepository {
        repositories::session::SessionRepository::new(self.conn.clone())
    }

    fn jam_repo(&self) -> repositories::jam::JamRepository {
        repositories::jam::JamRepository::new(self.conn.clone())
    }

    fn manager_repo(&self) -> repositories::manager::ManagerRepository {
        repositories::manager::ManagerRepository::new(self.conn.clone())
    }

    fn project_repo(&self) -> repositories::project::ProjectRepository {
        repositories::project::ProjectRepository::new(self.conn.clone())
    }

    fn upvote_repo(&self) -> repositories::upvote::UpvoteRepository {
        repositories::upvote::UpvoteRepository::new(self.conn.clone())
    }

    // ------------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------------

    pub async fn get_user(&self, name: &str) -> Result<Option<User>> {
        self.user_repo().get_by_name(name).await
    }

    pub async fn upsert_login_user(&self, name: &str, avatar_url: Option<&str>) -> Result<User> {
        self.user_repo().upsert_login(name, avatar_url).await
    }

    pub async fn create_user(
        &self,
        name: &str,
        avatar_url: Option<&str>,
        admin: bool,
        created_by: &str,
    ) -> Result<Option<User>> {
        self.user_repo()
            .create(name, avatar_url, admin, created_by)
            .await
    }

    pub async fn set_user_banned(&self, name: &str, banned: bool, by: &str) -> Result<Option<User>> {
        self.user_repo().set_banned(name, banned, by).await
    }

    pub async fn set_user_admin(&self, name: &str, admin: bool, by: &str) -> Result<Option<User>> {
        self.user_repo().set_admin(name, admin, by).await
    }

    pub async fn delete_user(&self, name: &str) -> Result<bool> {
        self.user_repo().delete(name).await
    }

    // ------------------------------------------------------------------------
    // Sessions
    // ------------------------------------------------------------------------

    pub async fn list_sessions(&self) -> Result<Vec<Session>> {
        self.session_repo().list_all().await
    }

    pub async fn insert_session(&self, name: &str, token: &str, one_time_token: &str) -> Result<()> {
        self.session_repo()
            .insert(name, token, one_time_token)
            .await
    }

    pub async fn clear_one_time_token(&self, one_time_token: &str) -> Result<bool> {
        self.session_repo()
            .clear_one_time_token(one_time_token)
            .await
    }

    pub async fn delete_session(&self, token: &str) -> Result<bool> {
        self.session_repo().delete_by_token(token).await
    }

    pub async fn delete_sessions_for(&self, name: &str) -> Result<u64> {
        self.session_repo().delete_by_name(name).await
    }

    // ------------------------------------------------------------------------
    // Jams
    // ------------------------------------------------------------------------

    pub async fn get_jam(&self, slug: &str) -> Result<Option<Jam>> {
        self.jam_repo().get(slug).await
    }

    pub async fn list_jams(
        &self,
        featured_only: bool,
        limit: u64,
        offset: u64,
    ) -> Result<(Vec<Jam>, u64)> {
        self.jam_repo().list(featured_only, limit, offset).await
    }

    pub async fn insert_jam(&self, slug: &str, jam: &NewJam, created_by: &str) -> Result<Option<Jam>> {
        self.jam_repo().insert(slug, jam, created_by).await
    }

    pub async fn save_jam(&self, original_slug: &str, jam: &Jam, updated_by: &str) -> Result<JamWrite> {
        self.jam_repo().save(original_slug, jam, updated_by).await
    }

    pub async fn delete_jam(&self, slug: &str) -> Result<bool> {
        self.jam_repo().delete(slug).await
    }

    // ------------------------------------------------------------------------
    // Managers
    // ------------------------------------------------------------------------

    pub async fn is_manager(&self, jam: &str, name: &str) -> Result<bool> {
        self.manager_repo().is_manager(jam, name).await
    }

    pub async fn list_managers(&self, jam: &str) -> Result<Vec<String>> {
        self.manager_repo().list(jam).await
    }

    pub async fn add_manager(&self, jam: &str, name: &str) -> Result<bool> {
        self.manager_repo().add(jam, name).await
    }

    pub async fn remove_manager(&self, jam: &str, name: &str) -> Result<bool> {
        self.manager_repo().remove(jam, name).await
    }

    // ------------------------------------------------------------------------
    // Projects
    // ------------------------------------------------------------------------

    pub async fn get_project(&self, jam: &str, project_id: i64) -> Result<Option<Project>> {
        self.project_repo().get(jam, project_id).await
    }

    pub async fn list_projects(&self, jam: &str) -> Result<Vec<Project>> {
        self.project_repo().list(jam).await
    }

    pub async fn insert_project(
        &self,
        jam: &str,
        project_id: i64,
        submitted_by: &str,
        submitted_at: DateTime<Utc>,
    ) -> Result<Option<Project>> {
        self.project_repo()
            .insert(jam, project_id, submitted_by, submitted_at)
            .await
    }

    pub async fn delete_project(&self, jam: &str, project_id: i64) -> Result<bool> {
        self.project_repo()
            .delete_with_upvotes(jam, project_id)
            .await
    }

    pub async fn set_project_selected(
        &self,
        jam: &str,
        project_id: i64,
        selected: bool,
    ) -> Result<bool> {
        self.project_repo()
            .set_selected(jam, project_id, selected)
            .await
    }

    pub async fn set_community_winner(&self, jam: &str, winner: Option<i64>) -> Result<u64> {
        self.project_repo().set_community_winner(jam, winner).await
    }

    // ------------------------------------------------------------------------
    // Upvotes
    // ------------------------------------------------------------------------

    pub async fn list_upvotes(&self, jam: &str) -> Result<Vec<Upvote>> {
        self.upvote_repo().list_for_jam(jam).await
    }

    pub async fn count_project_upvotes(&self, jam: &str, project_id: i64) -> Result<u64> {
        self.upvote_repo().count_for_project(jam, project_id).await
    }

    pub async fn count_user_upvotes(&self, jam: &str, user: &str) -> Result<u64> {
        self.upvote_repo().count_for_user(jam, user).await
    }

    pub async fn has_upvoted(&self, jam: &str, project_id: i64, user: &str) -> Result<bool> {
        self.upvote_repo().exists(jam, project_id, user).await
    }

    pub async fn insert_upvote(&self, jam: &str, project_id: i64, user: &str) -> Result<bool> {
        self.upvote_repo().insert(jam, project_id, user).await
    }

    pub async fn delete_upvote(&self, jam: &str, project_id: i64, user: &str) -> Result<bool> {
        self.upvote_repo().delete(jam, project_id, user).await
    }
}

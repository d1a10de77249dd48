use anyhow::{Context, Result};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set, SqlErr,
    TransactionTrait,
    sea_query::{Expr, Func, SimpleExpr},
};

use crate::domain::name_key;
use crate::entities::{managers, users};
use crate::models::User;

fn manager_named(name: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col(managers::Column::Name))).eq(name_key(name))
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    async fn find_model(&self, name: &str) -> Result<Option<users::Model>> {
        users::Entity::find()
            .filter(users::Column::NameKey.eq(name_key(name)))
            .one(&self.conn)
            .await
            .context("Failed to query user by name")
    }

    /// Get user by name (case-insensitive)
    pub async fn get_by_name(&self, name: &str) -> Result<Option<User>> {
        Ok(self.find_model(name).await?.map(User::from))
    }

    /// Creates the user if unseen, otherwise refreshes canonical casing and avatar.
    pub async fn upsert_login(&self, name: &str, avatar_url: Option<&str>) -> Result<User> {
        let now = Utc::now();

        if let Some(existing) = self.find_model(name).await? {
            let mut active: users::ActiveModel = existing.into();
            active.name = Set(name.to_string());
            active.avatar_url = Set(avatar_url.map(str::to_string));
            let updated = active
                .update(&self.conn)
                .await
                .context("Failed to refresh user on login")?;
            return Ok(User::from(updated));
        }

        let active = users::ActiveModel {
            name: Set(name.to_string()),
            name_key: Set(name_key(name)),
            avatar_url: Set(avatar_url.map(str::to_string)),
            admin: Set(false),
            banned: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
            updated_by: Set(None),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to create user")?;
        tracing::info!(user = %name, "Created user on first login");
        Ok(User::from(model))
    }

    /// Inserts a new user. Returns `None` if the name is already taken.
    pub async fn create(
        &self,
        name: &str,
        avatar_url: Option<&str>,
        admin: bool,
        created_by: &str,
    ) -> Result<Option<User>> {
        if self.find_model(name).await?.is_some() {
            return Ok(None);
        }

        let now = Utc::now();
        let active = users::ActiveModel {
            name: Set(name.to_string()),
            name_key: Set(name_key(name)),
            avatar_url: Set(avatar_url.map(str::to_string)),
            admin: Set(admin),
            banned: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
            updated_by: Set(Some(created_by.to_string())),
            ..Default::default()
        };

        match active.insert(&self.conn).await {
            Ok(model) => Ok(Some(User::from(model))),
            Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Ok(None)
            }
            Err(err) => Err(err).context("Failed to provision user"),
        }
    }

    pub async fn set_banned(&self, name: &str, banned: bool, by: &str) -> Result<Option<User>> {
        let Some(user) = self.find_model(name).await? else {
            return Ok(None);
        };

        let mut active: users::ActiveModel = user.into();
        active.banned = Set(banned);
        active.updated_at = Set(Utc::now());
        active.updated_by = Set(Some(by.to_string()));
        let updated = active.update(&self.conn).await?;

        Ok(Some(User::from(updated)))
    }

    pub async fn set_admin(&self, name: &str, admin: bool, by: &str) -> Result<Option<User>> {
        let Some(user) = self.find_model(name).await? else {
            return Ok(None);
        };

        let txn = self.conn.begin().await?;

        // A global admin implicitly manages every jam.
        if admin {
            managers::Entity::delete_many()
                .filter(manager_named(&user.name))
                .exec(&txn)
                .await?;
        }

        let mut active: users::ActiveModel = user.into();
        active.admin = Set(admin);
        active.updated_at = Set(Utc::now());
        active.updated_by = Set(Some(by.to_string()));
        let updated = active.update(&txn).await?;

        txn.commit().await?;

        Ok(Some(User::from(updated)))
    }

    /// Removes the user and their manager rows.
    pub async fn delete(&self, name: &str) -> Result<bool> {
        let Some(user) = self.find_model(name).await? else {
            return Ok(false);
        };

        let txn = self.conn.begin().await?;

        managers::Entity::delete_many()
            .filter(manager_named(&user.name))
            .exec(&txn)
            .await?;

        let result = users::Entity::delete_by_id(user.id).exec(&txn).await?;

        txn.commit().await?;

        Ok(result.rows_affected > 0)
    }
}

use anyhow::{Context, Result};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    sea_query::{Expr, Func},
};

use crate::domain::name_key;

use crate::entities::sessions;
use crate::models::Session;

pub struct SessionRepository {
    conn: DatabaseConnection,
}

impl SessionRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list_all(&self) -> Result<Vec<Session>> {
        let rows = sessions::Entity::find()
            .all(&self.conn)
            .await
            .context("Failed to load sessions")?;

        Ok(rows.into_iter().map(Session::from).collect())
    }

    pub async fn insert(&self, name: &str, token: &str, one_time_token: &str) -> Result<()> {
        let active = sessions::ActiveModel {
            name: Set(name.to_string()),
            token: Set(token.to_string()),
            one_time_token: Set(Some(one_time_token.to_string())),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        active
            .insert(&self.conn)
            .await
            .context("Failed to persist session")?;
        Ok(())
    }

    /// Nulls the one-time token. Returns false if no row still carried it.
    pub async fn clear_one_time_token(&self, one_time_token: &str) -> Result<bool> {
        let result = sessions::Entity::update_many()
            .col_expr(
                sessions::Column::OneTimeToken,
                Expr::value(Option::<String>::None),
            )
            .filter(sessions::Column::OneTimeToken.eq(one_time_token))
            .exec(&self.conn)
            .await
            .context("Failed to consume one-time token")?;

        Ok(result.rows_affected > 0)
    }

    pub async fn delete_by_token(&self, token: &str) -> Result<bool> {
        let result = sessions::Entity::delete_many()
            .filter(sessions::Column::Token.eq(token))
            .exec(&self.conn)
            .await
            .context("Failed to delete session")?;

        Ok(result.rows_affected > 0)
    }

    /// Deletes every session owned by `name`, matching case-insensitively.
    pub async fn delete_by_name(&self, name: &str) -> Result<u64> {
        let result = sessions::Entity::delete_many()
            .filter(Expr::expr(Func::lower(Expr::col(sessions::Column::Name))).eq(name_key(name)))
            .exec(&self.conn)
            .await
            .context("Failed to delete sessions for user")?;

        Ok(result.rows_affected)
    }
}

use anyhow::{Context, Result};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, SqlErr,
    sea_query::{Expr, Func},
};

use crate::domain::name_key;
use crate::entities::managers;

fn name_matches(name: &str) -> sea_orm::sea_query::SimpleExpr {
    Expr::expr(Func::lower(Expr::col(managers::Column::Name))).eq(name_key(name))
}

pub struct ManagerRepository {
    conn: DatabaseConnection,
}

impl ManagerRepository {
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn is_manager(&self, jam: &str, name: &str) -> Result<bool> {
        let count = managers::Entity::find()
            .filter(managers::Column::Jam.eq(jam))
            .filter(name_matches(name))
            .count(&self.conn)
            .await
            .context("Failed to check manager")?;

        Ok(count > 0)
    }

    pub async fn list(&self, jam: &str) -> Result<Vec<String>> {
        let rows = managers::Entity::find()
            .filter(managers::Column::Jam.eq(jam))
            .order_by_asc(managers::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to list managers")?;

        Ok(rows.into_iter().map(|m| m.name).collect())
    }

    /// Returns false when the pair already exists.
    pub async fn add(&self, jam: &str, name: &str) -> Result<bool> {
        if self.is_manager(jam, name).await? {
            return Ok(false);
        }

        let active = managers::ActiveModel {
            jam: Set(jam.to_string()),
            name: Set(name.to_string()),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        match active.insert(&self.conn).await {
            Ok(_) => Ok(true),
            Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Ok(false)
            }
            Err(err) => Err(err).context("Failed to add manager"),
        }
    }

    pub async fn remove(&self, jam: &str, name: &str) -> Result<bool> {
        let result = managers::Entity::delete_many()
            .filter(managers::Column::Jam.eq(jam))
            .filter(name_matches(name))
            .exec(&self.conn)
            .await
            .context("Failed to remove manager")?;

        Ok(result.rows_affected > 0)
    }
}

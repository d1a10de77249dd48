use anyhow::{Context, Result};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, SqlErr,
    sea_query::{Expr, Func, SimpleExpr},
};

use crate::domain::name_key;
use crate::entities::upvotes;
use crate::models::Upvote;

fn cast_by(user: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col(upvotes::Column::UpvotedBy))).eq(name_key(user))
}

pub struct UpvoteRepository {
    conn: DatabaseConnection,
}

impl UpvoteRepository {
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list_for_jam(&self, jam: &str) -> Result<Vec<Upvote>> {
        let rows = upvotes::Entity::find()
            .filter(upvotes::Column::Jam.eq(jam))
            .order_by_asc(upvotes::Column::UpvotedAt)
            .all(&self.conn)
            .await
            .context("Failed to list upvotes")?;

        Ok(rows.into_iter().map(Upvote::from).collect())
    }

    pub async fn count_for_project(&self, jam: &str, project_id: i64) -> Result<u64> {
        upvotes::Entity::find()
            .filter(upvotes::Column::Jam.eq(jam))
            .filter(upvotes::Column::ProjectId.eq(project_id))
            .count(&self.conn)
            .await
            .context("Failed to count project upvotes")
    }

    pub async fn count_for_user(&self, jam: &str, user: &str) -> Result<u64> {
        upvotes::Entity::find()
            .filter(upvotes::Column::Jam.eq(jam))
            .filter(cast_by(user))
            .count(&self.conn)
            .await
            .context("Failed to count user upvotes")
    }

    pub async fn exists(&self, jam: &str, project_id: i64, user: &str) -> Result<bool> {
        let count = upvotes::Entity::find()
            .filter(upvotes::Column::Jam.eq(jam))
            .filter(upvotes::Column::ProjectId.eq(project_id))
            .filter(cast_by(user))
            .count(&self.conn)
            .await
            .context("Failed to check upvote")?;

        Ok(count > 0)
    }

    /// Returns false when `user` already upvoted the project, in any casing.
    pub async fn insert(&self, jam: &str, project_id: i64, user: &str) -> Result<bool> {
        let active = upvotes::ActiveModel {
            jam: Set(jam.to_string()),
            project_id: Set(project_id),
            upvoted_by: Set(user.to_string()),
            upvoted_at: Set(Utc::now()),
            ..Default::default()
        };

        match active.insert(&self.conn).await {
            Ok(_) => Ok(true),
            Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Ok(false)
            }
            Err(err) => Err(err).context("Failed to insert upvote"),
        }
    }

    pub async fn delete(&self, jam: &str, project_id: i64, user: &str) -> Result<bool> {
        let result = upvotes::Entity::delete_many()
            .filter(upvotes::Column::Jam.eq(jam))
            .filter(upvotes::Column::ProjectId.eq(project_id))
            .filter(cast_by(user))
            .exec(&self.conn)
            .await
            .context("Failed to delete upvote")?;

        Ok(result.rows_affected > 0)
    }
}

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    SqlErr, TransactionTrait, sea_query::Expr,
};

use crate::entities::{projects, upvotes};
use crate::models::Project;

pub struct ProjectRepository {
    conn: DatabaseConnection,
}

impl ProjectRepository {
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get(&self, jam: &str, project_id: i64) -> Result<Option<Project>> {
        let row = projects::Entity::find()
            .filter(projects::Column::Jam.eq(jam))
            .filter(projects::Column::ProjectId.eq(project_id))
            .one(&self.conn)
            .await
            .context("Failed to query project")?;

        Ok(row.map(Project::from))
    }

    /// Projects of a jam in submission order.
    pub async fn list(&self, jam: &str) -> Result<Vec<Project>> {
        let rows = projects::Entity::find()
            .filter(projects::Column::Jam.eq(jam))
            .order_by_asc(projects::Column::SubmittedAt)
            .order_by_asc(projects::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list projects")?;

        Ok(rows.into_iter().map(Project::from).collect())
    }

    /// Returns `None` when the project was already submitted to this jam.
    pub async fn insert(
        &self,
        jam: &str,
        project_id: i64,
        submitted_by: &str,
        submitted_at: DateTime<Utc>,
    ) -> Result<Option<Project>> {
        let active = projects::ActiveModel {
            jam: Set(jam.to_string()),
            project_id: Set(project_id),
            submitted_by: Set(submitted_by.to_string()),
            submitted_at: Set(submitted_at),
            selected: Set(false),
            selected_by_the_community: Set(false),
            ..Default::default()
        };

        match active.insert(&self.conn).await {
            Ok(model) => Ok(Some(Project::from(model))),
            Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Ok(None)
            }
            Err(err) => Err(err).context("Failed to insert project"),
        }
    }

    /// Deletes the project and every upvote cast for it.
    pub async fn delete_with_upvotes(&self, jam: &str, project_id: i64) -> Result<bool> {
        let txn = self.conn.begin().await?;

        upvotes::Entity::delete_many()
            .filter(upvotes::Column::Jam.eq(jam))
            .filter(upvotes::Column::ProjectId.eq(project_id))
            .exec(&txn)
            .await?;

        let result = projects::Entity::delete_many()
            .filter(projects::Column::Jam.eq(jam))
            .filter(projects::Column::ProjectId.eq(project_id))
            .exec(&txn)
            .await?;

        txn.commit().await?;

        Ok(result.rows_affected > 0)
    }

    pub async fn set_selected(&self, jam: &str, project_id: i64, selected: bool) -> Result<bool> {
        let result = projects::Entity::update_many()
            .col_expr(projects::Column::Selected, Expr::value(selected))
            .filter(projects::Column::Jam.eq(jam))
            .filter(projects::Column::ProjectId.eq(project_id))
            .exec(&self.conn)
            .await
            .context("Failed to update manual winner")?;

        Ok(result.rows_affected > 0)
    }

    /// Makes `winner` the only community-selected project of the jam (or
    /// clears the flag everywhere when `None`). Rows already in the desired
    /// state are not written. Returns the number of rows changed.
    pub async fn set_community_winner(&self, jam: &str, winner: Option<i64>) -> Result<u64> {
        let txn = self.conn.begin().await?;

        let mut clear = projects::Entity::update_many()
            .col_expr(projects::Column::SelectedByTheCommunity, Expr::value(false))
            .filter(projects::Column::Jam.eq(jam))
            .filter(projects::Column::SelectedByTheCommunity.eq(true));
        if let Some(project_id) = winner {
            clear = clear.filter(projects::Column::ProjectId.ne(project_id));
        }
        let mut changed = clear.exec(&txn).await?.rows_affected;

        if let Some(project_id) = winner {
            changed += projects::Entity::update_many()
                .col_expr(projects::Column::SelectedByTheCommunity, Expr::value(true))
                .filter(projects::Column::Jam.eq(jam))
                .filter(projects::Column::ProjectId.eq(project_id))
                .filter(projects::Column::SelectedByTheCommunity.eq(false))
                .exec(&txn)
                .await?
                .rows_affected;
        }

        txn.commit().await?;

        Ok(changed)
    }
}

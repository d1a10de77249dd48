use anyhow::{Context, Result};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait, sea_query::Expr,
};
use tracing::info;

use crate::entities::{jams, managers, projects, upvotes};
use crate::models::{Jam, NewJam};

/// Outcome of persisting an edited jam.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JamWrite {
    Saved,
    NotFound,
    SlugTaken,
}

pub struct JamRepository {
    conn: DatabaseConnection,
}

impl JamRepository {
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    async fn find_model(&self, slug: &str) -> Result<Option<jams::Model>> {
        jams::Entity::find()
            .filter(jams::Column::Slug.eq(slug))
            .one(&self.conn)
            .await
            .context("Failed to query jam by slug")
    }

    pub async fn get(&self, slug: &str) -> Result<Option<Jam>> {
        Ok(self.find_model(slug).await?.map(Jam::from))
    }

    pub async fn exists(&self, slug: &str) -> Result<bool> {
        Ok(self.find_model(slug).await?.is_some())
    }

    /// Returns one page of jams (most recent start first) and the total count.
    pub async fn list(&self, featured_only: bool, limit: u64, offset: u64) -> Result<(Vec<Jam>, u64)> {
        let mut query = jams::Entity::find();
        if featured_only {
            query = query.filter(jams::Column::Featured.eq(true));
        }

        let total = query
            .clone()
            .count(&self.conn)
            .await
            .context("Failed to count jams")?;

        let rows = query
            .order_by_desc(jams::Column::DateStart)
            .order_by_asc(jams::Column::Id)
            .limit(limit)
            .offset(offset)
            .all(&self.conn)
            .await
            .context("Failed to list jams")?;

        Ok((rows.into_iter().map(Jam::from).collect(), total))
    }

    /// Inserts a jam under `slug`. Returns `None` if the slug is taken.
    pub async fn insert(&self, slug: &str, jam: &NewJam, created_by: &str) -> Result<Option<Jam>> {
        if self.exists(slug).await? {
            return Ok(None);
        }

        let now = Utc::now();
        let active = jams::ActiveModel {
            slug: Set(slug.to_string()),
            name: Set(jam.name.trim().to_string()),
            date_start: Set(jam.dates.start),
            date_end: Set(jam.dates.end),
            voting_start: Set(jam.dates.voting_start),
            voting_end: Set(jam.dates.voting_end),
            description: Set(jam.content.description.clone()),
            body: Set(jam.content.body.clone()),
            colors: Set(jam.content.colors.clone()),
            header_image: Set(jam.content.header_image.clone()),
            enable_mystery: Set(jam.options.enable_mystery),
            featured: Set(jam.featured),
            created_at: Set(now),
            created_by: Set(created_by.to_string()),
            updated_at: Set(now),
            updated_by: Set(created_by.to_string()),
            ..Default::default()
        };

        match active.insert(&self.conn).await {
            Ok(model) => {
                info!(jam = %slug, "Created jam");
                Ok(Some(Jam::from(model)))
            }
            Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Ok(None)
            }
            Err(err) => Err(err).context("Failed to insert jam"),
        }
    }

    /// Persists an edited jam that was loaded under `original_slug`.
    ///
    /// When `jam.slug` differs, managers, projects and upvotes are re-linked
    /// to the new slug in the same transaction.
    pub async fn save(&self, original_slug: &str, jam: &Jam, updated_by: &str) -> Result<JamWrite> {
        let Some(existing) = self.find_model(original_slug).await? else {
            return Ok(JamWrite::NotFound);
        };

        let renamed = jam.slug != original_slug;
        if renamed && self.exists(&jam.slug).await? {
            return Ok(JamWrite::SlugTaken);
        }

        let txn = self.conn.begin().await?;

        let mut active: jams::ActiveModel = existing.into();
        active.slug = Set(jam.slug.clone());
        active.name = Set(jam.name.clone());
        active.date_start = Set(jam.dates.start);
        active.date_end = Set(jam.dates.end);
        active.voting_start = Set(jam.dates.voting_start);
        active.voting_end = Set(jam.dates.voting_end);
        active.description = Set(jam.content.description.clone());
        active.body = Set(jam.content.body.clone());
        active.colors = Set(jam.content.colors.clone());
        active.header_image = Set(jam.content.header_image.clone());
        active.enable_mystery = Set(jam.options.enable_mystery);
        active.featured = Set(jam.featured);
        active.updated_at = Set(Utc::now());
        active.updated_by = Set(updated_by.to_string());
        active.update(&txn).await?;

        if renamed {
            managers::Entity::update_many()
                .col_expr(managers::Column::Jam, Expr::value(jam.slug.clone()))
                .filter(managers::Column::Jam.eq(original_slug))
                .exec(&txn)
                .await?;

            projects::Entity::update_many()
                .col_expr(projects::Column::Jam, Expr::value(jam.slug.clone()))
                .filter(projects::Column::Jam.eq(original_slug))
                .exec(&txn)
                .await?;

            upvotes::Entity::update_many()
                .col_expr(upvotes::Column::Jam, Expr::value(jam.slug.clone()))
                .filter(upvotes::Column::Jam.eq(original_slug))
                .exec(&txn)
                .await?;
        }

        txn.commit().await?;

        if renamed {
            info!(from = %original_slug, to = %jam.slug, "Renamed jam and re-linked dependents");
        }

        Ok(JamWrite::Saved)
    }

    /// Deletes the jam together with its managers, projects and upvotes.
    pub async fn delete(&self, slug: &str) -> Result<bool> {
        let txn = self.conn.begin().await?;

        upvotes::Entity::delete_many()
            .filter(upvotes::Column::Jam.eq(slug))
            .exec(&txn)
            .await?;

        projects::Entity::delete_many()
            .filter(projects::Column::Jam.eq(slug))
            .exec(&txn)
            .await?;

        managers::Entity::delete_many()
            .filter(managers::Column::Jam.eq(slug))
            .exec(&txn)
            .await?;

        let result = jams::Entity::delete_many()
            .filter(jams::Column::Slug.eq(slug))
            .exec(&txn)
            .await?;

        txn.commit().await?;

        let removed = result.rows_affected > 0;
        if removed {
            info!(jam = %slug, "Deleted jam");
        }
        Ok(removed)
    }
}

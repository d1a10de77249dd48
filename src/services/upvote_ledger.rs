//! Upvote ledger with a per-user, per-jam cap.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::db::Store;
use crate::domain::name_key;
use crate::services::key_lock::KeyedLocks;
use crate::services::winner_resolver::WinnerResolver;

#[derive(Debug, Error)]
pub enum UpvoteError {
    #[error("Jam not found: {0}")]
    JamNotFound(String),

    #[error("Project {0} is not part of this jam")]
    ProjectNotFound(i64),

    #[error("You already upvoted this project")]
    AlreadyUpvoted,

    #[error("You have used all {cap} upvotes for this jam")]
    TooManyUpvotes { cap: u64 },

    #[error("Upvote not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sea_orm::DbErr> for UpvoteError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for UpvoteError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UpvoteTally {
    pub upvotes: u64,
    /// Present only when the count was requested on behalf of a user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upvoted: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Remaining {
    pub remaining: u64,
    pub cap: u64,
}

/// One lock per voter per jam, whatever casing the name arrives in.
fn voter_key(jam: &str, user: &str) -> String {
    format!("{jam}\u{0}{}", name_key(user))
}

pub struct UpvoteLedger {
    store: Store,
    resolver: Arc<WinnerResolver>,
    locks: KeyedLocks,
    cap: u64,
}

impl UpvoteLedger {
    #[must_use]
    pub fn new(store: Store, resolver: Arc<WinnerResolver>, cap: u64) -> Self {
        Self {
            store,
            resolver,
            locks: KeyedLocks::new(),
            cap,
        }
    }

    #[must_use]
    pub const fn cap(&self) -> u64 {
        self.cap
    }

    async fn ensure_project(&self, jam: &str, project_id: i64) -> Result<(), UpvoteError> {
        if self.store.get_jam(jam).await?.is_none() {
            return Err(UpvoteError::JamNotFound(jam.to_string()));
        }
        if self.store.get_project(jam, project_id).await?.is_none() {
            return Err(UpvoteError::ProjectNotFound(project_id));
        }
        Ok(())
    }

    /// Records `user`'s upvote for a project.
    pub async fn cast(&self, jam: &str, project_id: i64, user: &str) -> Result<(), UpvoteError> {
        self.ensure_project(jam, project_id).await?;

        let result = self.insert_within_cap(jam, project_id, user).await;

        match &result {
            Ok(()) => metrics::counter!("upvotes_cast_total").increment(1),
            Err(UpvoteError::AlreadyUpvoted) => {
                metrics::counter!("upvotes_rejected_total", "reason" => "duplicate").increment(1);
            }
            Err(UpvoteError::TooManyUpvotes { .. }) => {
                metrics::counter!("upvotes_rejected_total", "reason" => "cap").increment(1);
            }
            Err(_) => {}
        }
        result?;

        debug!(jam = %jam, project_id, user = %user, "Upvote cast");
        self.refresh_winner(jam).await;
        Ok(())
    }

    async fn insert_within_cap(
        &self,
        jam: &str,
        project_id: i64,
        user: &str,
    ) -> Result<(), UpvoteError> {
        let _guard = self.locks.lock(&voter_key(jam, user)).await;

        if self.store.has_upvoted(jam, project_id, user).await? {
            return Err(UpvoteError::AlreadyUpvoted);
        }

        if self.store.count_user_upvotes(jam, user).await? >= self.cap {
            return Err(UpvoteError::TooManyUpvotes { cap: self.cap });
        }

        if !self.store.insert_upvote(jam, project_id, user).await? {
            return Err(UpvoteError::AlreadyUpvoted);
        }

        Ok(())
    }

    /// Withdraws `user`'s upvote for a project.
    pub async fn revoke(&self, jam: &str, project_id: i64, user: &str) -> Result<(), UpvoteError> {
        let removed = {
            let _guard = self.locks.lock(&voter_key(jam, user)).await;
            self.store.delete_upvote(jam, project_id, user).await?
        };

        if !removed {
            return Err(UpvoteError::NotFound);
        }

        debug!(jam = %jam, project_id, user = %user, "Upvote revoked");
        self.refresh_winner(jam).await;
        Ok(())
    }

    /// Upvote count for a project, annotated with whether `viewer` upvoted it.
    pub async fn count_for_project(
        &self,
        jam: &str,
        project_id: i64,
        viewer: Option<&str>,
    ) -> Result<UpvoteTally, UpvoteError> {
        self.ensure_project(jam, project_id).await?;

        let upvotes = self.store.count_project_upvotes(jam, project_id).await?;
        let upvoted = match viewer {
            Some(user) => Some(self.store.has_upvoted(jam, project_id, user).await?),
            None => None,
        };

        Ok(UpvoteTally { upvotes, upvoted })
    }

    /// `cap - upvotes already cast by user in jam`, never below zero.
    pub async fn remaining(&self, jam: &str, user: &str) -> Result<Remaining, UpvoteError> {
        if self.store.get_jam(jam).await?.is_none() {
            return Err(UpvoteError::JamNotFound(jam.to_string()));
        }

        let used = self.store.count_user_upvotes(jam, user).await?;
        Ok(Remaining {
            remaining: self.cap.saturating_sub(used),
            cap: self.cap,
        })
    }

    async fn refresh_winner(&self, jam: &str) {
        if let Err(e) = self.resolver.resolve(jam).await {
            warn!(jam = %jam, error = %e, "Failed to recompute community winner");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{JamContent, JamDates, JamOptions, NewJam};
    use chrono::{Duration, Utc};

    async fn ledger_with_projects(cap: u64, projects: &[i64]) -> (UpvoteLedger, Store) {
        let store = Store::new("sqlite::memory:").await.unwrap();
        let now = Utc::now();
        let jam = NewJam {
            name: "Spring".to_string(),
            dates: JamDates {
                start: now - Duration::days(1),
                end: now + Duration::days(1),
                voting_start: None,
                voting_end: None,
            },
            content: JamContent::default(),
            options: JamOptions::default(),
            featured: false,
        };
        store.insert_jam("spring", &jam, "admin").await.unwrap();
        for &id in projects {
            store.insert_project("spring", id, "maker", now).await.unwrap();
        }

        let resolver = Arc::new(WinnerResolver::new(store.clone()));
        (UpvoteLedger::new(store.clone(), resolver, cap), store)
    }

    #[tokio::test]
    async fn cap_is_enforced() {
        let (ledger, _) = ledger_with_projects(3, &[1, 2, 3, 4]).await;

        for id in 1..=3 {
            ledger.cast("spring", id, "alice").await.unwrap();
        }
        let fourth = ledger.cast("spring", 4, "alice").await;
        assert!(matches!(fourth, Err(UpvoteError::TooManyUpvotes { cap: 3 })));

        assert_eq!(ledger.remaining("spring", "alice").await.unwrap().remaining, 0);
        assert_eq!(ledger.remaining("spring", "bob").await.unwrap().remaining, 3);
    }

    #[tokio::test]
    async fn duplicate_upvote_is_rejected() {
        let (ledger, _) = ledger_with_projects(3, &[1]).await;
        ledger.cast("spring", 1, "alice").await.unwrap();
        let again = ledger.cast("spring", 1, "alice").await;
        assert!(matches!(again, Err(UpvoteError::AlreadyUpvoted)));
    }

    #[tokio::test]
    async fn voter_name_casing_shares_one_allowance() {
        let (ledger, store) = ledger_with_projects(3, &[1, 2, 3, 4]).await;
        store.upsert_login_user("alice", None).await.unwrap();

        for id in 1..=3 {
            ledger.cast("spring", id, "alice").await.unwrap();
        }
        // The profile service now reports different casing.
        let renamed = store.upsert_login_user("Alice", None).await.unwrap();
        assert_eq!(renamed.name, "Alice");

        assert!(matches!(
            ledger.cast("spring", 4, "Alice").await,
            Err(UpvoteError::TooManyUpvotes { cap: 3 })
        ));
        assert!(matches!(
            ledger.cast("spring", 1, "Alice").await,
            Err(UpvoteError::AlreadyUpvoted)
        ));
        assert_eq!(ledger.remaining("spring", "ALICE").await.unwrap().remaining, 0);

        let tally = ledger.count_for_project("spring", 1, Some("Alice")).await.unwrap();
        assert_eq!(tally, UpvoteTally { upvotes: 1, upvoted: Some(true) });

        ledger.revoke("spring", 1, "Alice").await.unwrap();
        ledger.cast("spring", 4, "Alice").await.unwrap();
        assert_eq!(store.count_user_upvotes("spring", "alice").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn revoke_frees_a_slot() {
        let (ledger, _) = ledger_with_projects(1, &[1, 2]).await;
        ledger.cast("spring", 1, "alice").await.unwrap();
        ledger.revoke("spring", 1, "alice").await.unwrap();
        ledger.cast("spring", 2, "alice").await.unwrap();

        assert!(matches!(
            ledger.revoke("spring", 1, "alice").await,
            Err(UpvoteError::NotFound)
        ));
    }

    #[tokio::test]
    async fn unknown_project_is_rejected() {
        let (ledger, _) = ledger_with_projects(3, &[1]).await;
        assert!(matches!(
            ledger.cast("spring", 99, "alice").await,
            Err(UpvoteError::ProjectNotFound(99))
        ));
        assert!(matches!(
            ledger.cast("autumn", 1, "alice").await,
            Err(UpvoteError::JamNotFound(_))
        ));
    }

    #[tokio::test]
    async fn concurrent_casts_respect_cap() {
        let (ledger, store) = ledger_with_projects(3, &[1, 2, 3, 4, 5, 6]).await;
        let ledger = Arc::new(ledger);

        let handles: Vec<_> = (1..=6)
            .map(|id| {
                let ledger = Arc::clone(&ledger);
                tokio::spawn(async move { ledger.cast("spring", id, "alice").await })
            })
            .collect();

        let mut accepted = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                accepted += 1;
            }
        }

        assert_eq!(accepted, 3);
        assert_eq!(store.count_user_upvotes("spring", "alice").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn tally_reports_viewer_flag() {
        let (ledger, _) = ledger_with_projects(3, &[1]).await;
        ledger.cast("spring", 1, "alice").await.unwrap();

        let anonymous = ledger.count_for_project("spring", 1, None).await.unwrap();
        assert_eq!(anonymous, UpvoteTally { upvotes: 1, upvoted: None });

        let bob = ledger.count_for_project("spring", 1, Some("bob")).await.unwrap();
        assert_eq!(bob.upvoted, Some(false));
    }
}

//! Community winner recomputation for closed jams.
//!
//! Projects marked `selected` by a manager are excluded from the community
//! vote. Among the rest, the project with the most upvotes wins; ties go to
//! the earliest submission. Recomputing with unchanged inputs writes nothing.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::db::Store;
use crate::domain::lifecycle::has_closed;
use crate::models::Project;
use crate::services::key_lock::KeyedLocks;

/// What a recomputation concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Jam unknown or still running; nothing was looked at.
    NotClosed,
    /// Every project is a manual winner; flags were left as they are.
    NoCandidates,
    /// No eligible upvotes; the community flag is cleared everywhere.
    NoVotes,
    Winner(i64),
}

pub struct WinnerResolver {
    store: Store,
    locks: KeyedLocks,
}

impl WinnerResolver {
    #[must_use]
    pub fn new(store: Store) -> Self {
        Self {
            store,
            locks: KeyedLocks::new(),
        }
    }

    pub async fn resolve(&self, jam: &str) -> anyhow::Result<Resolution> {
        self.resolve_at(jam, Utc::now()).await
    }

    pub async fn resolve_at(&self, slug: &str, now: DateTime<Utc>) -> anyhow::Result<Resolution> {
        let Some(jam) = self.store.get_jam(slug).await? else {
            return Ok(Resolution::NotClosed);
        };
        if !has_closed(&jam.dates, now) {
            return Ok(Resolution::NotClosed);
        }

        let _guard = self.locks.lock(slug).await;

        let candidates: Vec<Project> = self
            .store
            .list_projects(slug)
            .await?
            .into_iter()
            .filter(|p| !p.selected)
            .collect();
        if candidates.is_empty() {
            return Ok(Resolution::NoCandidates);
        }

        let mut tally: HashMap<i64, u64> = HashMap::new();
        for upvote in self.store.list_upvotes(slug).await? {
            if candidates.iter().any(|p| p.project_id == upvote.project_id) {
                *tally.entry(upvote.project_id).or_default() += 1;
            }
        }

        let winner = pick_winner(&candidates, &tally);
        let changed = self.store.set_community_winner(slug, winner).await?;

        metrics::counter!("winner_recomputations_total").increment(1);

        if changed > 0 {
            info!(jam = %slug, winner = ?winner, changed, "Community winner updated");
        } else {
            debug!(jam = %slug, winner = ?winner, "Community winner unchanged");
        }

        Ok(winner.map_or(Resolution::NoVotes, Resolution::Winner))
    }
}

/// Highest tally wins; equal tallies go to the earliest submission, then to
/// whichever comes first in `candidates`.
#[must_use]
pub fn pick_winner(candidates: &[Project], tally: &HashMap<i64, u64>) -> Option<i64> {
    let mut best: Option<(&Project, u64)> = None;

    for project in candidates {
        let Some(&votes) = tally.get(&project.project_id) else {
            continue;
        };
        if votes == 0 {
            continue;
        }

        let better = match best {
            None => true,
            Some((leader, leader_votes)) => {
                votes > leader_votes
                    || (votes == leader_votes && project.meta.submitted < leader.meta.submitted)
            }
        };
        if better {
            best = Some((project, votes));
        }
    }

    best.map(|(project, _)| project.project_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::project::ProjectMeta;
    use chrono::{Duration, TimeZone};

    fn project(id: i64, submitted: DateTime<Utc>) -> Project {
        Project {
            jam: "jam".to_string(),
            project_id: id,
            meta: ProjectMeta {
                submitted_by: format!("user{id}"),
                submitted,
            },
            selected: false,
            selected_by_the_community: false,
        }
    }

    #[test]
    fn most_votes_wins() {
        let t = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let candidates = [project(1, t), project(2, t + Duration::hours(1))];
        let tally = HashMap::from([(1, 1), (2, 3)]);
        assert_eq!(pick_winner(&candidates, &tally), Some(2));
    }

    #[test]
    fn tie_goes_to_earliest_submission() {
        let t1 = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let t2 = t1 + Duration::minutes(5);
        // Order in the slice must not matter.
        let candidates = [project(20, t2), project(10, t1)];
        let tally = HashMap::from([(10, 2), (20, 2)]);
        assert_eq!(pick_winner(&candidates, &tally), Some(10));
    }

    #[test]
    fn no_votes_no_winner() {
        let t = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        assert_eq!(pick_winner(&[project(1, t)], &HashMap::new()), None);
    }
}

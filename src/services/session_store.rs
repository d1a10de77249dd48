//! Process-wide session index backed by the `sessions` table.
//!
//! The store is the only owner of session state. It is constructed once with
//! [`SessionStore::open`], which loads every persisted session; holding a
//! `SessionStore` therefore means the index is ready. Lookups read the index
//! without touching the database. Mutations are serialized and written to the
//! database before the index changes, so a failed write leaves both untouched.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use rand::RngCore;
use thiserror::Error;
use tracing::{debug, info};

use crate::db::Store;
use crate::domain::name_key;
use crate::models::Session;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sea_orm::DbErr> for SessionError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for SessionError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Credentials handed out by [`SessionStore::issue`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedSession {
    pub token: String,
    pub one_time_token: String,
}

#[derive(Default)]
struct SessionIndex {
    by_token: HashMap<String, Session>,
    /// one-time token -> durable token
    by_one_time: HashMap<String, String>,
}

impl SessionIndex {
    fn insert(&mut self, session: Session) {
        if let Some(one_time) = &session.one_time_token {
            self.by_one_time
                .insert(one_time.clone(), session.token.clone());
        }
        self.by_token.insert(session.token.clone(), session);
    }

    fn remove(&mut self, token: &str) -> Option<Session> {
        let session = self.by_token.remove(token)?;
        if let Some(one_time) = &session.one_time_token {
            self.by_one_time.remove(one_time);
        }
        Some(session)
    }
}

pub struct SessionStore {
    store: Store,
    index: RwLock<SessionIndex>,
    writer: tokio::sync::Mutex<()>,
    token_bytes: usize,
}

impl SessionStore {
    /// Loads all persisted sessions and returns a ready store.
    pub async fn open(store: Store, token_bytes: usize) -> Result<Self, SessionError> {
        let sessions = store.list_sessions().await?;

        let mut index = SessionIndex::default();
        for session in sessions {
            index.insert(session);
        }

        info!(sessions = index.by_token.len(), "Session store ready");

        Ok(Self {
            store,
            index: RwLock::new(index),
            writer: tokio::sync::Mutex::new(()),
            token_bytes,
        })
    }

    /// Creates a session for `name` with a fresh durable and one-time token.
    pub async fn issue(&self, name: &str) -> Result<IssuedSession, SessionError> {
        let token = generate_secret(self.token_bytes);
        let one_time_token = generate_secret(self.token_bytes);

        let _writer = self.writer.lock().await;

        self.store
            .insert_session(name, &token, &one_time_token)
            .await?;

        self.write_index().insert(Session {
            name: name.to_string(),
            token: token.clone(),
            one_time_token: Some(one_time_token.clone()),
        });

        metrics::counter!("sessions_issued_total").increment(1);
        debug!(user = %name, "Issued session");

        Ok(IssuedSession {
            token,
            one_time_token,
        })
    }

    /// Consumes a one-time token and returns the session it belonged to.
    ///
    /// The token is cleared durably before it disappears from the index, so
    /// it can be exchanged at most once.
    pub async fn exchange_one_time(&self, one_time_token: &str) -> Result<Session, SessionError> {
        let _writer = self.writer.lock().await;

        let Some(token) = self.read_index().by_one_time.get(one_time_token).cloned() else {
            return Err(SessionError::NotFound);
        };

        let cleared = self.store.clear_one_time_token(one_time_token).await?;

        let mut index = self.write_index();
        index.by_one_time.remove(one_time_token);

        if !cleared {
            return Err(SessionError::NotFound);
        }

        let session = index
            .by_token
            .get_mut(&token)
            .ok_or(SessionError::NotFound)?;
        session.one_time_token = None;

        Ok(session.clone())
    }

    #[must_use]
    pub fn find_by_token(&self, token: &str) -> Option<Session> {
        self.read_index().by_token.get(token).cloned()
    }

    #[must_use]
    pub fn find_by_one_time_token(&self, one_time_token: &str) -> Option<Session> {
        let index = self.read_index();
        index
            .by_one_time
            .get(one_time_token)
            .and_then(|token| index.by_token.get(token))
            .cloned()
    }

    /// Removes a session. Revoking an unknown token is a no-op.
    pub async fn revoke(&self, token: &str) -> Result<bool, SessionError> {
        let _writer = self.writer.lock().await;

        let deleted = self.store.delete_session(token).await?;
        let removed = self.write_index().remove(token).is_some();

        if deleted || removed {
            metrics::counter!("sessions_revoked_total").increment(1);
        }

        Ok(deleted || removed)
    }

    /// Removes every session owned by `name`. Returns how many were revoked.
    pub async fn revoke_all_for(&self, name: &str) -> Result<u64, SessionError> {
        let _writer = self.writer.lock().await;

        let deleted = self.store.delete_sessions_for(name).await?;

        let key = name_key(name);
        let mut index = self.write_index();
        let doomed: Vec<String> = index
            .by_token
            .values()
            .filter(|s| name_key(&s.name) == key)
            .map(|s| s.token.clone())
            .collect();
        for token in &doomed {
            index.remove(token);
        }
        drop(index);

        let revoked = deleted.max(doomed.len() as u64);
        if revoked > 0 {
            metrics::counter!("sessions_revoked_total").increment(revoked);
            info!(user = %name, revoked, "Revoked all sessions for user");
        }

        Ok(revoked)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.read_index().by_token.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read_index(&self) -> std::sync::RwLockReadGuard<'_, SessionIndex> {
        self.index.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_index(&self) -> std::sync::RwLockWriteGuard<'_, SessionIndex> {
        self.index.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Hex-encoded random secret of `bytes` bytes.
fn generate_secret(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    rand::rng().fill_bytes(&mut buf);

    buf.iter()
        .fold(String::with_capacity(bytes * 2), |mut acc, b| {
            use std::fmt::Write;
            let _ = write!(acc, "{b:02x}");
            acc
        })
}

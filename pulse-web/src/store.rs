//! In-memory read model of the two collections
//!
//! All mutation goes through this store; views only ever see snapshots. The
//! store reconciles by full re-fetch (`refresh`) rather than incremental
//! patching, and deltas de-duplicate by id so a replayed event never
//! double-counts between refreshes.

use std::collections::VecDeque;
use std::sync::Arc;

use pulse_common::models::{Response, Session};
use sqlx::SqlitePool;
use tokio::sync::RwLock;
use tracing::{error, info};
use uuid::Uuid;

use crate::db;

/// Most recent responses retained for the notification feed
const RECENT_FEED_CAP: usize = 10;

/// Immutable snapshot of the read model
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub sessions: Vec<Session>,
    pub responses: Vec<Response>,
    /// Newest-first feed of the latest responses
    pub recent: Vec<Response>,
}

#[derive(Debug, Default)]
struct Inner {
    sessions: Vec<Session>,
    responses: Vec<Response>,
    recent: VecDeque<Response>,
}

/// Centralized mutable state behind immutable snapshots
#[derive(Clone, Default)]
pub struct ReadModel {
    inner: Arc<RwLock<Inner>>,
}

impl ReadModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clone out a consistent snapshot of both collections
    pub async fn snapshot(&self) -> Dataset {
        let inner = self.inner.read().await;
        Dataset {
            sessions: inner.sessions.clone(),
            responses: inner.responses.clone(),
            recent: inner.recent.iter().cloned().collect(),
        }
    }

    /// Full re-fetch of both collections
    ///
    /// Read errors are logged and leave the prior state untouched.
    pub async fn refresh(&self, pool: &SqlitePool) {
        self.refresh_sessions(pool).await;
        self.refresh_responses(pool).await;
    }

    /// Full re-fetch of the sessions collection only
    pub async fn refresh_sessions(&self, pool: &SqlitePool) {
        match db::sessions::list_sessions(pool).await {
            Ok(sessions) => {
                let mut inner = self.inner.write().await;
                inner.sessions = sessions;
            }
            Err(e) => error!("Session refresh failed, keeping prior state: {}", e),
        }
    }

    /// Full re-fetch of the responses collection only
    pub async fn refresh_responses(&self, pool: &SqlitePool) {
        match db::responses::list_responses(pool, None).await {
            Ok(responses) => {
                let mut inner = self.inner.write().await;
                inner.responses = responses;
            }
            Err(e) => error!("Response refresh failed, keeping prior state: {}", e),
        }
    }

    /// Merge one new response into the model
    ///
    /// De-duplicates by id: applying the same record twice is a no-op, so the
    /// total response count never double-counts a replayed event.
    pub async fn apply_response(&self, response: Response) {
        let mut inner = self.inner.write().await;

        if inner.responses.iter().any(|r| r.id == response.id) {
            info!(id = %response.id, "Duplicate response delta ignored");
            return;
        }

        inner.recent.push_front(response.clone());
        inner.recent.truncate(RECENT_FEED_CAP);
        inner.responses.push(response);
    }

    /// Remove a deleted session from the model
    pub async fn remove_session(&self, session_id: Uuid) {
        let mut inner = self.inner.write().await;
        inner.sessions.retain(|s| s.id != session_id);
    }

    /// Upsert one session into the model
    pub async fn apply_session(&self, session: Session) {
        let mut inner = self.inner.write().await;
        match inner.sessions.iter_mut().find(|s| s.id == session.id) {
            Some(existing) => *existing = session,
            None => inner.sessions.insert(0, session),
        }
    }
}

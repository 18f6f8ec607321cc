//! Session store port - where live login sessions are tracked.

use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::session::{SessionEntry, select_evictions};

/// Key-value store of login sessions, one key per (user, session).
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Record a session holding its refresh token, expiring after `ttl`.
    async fn store(
        &self,
        user_id: Uuid,
        session_id: &str,
        refresh_token: &str,
        ttl: Duration,
    ) -> Result<(), SessionError>;

    /// Whether the session is still live.
    async fn exists(&self, user_id: Uuid, session_id: &str) -> Result<bool, SessionError>;

    /// The refresh token recorded for a live session.
    async fn get(&self, user_id: Uuid, session_id: &str) -> Result<Option<String>, SessionError>;

    /// Remove a single session. Removing an unknown session is not an error.
    async fn revoke(&self, user_id: Uuid, session_id: &str) -> Result<(), SessionError>;

    /// Remove several sessions of one user at once.
    async fn revoke_many(&self, user_id: Uuid, session_ids: &[String]) -> Result<(), SessionError>;

    /// All live sessions of a user with their remaining lifetime.
    async fn list(&self, user_id: Uuid) -> Result<Vec<SessionEntry>, SessionError>;

    /// Liveness check used by the health endpoint.
    async fn ping(&self) -> Result<(), SessionError>;
}

/// Session store errors.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Operation failed: {0}")]
    Operation(String),
}

/// Delete a user's oldest sessions so a new one fits under `max`.
///
/// Returns the ids that were evicted.
pub async fn enforce_session_cap(
    store: &dyn SessionStore,
    user_id: Uuid,
    max: usize,
) -> Result<Vec<String>, SessionError> {
    let sessions = store.list(user_id).await?;
    let evicted = select_evictions(&sessions, max);

    if !evicted.is_empty() {
        store.revoke_many(user_id, &evicted).await?;
    }

    Ok(evicted)
}

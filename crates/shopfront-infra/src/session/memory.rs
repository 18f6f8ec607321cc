//! In-memory session store - used when Redis is unavailable and in tests.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use shopfront_core::domain::session::{SessionEntry, session_id_from_key, session_key};
use shopfront_core::ports::{SessionError, SessionStore};

struct StoredSession {
    refresh_token: String,
    expires_at: Instant,
}

/// Session store backed by a `HashMap` behind an async `RwLock`.
///
/// Keys follow the same layout as the Redis store. Sessions are lost on
/// restart and are not shared between processes.
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, StoredSession>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn store(
        &self,
        user_id: Uuid,
        session_id: &str,
        refresh_token: &str,
        ttl: Duration,
    ) -> Result<(), SessionError> {
        let mut sessions = self.sessions.write().await;
        let now = Instant::now();
        sessions.retain(|_, s| s.expires_at > now);
        sessions.insert(
            session_key(user_id, session_id),
            StoredSession {
                refresh_token: refresh_token.to_string(),
                expires_at: now + ttl,
            },
        );
        Ok(())
    }

    async fn exists(&self, user_id: Uuid, session_id: &str) -> Result<bool, SessionError> {
        Ok(self.get(user_id, session_id).await?.is_some())
    }

    async fn get(&self, user_id: Uuid, session_id: &str) -> Result<Option<String>, SessionError> {
        let sessions = self.sessions.read().await;
        Ok(sessions
            .get(&session_key(user_id, session_id))
            .filter(|s| s.expires_at > Instant::now())
            .map(|s| s.refresh_token.clone()))
    }

    async fn revoke(&self, user_id: Uuid, session_id: &str) -> Result<(), SessionError> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(&session_key(user_id, session_id));
        Ok(())
    }

    async fn revoke_many(&self, user_id: Uuid, session_ids: &[String]) -> Result<(), SessionError> {
        let mut sessions = self.sessions.write().await;
        for session_id in session_ids {
            sessions.remove(&session_key(user_id, session_id));
        }
        Ok(())
    }

    async fn list(&self, user_id: Uuid) -> Result<Vec<SessionEntry>, SessionError> {
        let sessions = self.sessions.read().await;
        let now = Instant::now();

        Ok(sessions
            .iter()
            .filter(|(_, s)| s.expires_at > now)
            .filter_map(|(key, s)| {
                session_id_from_key(user_id, key).map(|session_id| SessionEntry {
                    session_id,
                    ttl_remaining: s.expires_at - now,
                })
            })
            .collect())
    }

    async fn ping(&self) -> Result<(), SessionError> {
        Ok(())
    }
}

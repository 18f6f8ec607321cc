//! Redis session store with a managed, auto-reconnecting connection.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use uuid::Uuid;

use shopfront_core::domain::session::{
    SessionEntry, session_id_from_key, session_key, session_pattern,
};
use shopfront_core::ports::{SessionError, SessionStore};

/// Redis connection configuration.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis URL (e.g., redis://localhost:6379)
    pub url: String,
    pub connect_timeout: Duration,
    /// Whether to fall back to the in-memory store if Redis is unavailable
    pub fallback_to_memory: bool,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            connect_timeout: Duration::from_secs(5),
            fallback_to_memory: true,
        }
    }
}

impl RedisConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            url: std::env::var("REDIS_URL").unwrap_or(defaults.url),
            connect_timeout: std::env::var("REDIS_CONNECT_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.connect_timeout),
            fallback_to_memory: std::env::var("REDIS_FALLBACK_TO_MEMORY")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.fallback_to_memory),
        }
    }
}

/// Session store keeping one Redis key per session, expiring with the
/// refresh token.
pub struct RedisSessionStore {
    conn: ConnectionManager,
}

impl RedisSessionStore {
    pub async fn connect(config: &RedisConfig) -> Result<Self, SessionError> {
        let client = Client::open(config.url.as_str())
            .map_err(|e| SessionError::Connection(e.to_string()))?;

        // Bounded so an unreachable server does not stall startup
        let conn = tokio::time::timeout(config.connect_timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| SessionError::Connection("Connection timed out".to_string()))?
            .map_err(|e| SessionError::Connection(e.to_string()))?;

        tracing::info!(url = %config.url, "Connected to Redis session store");

        Ok(Self { conn })
    }
}

fn op_err(e: redis::RedisError) -> SessionError {
    SessionError::Operation(e.to_string())
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn store(
        &self,
        user_id: Uuid,
        session_id: &str,
        refresh_token: &str,
        ttl: Duration,
    ) -> Result<(), SessionError> {
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(
            session_key(user_id, session_id),
            refresh_token,
            ttl.as_secs().max(1),
        )
        .await
        .map_err(op_err)
    }

    async fn exists(&self, user_id: Uuid, session_id: &str) -> Result<bool, SessionError> {
        let mut conn = self.conn.clone();
        conn.exists::<_, bool>(session_key(user_id, session_id))
            .await
            .map_err(op_err)
    }

    async fn get(&self, user_id: Uuid, session_id: &str) -> Result<Option<String>, SessionError> {
        let mut conn = self.conn.clone();
        conn.get::<_, Option<String>>(session_key(user_id, session_id))
            .await
            .map_err(op_err)
    }

    async fn revoke(&self, user_id: Uuid, session_id: &str) -> Result<(), SessionError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(session_key(user_id, session_id))
            .await
            .map_err(op_err)
    }

    async fn revoke_many(&self, user_id: Uuid, session_ids: &[String]) -> Result<(), SessionError> {
        if session_ids.is_empty() {
            return Ok(());
        }
        let keys: Vec<String> = session_ids
            .iter()
            .map(|id| session_key(user_id, id))
            .collect();

        let mut conn = self.conn.clone();
        conn.del::<_, ()>(keys).await.map_err(op_err)
    }

    async fn list(&self, user_id: Uuid) -> Result<Vec<SessionEntry>, SessionError> {
        let mut conn = self.conn.clone();
        let keys: Vec<String> = conn.keys(session_pattern(user_id)).await.map_err(op_err)?;
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let mut pipe = redis::pipe();
        for key in &keys {
            pipe.cmd("PTTL").arg(key);
        }
        let ttls: Vec<i64> = pipe.query_async(&mut conn).await.map_err(op_err)?;

        // PTTL is negative for keys that expired between KEYS and PTTL
        Ok(keys
            .into_iter()
            .zip(ttls)
            .filter(|(_, ttl)| *ttl > 0)
            .filter_map(|(key, ttl)| {
                session_id_from_key(user_id, &key).map(|session_id| SessionEntry {
                    session_id,
                    ttl_remaining: Duration::from_millis(ttl as u64),
                })
            })
            .collect())
    }

    async fn ping(&self) -> Result<(), SessionError> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| SessionError::Connection(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn get_test_store() -> Option<RedisSessionStore> {
        let config = RedisConfig {
            url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6389".to_string()),
            connect_timeout: Duration::from_secs(1),
            fallback_to_memory: false,
        };

        RedisSessionStore::connect(&config).await.ok()
    }

    #[tokio::test]
    async fn test_redis_session_lifecycle() {
        let Some(store) = get_test_store().await else {
            tracing::warn!("Redis not available, skipping test");
            return;
        };
        let user_id = Uuid::new_v4();

        store
            .store(user_id, "s1", "refresh", Duration::from_secs(60))
            .await
            .unwrap();
        assert!(store.exists(user_id, "s1").await.unwrap());
        assert_eq!(
            store.get(user_id, "s1").await.unwrap().as_deref(),
            Some("refresh")
        );

        let listed = store.list(user_id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].session_id, "s1");

        store.revoke(user_id, "s1").await.unwrap();
        assert!(!store.exists(user_id, "s1").await.unwrap());
    }

    #[tokio::test]
    async fn test_redis_revoke_many() {
        let Some(store) = get_test_store().await else {
            return;
        };
        let user_id = Uuid::new_v4();

        for id in ["a", "b", "c"] {
            store
                .store(user_id, id, "t", Duration::from_secs(60))
                .await
                .unwrap();
        }
        store
            .revoke_many(user_id, &["a".to_string(), "b".to_string()])
            .await
            .unwrap();

        let listed = store.list(user_id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].session_id, "c");
        store.revoke(user_id, "c").await.unwrap();
    }

    #[test]
    fn test_config_defaults() {
        let config = RedisConfig::default();
        assert!(config.fallback_to_memory);
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
    }
}

//! Login sessions: key layout and the per-user session cap.

use std::time::Duration;

use uuid::Uuid;

/// A user may hold at most this many live sessions.
pub const MAX_SESSIONS_PER_USER: usize = 5;

/// Key under which a session's refresh token is stored.
pub fn session_key(user_id: Uuid, session_id: &str) -> String {
    format!("user:{user_id}:session:{session_id}")
}

/// Glob pattern matching every session key of a user.
pub fn session_pattern(user_id: Uuid) -> String {
    format!("user:{user_id}:session:*")
}

/// Extract the session id from a key produced by [`session_key`].
pub fn session_id_from_key(user_id: Uuid, key: &str) -> Option<String> {
    let prefix = format!("user:{user_id}:session:");
    key.strip_prefix(&prefix)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

/// Fresh random session id: 32 lowercase hex characters.
pub fn new_session_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// A live session as seen by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEntry {
    pub session_id: String,
    /// Time left before the store expires the key.
    pub ttl_remaining: Duration,
}

/// Pick the sessions to delete so that one more can be added without
/// exceeding `max`.
///
/// Every session is written with the same TTL, so the one with the least
/// time remaining is the oldest.
pub fn select_evictions(entries: &[SessionEntry], max: usize) -> Vec<String> {
    if entries.len() < max {
        return Vec::new();
    }

    let excess = entries.len() + 1 - max;
    let mut oldest_first: Vec<&SessionEntry> = entries.iter().collect();
    oldest_first.sort_by(|a, b| {
        a.ttl_remaining
            .cmp(&b.ttl_remaining)
            .then_with(|| a.session_id.cmp(&b.session_id))
    });

    oldest_first
        .into_iter()
        .take(excess)
        .map(|entry| entry.session_id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, secs: u64) -> SessionEntry {
        SessionEntry {
            session_id: id.to_string(),
            ttl_remaining: Duration::from_secs(secs),
        }
    }

    #[test]
    fn test_no_eviction_below_cap() {
        let entries = vec![entry("a", 10), entry("b", 20)];
        assert!(select_evictions(&entries, MAX_SESSIONS_PER_USER).is_empty());
    }

    #[test]
    fn test_evicts_oldest_to_make_room() {
        let entries = vec![
            entry("newest", 500),
            entry("oldest", 100),
            entry("mid", 300),
            entry("older", 200),
            entry("newer", 400),
        ];
        assert_eq!(select_evictions(&entries, 5), vec!["oldest".to_string()]);
    }

    #[test]
    fn test_evicts_all_excess_when_over_cap() {
        let entries: Vec<SessionEntry> = (0..7).map(|i| entry(&format!("s{i}"), i * 10)).collect();
        assert_eq!(select_evictions(&entries, 5), vec!["s0", "s1", "s2"]);
    }

    #[test]
    fn test_key_round_trip() {
        let user_id = Uuid::new_v4();
        let session_id = new_session_id();
        assert_eq!(session_id.len(), 32);

        let key = session_key(user_id, &session_id);
        assert_eq!(session_id_from_key(user_id, &key), Some(session_id));
        assert_eq!(session_id_from_key(Uuid::new_v4(), &key), None);
        assert!(session_pattern(user_id).ends_with(":session:*"));
    }
}

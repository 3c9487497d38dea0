//! Session Memory
//!
//! Short-term conversational memory: a per-session recency list with TTL
//! expiry. Records are prepended, retrieval returns the most recent K
//! unexpired records, and expired entries are dropped lazily on access.
//! Querying a session that never stored anything is an empty result, not
//! an error.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

/// One remembered conversation turn
#[derive(Debug, Clone)]
pub struct MemoryRecord {
    /// `{session_id}:{counter}`
    pub id: String,
    pub text: String,
    pub metadata: Value,
    expires_at: Instant,
}

impl MemoryRecord {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug, Default)]
struct SessionMemory {
    counter: u64,
    records: VecDeque<MemoryRecord>,
}

/// TTL-based recency store, scoped by session id.
pub struct MemoryStore {
    default_ttl: Duration,
    sessions: RwLock<HashMap<String, SessionMemory>>,
}

impl MemoryStore {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            default_ttl,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Store a record under a session, returning its id.
    pub async fn put(&self, session_id: &str, text: &str, metadata: Value) -> String {
        self.put_with_ttl(session_id, text, metadata, self.default_ttl)
            .await
    }

    /// Store a record with an explicit TTL.
    pub async fn put_with_ttl(
        &self,
        session_id: &str,
        text: &str,
        metadata: Value,
        ttl: Duration,
    ) -> String {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let session = sessions.entry(session_id.to_string()).or_default();

        session.records.retain(|r| !r.is_expired(now));

        let id = format!("{session_id}:{}", session.counter);
        session.counter += 1;

        session.records.push_front(MemoryRecord {
            id: id.clone(),
            text: text.to_string(),
            metadata,
            expires_at: now + ttl,
        });

        debug!(session = session_id, id = %id, "stored memory record");
        id
    }

    /// Up to `k` unexpired records, most recent first. Empty for unknown
    /// sessions.
    pub async fn recent(&self, session_id: &str, k: usize) -> Vec<MemoryRecord> {
        let now = Instant::now();
        let sessions = self.sessions.read().await;

        sessions
            .get(session_id)
            .map(|session| {
                session
                    .records
                    .iter()
                    .filter(|r| !r.is_expired(now))
                    .take(k)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Drop everything a session remembered.
    pub async fn clear(&self, session_id: &str) {
        let mut sessions = self.sessions.write().await;
        sessions.remove(session_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TTL: Duration = Duration::from_secs(3600);

    #[tokio::test]
    async fn test_new_session_is_empty_not_an_error() {
        let store = MemoryStore::new(TTL);
        let records = store.recent("never-seen", 3).await;
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_recent_returns_most_recent_first() {
        let store = MemoryStore::new(TTL);
        store.put("s1", "first", json!({})).await;
        store.put("s1", "second", json!({})).await;
        store.put("s1", "third", json!({})).await;

        let records = store.recent("s1", 2).await;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].text, "third");
        assert_eq!(records[1].text, "second");
    }

    #[tokio::test]
    async fn test_ids_carry_session_and_counter() {
        let store = MemoryStore::new(TTL);
        let first = store.put("s1", "a", json!({})).await;
        let second = store.put("s1", "b", json!({})).await;

        assert_eq!(first, "s1:0");
        assert_eq!(second, "s1:1");
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let store = MemoryStore::new(TTL);
        store.put("s1", "mine", json!({})).await;

        assert!(store.recent("s2", 3).await.is_empty());
        assert_eq!(store.recent("s1", 3).await.len(), 1);
    }

    #[tokio::test]
    async fn test_expired_records_are_dropped() {
        let store = MemoryStore::new(TTL);
        store
            .put_with_ttl("s1", "gone", json!({}), Duration::ZERO)
            .await;
        store.put("s1", "kept", json!({})).await;

        let records = store.recent("s1", 5).await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].text, "kept");
    }

    #[tokio::test]
    async fn test_clear_removes_session() {
        let store = MemoryStore::new(TTL);
        store.put("s1", "something", json!({"intent": "weather"})).await;
        store.clear("s1").await;

        assert!(store.recent("s1", 3).await.is_empty());
    }
}

//! In-memory store for single-process deployments and tests

use crate::domain::clock::{Clock, SystemClock};
use crate::domain::repository::{ReplayStore, SessionStore};
use crate::domain::value_objects::SessionId;
use crate::error::GateResult;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
struct Expiring<T> {
    value: T,
    expires_at_ms: i64,
}

impl<T> Expiring<T> {
    fn new(value: T, now_ms: i64, ttl: Duration) -> Self {
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        Self {
            value,
            expires_at_ms: now_ms.saturating_add(ttl_ms),
        }
    }

    fn is_live(&self, now_ms: i64) -> bool {
        self.expires_at_ms > now_ms
    }
}

/// Session and replay state held in process memory
///
/// Nothing survives a restart. Lapsed entries are invisible to readers
/// and reclaimed by [`purge_expired`](Self::purge_expired).
pub struct InMemoryGateStore {
    sessions: DashMap<SessionId, HashMap<String, Expiring<Value>>>,
    replay: DashMap<String, Expiring<String>>,
    clock: Arc<dyn Clock>,
}

impl Default for InMemoryGateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryGateStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            sessions: DashMap::new(),
            replay: DashMap::new(),
            clock,
        }
    }

    /// Drop lapsed session values and replay records; returns how many
    /// entries were removed
    pub fn purge_expired(&self) -> usize {
        let now_ms = self.clock.now_ms();

        let before = self.replay.len();
        self.replay.retain(|_, record| record.is_live(now_ms));
        let mut removed = before.saturating_sub(self.replay.len());

        self.sessions.retain(|_, values| {
            let before = values.len();
            values.retain(|_, entry| entry.is_live(now_ms));
            removed += before - values.len();
            !values.is_empty()
        });

        if removed > 0 {
            tracing::debug!(removed, "Purged expired gate entries");
        }
        removed
    }

    /// Number of session entries across all sessions, lapsed or not
    pub fn session_entry_count(&self) -> usize {
        self.sessions.iter().map(|session| session.len()).sum()
    }

    pub fn replay_record_count(&self) -> usize {
        self.replay.len()
    }
}

impl SessionStore for InMemoryGateStore {
    async fn get(&self, session: &SessionId, key: &str) -> GateResult<Option<Value>> {
        let now_ms = self.clock.now_ms();
        Ok(self.sessions.get(session).and_then(|values| {
            values
                .get(key)
                .filter(|entry| entry.is_live(now_ms))
                .map(|entry| entry.value.clone())
        }))
    }

    async fn set(&self, session: &SessionId, key: &str, value: Value, ttl: Duration) -> GateResult<()> {
        let entry = Expiring::new(value, self.clock.now_ms(), ttl);
        self.sessions
            .entry(*session)
            .or_default()
            .insert(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, session: &SessionId, key: &str) -> GateResult<()> {
        if let Some(mut values) = self.sessions.get_mut(session) {
            values.remove(key);
        }
        Ok(())
    }
}

impl ReplayStore for InMemoryGateStore {
    async fn get(&self, key: &str) -> GateResult<Option<String>> {
        let now_ms = self.clock.now_ms();
        Ok(self
            .replay
            .get(key)
            .filter(|record| record.is_live(now_ms))
            .map(|record| record.value.clone()))
    }

    async fn insert_if_absent(&self, key: &str, value: &str, ttl: Duration) -> GateResult<bool> {
        let now_ms = self.clock.now_ms();
        let record = Expiring::new(value.to_string(), now_ms, ttl);

        // the entry guard holds the shard lock for check and insert
        let inserted = match self.replay.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_live(now_ms) {
                    false
                } else {
                    occupied.insert(record);
                    true
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(record);
                true
            }
        };
        Ok(inserted)
    }

    async fn remove(&self, key: &str) -> GateResult<()> {
        self.replay.remove(key);
        Ok(())
    }
}

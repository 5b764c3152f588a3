//! Repository Traits
//!
//! Interfaces for state persistence. Implementations are in the infra layer.

use crate::domain::value_objects::SessionId;
use crate::error::GateResult;
use serde_json::Value;
use std::time::Duration;

/// Per-session key/value storage
///
/// Must give read-your-writes consistency for a single session. Values
/// lapse after their TTL so abandoned sessions do not accumulate.
#[trait_variant::make(SessionStore: Send)]
pub trait LocalSessionStore {
    /// Live (unexpired) value for `key`
    async fn get(&self, session: &SessionId, key: &str) -> GateResult<Option<Value>>;

    /// Store `value`, replacing any previous value and its TTL
    async fn set(&self, session: &SessionId, key: &str, value: Value, ttl: Duration)
    -> GateResult<()>;

    /// Deleting a missing key is not an error
    async fn delete(&self, session: &SessionId, key: &str) -> GateResult<()>;
}

/// Key/value storage with automatic expiry, used for replay tracking
#[trait_variant::make(ReplayStore: Send)]
pub trait LocalReplayStore {
    /// Live (unexpired) value for `key`
    async fn get(&self, key: &str) -> GateResult<Option<String>>;

    /// Atomically store `value` unless a live record exists
    ///
    /// Returns `true` when this call created the record.
    async fn insert_if_absent(&self, key: &str, value: &str, ttl: Duration) -> GateResult<bool>;

    /// Removing a missing key is not an error
    async fn remove(&self, key: &str) -> GateResult<()>;
}

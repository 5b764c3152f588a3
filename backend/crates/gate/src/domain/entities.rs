//! Domain Entities

use crate::domain::value_objects::ChallengeId;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Signed puzzle handed to the client
///
/// Produced by a [`ChallengeProvider`](crate::domain::provider::ChallengeProvider);
/// the gate never inspects or mutates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    pub algorithm: String,
    /// Unique identifier of this puzzle
    pub challenge: String,
    /// Upper bound of the number the client searches for
    pub max_number: u64,
    /// Opaque salt; may embed expiry and configured parameters
    pub salt: String,
    pub signature: String,
    /// Epoch seconds after which solutions are refused
    pub expires_at: i64,
}

/// Parameters for minting a challenge
#[derive(Debug, Clone)]
pub struct ChallengeOptions<'a> {
    pub hmac_key: &'a str,
    pub max_number: u64,
    pub expires_at: DateTime<Utc>,
    /// Extra parameters to embed in the salt
    pub params: &'a BTreeMap<String, String>,
}

/// Decoded solution submitted by the client
///
/// Always a JSON object; an empty payload stands in for anything
/// that could not be decoded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolutionPayload(Map<String, Value>);

impl SolutionPayload {
    /// Decode a base64-encoded JSON object
    ///
    /// Returns `None` for invalid base64, invalid JSON, or JSON that is not an object.
    pub fn decode(encoded: &str) -> Option<Self> {
        let bytes = platform::crypto::from_base64(encoded.trim()).ok()?;
        match serde_json::from_slice::<Value>(&bytes).ok()? {
            Value::Object(fields) => Some(Self(fields)),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The `challenge` field, if it is a non-blank string
    pub fn challenge_id(&self) -> Option<ChallengeId> {
        self.0
            .get("challenge")
            .and_then(Value::as_str)
            .and_then(|id| ChallengeId::new(id))
    }
}

/// Provider verdict on a submitted solution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    pub ok: bool,
    pub detail: Option<String>,
}

impl Verification {
    pub fn passed() -> Self {
        Self {
            ok: true,
            detail: None,
        }
    }

    pub fn failed(detail: impl Into<String>) -> Self {
        Self {
            ok: false,
            detail: Some(detail.into()),
        }
    }
}

/// Time-boxed pass granted after a successful solve
///
/// Stored in the session as absolute epoch seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthorizationWindow {
    pub expires_at: i64,
}

impl AuthorizationWindow {
    pub fn new(expires_at: i64) -> Self {
        Self { expires_at }
    }

    /// Strictly in the future
    pub fn is_active(&self, now_secs: i64) -> bool {
        self.expires_at > now_secs
    }

    /// Parse the stored session value; non-numeric values grant nothing
    pub fn from_session_value(value: &Value) -> Option<Self> {
        let expires_at = value
            .as_i64()
            .or_else(|| value.as_f64().map(|secs| secs.floor() as i64))?;
        Some(Self { expires_at })
    }

    pub fn to_session_value(self) -> Value {
        Value::from(self.expires_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn encode(value: &Value) -> String {
        platform::crypto::to_base64(value.to_string().as_bytes())
    }

    #[test]
    fn test_decode_object_payload() {
        let payload = SolutionPayload::decode(&encode(&json!({"challenge": "1234abcd"}))).unwrap();
        assert_eq!(payload.challenge_id().unwrap().as_str(), "1234abcd");
    }

    #[test]
    fn test_decode_rejects_non_objects() {
        assert!(SolutionPayload::decode("%%%not-base64").is_none());
        assert!(SolutionPayload::decode(&encode(&json!(["challenge"]))).is_none());
        assert!(SolutionPayload::decode(&platform::crypto::to_base64(b"{oops")).is_none());
        assert!(SolutionPayload::decode("").is_none());
    }

    #[test]
    fn test_challenge_id_requires_string() {
        let payload = SolutionPayload::decode(&encode(&json!({"challenge": 42}))).unwrap();
        assert!(payload.challenge_id().is_none());
        assert!(SolutionPayload::default().challenge_id().is_none());
    }

    #[test]
    fn test_authorization_window_is_strict() {
        let window = AuthorizationWindow::new(100);
        assert!(window.is_active(99));
        assert!(!window.is_active(100));
        assert!(!window.is_active(101));
    }

    #[test]
    fn test_authorization_window_from_session_value() {
        assert_eq!(
            AuthorizationWindow::from_session_value(&json!(28801)),
            Some(AuthorizationWindow::new(28801))
        );
        assert_eq!(
            AuthorizationWindow::from_session_value(&json!(28801.7)),
            Some(AuthorizationWindow::new(28801))
        );
        assert_eq!(AuthorizationWindow::from_session_value(&json!(true)), None);
        assert_eq!(AuthorizationWindow::from_session_value(&json!("soon")), None);
    }
}

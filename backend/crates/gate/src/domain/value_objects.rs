//! Domain Value Objects
//!
//! Immutable value types for the gate domain.

use platform::crypto::{from_base64_url, hmac_sha256, to_base64_url, verify_hmac_sha256};
use std::fmt;
use uuid::Uuid;

const SESSION_TOKEN_LEN: usize = 16 + 32; // UUID + HMAC

/// Opaque identifier of a client session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Create a new random session id (UUID v4)
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Signed cookie token: base64url(id || HMAC-SHA256(key, id))
    pub fn to_token(&self, key: &[u8]) -> String {
        let id_bytes = self.0.as_bytes();
        let signature = hmac_sha256(key, id_bytes);
        let mut token = Vec::with_capacity(SESSION_TOKEN_LEN);
        token.extend_from_slice(id_bytes);
        token.extend_from_slice(&signature);
        to_base64_url(&token)
    }

    /// Verify a cookie token; forged or truncated tokens yield `None`
    pub fn from_token(token: &str, key: &[u8]) -> Option<Self> {
        let data = from_base64_url(token).ok()?;
        if data.len() != SESSION_TOKEN_LEN {
            return None;
        }
        let (id_bytes, signature) = data.split_at(16);
        if !verify_hmac_sha256(key, id_bytes, signature) {
            return None;
        }
        let id_bytes: [u8; 16] = id_bytes.try_into().ok()?;
        Some(Self(Uuid::from_bytes(id_bytes)))
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier embedded in an issued challenge
///
/// Doubles as the replay-store key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChallengeId(String);

impl ChallengeId {
    /// Blank identifiers are rejected
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            None
        } else {
            Some(Self(value))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChallengeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which rule let a request bypass the challenge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExemptionReason {
    PriorAuthorization,
    Path,
    Network,
    Header,
}

impl ExemptionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExemptionReason::PriorAuthorization => "prior_authorization",
            ExemptionReason::Path => "path",
            ExemptionReason::Network => "network",
            ExemptionReason::Header => "header",
        }
    }
}

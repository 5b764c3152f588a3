//! Session cookie resolution

use crate::application::config::GateConfig;
use crate::domain::value_objects::SessionId;
use axum::http::{HeaderMap, HeaderValue};

/// Session bound to the current request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestSession {
    pub id: SessionId,
    /// No valid cookie was presented; the response must set one
    pub minted: bool,
}

impl RequestSession {
    /// Session from a validly signed cookie, else a fresh identifier
    pub fn resolve(headers: &HeaderMap, config: &GateConfig) -> Self {
        match existing_session(headers, config) {
            Some(id) => Self { id, minted: false },
            None => Self {
                id: SessionId::generate(),
                minted: true,
            },
        }
    }

    /// `Set-Cookie` value for a freshly minted session
    pub fn set_cookie(&self, config: &GateConfig) -> Option<HeaderValue> {
        if self.minted {
            session_cookie(config, &self.id)
        } else {
            None
        }
    }
}

/// Session carried by a validly signed cookie, if any
pub fn existing_session(headers: &HeaderMap, config: &GateConfig) -> Option<SessionId> {
    let token = config.cookie.read(headers)?;
    let session = SessionId::from_token(&token, config.cookie_key());
    if session.is_none() {
        tracing::debug!("Ignoring session cookie with bad signature");
    }
    session
}

pub fn session_cookie(config: &GateConfig, session: &SessionId) -> Option<HeaderValue> {
    config
        .cookie
        .header_value(&session.to_token(config.cookie_key()))
}

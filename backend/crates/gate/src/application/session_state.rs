//! Session-backed gate state
//!
//! The authorization window and pending referrers are the only session
//! entries the gate reads or writes. Each entry lives as long as it can
//! matter: the window for the authorization lifetime, a referrer for the
//! challenge lifetime.

use crate::application::config::GateConfig;
use crate::domain::entities::AuthorizationWindow;
use crate::domain::repository::SessionStore;
use crate::domain::value_objects::SessionId;
use crate::error::{GateError, GateResult};
use serde_json::Value;
use std::sync::Arc;

pub struct SessionState<S>
where
    S: SessionStore,
{
    store: Arc<S>,
    config: Arc<GateConfig>,
}

impl<S> SessionState<S>
where
    S: SessionStore,
{
    pub fn new(store: Arc<S>, config: Arc<GateConfig>) -> Self {
        Self { store, config }
    }

    /// Stored authorization window, active or not
    pub async fn authorization(&self, session: &SessionId) -> GateResult<Option<AuthorizationWindow>> {
        let value = self.store.get(session, &self.config.session_key).await?;
        Ok(value.as_ref().and_then(AuthorizationWindow::from_session_value))
    }

    /// Grant (or extend) a pass lasting the configured authorization lifetime
    pub async fn authorize(&self, session: &SessionId, now_secs: i64) -> GateResult<AuthorizationWindow> {
        let expires_at = now_secs
            .checked_add(self.config.auth_ttl_secs())
            .ok_or_else(|| GateError::Internal("authorization expiry out of range".to_string()))?;
        let window = AuthorizationWindow::new(expires_at);
        self.store
            .set(
                session,
                &self.config.session_key,
                window.to_session_value(),
                self.config.auth_ttl,
            )
            .await?;
        Ok(window)
    }

    pub async fn stash_referrer(
        &self,
        session: &SessionId,
        destination: &str,
        referrer: &str,
    ) -> GateResult<()> {
        self.store
            .set(
                session,
                &self.config.referer_key(destination),
                Value::String(referrer.to_string()),
                self.config.challenge_ttl,
            )
            .await
    }

    /// Read without consuming
    pub async fn pending_referrer(
        &self,
        session: &SessionId,
        destination: &str,
    ) -> GateResult<Option<String>> {
        let value = self
            .store
            .get(session, &self.config.referer_key(destination))
            .await?;
        Ok(value.and_then(|v| v.as_str().map(String::from)))
    }

    pub async fn clear_referrer(&self, session: &SessionId, destination: &str) -> GateResult<()> {
        self.store
            .delete(session, &self.config.referer_key(destination))
            .await
    }
}

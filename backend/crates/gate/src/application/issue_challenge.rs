//! Issue Challenge Use Case
//!
//! Read-only: minting a challenge never touches the session or replay store.

use crate::application::config::GateConfig;
use crate::application::session_state::SessionState;
use crate::domain::clock::Clock;
use crate::domain::entities::{Challenge, ChallengeOptions};
use crate::domain::provider::ChallengeProvider;
use crate::domain::repository::SessionStore;
use crate::domain::value_objects::SessionId;
use crate::error::{GateError, GateResult};
use chrono::TimeDelta;
use std::sync::Arc;

/// Input DTO for issue challenge
#[derive(Debug, Clone)]
pub struct IssueChallengeInput {
    /// Raw `next` query parameter
    pub next: Option<String>,
    pub session: Option<SessionId>,
}

/// Output DTO for issue challenge
#[derive(Debug, Clone)]
pub struct IssueChallengeOutput {
    pub challenge: Challenge,
    pub next_url: String,
    /// Referrer stashed when the client was redirected here
    pub referrer: Option<String>,
}

pub struct IssueChallengeUseCase<S, P>
where
    S: SessionStore,
    P: ChallengeProvider,
{
    state: SessionState<S>,
    provider: Arc<P>,
    config: Arc<GateConfig>,
    clock: Arc<dyn Clock>,
}

impl<S, P> IssueChallengeUseCase<S, P>
where
    S: SessionStore,
    P: ChallengeProvider,
{
    pub fn new(
        store: Arc<S>,
        provider: Arc<P>,
        config: Arc<GateConfig>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            state: SessionState::new(store, config.clone()),
            provider,
            config,
            clock,
        }
    }

    pub async fn execute(&self, input: IssueChallengeInput) -> GateResult<IssueChallengeOutput> {
        let expires_at = TimeDelta::try_seconds(self.config.challenge_ttl_secs())
            .and_then(|lifetime| self.clock.now().checked_add_signed(lifetime))
            .ok_or_else(|| GateError::Internal("challenge expiry out of range".to_string()))?;
        let options = ChallengeOptions {
            hmac_key: &self.config.hmac_key,
            max_number: self.config.max_number,
            expires_at,
            params: &self.config.salt_params,
        };
        let challenge = self.provider.create_challenge(&options)?;

        let next_url = safe_next(input.next.as_deref());
        let referrer = match &input.session {
            Some(session) => self.state.pending_referrer(session, &next_url).await?,
            None => None,
        };

        tracing::info!(
            challenge = %challenge.challenge,
            max_number = challenge.max_number,
            expires_at = challenge.expires_at,
            "Issued challenge"
        );

        Ok(IssueChallengeOutput {
            challenge,
            next_url,
            referrer,
        })
    }
}

/// Only local absolute paths are followed; anything else becomes `/`
pub fn safe_next(next: Option<&str>) -> String {
    match next {
        Some(next)
            if next.starts_with('/')
                && !next.starts_with("//")
                && !next.contains('\\')
                && !next.chars().any(char::is_control) =>
        {
            next.to_string()
        }
        _ => "/".to_string(),
    }
}

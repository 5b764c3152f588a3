//! Submit Solution Use Case

use crate::application::config::GateConfig;
use crate::application::issue_challenge::safe_next;
use crate::application::replay_guard::ReplayGuard;
use crate::application::session_state::SessionState;
use crate::domain::clock::Clock;
use crate::domain::entities::SolutionPayload;
use crate::domain::provider::ChallengeProvider;
use crate::domain::repository::{ReplayStore, SessionStore};
use crate::domain::value_objects::{ChallengeId, SessionId};
use crate::error::{GateError, GateResult};
use std::sync::Arc;

/// Input DTO for submit solution
#[derive(Debug, Clone)]
pub struct SubmitSolutionInput {
    /// Base64-encoded JSON solution, as posted
    pub encoded_payload: Option<String>,
    pub next: Option<String>,
    pub session: SessionId,
}

/// Output DTO for submit solution
#[derive(Debug, Clone)]
pub struct SubmitSolutionOutput {
    pub challenge_id: ChallengeId,
    /// Epoch seconds
    pub authorized_until: i64,
    pub next_url: String,
}

/// Submit Solution Use Case
///
/// Accepts only when the payload decodes to an object, the provider
/// verifies it, and its identifier has not been redeemed. Rejections
/// leave every store untouched; a store failure after redemption
/// releases the identifier again.
pub struct SubmitSolutionUseCase<R, P>
where
    R: SessionStore + ReplayStore,
    P: ChallengeProvider,
{
    state: SessionState<R>,
    replay: ReplayGuard<R>,
    provider: Arc<P>,
    config: Arc<GateConfig>,
    clock: Arc<dyn Clock>,
}

impl<R, P> SubmitSolutionUseCase<R, P>
where
    R: SessionStore + ReplayStore,
    P: ChallengeProvider,
{
    pub fn new(
        store: Arc<R>,
        provider: Arc<P>,
        config: Arc<GateConfig>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            state: SessionState::new(store.clone(), config.clone()),
            replay: ReplayGuard::new(store, config.challenge_ttl),
            provider,
            config,
            clock,
        }
    }

    pub async fn execute(&self, input: SubmitSolutionInput) -> GateResult<SubmitSolutionOutput> {
        let decoded = input
            .encoded_payload
            .as_deref()
            .and_then(SolutionPayload::decode);
        let payload = decoded.clone().unwrap_or_default();

        // The provider sees every submission, even an empty one.
        let verification = self
            .provider
            .verify_solution(&payload, &self.config.hmac_key, true);

        if decoded.is_none() {
            return Err(GateError::MalformedInput);
        }
        if !verification.ok {
            return Err(GateError::VerificationFailed(verification.detail));
        }
        let challenge_id = payload.challenge_id().ok_or(GateError::MalformedInput)?;

        if !self.replay.redeem(&challenge_id).await? {
            return Err(GateError::ReplayDetected);
        }

        // Redeemed but not authorized must not burn the challenge.
        let window = match self.state.authorize(&input.session, self.clock.now_secs()).await {
            Ok(window) => window,
            Err(e) => {
                if let Err(release_err) = self.replay.release(&challenge_id).await {
                    tracing::error!(
                        challenge_id = %challenge_id,
                        error = %release_err,
                        "Could not release challenge after failed authorization"
                    );
                }
                return Err(e);
            }
        };

        let next_url = safe_next(input.next.as_deref());
        if let Err(e) = self.state.clear_referrer(&input.session, &next_url).await {
            tracing::warn!(error = %e, "Could not clear stashed referrer");
        }

        tracing::info!(
            challenge_id = %challenge_id,
            authorized_until = window.expires_at,
            "Challenge solved"
        );

        Ok(SubmitSolutionOutput {
            challenge_id,
            authorized_until: window.expires_at,
            next_url,
        })
    }
}

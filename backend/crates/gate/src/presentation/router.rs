//! Gate Router

use crate::domain::provider::ChallengeProvider;
use crate::domain::repository::{ReplayStore, SessionStore};
use crate::presentation::handlers::{self, GateState};
use axum::{
    Router,
    routing::{get, post},
};

/// Create the gate router: challenge page and solution submission
///
/// The challenge path answers GET with a fresh challenge and accepts
/// submissions by POST; the submit path accepts POST only.
pub fn gate_router<R, P>(state: GateState<R, P>) -> Router
where
    R: SessionStore + ReplayStore + Sync + 'static,
    P: ChallengeProvider,
{
    let config = state.config.clone();

    let mut router = Router::new().route(
        &config.challenge_path,
        get(handlers::issue_challenge::<R, P>).post(handlers::submit_solution::<R, P>),
    );

    if config.submit_path != config.challenge_path {
        router = router.route(
            &config.submit_path,
            post(handlers::submit_solution::<R, P>),
        );
    }

    router.with_state(state)
}

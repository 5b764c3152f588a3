//! Gate Middleware
//!
//! Every request to a protected router passes through
//! [`require_challenge`]; anything not exempt is redirected to the
//! challenge page.

use crate::application::check_access::{AccessDecision, AccessRequest, CheckAccessUseCase};
use crate::domain::provider::ChallengeProvider;
use crate::domain::repository::{ReplayStore, SessionStore};
use crate::presentation::handlers::{GateState, with_session_cookie};
use crate::presentation::session::{existing_session, session_cookie};
use axum::Router;
use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::{Request, StatusCode, header};
use axum::middleware::{Next, from_fn_with_state};
use axum::response::{IntoResponse, Response};
use platform::client::client_ip_literal;
use std::net::SocketAddr;

/// Middleware that sends unauthorized clients to the challenge page
///
/// Store failures fail closed: the request is answered with an error
/// instead of reaching the protected handler.
pub async fn require_challenge<R, P>(
    State(state): State<GateState<R, P>>,
    req: Request<Body>,
    next: Next,
) -> Response
where
    R: SessionStore + ReplayStore + Sync + 'static,
    P: ChallengeProvider,
{
    let headers = req.headers();

    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip());
    let client_ip = client_ip_literal(headers, peer);

    let referrer = headers
        .get(header::REFERER)
        .and_then(|value| value.to_str().ok());

    let session = existing_session(headers, &state.config);

    let use_case = CheckAccessUseCase::new(
        state.store.clone(),
        state.config.clone(),
        state.clock.clone(),
    );

    let request = AccessRequest {
        path: req.uri().path(),
        query: req.uri().query(),
        client_ip: client_ip.as_deref(),
        headers,
        referrer,
        session,
    };

    match use_case.execute(request).await {
        Ok(AccessDecision::Allow(_)) => next.run(req).await,
        Ok(AccessDecision::Challenge {
            location,
            new_session,
        }) => {
            let cookie = new_session.and_then(|id| session_cookie(&state.config, &id));
            with_session_cookie(
                (StatusCode::FOUND, [(header::LOCATION, location)]).into_response(),
                cookie,
            )
        }
        // logged by the error response
        Err(e) => e.into_response(),
    }
}

/// Wrap `router` so every route requires a solved challenge
pub fn protect<R, P>(router: Router, state: GateState<R, P>) -> Router
where
    R: SessionStore + ReplayStore + Sync + 'static,
    P: ChallengeProvider,
{
    router.layer(from_fn_with_state(state, require_challenge::<R, P>))
}

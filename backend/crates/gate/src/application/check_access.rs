//! Check Access Use Case
//!
//! The interception decision: let the request through, or send the
//! client to the challenge page.

use crate::application::config::GateConfig;
use crate::application::session_state::SessionState;
use crate::domain::clock::Clock;
use crate::domain::repository::SessionStore;
use crate::domain::services::{ExemptionEvaluator, RequestFacts};
use crate::domain::value_objects::{ExemptionReason, SessionId};
use crate::error::GateResult;
use axum::http::HeaderMap;
use std::sync::Arc;

/// Input DTO for the interception check
#[derive(Debug, Clone, Copy)]
pub struct AccessRequest<'a> {
    pub path: &'a str,
    pub query: Option<&'a str>,
    pub client_ip: Option<&'a str>,
    pub headers: &'a HeaderMap,
    pub referrer: Option<&'a str>,
    /// Session from a valid cookie, if any
    pub session: Option<SessionId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    Allow(ExemptionReason),
    Challenge {
        /// Challenge path with the percent-encoded `next` destination
        location: String,
        /// Session minted to hold the stashed referrer
        new_session: Option<SessionId>,
    },
}

pub struct CheckAccessUseCase<S>
where
    S: SessionStore,
{
    state: SessionState<S>,
    config: Arc<GateConfig>,
    clock: Arc<dyn Clock>,
}

impl<S> CheckAccessUseCase<S>
where
    S: SessionStore,
{
    pub fn new(store: Arc<S>, config: Arc<GateConfig>, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: SessionState::new(store, config.clone()),
            config,
            clock,
        }
    }

    pub async fn execute(&self, request: AccessRequest<'_>) -> GateResult<AccessDecision> {
        let authorization = match &request.session {
            Some(session) => self.state.authorization(session).await?,
            None => None,
        };

        let facts = RequestFacts {
            path: request.path,
            client_ip: request.client_ip,
            headers: request.headers,
        };
        let evaluator = ExemptionEvaluator::new(&self.config.exemptions);
        if let Some(reason) = evaluator.evaluate(&facts, authorization, self.clock.now_secs()) {
            tracing::debug!(path = %request.path, reason = reason.as_str(), "Request exempt");
            return Ok(AccessDecision::Allow(reason));
        }

        let destination = full_path(request.path, request.query);
        let mut new_session = None;

        if let Some(referrer) = request.referrer.filter(|r| !r.is_empty()) {
            let session = match request.session {
                Some(session) => session,
                None => *new_session.insert(SessionId::generate()),
            };
            self.state
                .stash_referrer(&session, &destination, referrer)
                .await?;
        }

        tracing::debug!(path = %destination, "Redirecting to challenge");

        Ok(AccessDecision::Challenge {
            location: challenge_location(&self.config.challenge_path, &destination),
            new_session,
        })
    }
}

/// Path plus query string, as the client requested it
pub fn full_path(path: &str, query: Option<&str>) -> String {
    match query {
        Some(query) if !query.is_empty() => format!("{path}?{query}"),
        _ => path.to_string(),
    }
}

/// `<challenge_path>?next=<percent-encoded destination>`
pub fn challenge_location(challenge_path: &str, destination: &str) -> String {
    format!(
        "{}?next={}",
        challenge_path,
        urlencoding::encode(destination)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_challenge_location_encodes_query() {
        let destination = full_path("/protected", Some("search=stuff"));
        assert_eq!(
            challenge_location("/challenge", &destination),
            "/challenge?next=%2Fprotected%3Fsearch%3Dstuff"
        );
    }

    #[test]
    fn test_full_path_without_query() {
        assert_eq!(full_path("/protected", None), "/protected");
        assert_eq!(full_path("/protected", Some("")), "/protected");
    }
}

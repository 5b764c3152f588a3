//! Domain Services
//!
//! The exemption evaluator: decides whether a request may skip the challenge.

use crate::domain::entities::AuthorizationWindow;
use crate::domain::header::HeaderMatcher;
use crate::domain::network::NetworkMatcher;
use crate::domain::value_objects::ExemptionReason;
use axum::http::HeaderMap;
use std::collections::HashSet;

/// Exemption rules, compiled once at startup and read-only afterwards
#[derive(Debug, Clone, Default)]
pub struct ExemptionConfig {
    /// Exact-match paths, including the gate's own endpoints
    pub paths: HashSet<String>,
    pub networks: NetworkMatcher,
    pub headers: HeaderMatcher,
}

/// What the evaluator needs to know about a request
#[derive(Debug, Clone, Copy)]
pub struct RequestFacts<'a> {
    pub path: &'a str,
    /// Result of the client-IP extraction policy
    pub client_ip: Option<&'a str>,
    pub headers: &'a HeaderMap,
}

/// Applies the exemption checks cheapest first
#[derive(Debug, Clone, Copy)]
pub struct ExemptionEvaluator<'a> {
    config: &'a ExemptionConfig,
}

impl<'a> ExemptionEvaluator<'a> {
    pub fn new(config: &'a ExemptionConfig) -> Self {
        Self { config }
    }

    /// First matching rule, in order: prior authorization, path, network, header
    pub fn evaluate(
        &self,
        facts: &RequestFacts<'_>,
        authorization: Option<AuthorizationWindow>,
        now_secs: i64,
    ) -> Option<ExemptionReason> {
        if authorization.is_some_and(|window| window.is_active(now_secs)) {
            return Some(ExemptionReason::PriorAuthorization);
        }
        if self.config.paths.contains(facts.path) {
            return Some(ExemptionReason::Path);
        }
        if facts
            .client_ip
            .is_some_and(|ip| self.config.networks.contains_literal(ip))
        {
            return Some(ExemptionReason::Network);
        }
        if self.config.headers.matches(facts.headers) {
            return Some(ExemptionReason::Header);
        }
        None
    }

    pub fn is_exempt(
        &self,
        facts: &RequestFacts<'_>,
        authorization: Option<AuthorizationWindow>,
        now_secs: i64,
    ) -> bool {
        self.evaluate(facts, authorization, now_secs).is_some()
    }
}

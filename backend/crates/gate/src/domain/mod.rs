//! Domain Layer - Gate decision logic
//!
//! This layer contains:
//! - Exemption matchers (networks, headers) and the exemption evaluator
//! - Entities (Challenge, SolutionPayload, AuthorizationWindow)
//! - Value objects (SessionId, ChallengeId, ExemptionReason)
//! - Ports for stores, the challenge provider and the clock

pub mod clock;
pub mod entities;
pub mod header;
pub mod network;
pub mod provider;
pub mod repository;
pub mod services;
pub mod value_objects;

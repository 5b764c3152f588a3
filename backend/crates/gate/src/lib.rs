//! Proof-of-work gate
//!
//! Clean Architecture structure:
//! - `domain/` - Exemption matchers, entities, store and provider ports
//! - `application/` - Configuration and the gate use cases
//! - `infra/` - In-memory and PostgreSQL store implementations
//! - `presentation/` - HTTP handlers, router and the interception middleware
//!
//! ## Security Model
//! - Unauthenticated clients are redirected to the challenge page unless exempt
//! - Puzzle generation and verification belong to a [`ChallengeProvider`]
//! - A challenge identifier is redeemed at most once (atomic insert-if-absent)
//! - A successful solve grants a time-boxed pass stored in the session
//! - Unparseable client addresses never grant an exemption

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::{GateConfig, GateSettings};
pub use domain::provider::ChallengeProvider;
pub use error::{GateError, GateResult};
pub use infra::memory::InMemoryGateStore;
pub use infra::postgres::PgGateStore;
pub use presentation::handlers::GateState;
pub use presentation::middleware::{protect, require_challenge};
pub use presentation::router::gate_router;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

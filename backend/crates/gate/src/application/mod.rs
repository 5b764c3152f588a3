//! Application Layer - Use Cases
//!
//! Orchestrates the domain rules against the session and replay stores.

pub mod check_access;
pub mod config;
pub mod issue_challenge;
pub mod replay_guard;
pub mod session_state;
pub mod submit_solution;

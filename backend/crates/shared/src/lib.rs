//! Shared Kernel - Domain-crossing minimal core
//!
//! This crate holds the error vocabulary every gate crate agrees on:
//! - [`ErrorKind`](error::kind::ErrorKind) classification mapped to HTTP status codes
//! - [`AppError`](error::app_error::AppError) and the `AppResult<T>` alias
//! - Conversions from library errors (serde_json, sqlx) and into axum responses
//!
//! **Design Principle**: Only include things that are "hard to change"
//! and have consistent meaning across all crates.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}

//! Gate Error Types
//!
//! Gate-specific error variants that integrate with the unified
//! `kernel::error::AppError` system.

use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// Gate-specific result type alias
pub type GateResult<T> = Result<T, GateError>;

/// Message used when a rejection is rendered without configuration at hand
pub const GENERIC_FAILURE: &str = "Challenge failed or no longer valid.";

/// Gate-specific error variants
#[derive(Debug, Error)]
pub enum GateError {
    /// Invalid or missing setting; fatal at startup
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Submission payload was absent, undecodable or not a JSON object
    #[error("Malformed solution payload")]
    MalformedInput,

    /// Provider rejected the solution (wrong, expired, bad signature)
    #[error("Challenge verification failed: {}", .0.as_deref().unwrap_or("invalid solution"))]
    VerificationFailed(Option<String>),

    /// Challenge identifier was already redeemed
    #[error("Challenge already redeemed")]
    ReplayDetected,

    /// Session or replay store failure
    #[error("Store error: {0}")]
    Store(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A malformed exempt-IP entry; skipped at build time
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Could not exclude supplied ip address: {entry}")]
pub struct InvalidIpLiteral {
    pub entry: String,
}

impl GateError {
    /// Whether this is a client-side rejection of a submission
    ///
    /// All rejections share one user-visible failure message.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            GateError::MalformedInput | GateError::VerificationFailed(_) | GateError::ReplayDetected
        )
    }

    /// Short tag for logs
    pub fn reason(&self) -> &'static str {
        match self {
            GateError::Configuration(_) => "configuration",
            GateError::MalformedInput => "malformed_input",
            GateError::VerificationFailed(_) => "verification_failed",
            GateError::ReplayDetected => "replay_detected",
            GateError::Store(_) => "store",
            GateError::Database(_) => "database",
            GateError::Internal(_) => "internal",
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            GateError::MalformedInput
            | GateError::VerificationFailed(_)
            | GateError::ReplayDetected => ErrorKind::BadRequest,
            GateError::Store(_) => ErrorKind::ServiceUnavailable,
            GateError::Configuration(_) | GateError::Database(_) | GateError::Internal(_) => {
                ErrorKind::InternalServerError
            }
        }
    }

    fn log(&self) {
        match self {
            GateError::Database(e) => {
                tracing::error!(error = %e, "Gate database error");
            }
            GateError::Store(msg) => {
                tracing::error!(message = %msg, "Gate store error");
            }
            GateError::Internal(msg) | GateError::Configuration(msg) => {
                tracing::error!(message = %msg, "Gate internal error");
            }
            _ => {
                tracing::warn!(reason = self.reason(), "Challenge submission rejected");
            }
        }
    }
}

impl From<GateError> for AppError {
    fn from(err: GateError) -> Self {
        let kind = err.kind();
        // store and database details stay in the logs
        let message = if err.is_rejection() {
            GENERIC_FAILURE
        } else {
            kind.as_str()
        };
        AppError::new(kind, message).with_source(err)
    }
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        self.log();
        AppError::from(self).into_response()
    }
}

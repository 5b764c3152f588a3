//! Presentation Layer
//!
//! HTTP handlers, DTOs and the interception middleware.

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod session;

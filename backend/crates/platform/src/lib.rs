//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Client IP extraction (forwarded header first, then the peer address)
//! - Session cookie reading and writing
//! - Cryptographic utilities (HMAC-SHA256, Base64)

pub mod client;
pub mod cookie;
pub mod crypto;

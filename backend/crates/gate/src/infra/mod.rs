//! Infrastructure Layer - Store implementations

pub mod memory;
pub mod postgres;

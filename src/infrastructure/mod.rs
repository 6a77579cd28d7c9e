//! Infrastructure layer - Technical implementations
//!
//! This layer contains:
//! - The HTTP adapter onto the call platform
//! - The speech synthesis asset store

pub mod platform;
pub mod speech;

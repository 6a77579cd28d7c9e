//! Klaxon - An outbound voice notification service built with Rust
//!
//! This is a Domain-Driven Design (DDD) implementation of a call
//! notification engine: it synthesizes a spoken greeting, places a call
//! through a communications platform, and steers the call from webhook
//! progress reports until the callee confirms.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interface;

// Re-export commonly used types
pub use domain::shared::error::DomainError;
pub use domain::shared::result::Result;

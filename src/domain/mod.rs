//! Domain layer - Core business logic and rules
//!
//! This layer contains:
//! - Aggregates: Consistency boundaries
//! - Entities: Objects with identity
//! - Value Objects: Immutable objects without identity
//! - Domain Services: Operations that don't fit in a single aggregate
//! - Ports: Interfaces onto the platform and the asset store
//! - Progress Events: Normalized platform reports driving the engine

pub mod call;
pub mod media;
pub mod shared;

// Re-export commonly used types
pub use shared::{DomainError, Result};

//! Application layer - Use cases and application services
//!
//! This layer orchestrates domain objects to fulfill use cases.
//! It's responsible for:
//! - Driving a session's state machine from progress events
//! - Coordinating the platform and asset-store ports
//! - Supervising background work spawned per call

pub mod engine;
pub mod supervisor;

pub use engine::{CallLifecycleEngine, EngineTimings, Outcome, PlacedCall, PlacementRequest};
pub use supervisor::spawn_supervised;

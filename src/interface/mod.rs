//! Interface layer - External interfaces (REST API, webhook)
//!
//! This layer handles:
//! - REST API endpoints
//! - The platform notification webhook
//! - Static media hosting
//! - Request/response formatting

pub mod api;

//! Call entities

use serde::{Deserialize, Serialize};

/// Resolved callee identity as presented in responses and summaries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalleeInfo {
    /// Human-readable name; the dialed number when no directory entry exists
    display_name: String,
}

impl CalleeInfo {
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
        }
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }
}

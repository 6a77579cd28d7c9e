//! Shared value objects used across multiple bounded contexts

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Call identifier assigned by the remote platform when a call is placed
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallId(String);

impl CallId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Audio asset identifier; names a stored prompt clip
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetId(String);

impl AssetId {
    /// Fresh identifier for a one-off synthesized prompt
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Well-known identifier for a shared utility clip
    pub fn named(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Tenant identifier scoping directory lookups and platform tokens
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenantId(String);

impl TenantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_id_display() {
        let id = CallId::new("ab12-cd34");
        assert_eq!(id.to_string(), "ab12-cd34");
        assert_eq!(id.as_str(), "ab12-cd34");
    }

    #[test]
    fn test_asset_id_generate_is_unique() {
        let a = AssetId::generate();
        let b = AssetId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_asset_id_named() {
        let clip = AssetId::named("tone-menu");
        assert_eq!(clip.as_str(), "tone-menu");
        assert_eq!(clip, AssetId::named("tone-menu"));
    }

    #[test]
    fn test_serde_as_plain_string() {
        let id = CallId::new("call-7");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"call-7\"");

        let back: CallId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}

//! Prompt asset store interface

use crate::domain::shared::result::Result;
use crate::domain::shared::value_objects::AssetId;

/// Store of synthesized audio assets
///
/// Adapters own synthesis, storage, and the public URL scheme the remote
/// platform fetches media from.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait AssetStore: Send + Sync {
    /// Synthesize `text` into a fresh audio asset
    async fn synthesize(&self, text: &str) -> Result<AssetId>;

    /// Synthesize `text` into a fixed asset id, replacing previous content
    async fn synthesize_as(&self, asset: &AssetId, text: &str) -> Result<()>;

    /// Delete a stored asset
    async fn delete(&self, asset: &AssetId) -> Result<()>;

    /// Public URL the platform can fetch the asset from
    fn media_url(&self, asset: &AssetId) -> String;
}

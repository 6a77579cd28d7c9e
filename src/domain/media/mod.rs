//! Media bounded context - synthesized prompt assets

pub mod store;

pub use store::AssetStore;

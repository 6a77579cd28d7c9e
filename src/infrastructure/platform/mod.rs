//! Call platform adapter

pub mod client;
pub mod wire;

pub use client::HttpCallPlatform;

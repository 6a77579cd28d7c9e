//! Speech synthesis adapter

pub mod synthesizer;

pub use synthesizer::SpeechAssetStore;

//! Speech synthesis asset store
//!
//! Renders notification text into WAV clips under the media directory.
//! The remote platform fetches clips back over the public `/media` route,
//! so URLs are built against the service's externally reachable base.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use reqwest::Client;
use tracing::debug;

use crate::config::SpeechConfig;
use crate::domain::media::store::AssetStore;
use crate::domain::shared::error::DomainError;
use crate::domain::shared::result::Result;
use crate::domain::shared::value_objects::AssetId;

const OUTPUT_FORMAT: &str = "riff-16khz-16bit-mono-pcm";

pub struct SpeechAssetStore {
    client: Client,
    config: SpeechConfig,
    public_base_url: String,
}

impl SpeechAssetStore {
    pub fn new(config: SpeechConfig, public_base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            config,
            public_base_url: public_base_url.into(),
        }
    }

    fn asset_path(&self, asset: &AssetId) -> PathBuf {
        Path::new(&self.config.media_dir).join(format!("{}.wav", asset))
    }

    /// Short-lived bearer token gating the synthesis endpoint
    async fn fetch_token(&self) -> Result<String> {
        let response = self
            .client
            .post(&self.config.token_endpoint)
            .header("x-subscription-key", &self.config.subscription_key)
            .send()
            .await
            .map_err(|e| DomainError::SynthesisFailure(format!("token request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DomainError::SynthesisFailure(format!(
                "token endpoint returned {}: {}",
                status, body
            )));
        }

        response
            .text()
            .await
            .map_err(|e| DomainError::SynthesisFailure(format!("token response: {}", e)))
    }
}

#[async_trait::async_trait]
impl AssetStore for SpeechAssetStore {
    async fn synthesize(&self, text: &str) -> Result<AssetId> {
        let asset = AssetId::generate();
        self.synthesize_as(&asset, text).await?;
        Ok(asset)
    }

    async fn synthesize_as(&self, asset: &AssetId, text: &str) -> Result<()> {
        let token = self.fetch_token().await?;
        let ssml = build_ssml(
            text,
            &self.config.voice,
            &self.config.language,
            self.config.rate_percent,
            self.config.sentence_silence_ms,
        );

        let response = self
            .client
            .post(&self.config.synthesis_endpoint)
            .bearer_auth(token)
            .header("content-type", "application/ssml+xml")
            .header("x-output-format", OUTPUT_FORMAT)
            .body(ssml)
            .send()
            .await
            .map_err(|e| DomainError::SynthesisFailure(format!("synthesis request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DomainError::SynthesisFailure(format!(
                "synthesis endpoint returned {}: {}",
                status, body
            )));
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| DomainError::SynthesisFailure(format!("audio download: {}", e)))?;

        tokio::fs::create_dir_all(&self.config.media_dir)
            .await
            .map_err(|e| DomainError::SynthesisFailure(format!("media dir: {}", e)))?;

        let path = self.asset_path(asset);
        tokio::fs::write(&path, &audio).await.map_err(|e| {
            DomainError::SynthesisFailure(format!("write {}: {}", path.display(), e))
        })?;

        debug!(asset = %asset, bytes = audio.len(), "stored synthesized clip");
        Ok(())
    }

    async fn delete(&self, asset: &AssetId) -> Result<()> {
        let path = self.asset_path(asset);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            // Already gone counts as deleted
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DomainError::AssetCleanupFailure(format!(
                "remove {}: {}",
                path.display(),
                e
            ))),
        }
    }

    fn media_url(&self, asset: &AssetId) -> String {
        format!("{}/media/{}.wav", self.public_base_url, asset)
    }
}

/// Wrap notification text in the SSML the synthesis endpoint expects.
///
/// The rate tweak is relative, so the sign is always written out. A
/// trailing break keeps the platform from clipping the last word when it
/// stops playback.
fn build_ssml(
    text: &str,
    voice: &str,
    language: &str,
    rate_percent: i32,
    sentence_silence_ms: u32,
) -> String {
    format!(
        r#"<speak version="1.0" xml:lang="{}"><voice name="{}"><prosody rate="{:+}%">{}</prosody><break time="{}ms"/></voice></speak>"#,
        language,
        voice,
        rate_percent,
        escape_xml(text),
        sentence_silence_ms
    )
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

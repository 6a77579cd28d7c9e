//! Configuration management

use crate::domain::shared::error::DomainError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub api: ApiConfig,
    pub engine: EngineConfig,
    pub platform: PlatformConfig,
    pub speech: SpeechConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origin the platform fetches media from, no trailing slash
    pub public_base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Require x-api-key on management endpoints; the webhook is never gated
    pub require_key: bool,
    pub key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Ring seconds at or beyond which a pickup counts as voicemail
    pub voicemail_threshold_secs: u64,
    /// Warning band width below the threshold
    pub early_warning_margin_secs: u64,
    /// Seconds to wait before playing into voicemail
    pub voicemail_tuning_delay_secs: u64,
    /// Seconds the tone menu stays open without a selection
    pub tone_wait_budget_secs: u64,
    /// Settle seconds before menu audio
    pub tone_menu_settle_secs: u64,
    /// How long ended call ids stay recognizable to late events
    pub tombstone_ttl_secs: u64,
    pub tone_menu_enabled: bool,
    /// Name of the shared menu clip under the media directory
    pub tone_menu_asset: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// REST base of the communications platform
    pub api_base: String,
    /// Token endpoint template; `{tenant}` is substituted per request
    pub auth_base: String,
    pub client_id: String,
    pub client_secret: String,
    pub token_scope: String,
    /// Home tenant whose token authorizes commands on live calls
    pub service_tenant: String,
    /// Application identity presented as the caller on PSTN legs
    pub pstn_caller_id: String,
    /// Display name shown to the callee
    pub display_name: String,
    /// Publicly reachable URL the platform posts progress events to
    pub callback_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    pub synthesis_endpoint: String,
    pub token_endpoint: String,
    pub subscription_key: String,
    pub voice: String,
    pub language: String,
    /// Speaking rate tweak in percent; negative slows down
    pub rate_percent: i32,
    /// Trailing silence appended to each synthesized clip
    pub sentence_silence_ms: u32,
    /// Directory synthesized clips are written to
    pub media_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                public_base_url: "http://localhost:8080".to_string(),
            },
            api: ApiConfig {
                require_key: false,
                key: String::new(),
            },
            engine: EngineConfig {
                voicemail_threshold_secs: 25,
                early_warning_margin_secs: 8,
                voicemail_tuning_delay_secs: 9,
                tone_wait_budget_secs: 10,
                tone_menu_settle_secs: 3,
                tombstone_ttl_secs: 30,
                tone_menu_enabled: true,
                tone_menu_asset: "tone-menu".to_string(),
            },
            platform: PlatformConfig {
                api_base: "https://calls.example.com/v1".to_string(),
                auth_base: "https://login.example.com/{tenant}/oauth2/token".to_string(),
                client_id: String::new(),
                client_secret: String::new(),
                token_scope: "https://calls.example.com/.default".to_string(),
                service_tenant: "common".to_string(),
                pstn_caller_id: String::new(),
                display_name: "Klaxon Notifier".to_string(),
                callback_url: "http://localhost:8080/api/notifications".to_string(),
            },
            speech: SpeechConfig {
                synthesis_endpoint: "https://speech.example.com/tts/v1/synthesize".to_string(),
                token_endpoint: "https://speech.example.com/sts/v1/token".to_string(),
                subscription_key: String::new(),
                voice: "en-US-JennyNeural".to_string(),
                language: "en-US".to_string(),
                rate_percent: -10,
                sentence_silence_ms: 500,
                media_dir: "media".to_string(),
            },
        }
    }
}

impl Config {
    /// Load configuration: defaults, then an optional file, then
    /// KLAXON__SECTION__KEY environment overrides
    pub fn load(path: Option<&str>) -> Result<Self, DomainError> {
        let defaults = config::Config::try_from(&Config::default())
            .map_err(|e| DomainError::ConfigurationError(e.to_string()))?;

        let mut builder = config::Config::builder().add_source(defaults);
        builder = match path {
            Some(path) => builder.add_source(config::File::with_name(path)),
            None => builder.add_source(config::File::with_name("klaxon").required(false)),
        };

        builder
            .add_source(config::Environment::with_prefix("KLAXON").separator("__"))
            .build()
            .and_then(|merged| merged.try_deserialize())
            .map_err(|e| DomainError::ConfigurationError(e.to_string()))
    }

    /// Reject configurations that cannot place a call
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.platform.client_id.is_empty() || self.platform.client_secret.is_empty() {
            return Err(DomainError::ConfigurationError(
                "platform.client_id and platform.client_secret are required".to_string(),
            ));
        }

        if self.speech.subscription_key.is_empty() {
            return Err(DomainError::ConfigurationError(
                "speech.subscription_key is required".to_string(),
            ));
        }

        if self.api.require_key && self.api.key.is_empty() {
            return Err(DomainError::ConfigurationError(
                "api.key is required when api.require_key is set".to_string(),
            ));
        }

        if self.server.public_base_url.ends_with('/') {
            return Err(DomainError::ConfigurationError(
                "server.public_base_url must not end with a slash".to_string(),
            ));
        }

        Ok(())
    }
}

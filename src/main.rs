use klaxon::application::engine::{CallLifecycleEngine, EngineTimings};
use klaxon::config::Config;
use klaxon::domain::call::platform::CallPlatform;
use klaxon::domain::call::registry::CallRegistry;
use klaxon::domain::media::store::AssetStore;
use klaxon::domain::shared::value_objects::AssetId;
use klaxon::infrastructure::platform::HttpCallPlatform;
use klaxon::infrastructure::speech::SpeechAssetStore;
use klaxon::interface::api::{build_router, init_metrics, AppState};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Spoken when the tone menu opens; operators can re-record it through
/// `POST /api/assets/utility` with the configured clip name
const TONE_MENU_TEXT: &str =
    "Press 1 to acknowledge this notification. Press 2 to hear it again.";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "klaxon=info,tower_http=info".into()),
        )
        .init();

    info!("Starting Klaxon notification service");

    // Load configuration
    let config = Config::load(None)?;
    config.validate()?;
    info!("Configuration loaded");

    // The media directory must exist before the first synthesis or fetch
    tokio::fs::create_dir_all(&config.speech.media_dir).await?;

    // Initialize metrics exporter
    info!("Initializing Prometheus metrics exporter");
    let prometheus_handle = init_metrics()?;

    // Wire the platform and speech adapters
    let platform: Arc<dyn CallPlatform> =
        Arc::new(HttpCallPlatform::new(config.platform.clone()));
    let assets: Arc<dyn AssetStore> = Arc::new(SpeechAssetStore::new(
        config.speech.clone(),
        config.server.public_base_url.clone(),
    ));

    let registry = Arc::new(CallRegistry::new(Duration::from_secs(
        config.engine.tombstone_ttl_secs,
    )));

    // Synthesize the shared menu clip up front so the first call does not
    // pay for it mid-flight
    let tone_menu_asset = if config.engine.tone_menu_enabled {
        let clip = AssetId::named(config.engine.tone_menu_asset.clone());
        match assets.synthesize_as(&clip, TONE_MENU_TEXT).await {
            Ok(()) => {
                info!(asset = %clip, "tone menu clip ready");
                Some(clip)
            }
            Err(e) => {
                warn!(error = %e, "tone menu synthesis failed, menu disabled");
                None
            }
        }
    } else {
        None
    };

    let timings = EngineTimings {
        voicemail_threshold: Duration::from_secs(config.engine.voicemail_threshold_secs),
        early_warning_margin: Duration::from_secs(config.engine.early_warning_margin_secs),
        voicemail_tuning_delay: Duration::from_secs(config.engine.voicemail_tuning_delay_secs),
        tone_wait_budget: Duration::from_secs(config.engine.tone_wait_budget_secs),
        tone_menu_settle: Duration::from_secs(config.engine.tone_menu_settle_secs),
    };

    let engine = CallLifecycleEngine::new(
        registry,
        platform,
        assets.clone(),
        timings,
        tone_menu_asset,
    );

    let api_state = AppState {
        engine,
        assets,
        require_key: config.api.require_key,
        api_key: config.api.key.clone(),
    };
    let app = build_router(api_state, prometheus_handle, &config.speech.media_dir);

    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", config.server.host, config.server.port))
            .await?;
    info!(
        "REST API server started on {}:{}",
        config.server.host, config.server.port
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down...");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}

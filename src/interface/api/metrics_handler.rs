//! Prometheus metrics handler

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use metrics::{describe_counter, describe_gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::domain::shared::error::DomainError;
use crate::domain::shared::result::Result;

/// Initialize the Prometheus metrics exporter
pub fn init_metrics() -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| DomainError::ConfigurationError(format!("metrics recorder: {}", e)))?;

    // Describe metrics
    describe_counter!(
        "klaxon_calls_placed_total",
        "Total number of notification calls placed"
    );
    describe_counter!(
        "klaxon_calls_completed_total",
        "Total number of notification calls cleaned up, by reason"
    );
    describe_counter!(
        "klaxon_prompts_played_total",
        "Total number of prompt playbacks started"
    );
    describe_counter!(
        "klaxon_tone_selections_total",
        "Total number of tone menu selections, by selection"
    );
    describe_gauge!(
        "klaxon_active_calls",
        "Number of currently tracked notification calls"
    );

    Ok(handle)
}

/// HTTP metrics handler
pub async fn metrics_handler(
    axum::extract::State(prometheus_handle): axum::extract::State<PrometheusHandle>,
) -> Response {
    let metrics = prometheus_handle.render();
    (StatusCode::OK, metrics).into_response()
}

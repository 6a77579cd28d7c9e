//! API Router configuration

use super::asset_handler::create_utility_asset;
use super::call_handler::{
    get_call, health_check, list_calls, place_phone_call, place_user_call, AppState,
};
use super::metrics_handler::metrics_handler;
use super::notification_handler::receive_notifications;
use axum::{
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Build the API router
pub fn build_router(
    state: AppState,
    prometheus_handle: PrometheusHandle,
    media_dir: &str,
) -> Router {
    // Health check route (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    // Call management routes
    let call_routes = Router::new()
        .route("/api/calls/user", post(place_user_call))
        .route("/api/calls/phone", post(place_phone_call))
        .route("/api/calls", get(list_calls))
        .route("/api/calls/:call_id", get(get_call));

    // Utility asset routes
    let asset_routes = Router::new().route("/api/assets/utility", post(create_utility_asset));

    // The platform posts progress reports here; the route carries no api
    // key because the platform only authenticates itself at placement time
    let notification_routes =
        Router::new().route("/api/notifications", post(receive_notifications));

    // Metrics route (separate state)
    let metrics_routes = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(prometheus_handle);

    // Synthesized clips are fetched back by the platform from here
    let media_routes = Router::new().nest_service("/media", ServeDir::new(media_dir));

    // Combine routes with state
    Router::new()
        .merge(health_routes)
        .merge(call_routes)
        .merge(asset_routes)
        .merge(notification_routes)
        .with_state(state)
        .merge(metrics_routes)
        .merge(media_routes)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

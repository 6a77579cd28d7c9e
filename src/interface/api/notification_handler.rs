//! Notification webhook handler

use super::call_dto::ApiResponse;
use super::call_handler::AppState;
use super::notification_dto::NotificationEnvelope;
use crate::application::supervisor::spawn_supervised;
use axum::{extract::State, http::StatusCode, Json};
use tracing::{debug, warn};

/// Receive a batch of progress notifications from the platform.
///
/// The delivery is acknowledged as soon as it parses; event handling runs
/// on a background task because a single event can legitimately take
/// seconds (voicemail tuning, menu settle) and the platform retries slow
/// webhooks.
pub async fn receive_notifications(
    State(state): State<AppState>,
    Json(envelope): Json<NotificationEnvelope>,
) -> Result<(StatusCode, Json<ApiResponse<&'static str>>), StatusCode> {
    let events = match envelope.into_events() {
        Ok(events) => events,
        Err(e) => {
            warn!("API: Rejected notification delivery: {}", e);
            return Ok((
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::error(e.to_string())),
            ));
        }
    };

    debug!("API: Accepted delivery of {} progress event(s)", events.len());

    let engine = state.engine.clone();
    spawn_supervised("notification-delivery", async move {
        engine.process_delivery(events).await;
    });

    Ok((StatusCode::ACCEPTED, Json(ApiResponse::success("accepted"))))
}

//! Call API handlers

use super::call_dto::{
    ApiResponse, CallListResponse, PlacePhoneCallRequest, PlaceUserCallRequest, PlacedCallResponse,
};
use crate::application::engine::{CallLifecycleEngine, PlacementRequest};
use crate::domain::call::aggregate::CallSummary;
use crate::domain::media::store::AssetStore;
use crate::domain::shared::error::DomainError;
use crate::domain::shared::value_objects::CallId;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use std::sync::Arc;
use tracing::{error, info};

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub engine: CallLifecycleEngine,
    pub assets: Arc<dyn AssetStore>,
    pub require_key: bool,
    pub api_key: String,
}

impl AppState {
    /// Check the shared-key header on management routes
    pub fn authorized(&self, headers: &HeaderMap) -> bool {
        if !self.require_key {
            return true;
        }
        headers
            .get("x-api-key")
            .and_then(|v| v.to_str().ok())
            .map(|v| v == self.api_key)
            .unwrap_or(false)
    }
}

/// Map a failed operation to the HTTP status it should surface as
pub fn error_status(error: &DomainError) -> StatusCode {
    match error {
        DomainError::ValidationError(_) => StatusCode::BAD_REQUEST,
        DomainError::RemoteCommandFailure { .. } | DomainError::SynthesisFailure(_) => {
            StatusCode::BAD_GATEWAY
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Health check
pub async fn health_check() -> Json<ApiResponse<&'static str>> {
    Json(ApiResponse::success("OK"))
}

/// Place a notification call to a directory user
pub async fn place_user_call(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<PlaceUserCallRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PlacedCallResponse>>), StatusCode> {
    if !state.authorized(&headers) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    info!("API: Placing notification call to user {}", req.user_id);

    match req.into_placement() {
        Ok(request) => place(&state.engine, request).await,
        Err(e) => Ok((
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(e.to_string())),
        )),
    }
}

/// Place a notification call to an external phone number
pub async fn place_phone_call(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<PlacePhoneCallRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PlacedCallResponse>>), StatusCode> {
    if !state.authorized(&headers) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    info!("API: Placing notification call to phone {}", req.phone_number);

    match req.into_placement() {
        Ok(request) => place(&state.engine, request).await,
        Err(e) => Ok((
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(e.to_string())),
        )),
    }
}

async fn place(
    engine: &CallLifecycleEngine,
    request: PlacementRequest,
) -> Result<(StatusCode, Json<ApiResponse<PlacedCallResponse>>), StatusCode> {
    match engine.place_call(request).await {
        Ok(placed) => {
            info!("API: Placed call {}", placed.call_id);
            Ok((StatusCode::OK, Json(ApiResponse::success(placed.into()))))
        }
        Err(e) => {
            error!("API: Failed to place call: {}", e);
            Ok((error_status(&e), Json(ApiResponse::error(e.to_string()))))
        }
    }
}

/// List live notification calls
pub async fn list_calls(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<CallListResponse>>, StatusCode> {
    if !state.authorized(&headers) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    info!("API: Listing active calls");

    let calls = state.engine.active_calls().await;
    let total = calls.len();
    Ok(Json(ApiResponse::success(CallListResponse { calls, total })))
}

/// Get one live notification call
pub async fn get_call(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(call_id): Path<String>,
) -> Result<(StatusCode, Json<ApiResponse<CallSummary>>), StatusCode> {
    if !state.authorized(&headers) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    info!("API: Getting call {}", call_id);

    match state.engine.call_summary(&CallId::new(&call_id)).await {
        Some(summary) => Ok((StatusCode::OK, Json(ApiResponse::success(summary)))),
        None => Ok((
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error(format!("Call {} not found", call_id))),
        )),
    }
}

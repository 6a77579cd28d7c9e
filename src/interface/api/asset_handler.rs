//! Utility asset API handlers

use super::call_dto::{ApiResponse, AssetResponse, CreateAssetRequest};
use super::call_handler::{error_status, AppState};
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use tracing::{error, info};

use crate::domain::shared::value_objects::AssetId;

/// Synthesize a named utility clip, replacing any previous content.
///
/// Named clips back shared prompts such as the tone menu; they are
/// referenced by every call and never deleted by call cleanup.
pub async fn create_utility_asset(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateAssetRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AssetResponse>>), StatusCode> {
    if !state.authorized(&headers) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    info!("API: Synthesizing utility asset {}", req.name);

    if let Err(message) = validate_asset_name(&req.name) {
        return Ok((StatusCode::BAD_REQUEST, Json(ApiResponse::error(message))));
    }
    if req.text.trim().is_empty() {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("clip text must not be empty".to_string())),
        ));
    }

    let asset = AssetId::named(req.name);
    match state.assets.synthesize_as(&asset, &req.text).await {
        Ok(()) => {
            let url = state.assets.media_url(&asset);
            Ok((
                StatusCode::CREATED,
                Json(ApiResponse::success(AssetResponse {
                    asset: asset.to_string(),
                    url,
                })),
            ))
        }
        Err(e) => {
            error!("API: Failed to synthesize asset: {}", e);
            Ok((error_status(&e), Json(ApiResponse::error(e.to_string()))))
        }
    }
}

/// Names become file names under the media directory; keep them to a
/// safe alphabet
fn validate_asset_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("asset name must not be empty".to_string());
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(format!(
            "asset name {:?} may only contain letters, digits, '-' and '_'",
            name
        ));
    }
    Ok(())
}

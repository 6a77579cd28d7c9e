//! Call API DTOs

use serde::{Deserialize, Serialize};

use crate::application::engine::{PlacedCall, PlacementRequest};
use crate::domain::call::value_object::CallTarget;
use crate::domain::shared::error::DomainError;
use crate::domain::shared::result::Result;
use crate::domain::shared::value_objects::TenantId;

/// Request to call a directory user
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceUserCallRequest {
    /// Notification text read to the callee
    pub text: String,
    pub user_id: String,
    pub tenant: String,
}

impl PlaceUserCallRequest {
    pub fn into_placement(self) -> Result<PlacementRequest> {
        if self.user_id.trim().is_empty() {
            return Err(DomainError::ValidationError(
                "user id must not be empty".to_string(),
            ));
        }
        Ok(PlacementRequest {
            text: validated_text(self.text)?,
            target: CallTarget::User { id: self.user_id },
            tenant: TenantId::new(self.tenant),
        })
    }
}

/// Request to call an external phone number
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacePhoneCallRequest {
    pub text: String,
    pub phone_number: String,
    pub tenant: String,
}

impl PlacePhoneCallRequest {
    pub fn into_placement(self) -> Result<PlacementRequest> {
        let number = self.phone_number.trim();
        if number.is_empty() {
            return Err(DomainError::ValidationError(
                "phone number must not be empty".to_string(),
            ));
        }
        Ok(PlacementRequest {
            text: validated_text(self.text)?,
            target: CallTarget::Phone {
                number: number.to_string(),
            },
            tenant: TenantId::new(self.tenant),
        })
    }
}

fn validated_text(text: String) -> Result<String> {
    if text.trim().is_empty() {
        return Err(DomainError::ValidationError(
            "notification text must not be empty".to_string(),
        ));
    }
    Ok(text)
}

/// Placement response
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedCallResponse {
    pub call_id: String,
    /// Resolved callee display name
    pub callee: String,
}

impl From<PlacedCall> for PlacedCallResponse {
    fn from(placed: PlacedCall) -> Self {
        PlacedCallResponse {
            call_id: placed.call_id.to_string(),
            callee: placed.callee.display_name().to_string(),
        }
    }
}

/// Active calls list response
#[derive(Debug, Serialize, Deserialize)]
pub struct CallListResponse {
    pub calls: Vec<crate::domain::call::aggregate::CallSummary>,
    pub total: usize,
}

/// Request to synthesize a named utility clip
#[derive(Debug, Deserialize)]
pub struct CreateAssetRequest {
    pub name: String,
    pub text: String,
}

/// Synthesized asset response
#[derive(Debug, Serialize, Deserialize)]
pub struct AssetResponse {
    pub asset: String,
    pub url: String,
}

/// Generic API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

//! Request and response bodies for the call platform REST API

use serde::{Deserialize, Serialize};

use crate::domain::call::value_object::CallTarget;

/// Client-credentials grant, sent form-encoded to the tenant token endpoint
#[derive(Debug, Serialize)]
pub struct TokenRequest<'a> {
    pub grant_type: &'a str,
    pub client_id: &'a str,
    pub client_secret: &'a str,
    pub scope: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// Lifetime in seconds
    pub expires_in: u64,
}

/// Directory record resolved before dialing
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryUser {
    pub id: String,
    pub display_name: String,
}

/// Body of `POST /calls`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCallRequest<'a> {
    pub source: CallSource,
    pub target: &'a CallTarget,
    pub tenant: &'a str,
    /// Where the platform delivers progress notifications
    pub callback_url: &'a str,
    /// Clip announced once media comes up
    pub prompt_url: &'a str,
}

/// Identity presented to the callee
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallSource {
    pub display_name: String,
    /// Caller id for PSTN legs; omitted on directory calls
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caller_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCallResponse {
    pub id: String,
}

/// Body of `POST /calls/{id}/play-prompt`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayPromptRequest<'a> {
    pub media_url: &'a str,
    pub client_context: &'a str,
}

/// Body of `POST /calls/{id}/subscribe-tone`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeToneRequest<'a> {
    pub client_context: &'a str,
}

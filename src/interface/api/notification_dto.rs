//! Notification webhook DTOs
//!
//! The platform batches progress reports into one envelope per delivery.
//! Parsing normalizes each entry into a `ProgressEvent` and rejects the
//! whole delivery when any entry cannot be correlated to a call.

use serde::Deserialize;

use crate::domain::call::event::{CallLifecycleEvent, PlaybackOperationEvent, ProgressEvent};
use crate::domain::call::value_object::{OperationOutcome, ReportedCallState, ToneDigit};
use crate::domain::shared::error::DomainError;
use crate::domain::shared::result::Result;
use crate::domain::shared::value_objects::CallId;

/// Envelope of one webhook delivery
#[derive(Debug, Deserialize)]
pub struct NotificationEnvelope {
    pub value: Vec<Notification>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub resource_data: ResourceData,
}

/// Payload of one notification, distinguished by `kind`
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ResourceData {
    Call(CallResource),
    PlayPromptOperation(OperationResource),
}

/// Call lifecycle report
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallResource {
    pub id: Option<String>,
    pub state: ReportedCallState,
    #[serde(default)]
    pub media_active: bool,
    /// DTMF digit as a single character, e.g. `"1"` or `"#"`
    #[serde(default)]
    pub tone: Option<String>,
}

/// Playback operation report; `client_context` carries the call id the
/// playback was started with
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationResource {
    pub client_context: Option<String>,
    pub status: OperationOutcome,
}

impl NotificationEnvelope {
    /// Normalize the delivery into progress events
    pub fn into_events(self) -> Result<Vec<ProgressEvent>> {
        self.value
            .into_iter()
            .map(|notification| notification.resource_data.into_event())
            .collect()
    }
}

impl ResourceData {
    fn into_event(self) -> Result<ProgressEvent> {
        match self {
            ResourceData::Call(call) => {
                let id = call
                    .id
                    .filter(|id| !id.is_empty())
                    .ok_or_else(|| {
                        DomainError::ValidationError(
                            "call notification carries no call id".to_string(),
                        )
                    })?;
                let tone = call.tone.map(parse_tone).transpose()?;
                Ok(ProgressEvent::Lifecycle(CallLifecycleEvent {
                    call_id: CallId::new(id),
                    reported_state: call.state,
                    media_active: call.media_active,
                    tone,
                }))
            }
            ResourceData::PlayPromptOperation(operation) => {
                let context = operation
                    .client_context
                    .filter(|ctx| !ctx.is_empty())
                    .ok_or(DomainError::MissingCorrelationContext)?;
                Ok(ProgressEvent::Playback(PlaybackOperationEvent {
                    call_id: CallId::new(context),
                    outcome: operation.status,
                }))
            }
        }
    }
}

fn parse_tone(raw: String) -> Result<ToneDigit> {
    let mut chars = raw.chars();
    match (chars.next().and_then(ToneDigit::from_char), chars.next()) {
        (Some(tone), None) => Ok(tone),
        _ => Err(DomainError::ValidationError(format!(
            "unrecognized tone {:?}",
            raw
        ))),
    }
}

//! Call progress events
//!
//! Normalized form of what the platform posts to the webhook. The event kind
//! is decided once, at the gateway; downstream code matches on the variant and
//! never re-inspects raw payloads.

use crate::domain::call::value_object::{OperationOutcome, ReportedCallState, ToneDigit};
use crate::domain::shared::value_objects::CallId;
use serde::{Deserialize, Serialize};

/// Call lifecycle progress report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallLifecycleEvent {
    pub call_id: CallId,
    pub reported_state: ReportedCallState,
    /// Whether the platform reports the audio path as active
    pub media_active: bool,
    /// DTMF digit collected since the last report, if any
    pub tone: Option<ToneDigit>,
}

/// Progress report for a prompt playback started earlier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackOperationEvent {
    /// Call the playback was started on, recovered from the operation context
    pub call_id: CallId,
    pub outcome: OperationOutcome,
}

/// Union of all progress events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProgressEvent {
    Lifecycle(CallLifecycleEvent),
    Playback(PlaybackOperationEvent),
}

impl ProgressEvent {
    pub fn call_id(&self) -> &CallId {
        match self {
            ProgressEvent::Lifecycle(e) => &e.call_id,
            ProgressEvent::Playback(e) => &e.call_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ProgressEvent::Lifecycle(_) => "lifecycle",
            ProgressEvent::Playback(_) => "playback",
        }
    }
}

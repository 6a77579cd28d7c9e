//! Call platform interface

use crate::domain::call::entity::CalleeInfo;
use crate::domain::call::value_object::CallTarget;
use crate::domain::shared::result::Result;
use crate::domain::shared::value_objects::{CallId, TenantId};

/// Command port onto the remote communications platform
///
/// This is defined in the domain layer as a trait (port),
/// and implemented in the infrastructure layer (adapter).
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CallPlatform: Send + Sync {
    /// Resolve the callee identity before dialing
    async fn lookup_callee(&self, target: &CallTarget, tenant: &TenantId) -> Result<CalleeInfo>;

    /// Place an outbound call announcing `prompt_url`; returns the
    /// platform-assigned call id
    async fn place_call(
        &self,
        target: &CallTarget,
        tenant: &TenantId,
        prompt_url: &str,
    ) -> Result<CallId>;

    /// Start prompt playback on a live call, tagged with a correlation
    /// context echoed back in playback progress reports
    async fn play_prompt(
        &self,
        call_id: &CallId,
        media_url: &str,
        client_context: &str,
    ) -> Result<()>;

    /// Ask the platform to collect DTMF tones on a live call
    async fn subscribe_tone(&self, call_id: &CallId, client_context: &str) -> Result<()>;

    /// Hang up a live call
    async fn end_call(&self, call_id: &CallId) -> Result<()>;
}

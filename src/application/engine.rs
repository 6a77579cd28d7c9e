//! Call lifecycle engine
//!
//! Orchestrates a notification call from placement to cleanup: synthesizes
//! the greeting, places the call, then advances the per-call state machine as
//! progress events arrive from the platform webhook. Connect-time ring
//! duration decides between a live greeting and the voicemail fallback; an
//! optional DTMF menu lets the callee confirm or replay the notification.

use crate::application::supervisor::spawn_supervised;
use crate::domain::call::aggregate::CallSummary;
use crate::domain::call::entity::CalleeInfo;
use crate::domain::call::event::{CallLifecycleEvent, PlaybackOperationEvent, ProgressEvent};
use crate::domain::call::platform::CallPlatform;
use crate::domain::call::registry::{CallRegistry, SessionHandle};
use crate::domain::call::service::{CallDomainService, PickupClass};
use crate::domain::call::value_object::{
    CallTarget, MenuSelection, OperationOutcome, ReportedCallState, SessionState, ToneDigit,
};
use crate::domain::media::store::AssetStore;
use crate::domain::shared::error::DomainError;
use crate::domain::shared::result::Result;
use crate::domain::shared::value_objects::{AssetId, CallId, TenantId};
use metrics::{counter, gauge};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Engine timing knobs, all driven by the tokio clock
#[derive(Debug, Clone, Copy)]
pub struct EngineTimings {
    /// Ring time at or beyond which a pickup is classified as voicemail
    pub voicemail_threshold: Duration,
    /// Width of the warning band just below the threshold
    pub early_warning_margin: Duration,
    /// Wait before playing into voicemail so the prompt clears the beep
    pub voicemail_tuning_delay: Duration,
    /// How long the tone menu stays open without a selection
    pub tone_wait_budget: Duration,
    /// Settle delay before menu audio after subscribing or replaying
    pub tone_menu_settle: Duration,
}

impl Default for EngineTimings {
    fn default() -> Self {
        Self {
            voicemail_threshold: Duration::from_secs(25),
            early_warning_margin: Duration::from_secs(8),
            voicemail_tuning_delay: Duration::from_secs(9),
            tone_wait_budget: Duration::from_secs(10),
            tone_menu_settle: Duration::from_secs(3),
        }
    }
}

/// What handling one event amounted to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// State advanced or a remote command was issued
    Progressed,
    /// The session reached end of life and was pruned
    Completed,
    /// Nothing to do for this state and event pair
    Ignored,
    /// Call id was never registered; event dropped
    DroppedUnknown,
    /// Call torn down moments ago; late event dropped
    DroppedEnded,
}

/// Placement request accepted by the API
#[derive(Debug, Clone)]
pub struct PlacementRequest {
    pub text: String,
    pub target: CallTarget,
    pub tenant: TenantId,
}

/// Result of a successful placement
#[derive(Debug, Clone)]
pub struct PlacedCall {
    pub call_id: CallId,
    pub callee: CalleeInfo,
}

/// Call lifecycle engine
///
/// Cheap to clone; all heavy state sits behind shared handles. Event
/// handling for one call runs under that call's turn lock, so two webhook
/// deliveries for the same call are applied in order while distinct calls
/// proceed in parallel.
#[derive(Clone)]
pub struct CallLifecycleEngine {
    registry: Arc<CallRegistry>,
    platform: Arc<dyn CallPlatform>,
    assets: Arc<dyn AssetStore>,
    timings: EngineTimings,
    /// Shared menu clip; the tone menu is disabled when absent
    tone_menu_asset: Option<AssetId>,
}

impl CallLifecycleEngine {
    pub fn new(
        registry: Arc<CallRegistry>,
        platform: Arc<dyn CallPlatform>,
        assets: Arc<dyn AssetStore>,
        timings: EngineTimings,
        tone_menu_asset: Option<AssetId>,
    ) -> Self {
        Self {
            registry,
            platform,
            assets,
            timings,
            tone_menu_asset,
        }
    }

    /// Synthesize the prompt, place the call, and register the session
    ///
    /// The session is registered before the caller sees the id: the first
    /// webhook delivery may arrive before the placement response is read.
    pub async fn place_call(&self, request: PlacementRequest) -> Result<PlacedCall> {
        let callee = self
            .platform
            .lookup_callee(&request.target, &request.tenant)
            .await?;

        let greeting = self.assets.synthesize(&request.text).await?;
        let prompt_url = self.assets.media_url(&greeting);

        let call_id = match self
            .platform
            .place_call(&request.target, &request.tenant, &prompt_url)
            .await
        {
            Ok(call_id) => call_id,
            Err(e) => {
                // Placement never happened; don't leave the clip behind
                if let Err(cleanup) = self.assets.delete(&greeting).await {
                    warn!(asset = %greeting, error = %cleanup, "orphan greeting cleanup failed");
                }
                return Err(e);
            }
        };

        self.registry
            .create(
                call_id.clone(),
                greeting,
                callee.clone(),
                request.target.clone(),
                request.tenant.clone(),
            )
            .await?;

        counter!("klaxon_calls_placed_total").increment(1);
        gauge!("klaxon_active_calls").set(self.registry.active_count().await as f64);
        info!(call_id = %call_id, target = %request.target, callee = callee.display_name(), "placed notification call");

        Ok(PlacedCall { call_id, callee })
    }

    /// Handle a webhook delivery in order, logging each event's outcome
    pub async fn process_delivery(&self, events: Vec<ProgressEvent>) {
        for event in events {
            let call_id = event.call_id().clone();
            let kind = event.kind();
            match self.handle_event(event).await {
                Ok(outcome) => debug!(call_id = %call_id, kind, ?outcome, "event handled"),
                Err(e) => error!(call_id = %call_id, kind, error = %e, "event handling failed"),
            }
        }
    }

    /// Handle one progress event end to end
    pub async fn handle_event(&self, event: ProgressEvent) -> Result<Outcome> {
        let call_id = event.call_id().clone();
        let handle = match self.registry.get(&call_id).await {
            Ok(handle) => handle,
            Err(DomainError::CallAlreadyEnded(_)) => {
                warn!(call_id = %call_id, kind = event.kind(), "dropping event for recently ended call");
                return Ok(Outcome::DroppedEnded);
            }
            Err(DomainError::UnknownCallId(_)) => {
                warn!(call_id = %call_id, kind = event.kind(), "dropping event for unknown call");
                return Ok(Outcome::DroppedUnknown);
            }
            Err(e) => return Err(e),
        };

        let _turn = handle.begin_turn().await;
        if handle.read(|session| session.is_defunct()).await {
            warn!(call_id = %call_id, kind = event.kind(), "dropping event for call torn down mid-delivery");
            return Ok(Outcome::DroppedEnded);
        }

        match event {
            ProgressEvent::Lifecycle(event) => self.on_lifecycle(&handle, event).await,
            ProgressEvent::Playback(event) => self.on_playback(&handle, event).await,
        }
    }

    /// List live sessions
    pub async fn active_calls(&self) -> Vec<CallSummary> {
        self.registry.summaries().await
    }

    /// Look up one live session
    pub async fn call_summary(&self, call_id: &CallId) -> Option<CallSummary> {
        self.registry.summary_of(call_id).await
    }

    async fn on_lifecycle(
        &self,
        handle: &SessionHandle,
        event: CallLifecycleEvent,
    ) -> Result<Outcome> {
        match event.reported_state {
            ReportedCallState::Initializing => {
                debug!(call_id = %event.call_id, "call initializing");
                Ok(Outcome::Ignored)
            }
            ReportedCallState::Ringing => self.on_ringing(handle).await,
            ReportedCallState::Connected => {
                if let Some(tone) = event.tone {
                    self.on_tone(handle, tone).await
                } else if event.media_active {
                    self.on_media_up(handle).await
                } else {
                    self.on_connected_without_media(handle).await
                }
            }
            ReportedCallState::Ended => {
                info!(call_id = %event.call_id, "platform reports call ended");
                // Remote side is already gone; no hang-up command
                self.cleanup(handle, false, "remote-ended").await
            }
        }
    }

    async fn on_ringing(&self, handle: &SessionHandle) -> Result<Outcome> {
        handle
            .update(|session| match session.state() {
                SessionState::Dialing => {
                    session.transition_to(SessionState::Ringing)?;
                    session.start_ring_timer();
                    debug!(call_id = %session.call_id(), "callee alerted, ring stopwatch started");
                    Ok(Outcome::Progressed)
                }
                SessionState::Ringing => {
                    // Duplicate report; the stopwatch keeps its original start
                    session.start_ring_timer();
                    Ok(Outcome::Ignored)
                }
                state => {
                    debug!(call_id = %session.call_id(), %state, "ringing report after connect ignored");
                    Ok(Outcome::Ignored)
                }
            })
            .await
    }

    /// Audio path came up: gate on elapsed ring time, then play the greeting
    async fn on_media_up(&self, handle: &SessionHandle) -> Result<Outcome> {
        let (call_id, state, elapsed) = handle
            .read(|session| {
                (
                    session.call_id().clone(),
                    session.state(),
                    session.ring_elapsed(),
                )
            })
            .await;

        match state {
            SessionState::Dialing
            | SessionState::Ringing
            | SessionState::ConnectedAwaitingMedia => {}
            other => {
                debug!(call_id = %call_id, state = %other, "media report in steady state ignored");
                return Ok(Outcome::Ignored);
            }
        }

        match CallDomainService::classify_pickup(
            elapsed,
            self.timings.voicemail_threshold,
            self.timings.early_warning_margin,
        ) {
            PickupClass::Live => {
                debug!(call_id = %call_id, elapsed_ms = elapsed.as_millis() as u64, "live pickup");
            }
            PickupClass::RetuneBand => {
                warn!(
                    call_id = %call_id,
                    elapsed_secs = elapsed.as_secs(),
                    threshold_secs = self.timings.voicemail_threshold.as_secs(),
                    suggested_threshold_secs = elapsed.as_secs().saturating_sub(3),
                    "pickup close to the voicemail threshold; consider retuning"
                );
            }
            PickupClass::Voicemail => {
                info!(
                    call_id = %call_id,
                    elapsed_secs = elapsed.as_secs(),
                    "no live pickup; waiting out the voicemail beep"
                );
                tokio::time::sleep(self.timings.voicemail_tuning_delay).await;
            }
        }

        let media_url = handle
            .read(|session| self.assets.media_url(session.armed_asset()))
            .await;
        self.platform
            .play_prompt(&call_id, &media_url, call_id.as_str())
            .await?;

        handle
            .update(|session| session.transition_to(SessionState::PlayingPrompt))
            .await?;

        counter!("klaxon_prompts_played_total").increment(1);
        info!(call_id = %call_id, "greeting prompt started");
        Ok(Outcome::Progressed)
    }

    /// Connected but no audio path: with a menu configured, collect tones now
    async fn on_connected_without_media(&self, handle: &SessionHandle) -> Result<Outcome> {
        let (call_id, state) = handle
            .read(|session| (session.call_id().clone(), session.state()))
            .await;

        match state {
            SessionState::Dialing | SessionState::Ringing => {}
            other => {
                debug!(call_id = %call_id, state = %other, "connect-without-media report ignored");
                return Ok(Outcome::Ignored);
            }
        }

        let Some(menu_asset) = self.tone_menu_asset.clone() else {
            handle
                .update(|session| session.transition_to(SessionState::ConnectedAwaitingMedia))
                .await?;
            debug!(call_id = %call_id, "connected, waiting for the audio path");
            return Ok(Outcome::Progressed);
        };

        self.platform
            .subscribe_tone(&call_id, call_id.as_str())
            .await?;

        handle
            .update(|session| {
                session.arm_asset(menu_asset.clone());
                session.transition_to(SessionState::AwaitingTone)
            })
            .await?;
        info!(call_id = %call_id, "tone subscription active");

        tokio::time::sleep(self.timings.tone_menu_settle).await;
        let media_url = self.assets.media_url(&menu_asset);
        self.platform
            .play_prompt(&call_id, &media_url, call_id.as_str())
            .await?;

        counter!("klaxon_prompts_played_total").increment(1);
        Ok(Outcome::Progressed)
    }

    async fn on_tone(&self, handle: &SessionHandle, tone: ToneDigit) -> Result<Outcome> {
        let (call_id, state) = handle
            .read(|session| (session.call_id().clone(), session.state()))
            .await;

        if state != SessionState::AwaitingTone {
            debug!(call_id = %call_id, %state, tone = %tone.to_char(), "tone outside the menu window ignored");
            return Ok(Outcome::Ignored);
        }

        match MenuSelection::from_tone(tone) {
            Some(MenuSelection::Confirm) => {
                counter!("klaxon_tone_selections_total", "selection" => "confirm").increment(1);
                info!(call_id = %call_id, "notification confirmed by callee");
                self.cleanup(handle, true, "confirmed").await
            }
            Some(MenuSelection::Repeat) => {
                counter!("klaxon_tone_selections_total", "selection" => "repeat").increment(1);
                info!(call_id = %call_id, "replaying notification");

                // Disarm the pending no-selection deadline; the window reopens
                // when the replayed audio finishes
                let greeting_url = handle
                    .update(|session| {
                        session.bump_tone_generation();
                        session.restart_ring_timer();
                        session.arm_greeting();
                        self.assets.media_url(session.greeting_asset())
                    })
                    .await;

                self.platform
                    .play_prompt(&call_id, &greeting_url, call_id.as_str())
                    .await?;

                if let Some(menu_asset) = &self.tone_menu_asset {
                    tokio::time::sleep(self.timings.tone_menu_settle).await;
                    let menu_url = self.assets.media_url(menu_asset);
                    self.platform
                        .play_prompt(&call_id, &menu_url, call_id.as_str())
                        .await?;
                }

                counter!("klaxon_prompts_played_total").increment(1);
                Ok(Outcome::Progressed)
            }
            None => {
                debug!(call_id = %call_id, tone = %tone.to_char(), "tone without a menu action ignored");
                Ok(Outcome::Ignored)
            }
        }
    }

    async fn on_playback(
        &self,
        handle: &SessionHandle,
        event: PlaybackOperationEvent,
    ) -> Result<Outcome> {
        let (call_id, state) = handle
            .read(|session| (session.call_id().clone(), session.state()))
            .await;

        match event.outcome {
            OperationOutcome::Running => {
                debug!(call_id = %call_id, "prompt playback running");
                Ok(Outcome::Ignored)
            }
            OperationOutcome::Failed => {
                warn!(call_id = %call_id, %state, "prompt playback failed on the platform");
                Ok(Outcome::Ignored)
            }
            OperationOutcome::Completed => match state {
                SessionState::PlayingPrompt if self.tone_menu_asset.is_some() => {
                    handle
                        .update(|session| session.transition_to(SessionState::AwaitingTone))
                        .await?;
                    self.arm_tone_deadline(handle).await;
                    info!(call_id = %call_id, "greeting finished; tone menu armed");
                    Ok(Outcome::Progressed)
                }
                SessionState::PlayingPrompt => {
                    info!(call_id = %call_id, "greeting finished; hanging up");
                    self.cleanup(handle, true, "played").await
                }
                SessionState::AwaitingTone => {
                    // Menu clip or replayed greeting finished; reopen the window
                    self.arm_tone_deadline(handle).await;
                    Ok(Outcome::Progressed)
                }
                other => {
                    debug!(call_id = %call_id, state = %other, "stray playback completion ignored");
                    Ok(Outcome::Ignored)
                }
            },
        }
    }

    /// Arm the no-selection deadline for the tone menu
    ///
    /// The deadline task re-checks the generation under the call's turn, so a
    /// deadline outlived by a replay or a confirm disarms itself.
    async fn arm_tone_deadline(&self, handle: &SessionHandle) {
        let (call_id, generation) = handle
            .update(|session| {
                session.restart_ring_timer();
                (session.call_id().clone(), session.bump_tone_generation())
            })
            .await;

        let engine = self.clone();
        let budget = self.timings.tone_wait_budget;
        let task = format!("tone-deadline-{}", call_id);
        spawn_supervised(task, async move {
            tokio::time::sleep(budget).await;
            match engine.on_tone_deadline(&call_id, generation).await {
                Ok(outcome) => debug!(call_id = %call_id, ?outcome, "tone deadline resolved"),
                Err(e) => error!(call_id = %call_id, error = %e, "tone deadline handling failed"),
            }
        });
    }

    /// Fires once per armed deadline; cleans up if no selection arrived
    async fn on_tone_deadline(&self, call_id: &CallId, generation: u64) -> Result<Outcome> {
        let handle = match self.registry.get(call_id).await {
            // Session already pruned; nothing left to do
            Err(_) => return Ok(Outcome::Ignored),
            Ok(handle) => handle,
        };

        let _turn = handle.begin_turn().await;
        let (defunct, stale, state) = handle
            .read(|session| {
                (
                    session.is_defunct(),
                    session.tone_generation() != generation,
                    session.state(),
                )
            })
            .await;

        if defunct || stale || state != SessionState::AwaitingTone {
            debug!(call_id = %call_id, stale, %state, "tone deadline disarmed");
            return Ok(Outcome::Ignored);
        }

        info!(
            call_id = %call_id,
            budget_secs = self.timings.tone_wait_budget.as_secs(),
            "no tone selection; hanging up"
        );
        self.cleanup(&handle, true, "tone-timeout").await
    }

    /// Tear a session down: optional hang-up, asset disposal, then prune
    ///
    /// Ordering matters: the clip is deleted only after the hang-up so the
    /// platform never fetches a missing file, and the registry entry goes
    /// last so concurrent lookups route here until teardown finished.
    async fn cleanup(
        &self,
        handle: &SessionHandle,
        issue_hangup: bool,
        reason: &'static str,
    ) -> Result<Outcome> {
        let (call_id, greeting) = handle
            .read(|session| (session.call_id().clone(), session.greeting_asset().clone()))
            .await;

        if issue_hangup {
            self.platform.end_call(&call_id).await?;
        }

        if let Err(e) = self.assets.delete(&greeting).await {
            warn!(call_id = %call_id, asset = %greeting, error = %e, "greeting cleanup failed");
        }

        handle.update(|session| session.mark_defunct()).await;
        self.registry.remove(&call_id).await;

        counter!("klaxon_calls_completed_total", "reason" => reason).increment(1);
        gauge!("klaxon_active_calls").set(self.registry.active_count().await as f64);
        info!(call_id = %call_id, reason, "session cleaned up");
        Ok(Outcome::Completed)
    }
}

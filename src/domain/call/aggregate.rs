//! Call session aggregate root

use crate::domain::call::entity::CalleeInfo;
use crate::domain::call::value_object::{CallTarget, SessionState};
use crate::domain::shared::error::DomainError;
use crate::domain::shared::result::Result;
use crate::domain::shared::value_objects::{AssetId, CallId, TenantId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

/// Elapsed-ring stopwatch
///
/// Measures how long the callee has been alerted before the call connected.
/// Backed by the tokio clock so tests can drive it deterministically.
#[derive(Debug, Clone, Copy, Default)]
pub struct RingTimer {
    started: Option<Instant>,
}

impl RingTimer {
    /// Start the timer if it is not already running; returns false otherwise
    pub fn start_once(&mut self) -> bool {
        if self.started.is_some() {
            return false;
        }
        self.started = Some(Instant::now());
        true
    }

    /// Restart the timer from zero
    pub fn restart(&mut self) {
        self.started = Some(Instant::now());
    }

    pub fn is_running(&self) -> bool {
        self.started.is_some()
    }

    /// Time since the timer started; zero if it never started
    pub fn elapsed(&self) -> Duration {
        self.started
            .map(|at| at.elapsed())
            .unwrap_or(Duration::ZERO)
    }
}

/// Call session aggregate root
///
/// One live notification call. Holds the engine-side state machine, the
/// elapsed-ring stopwatch feeding the voicemail heuristic, and the audio
/// assets tied to the call.
#[derive(Debug, Clone)]
pub struct CallSession {
    /// Platform-assigned aggregate root ID
    call_id: CallId,
    /// Current state
    state: SessionState,
    /// Synthesized greeting owned by this session; deleted at cleanup
    greeting_asset: AssetId,
    /// Asset that plays on the next prompt command (greeting or menu clip)
    armed_asset: AssetId,
    /// Elapsed-ring stopwatch
    ring_timer: RingTimer,
    /// Monotonic counter invalidating stale tone-wait deadlines
    tone_generation: u64,
    /// Set during cleanup; late events for this session are dropped
    defunct: bool,
    /// Resolved callee identity
    callee: CalleeInfo,
    /// Dialed target
    target: CallTarget,
    /// Tenant the call was placed under
    tenant: TenantId,
    /// When placement was accepted
    placed_at: DateTime<Utc>,
}

impl CallSession {
    /// Create a new session; constructed by the registry only
    pub fn new(
        call_id: CallId,
        greeting_asset: AssetId,
        callee: CalleeInfo,
        target: CallTarget,
        tenant: TenantId,
    ) -> Self {
        Self {
            call_id,
            state: SessionState::Dialing,
            armed_asset: greeting_asset.clone(),
            greeting_asset,
            ring_timer: RingTimer::default(),
            tone_generation: 0,
            defunct: false,
            callee,
            target,
            tenant,
            placed_at: Utc::now(),
        }
    }

    /// Transition to a new state
    pub fn transition_to(&mut self, new_state: SessionState) -> Result<()> {
        if !self.state.can_transition_to(&new_state) {
            return Err(DomainError::InvalidStateTransition(format!(
                "Cannot transition from {:?} to {:?}",
                self.state, new_state
            )));
        }

        self.state = new_state;
        Ok(())
    }

    /// Start the ring stopwatch; duplicate ringing reports keep the original start
    pub fn start_ring_timer(&mut self) -> bool {
        self.ring_timer.start_once()
    }

    /// Restart the ring stopwatch; used when the tone menu is re-armed
    pub fn restart_ring_timer(&mut self) {
        self.ring_timer.restart();
    }

    pub fn ring_elapsed(&self) -> Duration {
        self.ring_timer.elapsed()
    }

    pub fn ring_timer_running(&self) -> bool {
        self.ring_timer.is_running()
    }

    /// Switch the asset that plays on the next prompt command
    pub fn arm_asset(&mut self, asset: AssetId) {
        self.armed_asset = asset;
    }

    /// Re-arm the session-owned greeting
    pub fn arm_greeting(&mut self) {
        self.armed_asset = self.greeting_asset.clone();
    }

    /// Invalidate any pending tone-wait deadline; returns the new generation
    pub fn bump_tone_generation(&mut self) -> u64 {
        self.tone_generation += 1;
        self.tone_generation
    }

    /// Mark the session as torn down; late events must be dropped
    pub fn mark_defunct(&mut self) {
        self.defunct = true;
    }

    /// Read-only snapshot for listings
    pub fn summary(&self) -> CallSummary {
        CallSummary {
            call_id: self.call_id.clone(),
            state: self.state,
            callee: self.callee.clone(),
            target: self.target.clone(),
            tenant: self.tenant.clone(),
            placed_at: self.placed_at,
        }
    }

    // Getters
    pub fn call_id(&self) -> &CallId {
        &self.call_id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn greeting_asset(&self) -> &AssetId {
        &self.greeting_asset
    }

    pub fn armed_asset(&self) -> &AssetId {
        &self.armed_asset
    }

    pub fn tone_generation(&self) -> u64 {
        self.tone_generation
    }

    pub fn is_defunct(&self) -> bool {
        self.defunct
    }

    pub fn callee(&self) -> &CalleeInfo {
        &self.callee
    }

    pub fn target(&self) -> &CallTarget {
        &self.target
    }

    pub fn tenant(&self) -> &TenantId {
        &self.tenant
    }

    pub fn placed_at(&self) -> &DateTime<Utc> {
        &self.placed_at
    }
}

/// Point-in-time view of a session for listings and lookups
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallSummary {
    pub call_id: CallId,
    pub state: SessionState,
    pub callee: CalleeInfo,
    pub target: CallTarget,
    pub tenant: TenantId,
    pub placed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_session() -> CallSession {
        CallSession::new(
            CallId::new("call-1"),
            AssetId::named("greeting-1"),
            CalleeInfo::new("Alice"),
            CallTarget::User {
                id: "u-alice".to_string(),
            },
            TenantId::new("contoso"),
        )
    }

    #[test]
    fn test_session_starts_dialing_with_greeting_armed() {
        let session = create_test_session();
        assert_eq!(session.state(), SessionState::Dialing);
        assert_eq!(session.armed_asset(), session.greeting_asset());
        assert!(!session.ring_timer_running());
        assert!(!session.is_defunct());
    }

    #[test]
    fn test_transitions_follow_the_table() {
        let mut session = create_test_session();

        session.transition_to(SessionState::Ringing).unwrap();
        session.transition_to(SessionState::PlayingPrompt).unwrap();
        session.transition_to(SessionState::AwaitingTone).unwrap();

        let result = session.transition_to(SessionState::Ringing);
        assert!(matches!(
            result,
            Err(DomainError::InvalidStateTransition(_))
        ));
        assert_eq!(session.state(), SessionState::AwaitingTone);
    }

    #[test]
    fn test_arm_asset_keeps_greeting_ownership() {
        let mut session = create_test_session();
        let menu = AssetId::named("tone-menu");

        session.arm_asset(menu.clone());
        assert_eq!(session.armed_asset(), &menu);
        assert_eq!(session.greeting_asset().as_str(), "greeting-1");

        session.arm_greeting();
        assert_eq!(session.armed_asset(), session.greeting_asset());
    }

    #[test]
    fn test_tone_generation_is_monotonic() {
        let mut session = create_test_session();
        let first = session.bump_tone_generation();
        let second = session.bump_tone_generation();
        assert_eq!(first, 1);
        assert_eq!(second, 2);
        assert_eq!(session.tone_generation(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ring_timer_starts_once() {
        let mut session = create_test_session();

        assert_eq!(session.ring_elapsed(), Duration::ZERO);
        assert!(session.start_ring_timer());

        tokio::time::advance(Duration::from_secs(7)).await;
        assert!(!session.start_ring_timer());
        assert_eq!(session.ring_elapsed(), Duration::from_secs(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ring_timer_restart_resets_elapsed() {
        let mut session = create_test_session();
        session.start_ring_timer();

        tokio::time::advance(Duration::from_secs(20)).await;
        session.restart_ring_timer();
        assert_eq!(session.ring_elapsed(), Duration::ZERO);

        tokio::time::advance(Duration::from_secs(3)).await;
        assert_eq!(session.ring_elapsed(), Duration::from_secs(3));
    }
}

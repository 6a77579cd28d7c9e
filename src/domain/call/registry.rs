//! In-memory call session registry

use crate::domain::call::aggregate::{CallSession, CallSummary};
use crate::domain::call::entity::CalleeInfo;
use crate::domain::call::value_object::CallTarget;
use crate::domain::shared::error::DomainError;
use crate::domain::shared::result::Result;
use crate::domain::shared::value_objects::{AssetId, CallId, TenantId};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard, RwLock};
use tokio::time::Instant;

/// Shared handle to one registered session
///
/// Two locks with distinct roles: `turn` serializes event handling for the
/// call and may be held across remote commands and deliberate waits; `data`
/// guards the session fields and is only held for synchronous access.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    inner: Arc<SessionEntry>,
}

#[derive(Debug)]
struct SessionEntry {
    turn: Mutex<()>,
    data: Mutex<CallSession>,
}

impl SessionHandle {
    fn new(session: CallSession) -> Self {
        Self {
            inner: Arc::new(SessionEntry {
                turn: Mutex::new(()),
                data: Mutex::new(session),
            }),
        }
    }

    /// Take the call's turn; one event handler runs at a time per call
    pub async fn begin_turn(&self) -> MutexGuard<'_, ()> {
        self.inner.turn.lock().await
    }

    /// Read session fields; the closure must not block
    pub async fn read<R>(&self, f: impl FnOnce(&CallSession) -> R) -> R {
        let session = self.inner.data.lock().await;
        f(&session)
    }

    /// Update session fields; the closure must not block
    pub async fn update<R>(&self, f: impl FnOnce(&mut CallSession) -> R) -> R {
        let mut session = self.inner.data.lock().await;
        f(&mut session)
    }
}

/// Owned registry of live notification calls
///
/// Sessions are constructed and discarded here and nowhere else. Lookups
/// distinguish calls that were never registered from calls torn down
/// moments ago: removal leaves a tombstone behind for a short TTL, purged
/// lazily on later registry traffic.
#[derive(Debug)]
pub struct CallRegistry {
    sessions: RwLock<HashMap<CallId, SessionHandle>>,
    tombstones: RwLock<HashMap<CallId, Instant>>,
    tombstone_ttl: Duration,
}

impl CallRegistry {
    pub fn new(tombstone_ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            tombstones: RwLock::new(HashMap::new()),
            tombstone_ttl,
        }
    }

    /// Register a freshly placed call
    pub async fn create(
        &self,
        call_id: CallId,
        greeting_asset: AssetId,
        callee: CalleeInfo,
        target: CallTarget,
        tenant: TenantId,
    ) -> Result<SessionHandle> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&call_id) {
            return Err(DomainError::DuplicateCallId(call_id.to_string()));
        }

        // The platform may recycle an id; a fresh registration clears its tombstone
        self.tombstones.write().await.remove(&call_id);

        let handle = SessionHandle::new(CallSession::new(
            call_id.clone(),
            greeting_asset,
            callee,
            target,
            tenant,
        ));
        sessions.insert(call_id, handle.clone());
        Ok(handle)
    }

    /// Look up a live session
    pub async fn get(&self, call_id: &CallId) -> Result<SessionHandle> {
        if let Some(handle) = self.sessions.read().await.get(call_id) {
            return Ok(handle.clone());
        }

        let mut tombstones = self.tombstones.write().await;
        Self::purge_expired(&mut tombstones, self.tombstone_ttl);
        if tombstones.contains_key(call_id) {
            return Err(DomainError::CallAlreadyEnded(call_id.to_string()));
        }

        Err(DomainError::UnknownCallId(call_id.to_string()))
    }

    /// Drop a session and leave a tombstone behind
    pub async fn remove(&self, call_id: &CallId) {
        let removed = self.sessions.write().await.remove(call_id);
        if removed.is_some() {
            let mut tombstones = self.tombstones.write().await;
            Self::purge_expired(&mut tombstones, self.tombstone_ttl);
            tombstones.insert(call_id.clone(), Instant::now());
        }
    }

    pub async fn active_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Snapshot every live session
    pub async fn summaries(&self) -> Vec<CallSummary> {
        let handles: Vec<SessionHandle> = self.sessions.read().await.values().cloned().collect();

        let mut summaries = Vec::with_capacity(handles.len());
        for handle in handles {
            summaries.push(handle.read(|session| session.summary()).await);
        }
        summaries
    }

    /// Snapshot a single live session
    pub async fn summary_of(&self, call_id: &CallId) -> Option<CallSummary> {
        let handle = self.sessions.read().await.get(call_id).cloned()?;
        Some(handle.read(|session| session.summary()).await)
    }

    fn purge_expired(tombstones: &mut HashMap<CallId, Instant>, ttl: Duration) {
        tombstones.retain(|_, removed_at| removed_at.elapsed() < ttl);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::call::value_object::SessionState;

    const TTL: Duration = Duration::from_secs(30);

    async fn register(registry: &CallRegistry, id: &str) -> SessionHandle {
        registry
            .create(
                CallId::new(id),
                AssetId::generate(),
                CalleeInfo::new("Alice"),
                CallTarget::User {
                    id: "u-alice".to_string(),
                },
                TenantId::new("contoso"),
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let registry = CallRegistry::new(TTL);
        register(&registry, "call-1").await;

        let handle = registry.get(&CallId::new("call-1")).await.unwrap();
        let state = handle.read(|s| s.state()).await;
        assert_eq!(state, SessionState::Dialing);
        assert_eq!(registry.active_count().await, 1);
    }

    #[tokio::test]
    async fn test_duplicate_create_is_rejected() {
        let registry = CallRegistry::new(TTL);
        register(&registry, "call-1").await;

        let result = registry
            .create(
                CallId::new("call-1"),
                AssetId::generate(),
                CalleeInfo::new("Bob"),
                CallTarget::Phone {
                    number: "+15550100".to_string(),
                },
                TenantId::new("contoso"),
            )
            .await;
        assert!(matches!(result, Err(DomainError::DuplicateCallId(_))));
        assert_eq!(registry.active_count().await, 1);
    }

    #[tokio::test]
    async fn test_unknown_id() {
        let registry = CallRegistry::new(TTL);
        let result = registry.get(&CallId::new("nope")).await;
        assert!(matches!(result, Err(DomainError::UnknownCallId(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_removed_id_is_tombstoned_until_ttl() {
        let registry = CallRegistry::new(TTL);
        register(&registry, "call-1").await;

        let id = CallId::new("call-1");
        registry.remove(&id).await;
        assert_eq!(registry.active_count().await, 0);

        let result = registry.get(&id).await;
        assert!(matches!(result, Err(DomainError::CallAlreadyEnded(_))));

        // Still distinguishable just before the TTL
        tokio::time::advance(TTL - Duration::from_secs(1)).await;
        let result = registry.get(&id).await;
        assert!(matches!(result, Err(DomainError::CallAlreadyEnded(_))));

        // Evicted afterwards
        tokio::time::advance(Duration::from_secs(2)).await;
        let result = registry.get(&id).await;
        assert!(matches!(result, Err(DomainError::UnknownCallId(_))));
    }

    #[tokio::test]
    async fn test_recreate_clears_tombstone() {
        let registry = CallRegistry::new(TTL);
        register(&registry, "call-1").await;

        let id = CallId::new("call-1");
        registry.remove(&id).await;
        register(&registry, "call-1").await;

        assert!(registry.get(&id).await.is_ok());
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let registry = CallRegistry::new(TTL);
        register(&registry, "call-1").await;

        let id = CallId::new("call-1");
        registry.remove(&id).await;
        registry.remove(&id).await;

        let result = registry.get(&id).await;
        assert!(matches!(result, Err(DomainError::CallAlreadyEnded(_))));
    }

    #[tokio::test]
    async fn test_summaries_cover_all_sessions() {
        let registry = CallRegistry::new(TTL);
        register(&registry, "call-1").await;
        register(&registry, "call-2").await;

        let summaries = registry.summaries().await;
        assert_eq!(summaries.len(), 2);

        let summary = registry.summary_of(&CallId::new("call-2")).await.unwrap();
        assert_eq!(summary.call_id, CallId::new("call-2"));
        assert!(registry.summary_of(&CallId::new("call-3")).await.is_none());
    }

    #[tokio::test]
    async fn test_turn_lock_serializes_handlers() {
        let registry = Arc::new(CallRegistry::new(TTL));
        let handle = register(&registry, "call-1").await;

        let order = Arc::new(Mutex::new(Vec::new()));

        let first = {
            let handle = handle.clone();
            let order = Arc::clone(&order);
            tokio::spawn(async move {
                let _turn = handle.begin_turn().await;
                order.lock().await.push("first-in");
                tokio::task::yield_now().await;
                order.lock().await.push("first-out");
            })
        };

        let second = {
            let handle = handle.clone();
            let order = Arc::clone(&order);
            tokio::spawn(async move {
                // Let the first task win the turn
                tokio::task::yield_now().await;
                let _turn = handle.begin_turn().await;
                order.lock().await.push("second-in");
            })
        };

        first.await.unwrap();
        second.await.unwrap();

        let order = order.lock().await;
        assert_eq!(*order, vec!["first-in", "first-out", "second-in"]);
    }
}

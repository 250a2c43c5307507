//! At most one tailoring run per session.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct InFlightRegistry {
    active: Arc<Mutex<HashSet<Uuid>>>,
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `session_id`. `None` when a run already holds it.
    pub fn try_acquire(&self, session_id: Uuid) -> Option<InFlightGuard> {
        if !lock(&self.active).insert(session_id) {
            return None;
        }
        debug!("Tailoring slot acquired for session {session_id}");
        Some(InFlightGuard {
            active: Arc::clone(&self.active),
            session_id,
        })
    }

    #[cfg(test)]
    pub fn is_active(&self, session_id: Uuid) -> bool {
        lock(&self.active).contains(&session_id)
    }
}

/// Releases the claim on drop, including when the owning future is dropped mid-await.
#[derive(Debug)]
pub struct InFlightGuard {
    active: Arc<Mutex<HashSet<Uuid>>>,
    session_id: Uuid,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        lock(&self.active).remove(&self.session_id);
        debug!("Tailoring slot released for session {}", self.session_id);
    }
}

// The set stays consistent even if a holder panicked, so poisoning is ignored.
fn lock(active: &Mutex<HashSet<Uuid>>) -> MutexGuard<'_, HashSet<Uuid>> {
    active.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_claim_is_refused_until_release() {
        let registry = InFlightRegistry::new();
        let id = Uuid::new_v4();

        let guard = registry.try_acquire(id).unwrap();
        assert!(registry.try_acquire(id).is_none());
        assert!(registry.is_active(id));

        drop(guard);
        assert!(!registry.is_active(id));
        assert!(registry.try_acquire(id).is_some());
    }

    #[test]
    fn test_sessions_are_independent() {
        let registry = InFlightRegistry::new();
        let _a = registry.try_acquire(Uuid::new_v4()).unwrap();
        assert!(registry.try_acquire(Uuid::new_v4()).is_some());
    }

    #[tokio::test]
    async fn test_abandoned_future_releases_claim() {
        let registry = InFlightRegistry::new();
        let id = Uuid::new_v4();
        let held = registry.clone();
        let task = tokio::spawn(async move {
            let _guard = held.try_acquire(id);
            std::future::pending::<()>().await;
        });
        tokio::task::yield_now().await;
        while !registry.is_active(id) {
            tokio::task::yield_now().await;
        }
        task.abort();
        let _ = task.await;
        assert!(!registry.is_active(id));
    }
}

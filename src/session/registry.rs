//! Registry of open session replicas

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};
use tracing::{debug, info};

use crate::error::CommandError;
use super::{normalize_session_id, SessionBackend, TimerSession};

struct OpenSession {
    session: Arc<TimerSession>,
    last_used: Instant,
}

impl OpenSession {
    // Only the registry holds it and nothing is counting down
    fn is_idle(&self, idle: Duration) -> bool {
        self.last_used.elapsed() >= idle
            && Arc::strong_count(&self.session) == 1
            && !self.session.timers().iter().any(|t| t.is_running())
    }
}

/// Opens sessions on first use and keeps them until closed or idle
pub struct SessionRegistry {
    backend: SessionBackend,
    sessions: Mutex<HashMap<String, OpenSession>>,
}

impl SessionRegistry {
    pub fn new(backend: SessionBackend) -> Self {
        Self {
            backend,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Return the open session for an id, opening it if needed
    pub fn get_or_open(&self, raw_id: &str) -> Result<Arc<TimerSession>, CommandError> {
        let id = normalize_session_id(raw_id)?;
        let mut sessions = self.lock();
        if let Some(open) = sessions.get_mut(&id) {
            open.last_used = Instant::now();
            return Ok(Arc::clone(&open.session));
        }

        let session = Arc::new(TimerSession::open(&id, &self.backend)?);
        sessions.insert(
            id,
            OpenSession {
                session: Arc::clone(&session),
                last_used: Instant::now(),
            },
        );
        Ok(session)
    }

    /// Close and forget a session; returns false if it was not open
    pub fn close(&self, raw_id: &str) -> bool {
        let Ok(id) = normalize_session_id(raw_id) else {
            return false;
        };
        match self.lock().remove(&id) {
            Some(open) => {
                open.session.close();
                true
            }
            None => false,
        }
    }

    pub fn close_all(&self) {
        let sessions: Vec<_> = self.lock().drain().map(|(_, open)| open.session).collect();
        info!("Closing {} sessions", sessions.len());
        for session in sessions {
            session.close();
        }
    }

    /// Close sessions unused for at least `idle` that no caller still holds
    /// and that have no running timer; returns how many were closed
    pub fn evict_idle(&self, idle: Duration) -> usize {
        let evicted: Vec<OpenSession> = {
            let mut sessions = self.lock();
            let ids: Vec<String> = sessions
                .iter()
                .filter(|(_, open)| open.is_idle(idle))
                .map(|(id, _)| id.clone())
                .collect();
            ids.iter().filter_map(|id| sessions.remove(id)).collect()
        };

        for open in &evicted {
            debug!("Evicting idle session {}", open.session.id());
            open.session.close();
        }
        evicted.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, OpenSession>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        reconciler::ReconcilerConfig,
        replication::{LoopbackBus, MemoryStore},
        utils::ManualClock,
    };

    fn registry() -> SessionRegistry {
        SessionRegistry::new(SessionBackend {
            transport: Arc::new(LoopbackBus::new()),
            store: Arc::new(MemoryStore::new()),
            clock: Arc::new(ManualClock::new(1_700_000_000_000)),
            reconciler: ReconcilerConfig::default(),
        })
    }

    #[tokio::test]
    async fn reopening_returns_the_same_session() {
        let registry = registry();
        let first = registry.get_or_open("abc").unwrap();
        let second = registry.get_or_open(" ABC ").unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn unused_sessions_are_evicted_and_closed() {
        let registry = registry();
        let session = registry.get_or_open("abc").unwrap();
        session.add_timer("Intro", 3).unwrap();
        drop(session);

        assert_eq!(registry.evict_idle(Duration::ZERO), 1);
        assert!(registry.is_empty());

        // Reopening hydrates from the snapshot cache
        let reopened = registry.get_or_open("abc").unwrap();
        assert_eq!(reopened.timers().len(), 1);
    }

    #[tokio::test]
    async fn recently_used_sessions_stay_open() {
        let registry = registry();
        drop(registry.get_or_open("abc").unwrap());

        assert_eq!(registry.evict_idle(Duration::from_secs(600)), 0);
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn held_sessions_stay_open() {
        let registry = registry();
        let held = registry.get_or_open("abc").unwrap();

        assert_eq!(registry.evict_idle(Duration::ZERO), 0);
        assert!(!held.is_closed());
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn sessions_with_a_running_timer_stay_open() {
        let registry = registry();
        let session = registry.get_or_open("abc").unwrap();
        let id = session.add_timer("Keynote", 5).unwrap();
        session.toggle_timer(&id);
        drop(session);

        assert_eq!(registry.evict_idle(Duration::ZERO), 0);
        assert_eq!(registry.len(), 1);
    }
}

//! Shared helpers for integration tests
#![allow(dead_code)]

use std::{sync::Arc, time::Duration};

use timer_sync::{
    reconciler::ReconcilerConfig,
    replication::{LoopbackBus, MemoryStore},
    session::{SessionBackend, TimerSession},
    state::Collection,
    utils::ManualClock,
};

pub const T0: i64 = 1_700_000_000_000;

/// Collaborators for one replica, with a fast tick and a manual clock
pub struct Replica {
    pub bus: Arc<LoopbackBus>,
    pub store: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
    pub backend: SessionBackend,
}

impl Replica {
    pub fn new(bus: Arc<LoopbackBus>, clock: Arc<ManualClock>) -> Self {
        let store = Arc::new(MemoryStore::new());
        let backend = SessionBackend {
            transport: bus.clone(),
            store: store.clone(),
            clock: clock.clone(),
            reconciler: ReconcilerConfig {
                tick_period: Duration::from_millis(10),
                correction_interval: Duration::from_secs(1),
            },
        };
        Self {
            bus,
            store,
            clock,
            backend,
        }
    }

    pub fn standalone() -> Self {
        Self::new(Arc::new(LoopbackBus::new()), Arc::new(ManualClock::new(T0)))
    }

    pub fn open(&self, session_id: &str) -> TimerSession {
        TimerSession::open(session_id, &self.backend).unwrap()
    }
}

/// Poll until the predicate holds for the session's collection
pub async fn wait_for<F>(session: &TimerSession, predicate: F) -> Collection
where
    F: Fn(&Collection) -> bool,
{
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let timers = session.timers();
            if predicate(&timers) {
                return timers;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time")
}

/// Give background tasks a few scheduling rounds
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

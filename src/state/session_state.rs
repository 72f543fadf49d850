//! One replica's view of a session
//!
//! The collection is replaced wholesale on every local command and every
//! accepted snapshot; it is never edited in place.

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use tokio::sync::watch;
use tracing::debug;

use crate::{
    engine::{apply, Command},
    replication::{ConnectivityMonitor, SessionReplicator},
    utils::Clock,
};
use super::{Collection, TimerRecord};

/// Own publishes remembered while waiting for them to loop back
const MAX_PENDING_ECHOES: usize = 64;

#[derive(Debug, Default)]
struct Replica {
    timers: Collection,
    /// Own local states not yet looped back, oldest first; `None` marks one
    /// that never reached the channel
    pending_echoes: VecDeque<Option<String>>,
}

impl Replica {
    fn track_echo(&mut self, payload: Option<String>) {
        self.pending_echoes.push_back(payload);
        if self.pending_echoes.len() > MAX_PENDING_ECHOES {
            self.pending_echoes.pop_front();
        }
    }
}

/// Shared state of one session replica
pub struct SessionState {
    session_id: String,
    replica: Mutex<Replica>,
    /// Tick-derived remaining time of running timers
    display: Mutex<HashMap<String, u64>>,
    updates: watch::Sender<Collection>,
    replicator: SessionReplicator,
    connectivity: ConnectivityMonitor,
    clock: Arc<dyn Clock>,
}

impl SessionState {
    /// Create the replica state, hydrated from the durable cache
    pub fn new(replicator: SessionReplicator, clock: Arc<dyn Clock>) -> Self {
        let timers = replicator.hydrate();
        let (updates, _) = watch::channel(timers.clone());

        Self {
            session_id: replicator.session_id().to_string(),
            replica: Mutex::new(Replica {
                timers,
                pending_echoes: VecDeque::new(),
            }),
            display: Mutex::new(HashMap::new()),
            updates,
            replicator,
            connectivity: ConnectivityMonitor::new(),
            clock,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn replicator(&self) -> &SessionReplicator {
        &self.replicator
    }

    pub fn connectivity(&self) -> &ConnectivityMonitor {
        &self.connectivity
    }

    pub fn now(&self) -> i64 {
        self.clock.now_millis()
    }

    /// Current collection in insertion order
    pub fn timers(&self) -> Collection {
        self.lock_replica().timers.clone()
    }

    /// Whether the timer is currently running in this replica's collection
    pub fn is_running(&self, id: &str) -> bool {
        self.lock_replica()
            .timers
            .iter()
            .any(|t| t.id == id && t.is_running())
    }

    /// Watch every collection replacement
    pub fn subscribe(&self) -> watch::Receiver<Collection> {
        self.updates.subscribe()
    }

    /// Apply a command, publish the result and return the new collection
    ///
    /// The replica lock is held across apply and publish so a replica's own
    /// commands go out in submission order.
    pub fn submit(&self, command: Command) -> Collection {
        let mut replica = self.lock_replica();
        let next = apply(&replica.timers, &command, self.now());
        debug!("Applied {} to session {}", command.name(), self.session_id);

        replica.timers = next.clone();
        // Tracked even when the broadcast failed so older echoes stay stale
        let payload = self.replicator.publish(&next);
        replica.track_echo(payload);
        drop(replica);

        self.updates.send_replace(next.clone());
        next
    }

    /// Handle a snapshot delivered by the channel; returns true if it replaced local state
    ///
    /// Peer snapshots always win. An echo of this replica's own publish is
    /// skipped when a newer own publish is still in flight.
    pub fn apply_remote(&self, payload: &str) -> bool {
        let mut replica = self.lock_replica();

        let own = replica
            .pending_echoes
            .iter()
            .position(|p| p.as_deref() == Some(payload));
        if let Some(position) = own {
            replica.pending_echoes.drain(..=position);
            if !replica.pending_echoes.is_empty() {
                debug!("Skipping stale echo on session {}", self.session_id);
                return false;
            }
        }

        let Some(timers) = self.replicator.on_remote_update(payload) else {
            return false;
        };
        debug!("Session {} received snapshot with {} timers", self.session_id, timers.len());

        replica.timers = timers.clone();
        drop(replica);

        self.updates.send_replace(timers);
        true
    }

    /// Broadcast the current collection again, used after the channel recovers
    pub fn republish(&self) {
        let mut replica = self.lock_replica();
        let payload = self.replicator.publish(&replica.timers);
        replica.track_echo(payload);
    }

    /// Remaining time to show for a timer: tick-derived while running, authoritative otherwise
    pub fn displayed_time(&self, record: &TimerRecord) -> u64 {
        if record.is_running() {
            if let Some(value) = self.lock_display().get(&record.id) {
                return (*value).min(record.current_time);
            }
        }
        record.current_time
    }

    pub fn set_display(&self, id: &str, seconds: u64) {
        self.lock_display().insert(id.to_string(), seconds);
    }

    pub fn clear_display(&self, id: &str) {
        self.lock_display().remove(id);
    }

    fn lock_replica(&self) -> MutexGuard<'_, Replica> {
        self.replica.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_display(&self) -> MutexGuard<'_, HashMap<String, u64>> {
        self.display.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

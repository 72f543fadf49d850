//! Timer session handle

use std::sync::{Arc, Mutex, PoisonError};
use tokio::{sync::watch, task::JoinHandle};
use tracing::info;

use crate::{
    engine::Command,
    error::CommandError,
    reconciler::ReconcilerConfig,
    replication::{SessionReplicator, SnapshotStore, Transport},
    state::{Collection, SessionState, TimerRecord},
    tasks::{channel_listener_task, tick_supervisor_task},
    utils::Clock,
};
use super::normalize_session_id;

/// Collaborators every session replica is opened with
#[derive(Clone)]
pub struct SessionBackend {
    pub transport: Arc<dyn Transport>,
    pub store: Arc<dyn SnapshotStore>,
    pub clock: Arc<dyn Clock>,
    pub reconciler: ReconcilerConfig,
}

/// An open replica of a session
///
/// Must be opened inside a tokio runtime. Dropping the handle closes it.
pub struct TimerSession {
    state: Arc<SessionState>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl TimerSession {
    /// Hydrate from the cache, then attach to the session channel
    pub fn open(session_id: &str, backend: &SessionBackend) -> Result<Self, CommandError> {
        let session_id = normalize_session_id(session_id)?;
        let replicator = SessionReplicator::new(
            session_id.clone(),
            Arc::clone(&backend.transport),
            Arc::clone(&backend.store),
        );

        let state = Arc::new(SessionState::new(replicator, Arc::clone(&backend.clock)));
        let subscription = state.replicator().subscribe();

        let listener = tokio::spawn(channel_listener_task(Arc::clone(&state), subscription));
        let supervisor = tokio::spawn(tick_supervisor_task(Arc::clone(&state), backend.reconciler));

        info!("Opened session {} with {} cached timers", session_id, state.timers().len());

        Ok(Self {
            state,
            tasks: Mutex::new(vec![listener, supervisor]),
        })
    }

    pub fn id(&self) -> &str {
        self.state.session_id()
    }

    pub fn state(&self) -> &Arc<SessionState> {
        &self.state
    }

    /// Current collection in insertion order
    pub fn timers(&self) -> Collection {
        self.state.timers()
    }

    /// Remaining time to show for a timer
    pub fn displayed_time(&self, record: &TimerRecord) -> u64 {
        self.state.displayed_time(record)
    }

    /// Whether the broadcast channel is live
    pub fn is_connected(&self) -> bool {
        self.state.connectivity().is_live()
    }

    /// Watch the live flag
    pub fn connectivity(&self) -> watch::Receiver<bool> {
        self.state.connectivity().subscribe()
    }

    /// Watch collection replacements
    pub fn subscribe(&self) -> watch::Receiver<Collection> {
        self.state.subscribe()
    }

    /// Add a paused timer and return its id
    pub fn add_timer(&self, name: &str, minutes: i64) -> Result<String, CommandError> {
        let command = Command::add(name, minutes)?;
        let id = command.timer_id().unwrap_or_default().to_string();
        self.state.submit(command);
        Ok(id)
    }

    pub fn remove_timer(&self, id: &str) -> Collection {
        self.state.submit(Command::remove(id))
    }

    pub fn rename_timer(&self, id: &str, name: &str) -> Result<Collection, CommandError> {
        Ok(self.state.submit(Command::rename(id, name)?))
    }

    pub fn toggle_timer(&self, id: &str) -> Collection {
        self.state.submit(Command::toggle(id))
    }

    pub fn reset_timer(&self, id: &str) -> Collection {
        self.state.submit(Command::reset(id))
    }

    pub fn reset_all(&self) -> Collection {
        self.state.submit(Command::ResetAll)
    }

    pub fn pause_all(&self) -> Collection {
        self.state.submit(Command::PauseAll)
    }

    pub fn set_time(&self, id: &str, seconds: i64) -> Collection {
        self.state.submit(Command::set_time(id, seconds))
    }

    /// Detach from the channel and cancel every tick loop
    pub fn close(&self) {
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        if tasks.is_empty() {
            return;
        }
        for task in tasks.drain(..) {
            task.abort();
        }
        self.state.connectivity().detach();
        info!("Closed session {}", self.id());
    }

    pub fn is_closed(&self) -> bool {
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }
}

impl Drop for TimerSession {
    fn drop(&mut self) {
        self.close();
    }
}

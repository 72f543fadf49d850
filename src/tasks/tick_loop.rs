//! Tick loops for running timers

use std::{
    collections::HashMap,
    sync::{Arc, Weak},
};
use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tracing::{debug, info};

use crate::{
    engine::Command,
    reconciler::{Anchor, ReconcilerConfig, TickReconciler},
    state::{SessionState, TimerRecord},
};

/// Seconds a running record may differ from its loop's anchor before the loop restarts
const REANCHOR_TOLERANCE_SECS: u64 = 1;

/// Advance one running timer's displayed time and push corrections
///
/// Ends after the zero correction, once the timer stops running, or once
/// the session is gone.
pub async fn tick_loop_task(
    state: Weak<SessionState>,
    timer_id: String,
    anchor: Anchor,
    config: ReconcilerConfig,
) {
    let mut reconciler = TickReconciler::new(anchor, &config);
    let mut interval = tokio::time::interval(config.tick_period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        interval.tick().await;

        let Some(state) = state.upgrade() else {
            break;
        };

        // The supervisor aborts this loop only after it sees the change
        if !state.is_running(&timer_id) {
            debug!("Timer {} no longer running, tick loop exits", timer_id);
            break;
        }

        let outcome = reconciler.tick(state.now());
        state.set_display(&timer_id, outcome.displayed);

        if let Some(seconds) = outcome.correction {
            debug!("Timer {} correction to {}s", timer_id, seconds);
            state.submit(Command::SetTime {
                id: timer_id.clone(),
                seconds,
            });
        }

        if reconciler.is_finished() {
            info!("Timer {} reached zero", timer_id);
            break;
        }
    }
}

struct TickHandle {
    anchor: Anchor,
    handle: JoinHandle<()>,
}

/// Keeps exactly one tick loop per running timer
///
/// Dropping the supervisor aborts every loop it started.
pub struct TickSupervisor {
    config: ReconcilerConfig,
    loops: HashMap<String, TickHandle>,
}

impl TickSupervisor {
    pub fn new(config: ReconcilerConfig) -> Self {
        Self {
            config,
            loops: HashMap::new(),
        }
    }

    /// Number of live loops
    pub fn active(&self) -> usize {
        self.loops.values().filter(|l| !l.handle.is_finished()).count()
    }

    /// Start loops for newly running timers and stop loops for the rest
    pub fn sync(&mut self, state: &Arc<SessionState>, timers: &[TimerRecord]) {
        let running: HashMap<&str, &TimerRecord> = timers
            .iter()
            .filter(|t| t.is_running())
            .map(|t| (t.id.as_str(), t))
            .collect();

        let stale: Vec<String> = self
            .loops
            .keys()
            .filter(|id| !running.contains_key(id.as_str()))
            .cloned()
            .collect();
        for id in stale {
            self.stop(state, &id);
        }

        for (id, record) in running {
            let reanchor = match self.loops.get(id) {
                Some(existing) => {
                    existing.handle.is_finished() || !tracks(existing.anchor, record)
                }
                None => true,
            };
            if reanchor {
                self.start(state, record);
            }
        }
    }

    /// Abort every loop
    pub fn shutdown(&mut self) {
        for (_, tick) in self.loops.drain() {
            tick.handle.abort();
        }
    }

    fn start(&mut self, state: &Arc<SessionState>, record: &TimerRecord) {
        let anchor = Anchor::from_record(record);
        debug!("Starting tick loop for {} at {}s", record.id, anchor.value);

        let handle = tokio::spawn(tick_loop_task(
            Arc::downgrade(state),
            record.id.clone(),
            anchor,
            self.config,
        ));
        if let Some(previous) = self.loops.insert(record.id.clone(), TickHandle { anchor, handle }) {
            previous.handle.abort();
        }
    }

    fn stop(&mut self, state: &SessionState, id: &str) {
        if let Some(tick) = self.loops.remove(id) {
            debug!("Stopping tick loop for {}", id);
            tick.handle.abort();
        }
        state.clear_display(id);
    }
}

impl Drop for TickSupervisor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// A record still belongs to a loop when its time matches what the anchor
// predicts; corrections do, a resume after a pause or a reset does not.
fn tracks(anchor: Anchor, record: &TimerRecord) -> bool {
    let expected = anchor.displayed_at(record.last_update);
    expected.abs_diff(record.current_time) <= REANCHOR_TOLERANCE_SECS
}

/// Follow the session's collection and keep tick loops in step with it
pub async fn tick_supervisor_task(state: Arc<SessionState>, config: ReconcilerConfig) {
    info!("Starting tick supervisor for session {}", state.session_id());

    let mut updates = state.subscribe();
    let mut supervisor = TickSupervisor::new(config);

    loop {
        let timers = updates.borrow_and_update().clone();
        supervisor.sync(&state, &timers);
        debug!("Session {} has {} tick loops", state.session_id(), supervisor.active());

        if updates.changed().await.is_err() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        replication::{LoopbackBus, MemoryStore, SessionReplicator},
        state::TimerStatus,
        utils::ManualClock,
    };
    use std::time::Duration;

    fn session_state(clock: Arc<ManualClock>) -> Arc<SessionState> {
        let replicator = SessionReplicator::new(
            "TICK",
            Arc::new(LoopbackBus::new()),
            Arc::new(MemoryStore::new()),
        );
        Arc::new(SessionState::new(replicator, clock))
    }

    fn fast() -> ReconcilerConfig {
        ReconcilerConfig {
            tick_period: Duration::from_millis(5),
            correction_interval: Duration::from_secs(1),
        }
    }

    const T0: i64 = 1_700_000_000_000;

    fn running(current: u64, last_update: i64) -> TimerRecord {
        let mut record = TimerRecord::new("t".into(), "t".into(), 300, last_update);
        record.current_time = current;
        record.status = TimerStatus::Running;
        record
    }

    #[test]
    fn own_corrections_keep_the_anchor() {
        let anchor = Anchor { time: T0, value: 300 };
        assert!(tracks(anchor, &running(290, T0 + 10_050)));
        assert!(tracks(anchor, &running(289, T0 + 10_000)));
    }

    #[test]
    fn resume_after_pause_moves_the_anchor() {
        let anchor = Anchor { time: T0, value: 300 };
        // Paused at 290 for a minute, then resumed
        assert!(!tracks(anchor, &running(290, T0 + 70_000)));
        // Reset and restarted
        assert!(!tracks(anchor, &running(300, T0 + 20_000)));
    }

    #[tokio::test]
    async fn finished_loop_is_restarted_for_a_running_record() {
        let clock = Arc::new(ManualClock::new(T0));
        let state = session_state(Arc::clone(&clock));
        let timers = state.submit(Command::add("Talk", 1).unwrap());
        let id = timers[0].id.clone();
        state.submit(Command::toggle(id.clone()));

        let mut supervisor = TickSupervisor::new(fast());
        clock.set(T0 + 60_000);
        supervisor.sync(&state, &state.timers());

        tokio::time::timeout(Duration::from_secs(2), async {
            while supervisor.active() > 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
        assert_eq!(state.timers()[0].status, TimerStatus::Finished);

        // A peer's late correction lands with the timer still running
        let mut late = running(1, T0 + 59_500);
        late.id = id;
        supervisor.sync(&state, &[late]);
        assert_eq!(supervisor.active(), 1);
    }

    #[tokio::test]
    async fn loop_does_not_correct_a_paused_timer() {
        let clock = Arc::new(ManualClock::new(T0));
        let state = session_state(Arc::clone(&clock));
        let timers = state.submit(Command::add("Talk", 1).unwrap());
        let id = timers[0].id.clone();
        clock.set(T0 + 60_000);

        // Anchor from an earlier running period
        let anchor = Anchor { time: T0, value: 60 };
        tokio::time::timeout(
            Duration::from_secs(2),
            tick_loop_task(Arc::downgrade(&state), id, anchor, fast()),
        )
        .await
        .unwrap();

        let after = state.timers();
        assert_eq!(after[0].status, TimerStatus::Paused);
        assert_eq!(after[0].current_time, 60);
    }
}

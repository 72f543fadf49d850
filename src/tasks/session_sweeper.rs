//! Idle session sweeper background task

use std::{sync::Arc, time::Duration};
use tokio::time::interval;
use tracing::{debug, info};

use crate::state::AppState;

/// Longest wait between sweeps
const MAX_SWEEP_PERIOD: Duration = Duration::from_secs(60);

/// Background task that closes sessions left idle for `idle`
pub async fn session_sweeper_task(state: Arc<AppState>, idle: Duration) {
    info!("Starting session sweeper, idle timeout {}s", idle.as_secs());

    let period = idle.clamp(Duration::from_secs(1), MAX_SWEEP_PERIOD);
    let mut interval = interval(period);

    loop {
        interval.tick().await;

        let evicted = state.registry.evict_idle(idle);
        if evicted > 0 {
            info!("Closed {} idle sessions", evicted);
        } else {
            debug!("No idle sessions, {} open", state.registry.len());
        }
    }
}

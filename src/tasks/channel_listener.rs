//! Broadcast channel listener background task

use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use crate::{replication::Subscription, state::SessionState};

/// Apply snapshots arriving on the session channel and track its status
pub async fn channel_listener_task(state: Arc<SessionState>, mut subscription: Subscription) {
    info!("Starting channel listener for session {}", state.session_id());

    let initial = *subscription.status.borrow_and_update();
    state.connectivity().observe(initial);

    loop {
        tokio::select! {
            message = subscription.messages.recv() => match message {
                Ok(payload) => {
                    state.apply_remote(&payload);
                }
                Err(RecvError::Lagged(skipped)) => {
                    // Later snapshots supersede the skipped ones
                    warn!("Session {} listener lagged, skipped {} snapshots", state.session_id(), skipped);
                }
                Err(RecvError::Closed) => {
                    warn!("Channel for session {} closed", state.session_id());
                    break;
                }
            },

            changed = subscription.status.changed() => {
                if changed.is_err() {
                    warn!("Channel status for session {} no longer reported", state.session_id());
                    break;
                }
                let status = *subscription.status.borrow_and_update();
                debug!("Session {} channel status: {:?}", state.session_id(), status);
                if state.connectivity().observe(status) {
                    info!("Session {} channel recovered, republishing", state.session_id());
                    state.republish();
                }
            }
        }
    }

    state.connectivity().detach();
}

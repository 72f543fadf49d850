//! Connectivity monitor for a session's broadcast channel

use tokio::sync::watch;
use tracing::info;

use super::ChannelStatus;

/// Tracks whether the replicator currently has a live upstream channel
#[derive(Debug)]
pub struct ConnectivityMonitor {
    live: watch::Sender<bool>,
}

impl ConnectivityMonitor {
    pub fn new() -> Self {
        let (live, _) = watch::channel(false);
        Self { live }
    }

    pub fn is_live(&self) -> bool {
        *self.live.borrow()
    }

    /// Watch the live flag
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.live.subscribe()
    }

    /// Record a channel status; returns true when the channel just recovered
    pub fn observe(&self, status: ChannelStatus) -> bool {
        let live = status == ChannelStatus::Subscribed;
        let was_live = self.live.send_replace(live);
        if was_live != live {
            info!("Channel {}", if live { "subscribed" } else { "lost" });
        }
        live && !was_live
    }

    /// Mark the channel as detached
    pub fn detach(&self) {
        self.live.send_replace(false);
    }
}

impl Default for ConnectivityMonitor {
    fn default() -> Self {
        Self::new()
    }
}

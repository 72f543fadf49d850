//! Snapshot replication for one session

use std::sync::Arc;
use tracing::{debug, warn};

use crate::state::{Collection, TimerRecord};
use super::{Subscription, SnapshotStore, Transport};

/// Publishes, receives and caches whole-collection snapshots for one session
#[derive(Clone)]
pub struct SessionReplicator {
    session_id: String,
    transport: Arc<dyn Transport>,
    store: Arc<dyn SnapshotStore>,
}

impl SessionReplicator {
    pub fn new(
        session_id: impl Into<String>,
        transport: Arc<dyn Transport>,
        store: Arc<dyn SnapshotStore>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            transport,
            store,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Broadcast channel name for this session
    pub fn channel_name(&self) -> String {
        format!("session:{}", self.session_id)
    }

    /// Durable cache key for this session
    pub fn cache_key(&self) -> String {
        format!("timers_{}", self.session_id)
    }

    /// Load the cached collection; missing, unreadable or malformed caches yield an empty one
    pub fn hydrate(&self) -> Collection {
        let key = self.cache_key();
        let payload = match self.store.get(&key) {
            Ok(Some(payload)) => payload,
            Ok(None) => {
                debug!("No cached snapshot for {}", key);
                return Vec::new();
            }
            Err(e) => {
                warn!("Failed to read cached snapshot {}: {}", key, e);
                return Vec::new();
            }
        };

        match serde_json::from_str::<Collection>(&payload) {
            Ok(timers) => {
                debug!("Hydrated {} timers from {}", timers.len(), key);
                timers
            }
            Err(e) => {
                warn!("Ignoring malformed cached snapshot {}: {}", key, e);
                Vec::new()
            }
        }
    }

    pub fn subscribe(&self) -> Subscription {
        self.transport.subscribe(&self.channel_name())
    }

    /// Cache the collection and broadcast it
    ///
    /// Returns the payload when the channel accepted it. The cache write
    /// happens even when the channel is down.
    pub fn publish(&self, timers: &[TimerRecord]) -> Option<String> {
        let payload = match serde_json::to_string(timers) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Failed to serialize snapshot for {}: {}", self.session_id, e);
                return None;
            }
        };

        self.cache(&payload);

        match self.transport.publish(&self.channel_name(), payload.clone()) {
            Ok(()) => Some(payload),
            Err(e) => {
                warn!("Snapshot for {} not broadcast: {}", self.session_id, e);
                None
            }
        }
    }

    /// Decode a snapshot received from the channel and refresh the cache
    pub fn on_remote_update(&self, payload: &str) -> Option<Collection> {
        match serde_json::from_str::<Collection>(payload) {
            Ok(timers) => {
                self.cache(payload);
                Some(timers)
            }
            Err(e) => {
                warn!("Dropping malformed snapshot on {}: {}", self.channel_name(), e);
                None
            }
        }
    }

    fn cache(&self, payload: &str) {
        if let Err(e) = self.store.set(&self.cache_key(), payload) {
            warn!("Failed to cache snapshot for {}: {}", self.session_id, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replication::{LoopbackBus, MemoryStore};

    fn replicator(store: Arc<MemoryStore>, bus: Arc<LoopbackBus>) -> SessionReplicator {
        SessionReplicator::new("ABC123", bus, store)
    }

    fn sample() -> Collection {
        vec![TimerRecord::new("t1".into(), "Speaker".into(), 300, 42)]
    }

    #[test]
    fn names_follow_session_id() {
        let r = replicator(Arc::new(MemoryStore::new()), Arc::new(LoopbackBus::new()));
        assert_eq!(r.channel_name(), "session:ABC123");
        assert_eq!(r.cache_key(), "timers_ABC123");
    }

    #[test]
    fn hydrate_treats_malformed_cache_as_empty() {
        let store = Arc::new(MemoryStore::new());
        store.set("timers_ABC123", "{not json").unwrap();
        let r = replicator(store, Arc::new(LoopbackBus::new()));

        assert!(r.hydrate().is_empty());
    }

    #[test]
    fn publish_caches_even_when_offline() {
        let store = Arc::new(MemoryStore::new());
        let bus = Arc::new(LoopbackBus::new());
        bus.set_online(false);
        let r = replicator(Arc::clone(&store), bus);

        assert!(r.publish(&sample()).is_none());
        assert_eq!(r.hydrate(), sample());
    }

    #[tokio::test]
    async fn publish_reaches_subscribers() {
        let bus = Arc::new(LoopbackBus::new());
        let r = replicator(Arc::new(MemoryStore::new()), bus);
        let mut sub = r.subscribe();

        let payload = r.publish(&sample()).unwrap();
        let received = sub.messages.recv().await.unwrap();
        assert_eq!(received, payload);
        assert_eq!(r.on_remote_update(&received), Some(sample()));
    }

    #[test]
    fn remote_update_refreshes_cache() {
        let store = Arc::new(MemoryStore::new());
        let r = replicator(Arc::clone(&store), Arc::new(LoopbackBus::new()));
        let payload = serde_json::to_string(&sample()).unwrap();

        assert!(r.on_remote_update("garbage").is_none());
        assert!(store.get("timers_ABC123").unwrap().is_none());

        r.on_remote_update(&payload);
        assert_eq!(store.get("timers_ABC123").unwrap(), Some(payload));
    }
}

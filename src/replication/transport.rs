//! Broadcast channel port and an in-process implementation

use std::{
    collections::HashMap,
    sync::{Mutex, PoisonError},
};
use serde::Serialize;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info};

use crate::error::TransportError;

const CHANNEL_CAPACITY: usize = 256;

/// Subscription state of a channel as reported by the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelStatus {
    Subscribed,
    Disconnected,
}

/// A live subscription to one named channel
pub struct Subscription {
    /// Raw snapshot payloads, including this replica's own publishes
    pub messages: broadcast::Receiver<String>,
    /// Channel status updates
    pub status: watch::Receiver<ChannelStatus>,
}

/// Named pub/sub channels shared by every replica of a session
pub trait Transport: Send + Sync {
    /// Start listening on a channel; dropping the subscription detaches it
    fn subscribe(&self, channel: &str) -> Subscription;

    /// Hand a payload to the channel without waiting for delivery
    fn publish(&self, channel: &str, payload: String) -> Result<(), TransportError>;
}

/// In-process bus; every subscriber, including the publisher, receives each message
pub struct LoopbackBus {
    channels: Mutex<HashMap<String, broadcast::Sender<String>>>,
    status: watch::Sender<ChannelStatus>,
}

impl LoopbackBus {
    pub fn new() -> Self {
        let (status, _) = watch::channel(ChannelStatus::Subscribed);
        Self {
            channels: Mutex::new(HashMap::new()),
            status,
        }
    }

    /// Simulate the upstream link going down or coming back
    pub fn set_online(&self, online: bool) {
        let status = if online {
            ChannelStatus::Subscribed
        } else {
            ChannelStatus::Disconnected
        };
        info!("Loopback bus status changed to {:?}", status);
        self.status.send_replace(status);
    }

    pub fn is_online(&self) -> bool {
        *self.status.borrow() == ChannelStatus::Subscribed
    }

    fn sender(&self, channel: &str) -> broadcast::Sender<String> {
        let mut channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
        channels
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .clone()
    }
}

impl Default for LoopbackBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for LoopbackBus {
    fn subscribe(&self, channel: &str) -> Subscription {
        debug!("Subscribing to {}", channel);
        Subscription {
            messages: self.sender(channel).subscribe(),
            status: self.status.subscribe(),
        }
    }

    fn publish(&self, channel: &str, payload: String) -> Result<(), TransportError> {
        if !self.is_online() {
            return Err(TransportError::Offline(channel.to_string()));
        }
        // No receivers just means nobody is listening yet
        let delivered = self.sender(channel).send(payload).unwrap_or(0);
        debug!("Published on {} to {} receivers", channel, delivered);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publisher_receives_its_own_message() {
        let bus = LoopbackBus::new();
        let mut sub = bus.subscribe("session:A");

        bus.publish("session:A", "[]".to_string()).unwrap();
        assert_eq!(sub.messages.recv().await.unwrap(), "[]");
    }

    #[tokio::test]
    async fn channels_are_isolated() {
        let bus = LoopbackBus::new();
        let mut a = bus.subscribe("session:A");
        let _b = bus.subscribe("session:B");

        bus.publish("session:B", "b".to_string()).unwrap();
        bus.publish("session:A", "a".to_string()).unwrap();
        assert_eq!(a.messages.recv().await.unwrap(), "a");
    }

    #[test]
    fn offline_bus_rejects_publish() {
        let bus = LoopbackBus::new();
        let sub = bus.subscribe("session:A");
        bus.set_online(false);

        assert_eq!(*sub.status.borrow(), ChannelStatus::Disconnected);
        assert_eq!(
            bus.publish("session:A", "[]".to_string()),
            Err(TransportError::Offline("session:A".to_string()))
        );
    }
}

//! Error types shared across the crate
//!
//! Only `CommandError` is ever surfaced to callers. Store and transport
//! failures are logged by the replicator and degrade to last-known state.

use thiserror::Error;

/// Rejected command input, caught before a command reaches the engine
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("timer name must not be empty")]
    EmptyName,

    #[error("session id must not be empty")]
    EmptySessionId,
}

/// Durable snapshot cache failures
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cache io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache lock poisoned")]
    LockPoisoned,
}

/// Broadcast channel failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("channel {0} is not subscribed")]
    Offline(String),
}

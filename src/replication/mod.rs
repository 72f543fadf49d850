//! Session replication module
//!
//! Moves whole-collection snapshots between replicas over a broadcast
//! channel and keeps the last snapshot in a durable cache per session.

pub mod connectivity;
pub mod replicator;
pub mod store;
pub mod transport;

// Re-export main types
pub use connectivity::ConnectivityMonitor;
pub use replicator::SessionReplicator;
pub use store::{FileStore, MemoryStore, SnapshotStore};
pub use transport::{ChannelStatus, LoopbackBus, Subscription, Transport};

//! Timer Sync - shared countdown timers kept consistent across devices
//!
//! This library provides the timer engine, the tick reconciler that derives
//! displayed time from wall-clock time, and the replication layer that keeps
//! every replica of a session on the same collection of timers.

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod reconciler;
pub mod replication;
pub mod session;
pub mod state;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use api::create_router;
pub use config::Config;
pub use engine::{apply, Command};
pub use error::CommandError;
pub use session::{SessionBackend, SessionRegistry, TimerSession};
pub use state::{AppState, TimerRecord, TimerStatus};
pub use utils::signals::shutdown_signal;

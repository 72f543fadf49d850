//! Background tasks module
//!
//! Each open session runs a channel listener and a tick supervisor, which in
//! turn runs one tick loop per running timer. The server runs one sweeper
//! that closes idle sessions.

pub mod channel_listener;
pub mod session_sweeper;
pub mod tick_loop;

// Re-export main functions
pub use channel_listener::channel_listener_task;
pub use session_sweeper::session_sweeper_task;
pub use tick_loop::{tick_loop_task, tick_supervisor_task, TickSupervisor};

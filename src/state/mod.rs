//! State management module
//!
//! The timer record model, per-session replica state and the server-wide
//! application state.

pub mod app_state;
pub mod session_state;
pub mod timer_record;

// Re-export main types
pub use app_state::AppState;
pub use session_state::SessionState;
pub use timer_record::{Collection, TimerRecord, TimerStatus};

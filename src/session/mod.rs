//! Session lifecycle module
//!
//! A `TimerSession` is one replica of a shared session: opening it hydrates
//! from the cache and attaches to the broadcast channel, closing it detaches
//! and cancels every tick loop.

pub mod handle;
pub mod registry;

// Re-export main types
pub use handle::{SessionBackend, TimerSession};
pub use registry::SessionRegistry;

use crate::error::CommandError;

/// Trim and upper-case a session code as typed or pasted by a user
pub fn normalize_session_id(raw: &str) -> Result<String, CommandError> {
    let id = raw.trim().to_uppercase();
    if id.is_empty() {
        return Err(CommandError::EmptySessionId);
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_ids_are_normalized() {
        assert_eq!(normalize_session_id("  ab12cd ").unwrap(), "AB12CD");
        assert_eq!(normalize_session_id(" "), Err(CommandError::EmptySessionId));
    }
}

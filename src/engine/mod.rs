//! Timer engine module
//!
//! The engine is the only place a collection changes. Commands are validated
//! when they are built; `apply` itself never fails.

pub mod command;
pub mod reducer;

// Re-export main types
pub use command::Command;
pub use reducer::apply;

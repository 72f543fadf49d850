//! Commands accepted by the timer engine

use uuid::Uuid;

use crate::error::CommandError;

/// A single mutation request against a session's collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Append a new paused timer; `id` is generated before the command is applied
    Add { id: String, name: String, initial_time: u64 },
    Remove { id: String },
    Rename { id: String, name: String },
    Toggle { id: String },
    Reset { id: String },
    ResetAll,
    PauseAll,
    SetTime { id: String, seconds: u64 },
}

impl Command {
    /// Build an Add command, trimming the name and clamping minutes to at least one
    pub fn add(name: &str, minutes: i64) -> Result<Self, CommandError> {
        let name = clean_name(name)?;
        let minutes = minutes.max(1) as u64;

        Ok(Command::Add {
            id: Uuid::new_v4().to_string(),
            name,
            initial_time: minutes.saturating_mul(60),
        })
    }

    /// Build a Rename command, rejecting names that are blank after trimming
    pub fn rename(id: impl Into<String>, name: &str) -> Result<Self, CommandError> {
        Ok(Command::Rename {
            id: id.into(),
            name: clean_name(name)?,
        })
    }

    pub fn remove(id: impl Into<String>) -> Self {
        Command::Remove { id: id.into() }
    }

    pub fn toggle(id: impl Into<String>) -> Self {
        Command::Toggle { id: id.into() }
    }

    pub fn reset(id: impl Into<String>) -> Self {
        Command::Reset { id: id.into() }
    }

    /// Negative inputs are treated as zero
    pub fn set_time(id: impl Into<String>, seconds: i64) -> Self {
        Command::SetTime {
            id: id.into(),
            seconds: seconds.max(0) as u64,
        }
    }

    /// The timer a command targets; None for the collection-wide commands
    pub fn timer_id(&self) -> Option<&str> {
        match self {
            Command::Add { id, .. }
            | Command::Remove { id }
            | Command::Rename { id, .. }
            | Command::Toggle { id }
            | Command::Reset { id }
            | Command::SetTime { id, .. } => Some(id.as_str()),
            Command::ResetAll | Command::PauseAll => None,
        }
    }

    /// Short label used in log lines
    pub fn name(&self) -> &'static str {
        match self {
            Command::Add { .. } => "add",
            Command::Remove { .. } => "remove",
            Command::Rename { .. } => "rename",
            Command::Toggle { .. } => "toggle",
            Command::Reset { .. } => "reset",
            Command::ResetAll => "reset-all",
            Command::PauseAll => "pause-all",
            Command::SetTime { .. } => "set-time",
        }
    }
}

fn clean_name(name: &str) -> Result<String, CommandError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CommandError::EmptyName);
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_clamps_minutes_and_trims_name() {
        let command = Command::add("  Speaker 1 ", 0).unwrap();
        match command {
            Command::Add { id, name, initial_time } => {
                assert!(!id.is_empty());
                assert_eq!(name, "Speaker 1");
                assert_eq!(initial_time, 60);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn add_generates_distinct_ids() {
        let a = Command::add("a", 5).unwrap();
        let b = Command::add("a", 5).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn blank_names_are_rejected() {
        assert_eq!(Command::add("   ", 5), Err(CommandError::EmptyName));
        assert_eq!(Command::rename("x", "\t"), Err(CommandError::EmptyName));
    }

    #[test]
    fn negative_set_time_becomes_zero() {
        assert_eq!(
            Command::set_time("x", -5),
            Command::SetTime { id: "x".into(), seconds: 0 }
        );
    }
}

//! Timer record structure and per-record invariants

use serde::{Deserialize, Serialize};

/// Lifecycle status of a single countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerStatus {
    Paused,
    Running,
    Finished,
}

/// One countdown as it travels on the wire and sits in the cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerRecord {
    /// Stable identity, never reused
    pub id: String,
    /// User-editable label
    pub name: String,
    /// Duration in seconds the timer resets to
    pub initial_time: u64,
    /// Remaining seconds as of `last_update`
    pub current_time: u64,
    pub status: TimerStatus,
    /// Epoch millis of the last authoritative time/status change
    pub last_update: i64,
}

/// A session's ordered collection of timers
pub type Collection = Vec<TimerRecord>;

impl TimerRecord {
    /// Create a fresh paused record with a full countdown
    pub fn new(id: String, name: String, initial_time: u64, now: i64) -> Self {
        Self {
            id,
            name,
            initial_time,
            current_time: initial_time,
            status: TimerStatus::Paused,
            last_update: now,
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == TimerStatus::Running
    }

    pub fn is_finished(&self) -> bool {
        self.status == TimerStatus::Finished
    }

    /// Check the status/time invariants every reachable record satisfies
    pub fn is_consistent(&self) -> bool {
        let finished_ok = !self.is_finished() || self.current_time == 0;
        let running_ok = !self.is_running() || self.current_time > 0;
        finished_ok && running_ok && self.current_time <= self.initial_time
    }

    /// Fraction of the countdown left at `displayed` seconds, guarded against
    /// zero-length timers
    pub fn remaining_ratio(&self, displayed: u64) -> f64 {
        if self.initial_time == 0 {
            return 0.0;
        }
        displayed.min(self.initial_time) as f64 / self.initial_time as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_wire_field_names() {
        let record = TimerRecord::new("t1".into(), "Speaker 1".into(), 300, 1_700_000_000_000);
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["id"], "t1");
        assert_eq!(json["initialTime"], 300);
        assert_eq!(json["currentTime"], 300);
        assert_eq!(json["status"], "paused");
        assert_eq!(json["lastUpdate"], 1_700_000_000_000i64);
    }

    #[test]
    fn parses_snapshot_written_by_web_clients() {
        let payload = r#"[{"id":"1712","name":"Q&A","initialTime":600,"currentTime":0,"status":"finished","lastUpdate":1712000000000}]"#;
        let timers: Collection = serde_json::from_str(payload).unwrap();

        assert_eq!(timers.len(), 1);
        assert!(timers[0].is_finished());
        assert!(timers[0].is_consistent());
    }

    #[test]
    fn remaining_ratio_handles_zero_length() {
        let mut record = TimerRecord::new("z".into(), "zero".into(), 0, 0);
        assert_eq!(record.remaining_ratio(0), 0.0);

        record.initial_time = 120;
        record.current_time = 30;
        assert!((record.remaining_ratio(30) - 0.25).abs() < f64::EPSILON);
        assert_eq!(record.remaining_ratio(500), 1.0);
    }
}

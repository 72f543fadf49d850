//! Tick reconciler
//!
//! Derives a running timer's displayed remaining time from wall-clock time
//! elapsed since an anchor, and decides when a correction should be pushed
//! back through the engine. Scheduling lives in `tasks::tick_loop`; this
//! module is pure so it can be driven by a manual clock.

use std::time::Duration;

use crate::state::TimerRecord;

/// Tick and correction cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcilerConfig {
    /// How often displayed time is recomputed
    pub tick_period: Duration,
    /// Minimum spacing between two non-final corrections
    pub correction_interval: Duration,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            tick_period: Duration::from_millis(100),
            correction_interval: Duration::from_secs(1),
        }
    }
}

/// The zero-point a running timer counts down from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor {
    /// Epoch millis at which `value` was authoritative
    pub time: i64,
    /// Remaining seconds at `time`
    pub value: u64,
}

impl Anchor {
    pub fn from_record(record: &TimerRecord) -> Self {
        Self {
            time: record.last_update,
            value: record.current_time,
        }
    }

    /// Remaining seconds at `now`; never above `value`, never negative
    pub fn displayed_at(&self, now: i64) -> u64 {
        let elapsed_ms = now.saturating_sub(self.time).max(0) as u64;
        self.value.saturating_sub(elapsed_ms / 1000)
    }
}

/// Result of one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickOutcome {
    pub displayed: u64,
    /// Seconds to submit as a SetTime correction, if one is due
    pub correction: Option<u64>,
}

/// Per-timer reconciliation state
#[derive(Debug, Clone)]
pub struct TickReconciler {
    anchor: Anchor,
    correction_interval_ms: i64,
    last_correction_at: i64,
    last_corrected: u64,
    finished: bool,
}

impl TickReconciler {
    pub fn new(anchor: Anchor, config: &ReconcilerConfig) -> Self {
        Self {
            anchor,
            correction_interval_ms: config.correction_interval.as_millis() as i64,
            last_correction_at: anchor.time,
            last_corrected: anchor.value,
            finished: false,
        }
    }

    pub fn anchor(&self) -> Anchor {
        self.anchor
    }

    /// True once the final zero correction has been issued
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Recompute the displayed value and decide whether to correct
    pub fn tick(&mut self, now: i64) -> TickOutcome {
        let displayed = self.anchor.displayed_at(now);

        if self.finished {
            return TickOutcome { displayed, correction: None };
        }

        // Reaching zero bypasses the throttle
        if displayed == 0 {
            self.finished = true;
            self.record_correction(now, 0);
            return TickOutcome { displayed, correction: Some(0) };
        }

        let since_last = now.saturating_sub(self.last_correction_at);
        if since_last > self.correction_interval_ms && displayed != self.last_corrected {
            self.record_correction(now, displayed);
            return TickOutcome { displayed, correction: Some(displayed) };
        }

        TickOutcome { displayed, correction: None }
    }

    fn record_correction(&mut self, now: i64, value: u64) {
        self.last_correction_at = now;
        self.last_corrected = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: i64 = 1_700_000_000_000;

    fn reconciler(value: u64) -> TickReconciler {
        TickReconciler::new(Anchor { time: T0, value }, &ReconcilerConfig::default())
    }

    #[test]
    fn displayed_is_floor_of_elapsed_seconds() {
        let anchor = Anchor { time: T0, value: 10 };
        assert_eq!(anchor.displayed_at(T0), 10);
        assert_eq!(anchor.displayed_at(T0 + 999), 10);
        assert_eq!(anchor.displayed_at(T0 + 1000), 9);
        assert_eq!(anchor.displayed_at(T0 + 60_000), 0);
    }

    #[test]
    fn displayed_never_exceeds_anchor_when_clock_is_behind() {
        let anchor = Anchor { time: T0, value: 10 };
        assert_eq!(anchor.displayed_at(T0 - 5_000), 10);
    }

    #[test]
    fn corrections_are_throttled_to_once_per_interval() {
        let mut r = reconciler(300);
        let mut corrections = Vec::new();
        let mut now = T0;
        while now <= T0 + 5_000 {
            if let Some(value) = r.tick(now).correction {
                corrections.push((now, value));
            }
            now += 100;
        }

        assert!(!corrections.is_empty());
        for pair in corrections.windows(2) {
            assert!(pair[1].0 - pair[0].0 > 1000);
        }
        assert!(corrections.iter().all(|(_, v)| *v < 300));
    }

    #[test]
    fn no_correction_without_visible_change() {
        let mut r = reconciler(300);
        assert_eq!(r.tick(T0 + 500).correction, None);
        assert_eq!(r.tick(T0 + 900).correction, None);
    }

    #[test]
    fn zero_is_corrected_immediately_and_once() {
        let mut r = reconciler(2);
        assert_eq!(r.tick(T0 + 1_100).correction, Some(1));
        // Throttle window still open, zero goes through anyway
        let outcome = r.tick(T0 + 2_000);
        assert_eq!(outcome.displayed, 0);
        assert_eq!(outcome.correction, Some(0));
        assert!(r.is_finished());
        assert_eq!(r.tick(T0 + 2_100).correction, None);
    }

    #[test]
    fn five_minute_timer_finishes_after_three_hundred_seconds() {
        let mut r = reconciler(300);
        let mut last = None;
        let mut now = T0;
        while now <= T0 + 300_000 {
            let outcome = r.tick(now);
            assert!(outcome.displayed <= 300);
            if outcome.correction.is_some() {
                last = outcome.correction;
            }
            now += 100;
        }
        assert_eq!(last, Some(0));
    }
}

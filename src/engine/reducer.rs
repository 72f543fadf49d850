//! Pure reducer from (collection, command) to the next collection

use crate::state::{Collection, TimerRecord, TimerStatus};
use super::Command;

/// Apply a command to a collection, producing the next collection
///
/// `now` is the epoch-millis stamp written to `last_update` by every command
/// that changes time or status. The input is never mutated, and commands that
/// reference an unknown id return an unchanged copy: a peer may have removed
/// the timer concurrently.
pub fn apply(timers: &[TimerRecord], command: &Command, now: i64) -> Collection {
    match command {
        Command::Add { id, name, initial_time } => {
            let mut next = timers.to_vec();
            next.push(TimerRecord::new(id.clone(), name.clone(), *initial_time, now));
            next
        }
        Command::Remove { id } => timers.iter().filter(|t| &t.id != id).cloned().collect(),
        Command::Rename { id, name } => update_one(timers, id, |t| t.name = name.clone()),
        Command::Toggle { id } => update_one(timers, id, |t| toggle(t, now)),
        Command::Reset { id } => update_one(timers, id, |t| reset(t, now)),
        Command::ResetAll => timers
            .iter()
            .cloned()
            .map(|mut t| {
                reset(&mut t, now);
                t
            })
            .collect(),
        Command::PauseAll => timers
            .iter()
            .cloned()
            .map(|mut t| {
                pause(&mut t, now);
                t
            })
            .collect(),
        Command::SetTime { id, seconds } => update_one(timers, id, |t| set_time(t, *seconds, now)),
    }
}

fn update_one<F>(timers: &[TimerRecord], id: &str, updater: F) -> Collection
where
    F: FnOnce(&mut TimerRecord),
{
    let mut next = timers.to_vec();
    if let Some(record) = next.iter_mut().find(|t| t.id == id) {
        updater(record);
    }
    next
}

fn toggle(record: &mut TimerRecord, now: i64) {
    if record.status == TimerStatus::Running {
        record.status = TimerStatus::Paused;
        record.last_update = now;
    } else if record.current_time > 0 {
        record.status = TimerStatus::Running;
        record.last_update = now;
    }
}

fn reset(record: &mut TimerRecord, now: i64) {
    record.current_time = record.initial_time;
    record.status = TimerStatus::Paused;
    record.last_update = now;
}

// Finished timers keep status finished; currentTime is already 0 there.
fn pause(record: &mut TimerRecord, now: i64) {
    if record.status != TimerStatus::Finished {
        record.status = TimerStatus::Paused;
    }
    record.last_update = now;
}

fn set_time(record: &mut TimerRecord, seconds: u64, now: i64) {
    // Only Reset leaves finished
    if record.status == TimerStatus::Finished && seconds > 0 {
        return;
    }
    let seconds = seconds.min(record.initial_time);
    record.current_time = seconds;
    if seconds == 0 {
        record.status = TimerStatus::Finished;
    }
    record.last_update = now;
}

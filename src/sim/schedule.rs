//! Fire-once delayed events keyed by the game clock
//!
//! Phase changes that happen "a bit later" (playback start after the
//! connecting animation, level reset after a win or loss) are queued here and
//! polled every tick. Starting a level clears the queue, so stale events from
//! a previous attempt can never fire into the new one.

use serde::{Deserialize, Serialize};

/// Deferred actions the tick knows how to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduledAction {
    /// Connecting finished: start the song and go Active
    BeginPlayback,
    /// Reload the current level (after a loss) or the next one (after a win)
    StartLevel { index: usize },
    /// Close the hub doors (presentation cue)
    CloseHub,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct Entry {
    due: f64,
    /// Insertion order breaks ties between events due at the same time
    seq: u64,
    action: ScheduledAction,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scheduler {
    entries: Vec<Entry>,
    next_seq: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `action` to fire once `delay` seconds after `now`
    pub fn schedule(&mut self, now: f64, delay: f32, action: ScheduledAction) {
        let entry = Entry {
            due: now + delay.max(0.0) as f64,
            seq: self.next_seq,
            action,
        };
        self.next_seq += 1;
        log::debug!("Scheduled {:?} at t={:.2}", action, entry.due);
        self.entries.push(entry);
    }

    /// Remove and return every action due at or before `now`, oldest first
    pub fn drain_due(&mut self, now: f64) -> Vec<ScheduledAction> {
        let mut due: Vec<Entry> = Vec::new();
        self.entries.retain(|e| {
            if e.due <= now {
                due.push(*e);
                false
            } else {
                true
            }
        });
        due.sort_by(|a, b| a.due.total_cmp(&b.due).then(a.seq.cmp(&b.seq)));
        due.into_iter().map(|e| e.action).collect()
    }

    /// Drop everything pending
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_once_when_due() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(10.0, 1.0, ScheduledAction::BeginPlayback);
        assert!(scheduler.drain_due(10.5).is_empty());
        assert_eq!(scheduler.drain_due(11.0), vec![ScheduledAction::BeginPlayback]);
        assert!(scheduler.drain_due(20.0).is_empty());
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_drains_in_due_order() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(0.0, 4.0, ScheduledAction::StartLevel { index: 2 });
        scheduler.schedule(0.0, 2.0, ScheduledAction::CloseHub);
        scheduler.schedule(0.0, 2.0, ScheduledAction::BeginPlayback);
        assert_eq!(
            scheduler.drain_due(5.0),
            vec![
                ScheduledAction::CloseHub,
                ScheduledAction::BeginPlayback,
                ScheduledAction::StartLevel { index: 2 },
            ]
        );
    }

    #[test]
    fn test_clear_supersedes_pending() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(0.0, 1.0, ScheduledAction::BeginPlayback);
        scheduler.clear();
        assert!(scheduler.drain_due(100.0).is_empty());
    }
}

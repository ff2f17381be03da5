//! Delayed effects
//!
//! Anything that should happen "some time from now" is queued here with the
//! generation it was scheduled under. The session bumps its generation on
//! every respawn and level change; an action that comes due under a newer
//! generation is dropped.

use serde::{Deserialize, Serialize};

/// What a timer does when it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimedAction {
    /// Speed boost wears off
    EndSpeedBoost,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scheduled {
    pub fire_at_ms: f64,
    pub generation: u64,
    pub action: TimedAction,
}

/// Time-ordered queue of pending actions
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scheduler {
    pending: Vec<Scheduled>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self { pending: Vec::new() }
    }

    pub fn schedule(&mut self, fire_at_ms: f64, generation: u64, action: TimedAction) {
        let entry = Scheduled {
            fire_at_ms,
            generation,
            action,
        };
        // Stable for equal times: earlier schedules fire first
        let index = self.pending.partition_point(|s| s.fire_at_ms <= fire_at_ms);
        self.pending.insert(index, entry);
    }

    /// Remove and return every entry due at `now_ms`, oldest first
    pub fn take_due(&mut self, now_ms: f64) -> Vec<Scheduled> {
        let due = self.pending.partition_point(|s| s.fire_at_ms <= now_ms);
        self.pending.drain(..due).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

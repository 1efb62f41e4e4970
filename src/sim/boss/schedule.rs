//! Per-boss list of delayed sub-attacks
//!
//! Staggered rings and salvos are queued here against the boss's own clock
//! and drained by its update. Death clears the list in one call.

use serde::{Deserialize, Serialize};

/// A deferred attack step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BossAction {
    /// Evenly spaced ring of shots starting at `offset`
    Ring { count: u32, offset: f32 },
    /// One shot at the player's position when the task fires, plus `spread`
    Aimed { spread: f32 },
    /// One shot in a fixed direction
    Shot { angle: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScheduledTask {
    pub fire_at_ms: f64,
    pub action: BossAction,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskSchedule {
    tasks: Vec<ScheduledTask>,
}

impl TaskSchedule {
    pub fn schedule(&mut self, now_ms: f64, delay_ms: f32, action: BossAction) {
        self.tasks.push(ScheduledTask {
            fire_at_ms: now_ms + delay_ms.max(0.0) as f64,
            action,
        });
    }

    /// Remove and return every task due at `now_ms`, earliest first.
    /// Ties keep insertion order.
    pub fn drain_due(&mut self, now_ms: f64) -> Vec<BossAction> {
        let mut due: Vec<ScheduledTask> = Vec::new();
        self.tasks.retain(|task| {
            if task.fire_at_ms <= now_ms {
                due.push(*task);
                false
            } else {
                true
            }
        });
        due.sort_by(|a, b| a.fire_at_ms.total_cmp(&b.fire_at_ms));
        due.into_iter().map(|t| t.action).collect()
    }

    /// Drop everything still queued. Returns how many tasks were cancelled.
    pub fn cancel_all(&mut self) -> usize {
        let n = self.tasks.len();
        self.tasks.clear();
        n
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

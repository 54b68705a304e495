//! Tie-break keys for the ready queue.
//!
//! Priority always dominates; the optimization goal picks the secondary key:
//! - `time`: shorter tasks first
//! - `resources`: tasks needing fewer resource labels first
//! - `cost` and anything else: no secondary preference
//!
//! The key only orders tasks that are ready at the same moment. It never moves
//! a task's start day, which is fixed by its prerequisites.

use std::cmp::Ordering;

use crate::models::{OptimizationGoal, Task};

/// Sort key for ready tasks (lower = picked first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReadyKey {
    pub priority_rank: u8,
    pub secondary: u64,
}

impl Ord for ReadyKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority_rank
            .cmp(&other.priority_rank)
            .then(self.secondary.cmp(&other.secondary))
    }
}

impl PartialOrd for ReadyKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Secondary key for a task under the given goal.
pub fn secondary_key(task: &Task, goal: OptimizationGoal) -> u64 {
    match goal {
        OptimizationGoal::Time => u64::from(task.duration),
        OptimizationGoal::Resources => task.resource_labels.len() as u64,
        OptimizationGoal::Cost | OptimizationGoal::Weather => 0,
    }
}

/// Compute the ready-queue key for a task.
pub fn ready_key(task: &Task, goal: OptimizationGoal) -> ReadyKey {
    ReadyKey {
        priority_rank: task.priority.rank(),
        secondary: secondary_key(task, goal),
    }
}

//! Deferred work.
//!
//! AI steps are queued rather than run inline. Each task carries the game
//! generation it was scheduled under; when the generation has moved on by the
//! time it is popped, the task is stale and is dropped.

use std::collections::VecDeque;

use crate::game::PlayerId;

/// Work that can be deferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Task {
    /// Let `player`'s AI handle its current decision point.
    AiStep {
        /// Player the step was scheduled for.
        player: PlayerId,
    },
}

/// A task stamped with the generation it was scheduled under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledTask {
    /// The work.
    pub task: Task,
    /// Game generation at scheduling time.
    pub generation: u64,
}

/// FIFO of scheduled tasks.
#[derive(Debug, Clone, Default)]
pub struct TaskQueue {
    tasks: VecDeque<ScheduledTask>,
}

impl TaskQueue {
    /// An empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `task` unless an identical one is already waiting.
    ///
    /// Returns whether the task was added.
    pub fn schedule(&mut self, task: Task, generation: u64) -> bool {
        let scheduled = ScheduledTask { task, generation };
        if self.tasks.contains(&scheduled) {
            return false;
        }
        self.tasks.push_back(scheduled);
        true
    }

    /// Take the oldest task.
    pub fn pop(&mut self) -> Option<ScheduledTask> {
        self.tasks.pop_front()
    }

    /// Drop every task, returning how many were dropped.
    pub fn cancel_all(&mut self) -> usize {
        let dropped = self.tasks.len();
        self.tasks.clear();
        dropped
    }

    /// Drop tasks scheduled under any generation other than `generation`.
    pub fn cancel_stale(&mut self, generation: u64) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.generation == generation);
        before - self.tasks.len()
    }

    /// Number of waiting tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether nothing is waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

//! Deferred tasks keyed by the simulation clock.
//!
//! Replaces coroutine-style "wait then do" with data: a task is a payload and
//! a due time. Advancing the clock hands back every payload that came due, in
//! due order. Cancelled tasks never come back.

use serde::{Deserialize, Serialize};

/// Handle to a scheduled task, used to cancel it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskHandle(u64);

#[derive(Debug, Clone)]
struct ScheduledTask<T> {
    handle: TaskHandle,
    due: f64,
    payload: T,
}

/// Tick-driven scheduler of deferred payloads.
#[derive(Debug, Clone)]
pub struct TickScheduler<T> {
    now: f64,
    next_handle: u64,
    tasks: Vec<ScheduledTask<T>>,
}

impl<T> Default for TickScheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TickScheduler<T> {
    /// Creates an empty scheduler at time zero.
    #[must_use]
    pub fn new() -> Self {
        Self {
            now: 0.0,
            next_handle: 1,
            tasks: Vec::new(),
        }
    }

    /// Current clock time in seconds.
    #[must_use]
    pub const fn now(&self) -> f64 {
        self.now
    }

    /// Schedules `payload` to come due `delay` seconds from now.
    ///
    /// Negative delays are treated as zero: the task comes due on the next advance.
    pub fn schedule(&mut self, delay: f32, payload: T) -> TaskHandle {
        let handle = TaskHandle(self.next_handle);
        self.next_handle += 1;
        self.tasks.push(ScheduledTask {
            handle,
            due: self.now + f64::from(delay.max(0.0)),
            payload,
        });
        handle
    }

    /// Cancels a pending task. Returns `false` if it already ran or was cancelled.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.handle != handle);
        self.tasks.len() != before
    }

    /// Checks whether a task is still pending.
    #[must_use]
    pub fn is_pending(&self, handle: TaskHandle) -> bool {
        self.tasks.iter().any(|task| task.handle == handle)
    }

    /// Seconds until a pending task comes due.
    #[must_use]
    pub fn remaining(&self, handle: TaskHandle) -> Option<f32> {
        self.tasks
            .iter()
            .find(|task| task.handle == handle)
            .map(|task| (task.due - self.now).max(0.0) as f32)
    }

    /// Number of pending tasks.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.tasks.len()
    }

    /// Drops every pending task.
    pub fn clear(&mut self) {
        self.tasks.clear();
    }

    /// Advances the clock by `dt` seconds and returns the payloads that came due.
    ///
    /// Payloads are ordered by due time, ties broken by scheduling order.
    pub fn advance(&mut self, dt: f32) -> Vec<T> {
        self.now += f64::from(dt.max(0.0));
        let now = self.now;

        let mut due = Vec::new();
        let mut index = 0;
        while index < self.tasks.len() {
            if self.tasks[index].due <= now {
                due.push(self.tasks.swap_remove(index));
            } else {
                index += 1;
            }
        }

        due.sort_by(|a, b| a.due.total_cmp(&b.due).then(a.handle.0.cmp(&b.handle.0)));
        due.into_iter().map(|task| task.payload).collect()
    }
}

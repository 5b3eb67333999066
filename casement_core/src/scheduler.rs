// Copyright 2026 the Casement Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The host's cooperative task queue.
//!
//! Nothing in a host blocks or sleeps. Anything that has to happen later is
//! a [`Task`] with a deadline in the [`Scheduler`]; the embedding event loop
//! sleeps until [`next_deadline`](Scheduler::next_deadline) and then calls
//! [`Host::run_due`](crate::host::Host::run_due).
//!
//! Each task kind has a single slot, so scheduling a task that is already
//! queued coalesces the two.

use enum_map::{Enum, EnumMap};

use crate::time::HostTime;

/// Work a host can defer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Enum)]
pub enum Task {
    /// Run a reconciliation pass.
    Reconcile,
    /// The periodic poll: stall detection, then a reconciliation pass.
    Poll,
    /// The paint task.
    Paint,
    /// End of the quiet period of a move burst.
    MoveBurst,
    /// End of the quiet period of a resize burst.
    ResizeBurst,
}

/// Deadlines for each [`Task`].
#[derive(Clone, Debug, Default)]
pub struct Scheduler {
    due: EnumMap<Task, Option<HostTime>>,
}

impl Scheduler {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `task` for `at`, keeping an earlier deadline if one is queued.
    pub fn schedule(&mut self, task: Task, at: HostTime) {
        let slot = &mut self.due[task];
        *slot = Some(slot.map_or(at, |t| t.min(at)));
    }

    /// Queues `task` for exactly `at`, replacing any queued deadline.
    pub fn reschedule(&mut self, task: Task, at: HostTime) {
        self.due[task] = Some(at);
    }

    /// Removes `task` from the queue.
    pub fn cancel(&mut self, task: Task) {
        self.due[task] = None;
    }

    /// Empties the queue.
    pub fn clear(&mut self) {
        self.due = EnumMap::default();
    }

    /// The deadline of `task`, if queued.
    #[must_use]
    pub fn deadline(&self, task: Task) -> Option<HostTime> {
        self.due[task]
    }

    /// The earliest queued deadline.
    #[must_use]
    pub fn next_deadline(&self) -> Option<HostTime> {
        self.due.values().flatten().min().copied()
    }

    /// Removes and returns every task due at `now`, earliest first.
    ///
    /// Ties run in [`Task`] declaration order.
    pub fn drain_due(&mut self, now: HostTime) -> Vec<(Task, HostTime)> {
        let mut due: Vec<(Task, HostTime)> = self
            .due
            .iter_mut()
            .filter_map(|(task, slot)| match *slot {
                Some(at) if now.has_reached(at) => {
                    *slot = None;
                    Some((task, at))
                }
                _ => None,
            })
            .collect();
        due.sort_by_key(|&(_, at)| at);
        due
    }
}

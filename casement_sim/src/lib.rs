// Copyright 2026 the Casement Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scriptable simulation harness for casement hosts.
//!
//! - [`backing`]: [`SimBacking`](backing::SimBacking), an in-memory
//!   [`BackingWindow`](casement_core::backing::BackingWindow) with a call log,
//!   size clamping, scripted failures and deferred application, driven
//!   through its [`SimHandle`](backing::SimHandle).
//! - [`listener`]: a shared event [`Journal`](listener::Journal) and the
//!   [`SequenceChecker`](listener::SequenceChecker) that validates the
//!   event-order contract.
//! - [`painter`]: [`RecordingPainter`](painter::RecordingPainter).
//! - [`Stepper`]: advances a [`ManualClock`] through a host's deadlines the
//!   way an event loop would.

use casement_core::clock::ManualClock;
use casement_core::error::HostResult;
use casement_core::host::Host;
use casement_core::time::{Duration, HostTime};

pub mod backing;
pub mod listener;
pub mod painter;

#[cfg(test)]
mod scenarios;

/// Upper bound on deadlines visited by a single [`Stepper::advance`].
const MAX_STEPS: usize = 100_000;

/// Drives a host against a [`ManualClock`].
#[derive(Clone, Debug)]
pub struct Stepper {
    clock: ManualClock,
}

impl Stepper {
    /// Creates a stepper over `clock`. The host must read the same clock.
    #[must_use]
    pub fn new(clock: ManualClock) -> Self {
        Self { clock }
    }

    /// The clock being driven.
    #[must_use]
    pub fn clock(&self) -> &ManualClock {
        &self.clock
    }

    /// Current time.
    #[must_use]
    pub fn now(&self) -> HostTime {
        use casement_core::clock::Clock;
        self.clock.now()
    }

    /// Moves time forward by `by`, running every deadline on the way in
    /// order, then runs whatever is due at the end.
    ///
    /// Returns the first listener failure; time still ends at the target.
    pub fn advance(&self, host: &mut Host, by: Duration) -> HostResult<()> {
        let target = self.now() + by;
        let mut first = None;
        let mut last_run = None;
        for _ in 0..MAX_STEPS {
            let Some(deadline) = host.next_deadline() else {
                break;
            };
            let mut at = deadline.max(self.now());
            if last_run == Some(at) {
                // Work queued for the instant that just ran; let time move.
                at = at + Duration::MILLISECOND;
            }
            if at > target {
                break;
            }
            self.clock.set(at);
            if let Err(err) = host.run_due() {
                first.get_or_insert(err);
            }
            last_run = Some(at);
        }
        self.clock.set(target);
        if let Err(err) = host.run_due() {
            first.get_or_insert(err);
        }
        first.map_or(Ok(()), Err)
    }
}

// Copyright 2026 the Casement Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Clock sources for host timestamps.
//!
//! A host reads the time through the [`Clock`] trait so that reconciliation
//! can be driven deterministically. [`MonotonicClock`] is the production
//! clock; [`ManualClock`] is advanced explicitly and is shared between clones,
//! which lets a test hold one handle while the host owns another.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crate::time::{Duration, HostTime};

/// Source of monotonic [`HostTime`] values.
pub trait Clock {
    /// Returns the current time. Successive calls never go backwards.
    fn now(&self) -> HostTime;
}

/// Wall-independent clock backed by [`Instant`].
///
/// The epoch is the moment the clock was created.
#[derive(Clone, Copy, Debug)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    /// Creates a clock whose epoch is now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> HostTime {
        let elapsed = self.origin.elapsed().as_millis();
        HostTime(u64::try_from(elapsed).unwrap_or(u64::MAX))
    }
}

/// Explicitly advanced clock for tests and simulations.
///
/// Clones share the same underlying time.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    millis: Arc<AtomicU64>,
}

impl ManualClock {
    /// Creates a clock starting at `start`.
    #[must_use]
    pub fn starting_at(start: HostTime) -> Self {
        Self {
            millis: Arc::new(AtomicU64::new(start.millis())),
        }
    }

    /// Moves the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        self.millis.fetch_add(by.millis(), Ordering::AcqRel);
    }

    /// Moves the clock to `to`. Earlier values are ignored.
    pub fn set(&self, to: HostTime) {
        self.millis.fetch_max(to.millis(), Ordering::AcqRel);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> HostTime {
        HostTime(self.millis.load(Ordering::Acquire))
    }
}

// Copyright 2026 the Casement Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cooperative shutdown for embedding loops.
//!
//! Hosts never block. An embedding that runs its event loop on a dedicated
//! thread can use a [`ShutdownSignal`] to stop it from elsewhere (a signal
//! handler, another window, a test).

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use crate::time::Duration;

/// A shared flag that asks a loop to stop.
///
/// Clones observe the same flag.
#[derive(Clone, Debug, Default)]
pub struct ShutdownSignal {
    flag: Arc<AtomicBool>,
}

impl ShutdownSignal {
    /// Creates an unset signal.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the flag.
    #[inline]
    pub fn request(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Whether the flag is set.
    #[inline]
    #[must_use]
    pub fn is_requested(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Blocks the calling thread until the flag is set, checking every
    /// `poll_interval`.
    pub fn wait(&self, poll_interval: Duration) {
        let nap = std::time::Duration::from(poll_interval.max(Duration::MILLISECOND));
        while !self.is_requested() {
            thread::sleep(nap);
        }
    }
}

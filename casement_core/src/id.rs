// Copyright 2026 the Casement Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host identity.

use core::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

static NEXT_HOST_ID: AtomicU32 = AtomicU32::new(1);

/// Identifies a host (window or dialog) for the lifetime of the process.
///
/// Ids are never reused, so a stale id held by a client simply stops
/// resolving once its dialog has closed and been removed from its owner.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HostId(u32);

impl HostId {
    pub(crate) fn next() -> Self {
        Self(NEXT_HOST_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Rebuilds an id from its raw value, e.g. when decoding a recorded
    /// trace. The result does not necessarily name a live host.
    #[inline]
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw id (for diagnostics only).
    #[inline]
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for HostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostId({})", self.0)
    }
}

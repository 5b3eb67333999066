// Copyright 2026 the Casement Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! UI-thread affinity.
//!
//! A host records the thread it was built on. Reconciliation, event
//! dispatch and backend mutation only ever happen there; entry points that
//! mutate state check the caller with [`ThreadGuard::check`]. Other threads
//! interact with a host only through an
//! [`InvalidationHandle`](crate::paint::InvalidationHandle).

use std::thread::{self, ThreadId};

use crate::error::{HostError, HostResult};

/// Remembers the thread a host belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ThreadGuard {
    owner: ThreadId,
}

impl ThreadGuard {
    /// A guard owned by the calling thread.
    #[must_use]
    pub fn current() -> Self {
        Self {
            owner: thread::current().id(),
        }
    }

    /// Whether the calling thread is the owner.
    #[must_use]
    pub fn is_owner(&self) -> bool {
        thread::current().id() == self.owner
    }

    /// Fails with [`HostError::WrongThread`] off the owning thread.
    pub fn check(&self) -> HostResult<()> {
        if self.is_owner() {
            Ok(())
        } else {
            log::error!("host entry point called from {:?}", thread::current().id());
            Err(HostError::WrongThread)
        }
    }
}

// Copyright 2026 the Casement Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types.
//!
//! Errors fall into three groups:
//!
//! - **Usage errors** ([`HostError::WrongThread`], [`HostError::Closed`],
//!   [`HostError::InvalidConfig`], [`HostError::Config`]) are returned
//!   synchronously from the call that caused them.
//! - **Collaborator failures** ([`HostError::Backing`], [`HostError::Paint`])
//!   are caught at the boundary of each backend or painter call and routed to
//!   the host's error hook. They never abort reconciliation.
//! - **Listener failures** ([`HostError::Listener`]) propagate out of the tick
//!   that dispatched the event. Observed state and bookkeeping were already
//!   updated by then, so the next tick resumes cleanly.

use thiserror::Error;

use crate::backing::BackingOp;
use crate::event::WindowEvent;
use crate::id::HostId;

/// Result alias used throughout the crate.
pub type HostResult<T> = Result<T, HostError>;

/// Errors produced by a host.
#[derive(Clone, Debug, Error)]
pub enum HostError {
    /// A state-mutating entry point was called off the host's UI thread.
    #[error("host entry point called off the UI thread")]
    WrongThread,

    /// The operation is not allowed on a closed host.
    #[error("{0:?} is closed")]
    Closed(HostId),

    /// Builder or configuration values were rejected.
    #[error("invalid host configuration: {0}")]
    InvalidConfig(String),

    /// A configuration file could not be parsed.
    #[error("config error: {0}")]
    Config(String),

    /// A backing window mutation failed.
    #[error("backing window call {op:?} failed: {source}")]
    Backing {
        /// The mutation that failed.
        op: BackingOp,
        /// The adapter's error.
        #[source]
        source: BackingError,
    },

    /// The painter failed.
    #[error("paint failed: {0}")]
    Paint(#[from] PaintError),

    /// The client listener failed while handling an event.
    #[error("client listener failed on {event:?}: {source}")]
    Listener {
        /// The event being delivered.
        event: WindowEvent,
        /// The listener's error.
        #[source]
        source: ListenerError,
    },
}

/// Failure reported by a [`BackingWindow`](crate::backing::BackingWindow)
/// mutator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct BackingError {
    message: String,
}

impl BackingError {
    /// Creates an error with the given message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the adapter's message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Failure reported by a [`ClientListener`](crate::event::ClientListener).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ListenerError {
    message: String,
}

impl ListenerError {
    /// Creates an error with the given message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Failure reported by a [`Painter`](crate::paint::Painter).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct PaintError {
    message: String,
}

impl PaintError {
    /// Creates an error with the given message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

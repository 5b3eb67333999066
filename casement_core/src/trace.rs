// Copyright 2026 the Casement Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the reconciliation loop.
//!
//! This module provides a [`TraceSink`] trait with one method per kind of
//! reconciler activity. All method bodies default to no-ops, so implementing
//! only the events you care about is fine.
//!
//! Each host owns a [`Tracer`] wrapping an optional boxed sink. When the
//! `trace` feature is **off**, every `Tracer` method compiles to nothing and
//! the sink given to [`Tracer::new`] is dropped. When **on**, each method
//! performs a single `Option` branch before dispatching.
//!
//! Tracing is independent from logging: the host also emits `log` records,
//! which are meant for humans, while trace events are meant for tools.

use crate::backing::BackingOp;
use crate::event::{StateEvent, WindowEvent};
use crate::geometry::Rect;
use crate::id::HostId;
use crate::stability::GateOutcome;
use crate::time::{Duration, HostTime};

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted after each reconciliation pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PassEvent {
    /// The host.
    pub host: HostId,
    /// Pass start time.
    pub now: HostTime,
    /// Index of the pass within its reconciliation run.
    pub index: u32,
    /// Name of the rule that matched, or `None` if the pass was idle.
    pub rule: Option<&'static str>,
}

/// Emitted for each stability gate check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GateEvent {
    /// The host.
    pub host: HostId,
    /// Check time.
    pub now: HostTime,
    /// The gated event.
    pub event: StateEvent,
    /// What the gate decided.
    pub outcome: GateOutcome,
}

/// Emitted when a canonical event is dispatched to the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FireEvent {
    /// The host.
    pub host: HostId,
    /// Dispatch time.
    pub now: HostTime,
    /// The event.
    pub event: WindowEvent,
}

/// Emitted for each backend mutator call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BackingCallEvent {
    /// The host.
    pub host: HostId,
    /// Call time.
    pub now: HostTime,
    /// The mutator.
    pub op: BackingOp,
    /// Whether the backend reported success.
    pub ok: bool,
}

/// Emitted when the poll ran late enough to count as a stall.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StallEvent {
    /// The host.
    pub host: HostId,
    /// When the late poll ran.
    pub now: HostTime,
    /// How late it ran.
    pub lateness: Duration,
    /// The newest-unstability mark after accounting for the stall.
    pub newest_unstability: HostTime,
}

/// What became of a paint task.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PaintOutcome {
    /// The painter ran on this rectangle.
    Painted(Rect),
    /// Too soon after the last paint; retried at the given time.
    Deferred(HostTime),
    /// The host was not showing and deiconified; the region was kept.
    Skipped,
    /// The painter returned an error.
    Failed,
}

/// Emitted for each run of the paint task.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PaintEvent {
    /// The host.
    pub host: HostId,
    /// Task run time.
    pub now: HostTime,
    /// What happened.
    pub outcome: PaintOutcome,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives reconciler trace events.
///
/// All methods have default no-op implementations, so you only need to
/// override the ones you care about.
pub trait TraceSink {
    /// Called after each reconciliation pass.
    fn on_pass(&mut self, e: &PassEvent) {
        _ = e;
    }

    /// Called for each stability gate check.
    fn on_gate(&mut self, e: &GateEvent) {
        _ = e;
    }

    /// Called when a canonical event is dispatched.
    fn on_event(&mut self, e: &FireEvent) {
        _ = e;
    }

    /// Called for each backend mutator call.
    fn on_backing_call(&mut self, e: &BackingCallEvent) {
        _ = e;
    }

    /// Called when a poll stall is detected.
    fn on_stall(&mut self, e: &StallEvent) {
        _ = e;
    }

    /// Called for each paint task run.
    fn on_paint(&mut self, e: &PaintEvent) {
        _ = e;
    }
}

/// A sink that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer
// ---------------------------------------------------------------------------

/// Optional owned sink; zero-cost when the `trace` feature is off.
#[derive(Default)]
pub struct Tracer {
    #[cfg(feature = "trace")]
    sink: Option<Box<dyn TraceSink>>,
}

impl core::fmt::Debug for Tracer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl Tracer {
    /// Creates a tracer that dispatches to `sink`.
    #[must_use]
    pub fn new(sink: Box<dyn TraceSink>) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            drop(sink);
            Self {}
        }
    }

    /// Creates a tracer with no sink.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Emits a [`PassEvent`].
    #[inline]
    pub fn pass(&mut self, e: &PassEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_pass(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`GateEvent`].
    #[inline]
    pub fn gate(&mut self, e: &GateEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_gate(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`FireEvent`].
    #[inline]
    pub fn event(&mut self, e: &FireEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_event(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`BackingCallEvent`].
    #[inline]
    pub fn backing_call(&mut self, e: &BackingCallEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_backing_call(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`StallEvent`].
    #[inline]
    pub fn stall(&mut self, e: &StallEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_stall(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PaintEvent`].
    #[inline]
    pub fn paint(&mut self, e: &PaintEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_paint(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

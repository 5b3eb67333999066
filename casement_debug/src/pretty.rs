// Copyright 2026 the Casement Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Times are
//! printed in host milliseconds.

use std::io::Write;

use casement_core::stability::GateOutcome;
use casement_core::trace::{
    BackingCallEvent, FireEvent, GateEvent, PaintEvent, PaintOutcome, PassEvent, StallEvent,
    TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    show_idle: bool,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("show_idle", &self.show_idle)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::with_writer(Box::new(std::io::stderr()))
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self::with_writer(writer)
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer,
            show_idle: false,
        }
    }

    /// Also print passes that matched no rule. Off by default; every poll
    /// produces one.
    #[must_use]
    pub fn show_idle(mut self, show: bool) -> Self {
        self.show_idle = show;
        self
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_pass(&mut self, e: &PassEvent) {
        let rule = match e.rule {
            Some(rule) => rule,
            None if self.show_idle => "idle",
            None => return,
        };
        let _ = writeln!(
            self.writer,
            "[pass] host={} t={}ms #{} rule={rule}",
            e.host.get(),
            e.now.millis(),
            e.index,
        );
    }

    fn on_gate(&mut self, e: &GateEvent) {
        let outcome = match e.outcome {
            GateOutcome::Programmatic => "programmatic".to_owned(),
            GateOutcome::Stable => "stable".to_owned(),
            GateOutcome::Wait(at) => format!("wait until {}ms", at.millis()),
        };
        let _ = writeln!(
            self.writer,
            "[gate] host={} t={}ms {:?}: {outcome}",
            e.host.get(),
            e.now.millis(),
            e.event,
        );
    }

    fn on_event(&mut self, e: &FireEvent) {
        let _ = writeln!(
            self.writer,
            "[event] host={} t={}ms {:?}",
            e.host.get(),
            e.now.millis(),
            e.event,
        );
    }

    fn on_backing_call(&mut self, e: &BackingCallEvent) {
        let status = if e.ok { "ok" } else { "FAILED" };
        let _ = writeln!(
            self.writer,
            "[backing] host={} t={}ms {:?} {status}",
            e.host.get(),
            e.now.millis(),
            e.op,
        );
    }

    fn on_stall(&mut self, e: &StallEvent) {
        let _ = writeln!(
            self.writer,
            "[stall] host={} t={}ms late={}ms unstable-until={}ms",
            e.host.get(),
            e.now.millis(),
            e.lateness.millis(),
            e.newest_unstability.millis(),
        );
    }

    fn on_paint(&mut self, e: &PaintEvent) {
        let outcome = match e.outcome {
            PaintOutcome::Painted(r) => {
                format!("painted ({}, {})..({}, {})", r.x0, r.y0, r.x1, r.y1)
            }
            PaintOutcome::Deferred(at) => format!("deferred to {}ms", at.millis()),
            PaintOutcome::Skipped => "skipped".to_owned(),
            PaintOutcome::Failed => "FAILED".to_owned(),
        };
        let _ = writeln!(
            self.writer,
            "[paint] host={} t={}ms {outcome}",
            e.host.get(),
            e.now.millis(),
        );
    }
}

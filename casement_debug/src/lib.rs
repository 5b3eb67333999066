// Copyright 2026 the Casement Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording, pretty-printing, and Chrome trace export for casement
//! diagnostics.
//!
//! This crate provides [`TraceSink`](casement_core::trace::TraceSink)
//! implementations for development and post-mortem analysis of host
//! reconciliation:
//!
//! - [`pretty::PrettyPrintSink`]: human-readable one-line-per-event output.
//! - [`recorder::RecorderSink`]: compact binary recording with
//!   [`recorder::decode`] for playback.
//! - [`chrome::export`]: writes Chrome Trace Event Format JSON from recorded
//!   bytes, one process lane per host.
//!
//! Enabling this crate turns on the `trace` feature of `casement_core`.

pub mod chrome;
pub mod pretty;
pub mod recorder;

// Copyright 2026 the Casement Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host state reconciliation for native window lifecycles.
//!
//! Native windowing backends report visibility, focus, minimize and maximize
//! state unreliably: late, out of order, transiently wrong, or not at all.
//! `casement_core` wraps each native window in a [`Host`](host::Host) that
//! repeatedly diffs what the backend reports against what the client has
//! already been told, and emits a canonical, ordered, debounced stream of
//! lifecycle events.
//!
//! # Architecture
//!
//! ```text
//!   BackingWindow (native adapter)
//!       │  queries / notifications
//!       ▼
//!   BackingSnapshot ──► StabilityTracker::observe()
//!       │
//!       ▼
//!   rule table (one pass) ──► Fire(event) ──► Dispatcher ──► ClientListener
//!       │                  └► Act(action) ──► BackingWindow mutators
//!       ▼
//!   Idle { recheck_at } ──► Scheduler ──► Host::run_due()
//! ```
//!
//! **[`host`]**: [`Host`](host::Host) and [`HostBuilder`](host::HostBuilder).
//! Public operations, notifications, the reconciliation work loop, dialogs
//! and close ordering.
//!
//! **[`stability`]**: per-event detection bookkeeping, the newest-unstability
//! mark, and the stability / anti-flicker gate.
//!
//! **[`dispatch`]**: the only writer of
//! [`ClientObservedState`](state::ClientObservedState). Updates state and
//! bookkeeping before the listener runs.
//!
//! **[`drag`]**: freezes reported bounds during a user drag and defers
//! bounds writes to its end.
//!
//! **[`enforce`]**: the single-slot queue of bounds to apply once the host
//! settles maximized or demaximized.
//!
//! **[`paint`]**: dirty-region accumulation, coalescing and burst handling.
//!
//! **[`scheduler`]**: the per-host task queue.
//!
//! **[`backing`]**: the [`BackingWindow`](backing::BackingWindow) contract
//! native adapters implement.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types, with
//! the zero-overhead [`Tracer`](trace::Tracer) wrapper.
//!
//! # Crate features
//!
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod backing;
pub mod clock;
pub mod config;
pub mod dispatch;
pub mod drag;
pub mod enforce;
pub mod error;
pub mod event;
pub mod geometry;
pub mod host;
pub mod id;
pub mod paint;
mod rules;
pub mod scheduler;
pub mod shutdown;
pub mod stability;
pub mod state;
pub mod thread;
pub mod time;
pub mod trace;

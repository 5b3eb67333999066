// Copyright 2026 the Casement Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stability and anti-flicker gating for backend state changes.
//!
//! Backends flicker: a minimize can report iconified, then deiconified, then
//! iconified again within a few milliseconds. [`StabilityTracker`] decides
//! when a detected difference between backend and client state is trusted
//! enough to become a canonical event.
//!
//! A detection of event `E` passes its gate when any of these holds:
//!
//! - a programmatic change to `E` is pending, or
//! - it already passed once and has not fired yet (see below),
//!
//! or when all of these hold:
//!
//! - the opposite state was last seen at least the anti-flicker delay ago,
//! - `E` was first detected at least the stability delay ago (the
//!   hidden-stability delay for Hidden),
//! - the newest-unstability mark is at least the stability delay ago.
//!
//! Once a gate passes, the detection stays trusted until it fires or the
//! backend stops reporting it. Without that, draining a FocusLost ahead of a
//! Hidden would bump the unstability mark and re-block the Hidden it was
//! drained for.

use enum_map::EnumMap;

use crate::backing::BackingSnapshot;
use crate::config::HostConfig;
use crate::event::{StateAxis, StateEvent};
use crate::time::{Duration, HostTime};

/// Per-event detection bookkeeping.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Detection {
    /// Detected and not yet fired.
    pub detected: bool,
    /// When the current detection started.
    pub first_detected: HostTime,
    /// When the backend last reported this state, if ever.
    pub last_seen: Option<HostTime>,
    /// The gate passed for the current detection.
    pub trusted: bool,
}

/// Result of a gate check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateOutcome {
    /// A matching programmatic change was pending.
    Programmatic,
    /// Every delay has elapsed.
    Stable,
    /// Not yet; re-check at the given time.
    Wait(HostTime),
}

impl GateOutcome {
    /// Whether the event may fire now.
    #[must_use]
    pub const fn passed(self) -> bool {
        !matches!(self, Self::Wait(_))
    }
}

/// Detection records, pending programmatic flags and the newest-unstability
/// mark for one host.
#[derive(Clone, Debug, Default)]
pub struct StabilityTracker {
    detections: EnumMap<StateEvent, Detection>,
    pending: EnumMap<StateEvent, bool>,
    newest_unstability: HostTime,
}

impl StabilityTracker {
    /// Creates a tracker with nothing detected and nothing pending.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The detection record for `event`.
    #[must_use]
    pub fn detection(&self, event: StateEvent) -> &Detection {
        &self.detections[event]
    }

    /// Whether a programmatic change to `event` is pending.
    #[must_use]
    pub fn is_pending(&self, event: StateEvent) -> bool {
        self.pending[event]
    }

    /// The newest time at which state may have been unstable.
    #[must_use]
    pub fn newest_unstability(&self) -> HostTime {
        self.newest_unstability
    }

    /// Earliest time state counts as settled for `delay`.
    #[must_use]
    pub fn settled_at(&self, delay: Duration) -> HostTime {
        self.newest_unstability + delay
    }

    /// Advances the newest-unstability mark to at least `t`.
    pub fn bump(&mut self, t: HostTime) {
        self.newest_unstability = self.newest_unstability.max(t);
    }

    /// Accounts for a scheduler stall of `lateness` noticed at `now`.
    ///
    /// Anything observed during the stall is suspect, so the mark moves
    /// forward by the lateness and at least to `now`.
    pub fn stall(&mut self, lateness: Duration, now: HostTime) {
        let pushed = self.newest_unstability + lateness;
        self.newest_unstability = pushed.max(now).max(self.newest_unstability);
    }

    /// Records which states the backend reports this pass.
    pub fn observe(&mut self, snapshot: &BackingSnapshot, now: HostTime) {
        let seen = [
            Some(StateEvent::for_value(StateAxis::Visibility, snapshot.showing)),
            snapshot
                .iconified
                .map(|v| StateEvent::for_value(StateAxis::Iconification, v)),
            snapshot
                .maximized
                .map(|v| StateEvent::for_value(StateAxis::Maximization, v)),
        ];
        for event in seen.into_iter().flatten() {
            self.detections[event].last_seen = Some(now);
        }
    }

    /// Forgets an in-progress detection of `event`; the backend no longer
    /// reports it.
    pub fn clear_detection(&mut self, event: StateEvent) {
        let d = &mut self.detections[event];
        d.detected = false;
        d.trusted = false;
    }

    /// Checks whether a detected change to `event` may fire at `now`.
    pub fn gate(&mut self, event: StateEvent, now: HostTime, config: &HostConfig) -> GateOutcome {
        if self.pending[event] {
            return GateOutcome::Programmatic;
        }

        let opposite_seen = self.detections[event.opposite()].last_seen;
        let d = &mut self.detections[event];
        if !d.detected {
            d.detected = true;
            d.trusted = false;
            d.first_detected = now;
        }
        if d.trusted {
            return GateOutcome::Stable;
        }

        let stability = if event == StateEvent::Hidden {
            config.hidden_stability_delay()
        } else {
            config.state_stability_delay()
        };
        let mut ready = (d.first_detected + stability).max(self.newest_unstability + stability);
        if let Some(seen) = opposite_seen {
            ready = ready.max(seen + config.anti_flicker_delay());
        }

        if now.has_reached(ready) {
            d.trusted = true;
            GateOutcome::Stable
        } else {
            GateOutcome::Wait(ready)
        }
    }

    /// Marks `event` as the target of a programmatic change.
    pub fn begin_programmatic(&mut self, event: StateEvent, now: HostTime) {
        self.pending[event] = true;
        self.pending[event.opposite()] = false;
        self.bump(now);
    }

    /// Drops a pending programmatic change to `event`, either because the
    /// backend refused it or because the client already observes `event`.
    pub fn cancel_programmatic(&mut self, event: StateEvent) {
        self.pending[event] = false;
    }

    /// Records that `event` fired at `now`.
    ///
    /// Clears pending changes on the whole axis: whatever was asked for
    /// before, the client state just moved.
    pub fn fired(&mut self, event: StateEvent, now: HostTime) {
        self.pending[event] = false;
        self.pending[event.opposite()] = false;
        self.clear_detection(event);
        self.clear_detection(event.opposite());
        self.bump(now);
    }
}

// Copyright 2026 the Casement Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bounds stabilization during user drags.
//!
//! While the user drags a window, many backends report intermediate and
//! sometimes contradictory bounds. A [`DragStabilizer`] captures the bounds
//! at button press and, once the window actually starts moving, freezes what
//! the host reports and defers bounds writes until the button is released.
//!
//! A move right after the host itself set bounds is usually the echo of that
//! call, not a drag. The [`DragMoveFilter`] decides which moves count.

use core::fmt;

use crate::geometry::Rect;
use crate::time::{Duration, HostTime};

/// A bounds write, in client or window space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BoundsTarget {
    /// Bounds of the client area.
    Client(Rect),
    /// Bounds of the whole window.
    Window(Rect),
}

/// What a [`DragMoveFilter`] gets to look at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DragMoveContext {
    /// Time of the move notification.
    pub now: HostTime,
    /// When the host last wrote bounds to the backend, if ever.
    pub last_bounds_set: Option<HostTime>,
    /// The configured drag-move blocking delay.
    pub blocking_delay: Duration,
}

/// Decides whether a move notification may start a drag.
pub trait DragMoveFilter {
    /// Returns `true` to ignore this move for drag detection.
    fn blocks(&self, ctx: &DragMoveContext) -> bool;
}

impl<F> DragMoveFilter for F
where
    F: Fn(&DragMoveContext) -> bool,
{
    fn blocks(&self, ctx: &DragMoveContext) -> bool {
        self(ctx)
    }
}

/// Blocks moves within the blocking delay of the last bounds write.
#[derive(Clone, Copy, Debug, Default)]
pub struct BlockAfterBoundsSet;

impl DragMoveFilter for BlockAfterBoundsSet {
    fn blocks(&self, ctx: &DragMoveContext) -> bool {
        ctx.last_bounds_set
            .is_some_and(|set| ctx.now.saturating_duration_since(set) < ctx.blocking_delay)
    }
}

/// One drag, from press to release or cancellation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DragSession {
    client_bounds: Rect,
    window_bounds: Rect,
    moving: bool,
    target: Option<BoundsTarget>,
}

impl DragSession {
    /// Client bounds captured at press.
    #[must_use]
    pub fn client_bounds(&self) -> Rect {
        self.client_bounds
    }

    /// Window bounds captured at press.
    #[must_use]
    pub fn window_bounds(&self) -> Rect {
        self.window_bounds
    }

    /// Whether a qualifying move has been seen.
    #[must_use]
    pub fn is_moving(&self) -> bool {
        self.moving
    }

    /// The bounds write queued for release, if any.
    #[must_use]
    pub fn target(&self) -> Option<BoundsTarget> {
        self.target
    }
}

/// Tracks at most one [`DragSession`] for a host.
pub struct DragStabilizer {
    session: Option<DragSession>,
    filter: Box<dyn DragMoveFilter>,
    last_bounds_set: Option<HostTime>,
}

impl fmt::Debug for DragStabilizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DragStabilizer")
            .field("session", &self.session)
            .field("last_bounds_set", &self.last_bounds_set)
            .finish_non_exhaustive()
    }
}

impl Default for DragStabilizer {
    fn default() -> Self {
        Self::new(Box::new(BlockAfterBoundsSet))
    }
}

impl DragStabilizer {
    /// Creates a stabilizer with the given move filter.
    #[must_use]
    pub fn new(filter: Box<dyn DragMoveFilter>) -> Self {
        Self {
            session: None,
            filter,
            last_bounds_set: None,
        }
    }

    /// The current session, if a drag button is down.
    #[must_use]
    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    /// Captured `(client, window)` bounds while the drag is moving.
    #[must_use]
    pub fn frozen_bounds(&self) -> Option<(Rect, Rect)> {
        self.session
            .filter(|s| s.moving)
            .map(|s| (s.client_bounds, s.window_bounds))
    }

    /// Starts a session with the bounds read at press.
    ///
    /// A press while a session exists restarts it.
    pub fn press(&mut self, client_bounds: Rect, window_bounds: Rect) {
        self.session = Some(DragSession {
            client_bounds,
            window_bounds,
            moving: false,
            target: None,
        });
    }

    /// Feeds a move notification. Returns `true` if this move started the
    /// drag.
    pub fn on_move(&mut self, now: HostTime, blocking_delay: Duration) -> bool {
        let ctx = DragMoveContext {
            now,
            last_bounds_set: self.last_bounds_set,
            blocking_delay,
        };
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if session.moving || self.filter.blocks(&ctx) {
            return false;
        }
        session.moving = true;
        true
    }

    /// Queues a bounds write for release. Returns `false` (and queues
    /// nothing) unless the drag is moving. A later target replaces an earlier
    /// one.
    pub fn queue(&mut self, target: BoundsTarget) -> bool {
        match self.session.as_mut() {
            Some(s) if s.moving => {
                s.target = Some(target);
                true
            }
            _ => false,
        }
    }

    /// Ends the session; returns the write to flush, if any.
    pub fn release(&mut self) -> Option<BoundsTarget> {
        self.session.take().and_then(|s| s.target)
    }

    /// Drops the session and its queued write. Returns `true` if there was
    /// one.
    pub fn cancel(&mut self) -> bool {
        self.session.take().is_some()
    }

    /// Records a bounds write to the backend.
    pub fn note_bounds_set(&mut self, now: HostTime) {
        self.last_bounds_set = Some(now);
    }
}

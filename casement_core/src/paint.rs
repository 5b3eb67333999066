// Copyright 2026 the Casement Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Paint triggering.
//!
//! Invalidations accumulate in a [`DirtyRegion`] shared through an
//! [`InvalidationHandle`], which may be cloned onto any thread. The host's
//! paint task consumes the region on the UI thread and hands it to the
//! [`Painter`].
//!
//! [`PaintScheduler`] throttles that task to one paint per coalescing delay
//! and debounces move and resize bursts.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::error::PaintError;
use crate::geometry::Rect;
use crate::time::{Duration, HostTime};

/// Renders a dirty rectangle. The pixel pipeline lives behind this.
pub trait Painter {
    /// Paints `dirty`, in client-local coordinates.
    fn paint(&mut self, dirty: Rect) -> Result<(), PaintError>;
}

impl<F> Painter for F
where
    F: FnMut(Rect) -> Result<(), PaintError>,
{
    fn paint(&mut self, dirty: Rect) -> Result<(), PaintError> {
        self(dirty)
    }
}

/// Bounding rectangle of everything invalidated since the last paint.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DirtyRegion(Option<Rect>);

impl DirtyRegion {
    /// Grows the region to include `rect`. Empty rectangles are ignored.
    pub fn add(&mut self, rect: Rect) {
        if rect.is_zero_area() {
            return;
        }
        self.0 = Some(match self.0 {
            Some(r) => r.union(rect),
            None => rect,
        });
    }

    /// The bounding rectangle, if anything is dirty.
    #[must_use]
    pub fn bounds(&self) -> Option<Rect> {
        self.0
    }

    /// Empties the region, returning what it held.
    pub fn take(&mut self) -> Option<Rect> {
        self.0.take()
    }
}

/// Thread-safe handle for invalidating a host's client area.
#[derive(Clone, Debug, Default)]
pub struct InvalidationHandle {
    region: Arc<Mutex<DirtyRegion>>,
    requested: Arc<AtomicBool>,
}

impl InvalidationHandle {
    /// Creates an empty handle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `rect` dirty and requests a paint.
    pub fn invalidate(&self, rect: Rect) {
        self.region.lock().add(rect);
        self.requested.store(true, Ordering::Release);
    }

    /// Current dirty bounds without consuming them.
    #[must_use]
    pub fn dirty(&self) -> Option<Rect> {
        self.region.lock().bounds()
    }

    /// Atomically reads and clears the dirty region.
    pub fn take(&self) -> Option<Rect> {
        self.region.lock().take()
    }

    /// Clears and returns the paint-request flag.
    pub(crate) fn take_request(&self) -> bool {
        self.requested.swap(false, Ordering::AcqRel)
    }
}

/// What the paint task should do now.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PaintDecision {
    /// Paint now.
    Paint,
    /// Too soon after the last paint; run again at the given time.
    Defer(HostTime),
}

/// Which burst a move or resize notification belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BurstKind {
    /// Move notifications.
    Move,
    /// Resize notifications.
    Resize,
}

/// Paint throttling and burst debounce state.
#[derive(Clone, Copy, Debug, Default)]
pub struct PaintScheduler {
    last_paint: Option<HostTime>,
    overrun: Duration,
    move_burst: bool,
    resize_burst: bool,
}

impl PaintScheduler {
    /// Time of the last paint.
    #[must_use]
    pub fn last_paint(&self) -> Option<HostTime> {
        self.last_paint
    }

    /// Whether a burst of `kind` is in progress.
    #[must_use]
    pub fn in_burst(&self, kind: BurstKind) -> bool {
        match kind {
            BurstKind::Move => self.move_burst,
            BurstKind::Resize => self.resize_burst,
        }
    }

    /// Decides whether a paint task running at `now` should paint.
    #[must_use]
    pub fn decide(&self, now: HostTime, coalescing: Duration) -> PaintDecision {
        let Some(last) = self.last_paint else {
            return PaintDecision::Paint;
        };
        let elapsed = now.saturating_duration_since(last);
        if elapsed >= coalescing {
            return PaintDecision::Paint;
        }
        let delay = (coalescing - elapsed - self.overrun).max(Duration::MILLISECOND);
        PaintDecision::Defer(now + delay)
    }

    /// Records a paint that ran at `now` for a task due at `scheduled`.
    pub fn painted(&mut self, scheduled: HostTime, now: HostTime) {
        self.last_paint = Some(now);
        self.overrun = now.saturating_duration_since(scheduled);
    }

    /// Feeds a move or resize notification. Returns `true` if it opened a new
    /// burst.
    pub fn burst_event(&mut self, kind: BurstKind) -> bool {
        let active = match kind {
            BurstKind::Move => &mut self.move_burst,
            BurstKind::Resize => &mut self.resize_burst,
        };
        !core::mem::replace(active, true)
    }

    /// Ends a burst after its quiet period.
    pub fn end_burst(&mut self, kind: BurstKind) {
        match kind {
            BurstKind::Move => self.move_burst = false,
            BurstKind::Resize => self.resize_burst = false,
        }
    }
}

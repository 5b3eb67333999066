// Copyright 2026 the Casement Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bounds helpers and the coordinate-scaling hook.
//!
//! All bounds are [`kurbo::Rect`] values in client coordinate space.
//! *Client bounds* exclude window decorations; *window bounds* include them.
//! The two are related by the backend's [`Insets`].
//!
//! Backends whose native coordinates differ from client space (device pixels
//! versus logical pixels, flipped axes) plug a [`CoordinateScale`] into the
//! [`Scaled`](crate::backing::Scaled) adapter wrapper. The reconciler itself
//! never converts coordinates.

pub use kurbo::{Insets, Point, Rect, Size, Vec2};

/// Sentinel returned by bounds getters while a host is hidden or iconified.
pub const EMPTY_BOUNDS: Rect = Rect::ZERO;

/// Sentinel returned by [`insets`](crate::host::Host::insets) while a host is
/// hidden or iconified.
pub const EMPTY_INSETS: Insets = Insets::ZERO;

/// Returns `true` for the [`EMPTY_BOUNDS`] sentinel.
#[must_use]
pub fn is_empty_bounds(rect: Rect) -> bool {
    rect == EMPTY_BOUNDS
}

/// Shifts `actual` so that its right and/or bottom edge sits where `target`
/// asked for it, keeping the size the backend settled on.
///
/// Used after a backend clamped or rounded a bounds request: the caller wanted
/// the far edge pinned, so the near edge moves instead.
#[must_use]
pub fn pin_far_edges(actual: Rect, target: Rect, fix_right: bool, fix_bottom: bool) -> Rect {
    let mut pinned = actual;
    if fix_right {
        let width = actual.width();
        pinned.x1 = target.x1;
        pinned.x0 = target.x1 - width;
    }
    if fix_bottom {
        let height = actual.height();
        pinned.y1 = target.y1;
        pinned.y0 = target.y1 - height;
    }
    pinned
}

/// A rectangle covering the whole client area, in client-local coordinates.
#[must_use]
pub fn client_area(client_bounds: Rect) -> Rect {
    Rect::from_origin_size(Point::ORIGIN, client_bounds.size())
}

/// Converts between client space and a backend's native space.
///
/// Implementations must be exact inverses up to the backend's rounding.
pub trait CoordinateScale {
    /// Converts a client-space rectangle into backend space.
    fn to_backend(&self, rect: Rect) -> Rect;

    /// Converts a backend-space rectangle into client space.
    fn to_client(&self, rect: Rect) -> Rect;

    /// Converts backend-space insets into client space.
    fn insets_to_client(&self, insets: Insets) -> Insets;
}

/// The identity scale.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IdentityScale;

impl CoordinateScale for IdentityScale {
    fn to_backend(&self, rect: Rect) -> Rect {
        rect
    }

    fn to_client(&self, rect: Rect) -> Rect {
        rect
    }

    fn insets_to_client(&self, insets: Insets) -> Insets {
        insets
    }
}

/// A uniform scale factor: backend units per client unit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UniformScale(pub f64);

impl CoordinateScale for UniformScale {
    fn to_backend(&self, rect: Rect) -> Rect {
        rect.scale_from_origin(self.0)
    }

    fn to_client(&self, rect: Rect) -> Rect {
        rect.scale_from_origin(1.0 / self.0)
    }

    fn insets_to_client(&self, insets: Insets) -> Insets {
        let k = 1.0 / self.0;
        Insets::new(insets.x0 * k, insets.y0 * k, insets.x1 * k, insets.y1 * k)
    }
}

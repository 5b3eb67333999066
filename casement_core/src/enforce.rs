// Copyright 2026 the Casement Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deferred bounds enforcement.
//!
//! Bounds written while a host is hidden, iconified or maximized would be
//! lost or misapplied by most backends. Instead they are parked here and
//! applied once the host settles into the state they belong to.
//!
//! There is a single slot. Arming one kind of enforcement replaces the
//! other, so a maximize after a demaximized bounds write forgets the write.

use crate::drag::BoundsTarget;
use crate::geometry::Rect;

/// The armed enforcement, if any.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Enforcement {
    /// Nothing armed.
    #[default]
    None,
    /// Apply the backend's work area as window bounds once stably
    /// maximized.
    OnMaximize,
    /// Apply the target once stably demaximized.
    OnDemaximize(BoundsTarget),
}

/// The enforcement slot plus the last stable demaximized window bounds.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BoundsEnforcement {
    slot: Enforcement,
    demax_bounds: Option<Rect>,
}

impl BoundsEnforcement {
    /// The armed enforcement.
    #[must_use]
    pub fn slot(&self) -> Enforcement {
        self.slot
    }

    /// Last window bounds recorded while stably demaximized.
    #[must_use]
    pub fn demax_bounds(&self) -> Option<Rect> {
        self.demax_bounds
    }

    /// Arms enforce-on-maximize.
    pub fn arm_maximize(&mut self) {
        self.slot = Enforcement::OnMaximize;
    }

    /// Arms enforce-on-demaximize with a caller-supplied target.
    pub fn arm_demaximize(&mut self, target: BoundsTarget) {
        self.slot = Enforcement::OnDemaximize(target);
    }

    /// Arms enforce-on-demaximize with the recorded demaximized bounds.
    ///
    /// Returns `false` if none were recorded yet, or if a caller-supplied
    /// target is already armed.
    pub fn arm_restore(&mut self) -> bool {
        if matches!(self.slot, Enforcement::OnDemaximize(_)) {
            return false;
        }
        match self.demax_bounds {
            Some(bounds) => {
                self.slot = Enforcement::OnDemaximize(BoundsTarget::Window(bounds));
                true
            }
            None => false,
        }
    }

    /// Clears the slot only if it holds enforce-on-maximize.
    pub fn disarm_maximize(&mut self) {
        if self.slot == Enforcement::OnMaximize {
            self.slot = Enforcement::None;
        }
    }

    /// Clears the slot only if it holds enforce-on-demaximize.
    pub fn disarm_demaximize(&mut self) {
        if matches!(self.slot, Enforcement::OnDemaximize(_)) {
            self.slot = Enforcement::None;
        }
    }

    /// Clears the slot.
    pub fn disarm(&mut self) {
        self.slot = Enforcement::None;
    }

    /// Empties the slot, returning what was armed.
    pub fn take(&mut self) -> Enforcement {
        core::mem::take(&mut self.slot)
    }

    /// Records the window bounds seen while stably demaximized.
    pub fn refresh_demax_bounds(&mut self, window_bounds: Rect) {
        self.demax_bounds = Some(window_bounds);
    }
}

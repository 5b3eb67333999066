// Copyright 2026 the Casement Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The state a client has already been told about.

use crate::event::WindowEvent;

/// What the client has observed so far.
///
/// Only the dispatcher mutates this, and always before the listener sees the
/// corresponding event. Move and resize notifications raise the pending
/// flags; the matching events clear them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ClientObservedState {
    pub(crate) showing: bool,
    pub(crate) focused: bool,
    pub(crate) iconified: bool,
    pub(crate) maximized: bool,
    pub(crate) moved_pending: bool,
    pub(crate) resized_pending: bool,
    pub(crate) closed: bool,
}

impl ClientObservedState {
    /// Shown and not yet hidden.
    #[must_use]
    pub fn is_showing(&self) -> bool {
        self.showing
    }

    /// Focused and not yet unfocused.
    #[must_use]
    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// Iconified and not yet deiconified.
    #[must_use]
    pub fn is_iconified(&self) -> bool {
        self.iconified
    }

    /// Maximized and not yet demaximized.
    #[must_use]
    pub fn is_maximized(&self) -> bool {
        self.maximized
    }

    /// A Moved event is waiting for the host to be showing and deiconified.
    #[must_use]
    pub fn is_moved_pending(&self) -> bool {
        self.moved_pending
    }

    /// A Resized event is waiting for the host to be showing and deiconified.
    #[must_use]
    pub fn is_resized_pending(&self) -> bool {
        self.resized_pending
    }

    /// Closed has been delivered.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Showing and not iconified.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.showing && !self.iconified
    }

    /// Showing, not iconified, and focused: the condition a drag needs.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_live() && self.focused
    }

    /// Records `event` as observed.
    pub(crate) fn apply(&mut self, event: WindowEvent) {
        match event {
            WindowEvent::Shown => self.showing = true,
            WindowEvent::Hidden => self.showing = false,
            WindowEvent::FocusGained => self.focused = true,
            WindowEvent::FocusLost => self.focused = false,
            WindowEvent::Iconified => self.iconified = true,
            WindowEvent::Deiconified => self.iconified = false,
            WindowEvent::Maximized => self.maximized = true,
            WindowEvent::Demaximized => self.maximized = false,
            WindowEvent::Moved => self.moved_pending = false,
            WindowEvent::Resized => self.resized_pending = false,
            WindowEvent::Closed => self.closed = true,
        }
    }
}

// Copyright 2026 the Casement Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backend contract for native window integrations.
//!
//! Each native windowing backend supplies one [`BackingWindow`]
//! implementation per host. The contract has four parts:
//!
//! - **Queries**: best-effort reads of the native state. Focus, iconified
//!   and maximized answers are only meaningful under preconditions (see
//!   [`BackingSnapshot`]); the reconciler never asks outside them.
//!
//! - **Capability probes**: [`does_iconify_work`](BackingWindow::does_iconify_work)
//!   and [`does_maximize_work`](BackingWindow::does_maximize_work) are read at
//!   each call site and never retried once false.
//!
//! - **Mutators**: requests to change native state. Backends may apply them
//!   asynchronously, clamp them, or silently ignore them; the reconciler
//!   re-reads state rather than trusting a mutation to have happened.
//!
//! - **Notifications**: the binding forwards native events to
//!   [`Host::notify`](crate::host::Host::notify) as [`BackingNotification`]s.
//!   Move, resize and close notifications are mandatory because coordinates
//!   are never polled. The others are latency hints: the host polls on its
//!   own schedule regardless.
//!
//! # Crate boundaries
//!
//! `casement_core` owns the reconciler and this contract. Backend crates
//! depend on `casement_core` and provide the native glue. Application code
//! builds a [`Host`](crate::host::Host) around a boxed adapter and drives it
//! from its event loop.

use crate::error::BackingError;
use crate::geometry::{CoordinateScale, Insets, Rect};

/// A native window wrapped for reconciliation.
pub trait BackingWindow {
    /// Whether the native window is currently mapped on screen.
    fn is_showing(&self) -> bool;

    /// Whether the native window has keyboard focus.
    ///
    /// Undefined unless showing and not iconified.
    fn is_focused(&self) -> bool;

    /// Whether the native window is minimized.
    ///
    /// Undefined unless showing.
    fn is_iconified(&self) -> bool;

    /// Whether the native window is maximized.
    ///
    /// Undefined unless showing and not iconified.
    fn is_maximized(&self) -> bool;

    /// Decoration thickness between window bounds and client bounds.
    fn insets(&self) -> Insets;

    /// Bounds of the client area.
    fn client_bounds(&self) -> Rect;

    /// Bounds of the whole window including decorations.
    fn window_bounds(&self) -> Rect;

    /// Usable screen area for a maximized window, if the backend knows it.
    ///
    /// Returning `None` disables enforce-on-maximize for this host.
    fn work_area(&self) -> Option<Rect> {
        None
    }

    /// Whether [`set_iconified`](Self::set_iconified) has any effect.
    fn does_iconify_work(&self) -> bool {
        true
    }

    /// Whether [`set_maximized`](Self::set_maximized) has any effect.
    fn does_maximize_work(&self) -> bool {
        true
    }

    /// Maps the window.
    fn show(&mut self) -> Result<(), BackingError>;

    /// Unmaps the window.
    fn hide(&mut self) -> Result<(), BackingError>;

    /// Asks the window manager for keyboard focus.
    fn request_focus_gain(&mut self) -> Result<(), BackingError>;

    /// Minimizes or restores the window.
    fn set_iconified(&mut self, iconified: bool) -> Result<(), BackingError>;

    /// Maximizes or restores the window.
    fn set_maximized(&mut self, maximized: bool) -> Result<(), BackingError>;

    /// Moves/resizes so the client area matches `bounds`.
    fn set_client_bounds(&mut self, bounds: Rect) -> Result<(), BackingError>;

    /// Moves/resizes so the whole window matches `bounds`.
    fn set_window_bounds(&mut self, bounds: Rect) -> Result<(), BackingError>;

    /// Destroys the native window.
    fn close(&mut self) -> Result<(), BackingError>;
}

/// Identifies a [`BackingWindow`] mutator, for error reports and tracing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BackingOp {
    /// [`BackingWindow::show`].
    Show,
    /// [`BackingWindow::hide`].
    Hide,
    /// [`BackingWindow::request_focus_gain`].
    RequestFocusGain,
    /// [`BackingWindow::set_iconified`].
    SetIconified(bool),
    /// [`BackingWindow::set_maximized`].
    SetMaximized(bool),
    /// [`BackingWindow::set_client_bounds`].
    SetClientBounds,
    /// [`BackingWindow::set_window_bounds`].
    SetWindowBounds,
    /// [`BackingWindow::close`].
    Close,
}

/// A native event forwarded by the binding to
/// [`Host::notify`](crate::host::Host::notify).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BackingNotification {
    /// The window moved. Mandatory.
    Moved,
    /// The window resized. Mandatory.
    Resized,
    /// The user or window manager asked the window to close. Mandatory.
    Closing,
    /// The native window is gone. Mandatory.
    Closed,
    /// A pointer button went down.
    ButtonPressed {
        /// Whether the press landed inside the client area.
        inside_client: bool,
    },
    /// All pointer buttons are up.
    ButtonReleased,
    /// Hint: the window may have been shown.
    Shown,
    /// Hint: the window may have been hidden.
    Hidden,
    /// Hint: focus may have been gained.
    FocusGained,
    /// Hint: focus may have been lost.
    FocusLost,
    /// Hint: the window may have been iconified.
    Iconified,
    /// Hint: the window may have been deiconified.
    Deiconified,
    /// Hint: the window may have been maximized.
    Maximized,
    /// Hint: the window may have been demaximized.
    Demaximized,
    /// Hint: something happened; reconcile soon.
    AnyEvent,
}

/// One pass's view of the backing state.
///
/// Read fresh at the start of every reconciliation pass and never cached.
/// Fields whose query preconditions do not hold are `None`; a backend that
/// cannot iconify or maximize reports `Some(false)` for that axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BackingSnapshot {
    /// Whether the window is mapped.
    pub showing: bool,
    /// Minimized state; `None` while not showing.
    pub iconified: Option<bool>,
    /// Maximized state; `None` unless showing and not iconified.
    pub maximized: Option<bool>,
    /// Focus state; `None` unless showing and not iconified.
    pub focused: Option<bool>,
}

impl BackingSnapshot {
    /// Reads the backing state, honoring the query preconditions.
    #[must_use]
    pub fn read(backing: &dyn BackingWindow) -> Self {
        let showing = backing.is_showing();
        let iconified = showing.then(|| backing.does_iconify_work() && backing.is_iconified());
        let live = iconified == Some(false);
        let maximized = live.then(|| backing.does_maximize_work() && backing.is_maximized());
        let focused = live.then(|| backing.is_focused());
        Self {
            showing,
            iconified,
            maximized,
            focused,
        }
    }

    /// A snapshot of a window that is not mapped.
    pub const HIDDEN: Self = Self {
        showing: false,
        iconified: None,
        maximized: None,
        focused: None,
    };

    /// Whether the window is showing and not iconified.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.iconified == Some(false)
    }
}

/// Adapter wrapper applying a [`CoordinateScale`] at the backend boundary.
///
/// Queries are converted from backend space to client space; bounds setters
/// are converted the other way.
#[derive(Debug)]
pub struct Scaled<B, S> {
    inner: B,
    scale: S,
}

impl<B: BackingWindow, S: CoordinateScale> Scaled<B, S> {
    /// Wraps `inner` with `scale`.
    pub fn new(inner: B, scale: S) -> Self {
        Self { inner, scale }
    }

    /// Returns the wrapped adapter.
    pub fn inner(&self) -> &B {
        &self.inner
    }

    /// Returns the wrapped adapter mutably.
    pub fn inner_mut(&mut self) -> &mut B {
        &mut self.inner
    }
}

impl<B: BackingWindow, S: CoordinateScale> BackingWindow for Scaled<B, S> {
    fn is_showing(&self) -> bool {
        self.inner.is_showing()
    }

    fn is_focused(&self) -> bool {
        self.inner.is_focused()
    }

    fn is_iconified(&self) -> bool {
        self.inner.is_iconified()
    }

    fn is_maximized(&self) -> bool {
        self.inner.is_maximized()
    }

    fn insets(&self) -> Insets {
        self.scale.insets_to_client(self.inner.insets())
    }

    fn client_bounds(&self) -> Rect {
        self.scale.to_client(self.inner.client_bounds())
    }

    fn window_bounds(&self) -> Rect {
        self.scale.to_client(self.inner.window_bounds())
    }

    fn work_area(&self) -> Option<Rect> {
        self.inner.work_area().map(|r| self.scale.to_client(r))
    }

    fn does_iconify_work(&self) -> bool {
        self.inner.does_iconify_work()
    }

    fn does_maximize_work(&self) -> bool {
        self.inner.does_maximize_work()
    }

    fn show(&mut self) -> Result<(), BackingError> {
        self.inner.show()
    }

    fn hide(&mut self) -> Result<(), BackingError> {
        self.inner.hide()
    }

    fn request_focus_gain(&mut self) -> Result<(), BackingError> {
        self.inner.request_focus_gain()
    }

    fn set_iconified(&mut self, iconified: bool) -> Result<(), BackingError> {
        self.inner.set_iconified(iconified)
    }

    fn set_maximized(&mut self, maximized: bool) -> Result<(), BackingError> {
        self.inner.set_maximized(maximized)
    }

    fn set_client_bounds(&mut self, bounds: Rect) -> Result<(), BackingError> {
        self.inner.set_client_bounds(self.scale.to_backend(bounds))
    }

    fn set_window_bounds(&mut self, bounds: Rect) -> Result<(), BackingError> {
        self.inner.set_window_bounds(self.scale.to_backend(bounds))
    }

    fn close(&mut self) -> Result<(), BackingError> {
        self.inner.close()
    }
}

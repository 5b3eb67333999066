// Copyright 2026 the Casement Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A scriptable in-memory backing window.
//!
//! [`SimBacking`] is handed to a host; the paired [`SimHandle`] stays with
//! the test. Both share one [`SimState`]. The handle plays the part of the
//! user and the window manager (iconify from the taskbar, drag the frame,
//! flicker) and inspects what the host asked the backend to do.
//!
//! In deferred mode, mutators are queued and only take effect on
//! [`SimHandle::flush`], like a backend that applies requests
//! asynchronously.

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use casement_core::backing::{BackingOp, BackingWindow};
use casement_core::error::BackingError;
use casement_core::geometry::{Insets, Rect};
use log::trace;

/// One mutator call the host made.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimCall {
    /// The mutator.
    pub op: BackingOp,
    /// The requested bounds, for bounds setters.
    pub bounds: Option<Rect>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Mutation {
    Show,
    Hide,
    Focus,
    Iconify(bool),
    Maximize(bool),
    Client(Rect),
    Window(Rect),
    Close,
}

/// Native state of a simulated window.
#[derive(Clone, Debug)]
pub struct SimState {
    /// Whether the window is mapped.
    pub showing: bool,
    /// Whether the window is minimized.
    pub iconified: bool,
    /// Whether the window is maximized.
    pub maximized: bool,
    /// Whether the window has focus.
    pub focused: bool,
    /// Whether the native window was destroyed.
    pub closed: bool,
    /// Client bounds.
    pub client: Rect,
    /// Decoration insets.
    pub insets: Insets,
    /// Reported work area.
    pub work_area: Option<Rect>,
    /// Reported by `does_iconify_work`.
    pub iconify_works: bool,
    /// Reported by `does_maximize_work`.
    pub maximize_works: bool,
    /// Whether `request_focus_gain` grants focus.
    pub grant_focus: bool,
    /// Largest client width the window manager allows.
    pub max_client_width: Option<f64>,
    /// Largest client height the window manager allows.
    pub max_client_height: Option<f64>,
    calls: Vec<SimCall>,
    deferred: bool,
    queued: Vec<Mutation>,
    fail: Vec<BackingOp>,
}

impl Default for SimState {
    fn default() -> Self {
        Self {
            showing: false,
            iconified: false,
            maximized: false,
            focused: false,
            closed: false,
            client: Rect::new(100.0, 100.0, 500.0, 400.0),
            insets: Insets::new(4.0, 24.0, 4.0, 4.0),
            work_area: Some(Rect::new(0.0, 0.0, 1920.0, 1080.0)),
            iconify_works: true,
            maximize_works: true,
            grant_focus: true,
            max_client_width: None,
            max_client_height: None,
            calls: Vec::new(),
            deferred: false,
            queued: Vec::new(),
            fail: Vec::new(),
        }
    }
}

impl SimState {
    /// Window bounds: client bounds grown by the insets.
    #[must_use]
    pub fn window_bounds(&self) -> Rect {
        let (c, i) = (self.client, self.insets);
        Rect::new(c.x0 - i.x0, c.y0 - i.y0, c.x1 + i.x1, c.y1 + i.y1)
    }

    fn clamp(&self, mut client: Rect) -> Rect {
        if let Some(max) = self.max_client_width {
            client.x1 = client.x1.min(client.x0 + max);
        }
        if let Some(max) = self.max_client_height {
            client.y1 = client.y1.min(client.y0 + max);
        }
        client
    }

    fn apply(&mut self, m: Mutation) {
        match m {
            Mutation::Show => self.showing = true,
            Mutation::Hide => {
                self.showing = false;
                self.focused = false;
            }
            Mutation::Focus => {
                if self.grant_focus && self.showing && !self.iconified {
                    self.focused = true;
                }
            }
            Mutation::Iconify(v) => {
                self.iconified = v;
                if v {
                    self.focused = false;
                }
            }
            Mutation::Maximize(v) => {
                self.maximized = v;
                if v && let Some(area) = self.work_area {
                    let i = self.insets;
                    self.client = Rect::new(
                        area.x0 + i.x0,
                        area.y0 + i.y0,
                        area.x1 - i.x1,
                        area.y1 - i.y1,
                    );
                }
            }
            Mutation::Client(r) => self.client = self.clamp(r),
            Mutation::Window(r) => {
                let i = self.insets;
                let client = Rect::new(r.x0 + i.x0, r.y0 + i.y0, r.x1 - i.x1, r.y1 - i.y1);
                self.client = self.clamp(client);
            }
            Mutation::Close => {
                self.showing = false;
                self.focused = false;
                self.closed = true;
            }
        }
    }
}

/// The host's end of a simulated window.
#[derive(Debug)]
pub struct SimBacking {
    state: Rc<RefCell<SimState>>,
}

/// The test's end of a simulated window.
#[derive(Clone, Debug)]
pub struct SimHandle {
    state: Rc<RefCell<SimState>>,
}

/// Creates a hidden simulated window with default geometry.
#[must_use]
pub fn sim_window() -> (SimBacking, SimHandle) {
    sim_window_with(SimState::default())
}

/// Creates a simulated window starting from `state`.
#[must_use]
pub fn sim_window_with(state: SimState) -> (SimBacking, SimHandle) {
    let state = Rc::new(RefCell::new(state));
    (
        SimBacking {
            state: Rc::clone(&state),
        },
        SimHandle { state },
    )
}

impl SimBacking {
    fn mutate(
        &mut self,
        op: BackingOp,
        bounds: Option<Rect>,
        m: Mutation,
    ) -> Result<(), BackingError> {
        let mut s = self.state.borrow_mut();
        s.calls.push(SimCall { op, bounds });
        if let Some(i) = s.fail.iter().position(|f| *f == op) {
            s.fail.remove(i);
            trace!("sim: {op:?} fails");
            return Err(BackingError::new(format!("simulated {op:?} failure")));
        }
        if s.closed {
            return Err(BackingError::new("window destroyed"));
        }
        if s.deferred {
            s.queued.push(m);
        } else {
            s.apply(m);
        }
        trace!("sim: {op:?}");
        Ok(())
    }
}

impl BackingWindow for SimBacking {
    fn is_showing(&self) -> bool {
        self.state.borrow().showing
    }

    fn is_focused(&self) -> bool {
        self.state.borrow().focused
    }

    fn is_iconified(&self) -> bool {
        self.state.borrow().iconified
    }

    fn is_maximized(&self) -> bool {
        self.state.borrow().maximized
    }

    fn insets(&self) -> Insets {
        self.state.borrow().insets
    }

    fn client_bounds(&self) -> Rect {
        self.state.borrow().client
    }

    fn window_bounds(&self) -> Rect {
        self.state.borrow().window_bounds()
    }

    fn work_area(&self) -> Option<Rect> {
        self.state.borrow().work_area
    }

    fn does_iconify_work(&self) -> bool {
        self.state.borrow().iconify_works
    }

    fn does_maximize_work(&self) -> bool {
        self.state.borrow().maximize_works
    }

    fn show(&mut self) -> Result<(), BackingError> {
        self.mutate(BackingOp::Show, None, Mutation::Show)
    }

    fn hide(&mut self) -> Result<(), BackingError> {
        self.mutate(BackingOp::Hide, None, Mutation::Hide)
    }

    fn request_focus_gain(&mut self) -> Result<(), BackingError> {
        self.mutate(BackingOp::RequestFocusGain, None, Mutation::Focus)
    }

    fn set_iconified(&mut self, iconified: bool) -> Result<(), BackingError> {
        self.mutate(
            BackingOp::SetIconified(iconified),
            None,
            Mutation::Iconify(iconified),
        )
    }

    fn set_maximized(&mut self, maximized: bool) -> Result<(), BackingError> {
        self.mutate(
            BackingOp::SetMaximized(maximized),
            None,
            Mutation::Maximize(maximized),
        )
    }

    fn set_client_bounds(&mut self, bounds: Rect) -> Result<(), BackingError> {
        self.mutate(
            BackingOp::SetClientBounds,
            Some(bounds),
            Mutation::Client(bounds),
        )
    }

    fn set_window_bounds(&mut self, bounds: Rect) -> Result<(), BackingError> {
        self.mutate(
            BackingOp::SetWindowBounds,
            Some(bounds),
            Mutation::Window(bounds),
        )
    }

    fn close(&mut self) -> Result<(), BackingError> {
        self.mutate(BackingOp::Close, None, Mutation::Close)
    }
}

impl SimHandle {
    /// Read access to the shared state.
    #[must_use]
    pub fn state(&self) -> Ref<'_, SimState> {
        self.state.borrow()
    }

    /// Edits the shared state directly, bypassing the call log.
    pub fn edit(&self, f: impl FnOnce(&mut SimState)) {
        f(&mut self.state.borrow_mut());
    }

    /// Current client bounds.
    #[must_use]
    pub fn client_bounds(&self) -> Rect {
        self.state.borrow().client
    }

    /// Every mutator call so far.
    #[must_use]
    pub fn calls(&self) -> Vec<SimCall> {
        self.state.borrow().calls.clone()
    }

    /// How many times `op` was called.
    #[must_use]
    pub fn count(&self, op: BackingOp) -> usize {
        self.state
            .borrow()
            .calls
            .iter()
            .filter(|c| c.op == op)
            .count()
    }

    /// Forgets the call log.
    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    /// Makes the next call of `op` fail.
    pub fn fail_next(&self, op: BackingOp) {
        self.state.borrow_mut().fail.push(op);
    }

    /// Queues mutators until [`flush`](Self::flush) instead of applying them.
    pub fn set_deferred(&self, deferred: bool) {
        self.state.borrow_mut().deferred = deferred;
    }

    /// Applies every queued mutator.
    pub fn flush(&self) {
        let mut s = self.state.borrow_mut();
        for m in core::mem::take(&mut s.queued) {
            s.apply(m);
        }
    }

    /// The user or window manager shows or hides the window.
    pub fn user_set_showing(&self, showing: bool) {
        let m = if showing { Mutation::Show } else { Mutation::Hide };
        self.state.borrow_mut().apply(m);
    }

    /// The user or window manager minimizes or restores the window.
    pub fn user_set_iconified(&self, iconified: bool) {
        self.state.borrow_mut().apply(Mutation::Iconify(iconified));
    }

    /// The user or window manager maximizes or restores the window.
    pub fn user_set_maximized(&self, maximized: bool) {
        self.state.borrow_mut().apply(Mutation::Maximize(maximized));
    }

    /// Focus moves to or away from the window.
    pub fn user_set_focused(&self, focused: bool) {
        self.state.borrow_mut().focused = focused;
    }

    /// The user drags the window so its client area lands on `client`.
    pub fn user_move_to(&self, client: Rect) {
        self.state.borrow_mut().client = client;
    }
}

// Copyright 2026 the Casement Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The host: one window or dialog and its reconciliation state.
//!
//! A [`Host`] owns a boxed [`BackingWindow`], the client's
//! [`ClientListener`], and everything needed to turn the backend's
//! unreliable state into a canonical event stream.
//!
//! # Driving a host
//!
//! Reconciliation runs synchronously inside every public operation and every
//! [`notify`](Host::notify). Delayed work (stability re-checks, the periodic
//! poll, paints, burst debounce) is queued on the host's own task queue. The
//! embedding event loop sleeps until [`next_deadline`](Host::next_deadline)
//! and then calls [`run_due`](Host::run_due):
//!
//! ```no_run
//! # use casement_core::host::Host;
//! # fn wait_until(_: Option<casement_core::time::HostTime>) {}
//! # fn drive(mut host: Host) -> casement_core::error::HostResult<()> {
//! while !host.is_closed() {
//!     wait_until(host.next_deadline());
//!     host.run_due()?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Operations
//!
//! Visibility and state operations return `Ok(true)` when they started a
//! change and `Ok(false)` when there was nothing to do: the host is closed,
//! already in the target state, or the same change is already pending.
//! Backend failures are reported to the error hook, not returned.

use core::fmt;
use std::rc::Rc;

use log::{debug, trace, warn};

use crate::backing::{BackingNotification, BackingOp, BackingSnapshot, BackingWindow};
use crate::clock::{Clock, MonotonicClock};
use crate::config::HostConfig;
use crate::dispatch::{Dispatcher, Effects, Intents};
use crate::drag::{BlockAfterBoundsSet, BoundsTarget, DragMoveFilter, DragSession, DragStabilizer};
use crate::enforce::{BoundsEnforcement, Enforcement};
use crate::error::{BackingError, HostError, HostResult};
use crate::event::{ClientListener, HostRequest, StateAxis, StateEvent, WindowEvent};
use crate::geometry::{self, EMPTY_BOUNDS, EMPTY_INSETS, Insets, Rect};
use crate::id::HostId;
use crate::paint::{BurstKind, InvalidationHandle, PaintDecision, PaintScheduler, Painter};
use crate::rules::{self, Action, Decision, Pass};
use crate::scheduler::{Scheduler, Task};
use crate::stability::StabilityTracker;
use crate::state::ClientObservedState;
use crate::thread::ThreadGuard;
use crate::time::{Duration, HostTime};
use crate::trace::{
    BackingCallEvent, FireEvent, GateEvent, PaintEvent, PaintOutcome, PassEvent, StallEvent,
    TraceSink, Tracer,
};

/// Passes a single reconciliation run may take before it yields.
const MAX_PASSES: u32 = 64;

/// Receives collaborator failures. Defaults to `log::error!`.
pub type ErrorHook = Box<dyn FnMut(HostId, &HostError)>;

fn default_error_hook() -> ErrorHook {
    Box::new(|id, err| log::error!("{id:?}: {err}"))
}

/// Policies for [`Host::set_client_bounds_smart`] and
/// [`Host::set_window_bounds_smart`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SmartBounds {
    /// Keep the requested right edge if the backend adjusts the width.
    pub fix_right: bool,
    /// Keep the requested bottom edge if the backend adjusts the height.
    pub fix_bottom: bool,
    /// Restore the previous bounds if the result is not what was asked for.
    pub rollback_if_inexact: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BoundsKind {
    Client,
    Window,
}

impl BoundsKind {
    fn target(self, bounds: Rect) -> BoundsTarget {
        match self {
            Self::Client => BoundsTarget::Client(bounds),
            Self::Window => BoundsTarget::Window(bounds),
        }
    }
}

/// Builds a [`Host`].
pub struct HostBuilder {
    backing: Box<dyn BackingWindow>,
    listener: Box<dyn ClientListener>,
    title: String,
    decorated: bool,
    modal: bool,
    config: HostConfig,
    clock: Option<Rc<dyn Clock>>,
    painter: Option<Box<dyn Painter>>,
    trace_sink: Option<Box<dyn TraceSink>>,
    error_hook: Option<ErrorHook>,
    drag_filter: Option<Box<dyn DragMoveFilter>>,
}

impl fmt::Debug for HostBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostBuilder")
            .field("title", &self.title)
            .field("decorated", &self.decorated)
            .field("modal", &self.modal)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl HostBuilder {
    /// Starts a builder for a host around `backing`, delivering events to
    /// `listener`.
    pub fn new(
        backing: impl BackingWindow + 'static,
        listener: impl ClientListener + 'static,
    ) -> Self {
        Self::from_boxed(Box::new(backing), Box::new(listener))
    }

    /// Like [`new`](Self::new), for already boxed parts.
    #[must_use]
    pub fn from_boxed(backing: Box<dyn BackingWindow>, listener: Box<dyn ClientListener>) -> Self {
        Self {
            backing,
            listener,
            title: String::new(),
            decorated: true,
            modal: false,
            config: HostConfig::default(),
            clock: None,
            painter: None,
            trace_sink: None,
            error_hook: None,
            drag_filter: None,
        }
    }

    /// Sets the title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Sets whether the window has native decorations.
    #[must_use]
    pub fn decorated(mut self, decorated: bool) -> Self {
        self.decorated = decorated;
        self
    }

    /// Sets whether the host is modal. Only meaningful for dialogs.
    #[must_use]
    pub fn modal(mut self, modal: bool) -> Self {
        self.modal = modal;
        self
    }

    /// Sets the configuration. It is validated by [`build`](Self::build).
    #[must_use]
    pub fn config(mut self, config: HostConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the clock. Hosts default to a [`MonotonicClock`]; dialogs
    /// default to their owner's clock.
    #[must_use]
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Rc::new(clock));
        self
    }

    /// Sets the painter.
    #[must_use]
    pub fn painter(mut self, painter: impl Painter + 'static) -> Self {
        self.painter = Some(Box::new(painter));
        self
    }

    /// Sets a trace sink. Ignored unless the `trace` feature is enabled.
    #[must_use]
    pub fn trace_sink(mut self, sink: impl TraceSink + 'static) -> Self {
        self.trace_sink = Some(Box::new(sink));
        self
    }

    /// Sets the hook that receives backend and painter failures.
    #[must_use]
    pub fn error_hook(mut self, hook: impl FnMut(HostId, &HostError) + 'static) -> Self {
        self.error_hook = Some(Box::new(hook));
        self
    }

    /// Replaces the default [`BlockAfterBoundsSet`] drag-move filter.
    #[must_use]
    pub fn drag_move_filter(mut self, filter: impl DragMoveFilter + 'static) -> Self {
        self.drag_filter = Some(Box::new(filter));
        self
    }

    /// Builds a top-level host.
    pub fn build(self) -> HostResult<Host> {
        self.build_owned(None)
    }

    fn build_owned(self, owner: Option<&Host>) -> HostResult<Host> {
        self.config.validate()?;
        let clock = match (self.clock, owner) {
            (Some(clock), _) => clock,
            (None, Some(owner)) => Rc::clone(&owner.clock),
            (None, None) => Rc::new(MonotonicClock::new()),
        };
        let id = HostId::next();
        let now = clock.now();
        let mut scheduler = Scheduler::new();
        scheduler.schedule(Task::Poll, now + self.config.poll_period());
        debug!("{id:?}: created {:?}", self.title);

        Ok(Host {
            id,
            owner: owner.map(|o| o.id),
            title: self.title,
            decorated: self.decorated,
            modal: self.modal,
            thread: ThreadGuard::current(),
            clock,
            backing: self.backing,
            backing_closed: false,
            closing: false,
            dispatcher: Dispatcher::new(id, self.listener),
            stability: StabilityTracker::new(),
            drag: DragStabilizer::new(
                self.drag_filter
                    .unwrap_or_else(|| Box::new(BlockAfterBoundsSet)),
            ),
            enforcement: BoundsEnforcement::default(),
            invalidation: InvalidationHandle::new(),
            paint: PaintScheduler::default(),
            painter: self.painter,
            scheduler,
            tracer: self.trace_sink.map_or_else(Tracer::none, Tracer::new),
            error_hook: self.error_hook.unwrap_or_else(default_error_hook),
            dialogs: Vec::new(),
            config: self.config,
        })
    }
}

/// One window or dialog.
pub struct Host {
    id: HostId,
    owner: Option<HostId>,
    title: String,
    decorated: bool,
    modal: bool,
    config: HostConfig,
    thread: ThreadGuard,
    clock: Rc<dyn Clock>,
    backing: Box<dyn BackingWindow>,
    backing_closed: bool,
    closing: bool,
    dispatcher: Dispatcher,
    stability: StabilityTracker,
    drag: DragStabilizer,
    enforcement: BoundsEnforcement,
    invalidation: InvalidationHandle,
    paint: PaintScheduler,
    painter: Option<Box<dyn Painter>>,
    scheduler: Scheduler,
    tracer: Tracer,
    error_hook: ErrorHook,
    dialogs: Vec<Self>,
}

impl fmt::Debug for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Host")
            .field("id", &self.id)
            .field("owner", &self.owner)
            .field("title", &self.title)
            .field("observed", self.dispatcher.observed())
            .field("closing", &self.closing)
            .field("dialogs", &self.dialogs)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Accessors
// ---------------------------------------------------------------------------

impl Host {
    /// The host's id.
    #[must_use]
    pub fn id(&self) -> HostId {
        self.id
    }

    /// The owning host, for dialogs.
    #[must_use]
    pub fn owner(&self) -> Option<HostId> {
        self.owner
    }

    /// The title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Whether the window has native decorations.
    #[must_use]
    pub fn is_decorated(&self) -> bool {
        self.decorated
    }

    /// Whether the host is modal.
    #[must_use]
    pub fn is_modal(&self) -> bool {
        self.modal
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// The state the client has observed.
    #[must_use]
    pub fn state(&self) -> &ClientObservedState {
        self.dispatcher.observed()
    }

    /// Whether Closed has been delivered.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.dispatcher.observed().is_closed()
    }

    /// Whether [`close`](Self::close) has started.
    #[must_use]
    pub fn is_closing(&self) -> bool {
        self.closing
    }

    /// The current time on the host's clock.
    #[must_use]
    pub fn now(&self) -> HostTime {
        self.clock.now()
    }

    /// Stability bookkeeping, for diagnostics.
    #[must_use]
    pub fn stability(&self) -> &StabilityTracker {
        &self.stability
    }

    /// The drag in progress, if any.
    #[must_use]
    pub fn drag_session(&self) -> Option<&DragSession> {
        self.drag.session()
    }

    /// The armed bounds enforcement.
    #[must_use]
    pub fn enforcement(&self) -> Enforcement {
        self.enforcement.slot()
    }

    /// A handle for invalidating this host from any thread.
    #[must_use]
    pub fn invalidation_handle(&self) -> InvalidationHandle {
        self.invalidation.clone()
    }

    /// The earliest time [`run_due`](Self::run_due) has work, across this
    /// host and its dialogs.
    #[must_use]
    pub fn next_deadline(&self) -> Option<HostTime> {
        self.dialogs
            .iter()
            .filter_map(Self::next_deadline)
            .chain(self.scheduler.next_deadline())
            .min()
    }

    fn reports_bounds(&self) -> bool {
        !self.closing && !self.backing_closed && self.dispatcher.observed().is_live()
    }

    /// Client bounds, or [`EMPTY_BOUNDS`] unless showing and deiconified.
    ///
    /// During a drag this is the value captured at button press.
    #[must_use]
    pub fn client_bounds(&self) -> Rect {
        if !self.reports_bounds() {
            return EMPTY_BOUNDS;
        }
        match self.drag.frozen_bounds() {
            Some((client, _)) => client,
            None => self.backing.client_bounds(),
        }
    }

    /// Window bounds, or [`EMPTY_BOUNDS`] unless showing and deiconified.
    ///
    /// During a drag this is the value captured at button press.
    #[must_use]
    pub fn window_bounds(&self) -> Rect {
        if !self.reports_bounds() {
            return EMPTY_BOUNDS;
        }
        match self.drag.frozen_bounds() {
            Some((_, window)) => window,
            None => self.backing.window_bounds(),
        }
    }

    /// Decoration insets, or [`EMPTY_INSETS`] unless showing and
    /// deiconified.
    #[must_use]
    pub fn insets(&self) -> Insets {
        if self.reports_bounds() {
            self.backing.insets()
        } else {
            EMPTY_INSETS
        }
    }
}

// ---------------------------------------------------------------------------
// Public operations
// ---------------------------------------------------------------------------

impl Host {
    fn run_op(&mut self, op: impl FnOnce(&mut Self) -> bool) -> HostResult<bool> {
        self.thread.check()?;
        let changed = op(self);
        if changed {
            self.reconcile()?;
        }
        Ok(changed)
    }

    /// Shows the host. With `deiconify_on_show`, also deiconifies it.
    pub fn show(&mut self) -> HostResult<bool> {
        self.run_op(Self::op_show)
    }

    /// Hides the host.
    pub fn hide(&mut self) -> HostResult<bool> {
        self.run_op(Self::op_hide)
    }

    /// Asks the backend for keyboard focus.
    pub fn request_focus_gain(&mut self) -> HostResult<bool> {
        self.run_op(Self::op_request_focus)
    }

    /// Minimizes the host.
    pub fn iconify(&mut self) -> HostResult<bool> {
        self.run_op(|h| h.op_set_iconified(true))
    }

    /// Restores the host from minimized.
    pub fn deiconify(&mut self) -> HostResult<bool> {
        self.run_op(|h| h.op_set_iconified(false))
    }

    /// Maximizes the host, or arranges for it to fill the work area once it
    /// is live if it cannot be maximized right now.
    pub fn maximize(&mut self) -> HostResult<bool> {
        self.run_op(Self::op_maximize)
    }

    /// Restores the host from maximized.
    pub fn demaximize(&mut self) -> HostResult<bool> {
        self.run_op(Self::op_demaximize)
    }

    /// Sets the client bounds.
    ///
    /// Applied immediately while showing, deiconified and demaximized;
    /// queued until release during a drag; otherwise applied once the host
    /// next settles in that state.
    pub fn set_client_bounds(&mut self, bounds: Rect) -> HostResult<bool> {
        self.run_op(|h| h.op_set_bounds(BoundsTarget::Client(bounds)))
    }

    /// Sets the window bounds. See [`set_client_bounds`](Self::set_client_bounds).
    pub fn set_window_bounds(&mut self, bounds: Rect) -> HostResult<bool> {
        self.run_op(|h| h.op_set_bounds(BoundsTarget::Window(bounds)))
    }

    /// Sets the client bounds, then corrects for backend adjustments.
    ///
    /// Returns whether the client bounds changed overall.
    pub fn set_client_bounds_smart(
        &mut self,
        bounds: Rect,
        policy: SmartBounds,
    ) -> HostResult<bool> {
        self.run_op(|h| h.op_set_bounds_smart(BoundsKind::Client, bounds, policy))
    }

    /// Sets the window bounds, then corrects for backend adjustments.
    ///
    /// Returns whether the window bounds changed overall.
    pub fn set_window_bounds_smart(
        &mut self,
        bounds: Rect,
        policy: SmartBounds,
    ) -> HostResult<bool> {
        self.run_op(|h| h.op_set_bounds_smart(BoundsKind::Window, bounds, policy))
    }

    /// Marks `rect` (client-local) dirty and schedules a paint.
    pub fn invalidate(&mut self, rect: Rect) {
        self.invalidation.invalidate(rect);
        self.sync_paint_request(self.now());
    }

    /// Marks the whole client area dirty and schedules a paint.
    pub fn invalidate_all(&mut self) {
        if !self.backing_closed {
            let area = geometry::client_area(self.backing.client_bounds());
            self.invalidate(area);
        }
    }

    /// Closes this host.
    ///
    /// Closes every dialog first, depth-first, then the backing window, then
    /// delivers whatever of FocusLost, Hidden and Closed the client has not
    /// seen yet. Every step is attempted; the first failure is returned.
    /// Calling it again does nothing.
    pub fn close(&mut self) -> HostResult<()> {
        self.thread.check()?;
        let mut first = self.begin_close();
        if let Err(err) = self.reconcile() {
            first.get_or_insert(err);
        }
        first.map_or(Ok(()), Err)
    }

    /// Feeds a backend notification.
    pub fn notify(&mut self, notification: BackingNotification) -> HostResult<()> {
        self.thread.check()?;
        if self.is_closed() {
            return Ok(());
        }
        let now = self.now();
        trace!("{:?}: notify {notification:?}", self.id);
        let mut first = None;
        match notification {
            BackingNotification::Moved => self.bounds_notification(BurstKind::Move, now),
            BackingNotification::Resized => self.bounds_notification(BurstKind::Resize, now),
            BackingNotification::Closing => first = self.begin_close(),
            BackingNotification::Closed => {
                self.backing_closed = true;
                first = self.begin_close();
            }
            BackingNotification::ButtonPressed { inside_client } => {
                self.button_pressed(inside_client);
            }
            BackingNotification::ButtonReleased => {
                if let Some(target) = self.drag.release() {
                    debug!("{:?}: drag ended, applying {target:?}", self.id);
                    _ = self.apply_bounds(target);
                }
            }
            BackingNotification::Shown
            | BackingNotification::Hidden
            | BackingNotification::FocusGained
            | BackingNotification::FocusLost
            | BackingNotification::Iconified
            | BackingNotification::Deiconified
            | BackingNotification::Maximized
            | BackingNotification::Demaximized
            | BackingNotification::AnyEvent => {}
        }
        if let Err(err) = self.reconcile() {
            first.get_or_insert(err);
        }
        first.map_or(Ok(()), Err)
    }

    /// Runs every task that is due, in this host and its dialogs.
    ///
    /// A listener failure stops this host's remaining tasks; they stay queued
    /// and run on the next call.
    pub fn run_due(&mut self) -> HostResult<()> {
        self.thread.check()?;
        let mut first = None;
        for dialog in &mut self.dialogs {
            if let Err(err) = dialog.run_due() {
                first.get_or_insert(err);
            }
        }
        self.prune_dialogs();

        let now = self.now();
        if self.closing && !self.is_closed() {
            self.scheduler.schedule(Task::Reconcile, now);
        }
        self.sync_paint_request(now);

        let mut due = self.scheduler.drain_due(now).into_iter();
        while let Some((task, at)) = due.next() {
            if let Err(err) = self.run_task(task, at) {
                for (task, at) in due.by_ref() {
                    self.scheduler.schedule(task, at);
                }
                first.get_or_insert(err);
                break;
            }
        }
        first.map_or(Ok(()), Err)
    }
}

// ---------------------------------------------------------------------------
// Dialogs
// ---------------------------------------------------------------------------

impl Host {
    /// Builds a dialog owned by this host and returns its id.
    ///
    /// Fails with [`HostError::Closed`] once this host is closing or closed.
    pub fn create_dialog(&mut self, builder: HostBuilder) -> HostResult<HostId> {
        self.thread.check()?;
        if self.closing || self.is_closed() {
            return Err(HostError::Closed(self.id));
        }
        self.prune_dialogs();
        let dialog = builder.build_owned(Some(&*self))?;
        let id = dialog.id;
        self.dialogs.push(dialog);
        Ok(id)
    }

    /// Finds an open dialog by id, searching nested dialogs too.
    #[must_use]
    pub fn dialog(&self, id: HostId) -> Option<&Self> {
        self.dialogs
            .iter()
            .find_map(|d| if d.id == id { Some(d) } else { d.dialog(id) })
    }

    /// Finds an open dialog by id, searching nested dialogs too.
    pub fn dialog_mut(&mut self, id: HostId) -> Option<&mut Self> {
        self.dialogs.iter_mut().find_map(|d| {
            if d.id == id {
                Some(d)
            } else {
                d.dialog_mut(id)
            }
        })
    }

    /// Direct dialogs in creation order.
    pub fn dialogs(&self) -> impl Iterator<Item = &Self> {
        self.dialogs.iter()
    }

    fn prune_dialogs(&mut self) {
        self.dialogs.retain(|d| {
            if d.is_closed() {
                debug!("{:?}: dropping closed dialog", d.id);
            }
            !d.is_closed()
        });
    }
}

// ---------------------------------------------------------------------------
// Operation bodies
// ---------------------------------------------------------------------------

impl Host {
    fn inert(&self) -> bool {
        self.closing || self.is_closed()
    }

    fn report(&mut self, err: &HostError) {
        (self.error_hook)(self.id, err);
    }

    /// Calls a backend mutator, tracing it and routing failure to the hook.
    fn call_backing(
        &mut self,
        op: BackingOp,
        f: impl FnOnce(&mut dyn BackingWindow) -> Result<(), BackingError>,
    ) -> HostResult<()> {
        let result = f(self.backing.as_mut());
        let now = self.now();
        self.tracer.backing_call(&BackingCallEvent {
            host: self.id,
            now,
            op,
            ok: result.is_ok(),
        });
        match result {
            Ok(()) => {
                debug!("{:?}: backing {op:?}", self.id);
                Ok(())
            }
            Err(source) => {
                let err = HostError::Backing { op, source };
                self.report(&err);
                Err(err)
            }
        }
    }

    /// Marks a programmatic change to `event` unless it would be a no-op.
    fn begin_state_change(&mut self, event: StateEvent) -> bool {
        if self.inert() || self.stability.is_pending(event) {
            return false;
        }
        let o = self.dispatcher.observed();
        let (observed, target) = match event {
            StateEvent::Shown => (o.is_showing(), true),
            StateEvent::Hidden => (o.is_showing(), false),
            StateEvent::Iconified => (o.is_iconified(), true),
            StateEvent::Deiconified => (o.is_iconified(), false),
            StateEvent::Maximized => (o.is_maximized(), true),
            StateEvent::Demaximized => (o.is_maximized(), false),
        };
        if observed == target && !self.stability.is_pending(event.opposite()) {
            trace!("{:?}: {event:?} already observed", self.id);
            return false;
        }
        let now = self.now();
        self.stability.begin_programmatic(event, now);
        debug!("{:?}: programmatic {event:?}", self.id);
        true
    }

    /// Calls the mutator behind a programmatic change, withdrawing the
    /// pending mark if the backend refuses.
    fn programmatic_call(
        &mut self,
        event: StateEvent,
        op: BackingOp,
        f: impl FnOnce(&mut dyn BackingWindow) -> Result<(), BackingError>,
    ) {
        if self.call_backing(op, f).is_err() {
            self.stability.cancel_programmatic(event);
        }
    }

    fn op_show(&mut self) -> bool {
        let iconified = self.dispatcher.observed().is_iconified();
        let deiconify = self.config.deiconify_on_show && iconified;
        let shown = self.begin_state_change(StateEvent::Shown);
        if shown {
            self.programmatic_call(StateEvent::Shown, BackingOp::Show, |b| b.show());
        }
        let deiconified = deiconify && self.op_set_iconified(false);
        shown || deiconified
    }

    fn op_hide(&mut self) -> bool {
        if !self.begin_state_change(StateEvent::Hidden) {
            return false;
        }
        self.programmatic_call(StateEvent::Hidden, BackingOp::Hide, |b| b.hide());
        true
    }

    fn op_request_focus(&mut self) -> bool {
        let o = *self.dispatcher.observed();
        if self.inert() || !o.is_live() || o.is_focused() {
            return false;
        }
        self.call_backing(BackingOp::RequestFocusGain, |b| b.request_focus_gain())
            .is_ok()
    }

    fn op_set_iconified(&mut self, iconified: bool) -> bool {
        if !self.backing.does_iconify_work() {
            return false;
        }
        let event = StateEvent::for_value(StateAxis::Iconification, iconified);
        if !self.begin_state_change(event) {
            return false;
        }
        self.programmatic_call(event, BackingOp::SetIconified(iconified), |b| {
            b.set_iconified(iconified)
        });
        true
    }

    fn op_maximize(&mut self) -> bool {
        if self.inert() {
            return false;
        }
        if !self.backing.does_maximize_work() {
            if self.enforcement.slot() == Enforcement::OnMaximize {
                return false;
            }
            self.enforcement.arm_maximize();
            return true;
        }
        if !self.begin_state_change(StateEvent::Maximized) {
            return false;
        }
        if !self.dispatcher.observed().is_live() {
            self.enforcement.arm_maximize();
        }
        self.programmatic_call(StateEvent::Maximized, BackingOp::SetMaximized(true), |b| {
            b.set_maximized(true)
        });
        true
    }

    fn op_demaximize(&mut self) -> bool {
        if self.inert() {
            return false;
        }
        if !self.backing.does_maximize_work() {
            let armed = self.enforcement.slot() == Enforcement::OnMaximize;
            self.enforcement.disarm_maximize();
            return armed;
        }
        if !self.begin_state_change(StateEvent::Demaximized) {
            return false;
        }
        self.enforcement.disarm_maximize();
        self.programmatic_call(StateEvent::Demaximized, BackingOp::SetMaximized(false), |b| {
            b.set_maximized(false)
        });
        true
    }

    /// Whether bounds can go straight to the backend.
    fn bounds_settable(&self) -> bool {
        if self.inert() || self.backing_closed || self.drag.frozen_bounds().is_some() {
            return false;
        }
        let o = self.dispatcher.observed();
        let s = BackingSnapshot::read(self.backing.as_ref());
        o.is_live() && !o.is_maximized() && s.is_live() && s.maximized == Some(false)
    }

    fn read_bounds(&self, kind: BoundsKind) -> Rect {
        match kind {
            BoundsKind::Client => self.backing.client_bounds(),
            BoundsKind::Window => self.backing.window_bounds(),
        }
    }

    fn apply_bounds(&mut self, target: BoundsTarget) -> HostResult<()> {
        let now = self.now();
        self.drag.note_bounds_set(now);
        match target {
            BoundsTarget::Client(r) => {
                self.call_backing(BackingOp::SetClientBounds, |b| b.set_client_bounds(r))
            }
            BoundsTarget::Window(r) => {
                self.call_backing(BackingOp::SetWindowBounds, |b| b.set_window_bounds(r))
            }
        }
    }

    fn op_set_bounds(&mut self, target: BoundsTarget) -> bool {
        if self.inert() {
            return false;
        }
        if self.drag.queue(target) {
            debug!("{:?}: {target:?} queued until drag end", self.id);
            return true;
        }
        if !self.bounds_settable() {
            debug!("{:?}: {target:?} deferred until demaximized", self.id);
            self.enforcement.arm_demaximize(target);
            return true;
        }
        let current = match target {
            BoundsTarget::Client(r) => (self.backing.client_bounds(), r),
            BoundsTarget::Window(r) => (self.backing.window_bounds(), r),
        };
        if current.0 == current.1 {
            return false;
        }
        self.enforcement.disarm_demaximize();
        _ = self.apply_bounds(target);
        true
    }

    fn op_set_bounds_smart(&mut self, kind: BoundsKind, bounds: Rect, policy: SmartBounds) -> bool {
        if !self.bounds_settable() {
            return self.op_set_bounds(kind.target(bounds));
        }
        let before = self.read_bounds(kind);
        if before == bounds {
            return false;
        }
        self.enforcement.disarm_demaximize();
        _ = self.apply_bounds(kind.target(bounds));
        let mut after = self.read_bounds(kind);
        let mut expected = bounds;

        if after != bounds && (policy.fix_right || policy.fix_bottom) {
            expected = geometry::pin_far_edges(after, bounds, policy.fix_right, policy.fix_bottom);
            if expected != after {
                debug!("{:?}: pinning far edges at {expected:?}", self.id);
                _ = self.apply_bounds(kind.target(expected));
                after = self.read_bounds(kind);
            }
        }
        if after != expected && policy.rollback_if_inexact {
            debug!("{:?}: got {after:?} for {expected:?}, rolling back", self.id);
            _ = self.apply_bounds(kind.target(before));
            after = self.read_bounds(kind);
        }
        after != before
    }

    /// Starts closing without driving the loop. Returns the first failure.
    fn begin_close(&mut self) -> Option<HostError> {
        if self.inert() {
            return None;
        }
        debug!("{:?}: closing", self.id);
        self.closing = true;
        let mut first = None;
        for dialog in &mut self.dialogs {
            if let Err(err) = dialog.close() {
                first.get_or_insert(err);
            }
        }
        self.prune_dialogs();

        self.drag.cancel();
        self.enforcement.disarm();
        *self.dispatcher.intents_mut() = Intents::default();
        if !self.backing_closed {
            if let Err(err) = self.call_backing(BackingOp::Close, |b| b.close()) {
                first.get_or_insert(err);
            }
            self.backing_closed = true;
        }
        first
    }

    fn apply_request(&mut self, request: HostRequest) {
        trace!("{:?}: listener request {request:?}", self.id);
        match request {
            HostRequest::Show => {
                self.op_show();
            }
            HostRequest::Hide => {
                self.op_hide();
            }
            HostRequest::RequestFocusGain => {
                self.op_request_focus();
            }
            HostRequest::Iconify => {
                self.op_set_iconified(true);
            }
            HostRequest::Deiconify => {
                self.op_set_iconified(false);
            }
            HostRequest::Maximize => {
                self.op_maximize();
            }
            HostRequest::Demaximize => {
                self.op_demaximize();
            }
            HostRequest::SetClientBounds(r) => {
                self.op_set_bounds(BoundsTarget::Client(r));
            }
            HostRequest::SetWindowBounds(r) => {
                self.op_set_bounds(BoundsTarget::Window(r));
            }
            HostRequest::Close => {
                // Backend failures already went to the hook.
                if let Some(err @ HostError::Listener { .. }) = self.begin_close() {
                    self.report(&err);
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Reconciliation
// ---------------------------------------------------------------------------

impl Host {
    /// Runs passes until one is idle.
    fn reconcile(&mut self) -> HostResult<()> {
        for index in 0..MAX_PASSES {
            if self.is_closed() {
                self.scheduler.clear();
                return Ok(());
            }
            for request in self.dispatcher.take_requests() {
                self.apply_request(request);
            }

            let now = self.now();
            let snapshot = if self.backing_closed {
                BackingSnapshot::HIDDEN
            } else {
                BackingSnapshot::read(self.backing.as_ref())
            };
            self.stability.observe(&snapshot, now);

            let maximize_works = !self.backing_closed && self.backing.does_maximize_work();
            let mut pass = Pass {
                now,
                snapshot,
                observed: *self.dispatcher.observed(),
                intents: self.dispatcher.intents(),
                enforcement: self.enforcement.slot(),
                closing: self.closing,
                dialogs_open: !self.dialogs.is_empty(),
                maximize_works,
                config: &self.config,
                stability: &mut self.stability,
                gates: Vec::new(),
            };
            let decision = rules::evaluate(&mut pass);
            let gates = pass.gates;

            for (event, outcome) in gates {
                self.tracer.gate(&GateEvent {
                    host: self.id,
                    now,
                    event,
                    outcome,
                });
            }
            self.tracer.pass(&PassEvent {
                host: self.id,
                now,
                index,
                rule: decision.rule(),
            });

            match decision {
                Decision::Fire { event, .. } => self.fire(event, now)?,
                Decision::Act { action, .. } => self.act(action, &snapshot, now),
                Decision::Idle { recheck_at } => {
                    self.refresh_demax_bounds(&snapshot, now);
                    if let Some(at) = recheck_at {
                        trace!("{:?}: re-check at {at:?}", self.id);
                        self.scheduler.schedule(Task::Reconcile, at);
                    }
                    if self.is_closed() {
                        self.scheduler.clear();
                    }
                    return Ok(());
                }
            }
        }
        warn!(
            "{:?}: reconciliation did not settle after {MAX_PASSES} passes; yielding",
            self.id
        );
        let now = self.now();
        self.scheduler
            .schedule(Task::Reconcile, now + Duration::MILLISECOND);
        Ok(())
    }

    fn fire(&mut self, event: WindowEvent, now: HostTime) -> HostResult<()> {
        self.tracer.event(&FireEvent {
            host: self.id,
            now,
            event,
        });
        let focus_change = matches!(event, WindowEvent::FocusGained | WindowEvent::FocusLost);
        let client_area = if focus_change && !self.backing_closed {
            geometry::client_area(self.backing.client_bounds())
        } else {
            Rect::ZERO
        };
        let fx = Effects {
            now,
            config: &self.config,
            stability: &mut self.stability,
            drag: &mut self.drag,
            enforcement: &mut self.enforcement,
            invalidation: &self.invalidation,
            client_area,
        };
        let result = self.dispatcher.fire(event, fx);

        self.sync_paint_request(now);
        if matches!(event, WindowEvent::Shown | WindowEvent::Deiconified)
            && self.invalidation.dirty().is_some()
        {
            // Paints skipped while hidden kept their region.
            self.scheduler.schedule(Task::Paint, now);
        }
        if result.is_err() {
            self.scheduler.schedule(Task::Reconcile, now);
        }
        result
    }

    fn act(&mut self, action: Action, snapshot: &BackingSnapshot, now: HostTime) {
        match action {
            Action::RequestFocus => {
                self.dispatcher.intents_mut().focus_request = false;
                if snapshot.focused != Some(true) {
                    _ = self.call_backing(BackingOp::RequestFocusGain, |b| b.request_focus_gain());
                }
            }
            Action::RestoreMaximized => {
                self.dispatcher.intents_mut().restore_maximized = false;
                if snapshot.maximized != Some(true) && self.backing.does_maximize_work() {
                    debug!("{:?}: restoring maximized state", self.id);
                    if self.dispatcher.observed().is_maximized() {
                        // Iconify kept the client maximized; nothing will fire.
                        _ = self.call_backing(BackingOp::SetMaximized(true), |b| {
                            b.set_maximized(true)
                        });
                    } else {
                        self.stability.begin_programmatic(StateEvent::Maximized, now);
                        self.programmatic_call(
                            StateEvent::Maximized,
                            BackingOp::SetMaximized(true),
                            |b| b.set_maximized(true),
                        );
                    }
                }
            }
            Action::Enforce => match self.enforcement.take() {
                Enforcement::None => {}
                Enforcement::OnMaximize => match self.backing.work_area() {
                    Some(area) => {
                        debug!("{:?}: enforcing work area {area:?}", self.id);
                        _ = self.apply_bounds(BoundsTarget::Window(area));
                    }
                    None => trace!("{:?}: no work area; nothing to enforce", self.id),
                },
                Enforcement::OnDemaximize(target) => {
                    debug!("{:?}: enforcing {target:?}", self.id);
                    _ = self.apply_bounds(target);
                }
            },
        }
    }

    fn refresh_demax_bounds(&mut self, snapshot: &BackingSnapshot, now: HostTime) {
        let o = self.dispatcher.observed();
        let stable = o.is_live()
            && !o.is_maximized()
            && snapshot.is_live()
            && snapshot.maximized == Some(false)
            && self.drag.frozen_bounds().is_none()
            && now.has_reached(
                self.stability
                    .settled_at(self.config.state_stability_delay()),
            );
        if stable {
            self.enforcement
                .refresh_demax_bounds(self.backing.window_bounds());
        }
    }
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

impl Host {
    fn run_task(&mut self, task: Task, at: HostTime) -> HostResult<()> {
        let now = self.now();
        match task {
            Task::Reconcile => self.reconcile(),
            Task::Poll => {
                self.poll(at, now);
                self.reconcile()
            }
            Task::Paint => {
                self.run_paint(at, now);
                Ok(())
            }
            Task::MoveBurst => {
                self.end_burst(BurstKind::Move);
                Ok(())
            }
            Task::ResizeBurst => {
                self.end_burst(BurstKind::Resize);
                Ok(())
            }
        }
    }

    fn poll(&mut self, scheduled: HostTime, now: HostTime) {
        let lateness = now.saturating_duration_since(scheduled);
        if lateness > self.config.stall_margin() {
            self.stability.stall(lateness, now);
            let newest_unstability = self.stability.newest_unstability();
            warn!(
                "{:?}: poll ran {}ms late; distrusting state until {newest_unstability:?}",
                self.id,
                lateness.millis()
            );
            self.tracer.stall(&StallEvent {
                host: self.id,
                now,
                lateness,
                newest_unstability,
            });
        }
        self.scheduler
            .reschedule(Task::Poll, now + self.config.poll_period());
    }

    fn sync_paint_request(&mut self, now: HostTime) {
        if self.invalidation.take_request() {
            self.scheduler.schedule(Task::Paint, now);
        }
    }

    fn trace_paint(&mut self, now: HostTime, outcome: PaintOutcome) {
        self.tracer.paint(&PaintEvent {
            host: self.id,
            now,
            outcome,
        });
    }

    fn run_paint(&mut self, scheduled: HostTime, now: HostTime) {
        if self.inert() || !self.dispatcher.observed().is_live() {
            trace!("{:?}: paint skipped while not live", self.id);
            self.trace_paint(now, PaintOutcome::Skipped);
            return;
        }
        if let PaintDecision::Defer(at) = self
            .paint
            .decide(now, self.config.paint_coalescing_delay())
        {
            self.scheduler.schedule(Task::Paint, at);
            self.trace_paint(now, PaintOutcome::Deferred(at));
            return;
        }
        let Some(painter) = self.painter.as_mut() else {
            return;
        };
        let Some(dirty) = self.invalidation.take() else {
            return;
        };
        self.paint.painted(scheduled, now);
        let result = painter.paint(dirty);
        match result {
            Ok(()) => self.trace_paint(now, PaintOutcome::Painted(dirty)),
            Err(err) => {
                self.report(&HostError::Paint(err));
                self.trace_paint(now, PaintOutcome::Failed);
            }
        }
    }

    fn bounds_notification(&mut self, kind: BurstKind, now: HostTime) {
        let (task, paint_during) = match kind {
            BurstKind::Move => {
                self.dispatcher.mark_moved();
                if self
                    .drag
                    .on_move(now, self.config.drag_move_blocking_delay())
                {
                    debug!("{:?}: drag started", self.id);
                }
                (Task::MoveBurst, self.config.paint_during_move)
            }
            BurstKind::Resize => {
                self.dispatcher.mark_resized();
                (Task::ResizeBurst, self.config.paint_during_resize)
            }
        };
        if self.paint.burst_event(kind) && paint_during {
            self.invalidate_all();
        }
        self.scheduler
            .reschedule(task, now + self.config.burst_quiet_delay());
    }

    fn end_burst(&mut self, kind: BurstKind) {
        trace!("{:?}: {kind:?} burst settled", self.id);
        self.paint.end_burst(kind);
        self.invalidate_all();
    }

    fn button_pressed(&mut self, inside_client: bool) {
        let o = self.dispatcher.observed();
        if inside_client
            && self.config.fix_bounds_during_drag
            && o.is_active()
            && !self.inert()
            && !self.backing_closed
        {
            let client = self.backing.client_bounds();
            let window = self.backing.window_bounds();
            trace!("{:?}: drag armed at {client:?}", self.id);
            self.drag.press(client, window);
        }
    }
}

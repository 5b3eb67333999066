// Copyright 2026 the Casement Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Delivery of canonical events to the client.
//!
//! The [`Dispatcher`] is the only place [`ClientObservedState`] changes. For
//! each event it updates the state, runs the bookkeeping that depends on the
//! event, and only then invokes the listener. A listener that fails leaves
//! the host consistent: everything it could observe was already updated.

use core::fmt;

use log::debug;

use crate::config::HostConfig;
use crate::drag::DragStabilizer;
use crate::enforce::BoundsEnforcement;
use crate::error::{HostError, HostResult};
use crate::event::{ClientListener, HostControl, HostRequest, WindowEvent};
use crate::geometry::Rect;
use crate::id::HostId;
use crate::paint::InvalidationHandle;
use crate::stability::StabilityTracker;
use crate::state::ClientObservedState;
use crate::time::HostTime;

/// Follow-up work a fired event asked for, acted on by later passes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Intents {
    /// Ask the backend for focus once the host is live.
    pub focus_request: bool,
    /// Re-maximize once the host is deiconified.
    pub restore_maximized: bool,
}

/// Host components the dispatcher's bookkeeping touches.
pub(crate) struct Effects<'a> {
    pub(crate) now: HostTime,
    pub(crate) config: &'a HostConfig,
    pub(crate) stability: &'a mut StabilityTracker,
    pub(crate) drag: &'a mut DragStabilizer,
    pub(crate) enforcement: &'a mut BoundsEnforcement,
    pub(crate) invalidation: &'a InvalidationHandle,
    /// The whole client area, invalidated on focus changes.
    pub(crate) client_area: Rect,
}

/// Owns the listener, the observed state and the listener's request queue.
pub struct Dispatcher {
    id: HostId,
    listener: Box<dyn ClientListener>,
    observed: ClientObservedState,
    intents: Intents,
    requests: Vec<HostRequest>,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("id", &self.id)
            .field("observed", &self.observed)
            .field("intents", &self.intents)
            .field("requests", &self.requests)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    pub(crate) fn new(id: HostId, listener: Box<dyn ClientListener>) -> Self {
        Self {
            id,
            listener,
            observed: ClientObservedState::default(),
            intents: Intents::default(),
            requests: Vec::new(),
        }
    }

    /// The state the client has observed.
    #[must_use]
    pub fn observed(&self) -> &ClientObservedState {
        &self.observed
    }

    /// Outstanding follow-up work.
    #[must_use]
    pub fn intents(&self) -> Intents {
        self.intents
    }

    pub(crate) fn intents_mut(&mut self) -> &mut Intents {
        &mut self.intents
    }

    /// Records a move notification; Moved fires once the host is live.
    pub(crate) fn mark_moved(&mut self) {
        self.observed.moved_pending = true;
    }

    /// Records a resize notification; Resized fires once the host is live.
    pub(crate) fn mark_resized(&mut self) {
        self.observed.resized_pending = true;
    }

    /// Takes the requests queued by the listener.
    pub(crate) fn take_requests(&mut self) -> Vec<HostRequest> {
        core::mem::take(&mut self.requests)
    }

    /// Delivers `event`.
    pub(crate) fn fire(&mut self, event: WindowEvent, fx: Effects<'_>) -> HostResult<()> {
        let was_maximized = self.observed.maximized;
        self.observed.apply(event);
        self.bookkeep(event, was_maximized, fx);

        debug!("{:?}: {event:?}", self.id);
        let mut control = HostControl::new(self.id, &self.observed, &mut self.requests);
        self.listener
            .on_event(event, &mut control)
            .map_err(|source| HostError::Listener { event, source })
    }

    fn bookkeep(&mut self, event: WindowEvent, was_maximized: bool, fx: Effects<'_>) {
        let cfg = fx.config;
        match event {
            WindowEvent::Shown => {
                self.intents.focus_request |= cfg.request_focus_on_show;
            }
            WindowEvent::Hidden => {
                fx.drag.cancel();
                self.intents.focus_request = false;
            }
            WindowEvent::Iconified => {
                fx.drag.cancel();
                if cfg.restore_maximized_across_iconify && was_maximized {
                    self.intents.restore_maximized = true;
                }
            }
            WindowEvent::Deiconified => {
                self.intents.focus_request |= cfg.request_focus_on_deiconify;
            }
            WindowEvent::Maximized => {
                self.intents.focus_request |= cfg.request_focus_on_maximize;
                if cfg.enforce_bounds_on_maximize {
                    fx.enforcement.arm_maximize();
                }
            }
            WindowEvent::Demaximized => {
                self.intents.restore_maximized = false;
                self.intents.focus_request |= cfg.request_focus_on_demaximize;
                if cfg.restore_bounds_on_demaximize {
                    fx.enforcement.arm_restore();
                }
            }
            WindowEvent::FocusGained => {
                self.intents.focus_request = false;
                fx.invalidation.invalidate(fx.client_area);
            }
            WindowEvent::FocusLost => {
                if fx.drag.cancel() {
                    debug!("{:?}: drag cancelled by focus loss", self.id);
                }
                fx.invalidation.invalidate(fx.client_area);
            }
            WindowEvent::Moved | WindowEvent::Resized | WindowEvent::Closed => {}
        }

        match event.state_event() {
            Some(state) => fx.stability.fired(state, fx.now),
            None => fx.stability.bump(fx.now),
        }
    }
}

// Copyright 2026 the Casement Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Canonical events and the client-facing listener surface.
//!
//! A host delivers [`WindowEvent`]s one at a time, synchronously, on the UI
//! thread, through a single [`ClientListener`]. The order always follows the
//! reconciler's state machine: FocusLost precedes Hidden and Iconified,
//! Maximized never precedes Shown, and Closed is last.
//!
//! Listeners may react by calling back into the host through the
//! [`HostControl`] they receive. Those calls are queued and applied by the
//! reconciliation loop right after the listener returns, before the next
//! pass re-diffs state.

use enum_map::Enum;

use crate::error::ListenerError;
use crate::geometry::Rect;
use crate::id::HostId;
use crate::state::ClientObservedState;

/// A canonical window-lifecycle event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WindowEvent {
    /// The host became visible.
    Shown,
    /// The host became invisible.
    Hidden,
    /// The host gained keyboard focus.
    FocusGained,
    /// The host lost keyboard focus.
    FocusLost,
    /// The host was minimized.
    Iconified,
    /// The host was restored from minimized.
    Deiconified,
    /// The host was maximized.
    Maximized,
    /// The host was restored from maximized.
    Demaximized,
    /// The host moved.
    Moved,
    /// The host resized.
    Resized,
    /// The host closed. Always the last event.
    Closed,
}

/// A two-valued piece of observed state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Enum)]
pub enum Axis {
    /// Shown / Hidden.
    Visibility,
    /// Iconified / Deiconified.
    Iconification,
    /// Maximized / Demaximized.
    Maximization,
    /// FocusGained / FocusLost.
    Focus,
}

impl WindowEvent {
    /// The axis this event flips and the value it flips it to.
    ///
    /// `None` for [`Moved`](Self::Moved), [`Resized`](Self::Resized) and
    /// [`Closed`](Self::Closed).
    #[must_use]
    pub const fn axis(self) -> Option<(Axis, bool)> {
        match self {
            Self::Shown => Some((Axis::Visibility, true)),
            Self::Hidden => Some((Axis::Visibility, false)),
            Self::Iconified => Some((Axis::Iconification, true)),
            Self::Deiconified => Some((Axis::Iconification, false)),
            Self::Maximized => Some((Axis::Maximization, true)),
            Self::Demaximized => Some((Axis::Maximization, false)),
            Self::FocusGained => Some((Axis::Focus, true)),
            Self::FocusLost => Some((Axis::Focus, false)),
            Self::Moved | Self::Resized | Self::Closed => None,
        }
    }

    /// The gated form of this event, if it is subject to stability gating.
    #[must_use]
    pub const fn state_event(self) -> Option<StateEvent> {
        match self {
            Self::Shown => Some(StateEvent::Shown),
            Self::Hidden => Some(StateEvent::Hidden),
            Self::Iconified => Some(StateEvent::Iconified),
            Self::Deiconified => Some(StateEvent::Deiconified),
            Self::Maximized => Some(StateEvent::Maximized),
            Self::Demaximized => Some(StateEvent::Demaximized),
            _ => None,
        }
    }
}

/// The events subject to stability and anti-flicker gating.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Enum)]
pub enum StateEvent {
    /// See [`WindowEvent::Shown`].
    Shown,
    /// See [`WindowEvent::Hidden`].
    Hidden,
    /// See [`WindowEvent::Iconified`].
    Iconified,
    /// See [`WindowEvent::Deiconified`].
    Deiconified,
    /// See [`WindowEvent::Maximized`].
    Maximized,
    /// See [`WindowEvent::Demaximized`].
    Demaximized,
}

impl StateEvent {
    /// The event that undoes this one.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Shown => Self::Hidden,
            Self::Hidden => Self::Shown,
            Self::Iconified => Self::Deiconified,
            Self::Deiconified => Self::Iconified,
            Self::Maximized => Self::Demaximized,
            Self::Demaximized => Self::Maximized,
        }
    }

    /// Picks the event for an axis value: `on` selects Shown, Iconified or
    /// Maximized.
    #[must_use]
    pub const fn for_value(axis: StateAxis, on: bool) -> Self {
        match (axis, on) {
            (StateAxis::Visibility, true) => Self::Shown,
            (StateAxis::Visibility, false) => Self::Hidden,
            (StateAxis::Iconification, true) => Self::Iconified,
            (StateAxis::Iconification, false) => Self::Deiconified,
            (StateAxis::Maximization, true) => Self::Maximized,
            (StateAxis::Maximization, false) => Self::Demaximized,
        }
    }
}

/// The gated subset of [`Axis`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StateAxis {
    /// Shown / Hidden.
    Visibility,
    /// Iconified / Deiconified.
    Iconification,
    /// Maximized / Demaximized.
    Maximization,
}

impl From<StateEvent> for WindowEvent {
    fn from(e: StateEvent) -> Self {
        match e {
            StateEvent::Shown => Self::Shown,
            StateEvent::Hidden => Self::Hidden,
            StateEvent::Iconified => Self::Iconified,
            StateEvent::Deiconified => Self::Deiconified,
            StateEvent::Maximized => Self::Maximized,
            StateEvent::Demaximized => Self::Demaximized,
        }
    }
}

/// Receives the canonical event stream of one host.
pub trait ClientListener {
    /// Handles one event.
    ///
    /// `host.state()` already reflects `event`. Returning an error aborts
    /// only the rest of this dispatch; the host stays consistent.
    fn on_event(
        &mut self,
        event: WindowEvent,
        host: &mut HostControl<'_>,
    ) -> Result<(), ListenerError>;
}

impl<F> ClientListener for F
where
    F: FnMut(WindowEvent, &mut HostControl<'_>) -> Result<(), ListenerError>,
{
    fn on_event(
        &mut self,
        event: WindowEvent,
        host: &mut HostControl<'_>,
    ) -> Result<(), ListenerError> {
        self(event, host)
    }
}

/// A listener that ignores everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopListener;

impl ClientListener for NoopListener {
    fn on_event(&mut self, _: WindowEvent, _: &mut HostControl<'_>) -> Result<(), ListenerError> {
        Ok(())
    }
}

/// A host call made from inside a listener.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum HostRequest {
    /// [`Host::show`](crate::host::Host::show).
    Show,
    /// [`Host::hide`](crate::host::Host::hide).
    Hide,
    /// [`Host::request_focus_gain`](crate::host::Host::request_focus_gain).
    RequestFocusGain,
    /// [`Host::iconify`](crate::host::Host::iconify).
    Iconify,
    /// [`Host::deiconify`](crate::host::Host::deiconify).
    Deiconify,
    /// [`Host::maximize`](crate::host::Host::maximize).
    Maximize,
    /// [`Host::demaximize`](crate::host::Host::demaximize).
    Demaximize,
    /// [`Host::set_client_bounds`](crate::host::Host::set_client_bounds).
    SetClientBounds(Rect),
    /// [`Host::set_window_bounds`](crate::host::Host::set_window_bounds).
    SetWindowBounds(Rect),
    /// [`Host::close`](crate::host::Host::close).
    Close,
}

/// The host as seen from inside a listener callback.
#[derive(Debug)]
pub struct HostControl<'a> {
    id: HostId,
    state: &'a ClientObservedState,
    requests: &'a mut Vec<HostRequest>,
}

impl<'a> HostControl<'a> {
    pub(crate) fn new(
        id: HostId,
        state: &'a ClientObservedState,
        requests: &'a mut Vec<HostRequest>,
    ) -> Self {
        Self {
            id,
            state,
            requests,
        }
    }

    /// The host's id.
    #[must_use]
    pub fn id(&self) -> HostId {
        self.id
    }

    /// The observed state, already advanced past the event being delivered.
    #[must_use]
    pub fn state(&self) -> &ClientObservedState {
        self.state
    }

    /// Queues an arbitrary request.
    pub fn request(&mut self, request: HostRequest) {
        self.requests.push(request);
    }

    /// Queues [`Host::show`](crate::host::Host::show).
    pub fn show(&mut self) {
        self.request(HostRequest::Show);
    }

    /// Queues [`Host::hide`](crate::host::Host::hide).
    pub fn hide(&mut self) {
        self.request(HostRequest::Hide);
    }

    /// Queues [`Host::close`](crate::host::Host::close).
    pub fn close(&mut self) {
        self.request(HostRequest::Close);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposites_are_involutions() {
        for e in [
            StateEvent::Shown,
            StateEvent::Hidden,
            StateEvent::Iconified,
            StateEvent::Deiconified,
            StateEvent::Maximized,
            StateEvent::Demaximized,
        ] {
            assert_eq!(e.opposite().opposite(), e);
            assert_ne!(e.opposite(), e);
        }
    }

    #[test]
    fn state_events_map_to_their_axis() {
        let e: WindowEvent = StateEvent::for_value(StateAxis::Iconification, true).into();
        assert_eq!(e, WindowEvent::Iconified);
        assert_eq!(e.axis(), Some((Axis::Iconification, true)));
        assert_eq!(WindowEvent::Closed.axis(), None);
        assert_eq!(e.state_event(), Some(StateEvent::Iconified));
        assert_eq!(WindowEvent::FocusLost.state_event(), None);
    }

    #[test]
    fn control_queues_requests_in_order() {
        let state = ClientObservedState::default();
        let mut requests = Vec::new();
        let mut control = HostControl::new(HostId::next(), &state, &mut requests);
        control.hide();
        control.close();
        assert_eq!(requests, [HostRequest::Hide, HostRequest::Close]);
    }
}

// Copyright 2026 the Casement Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Event recording and sequence validation.

use std::cell::RefCell;
use std::rc::Rc;

use casement_core::error::ListenerError;
use casement_core::event::{Axis, ClientListener, HostControl, WindowEvent};
use casement_core::id::HostId;
use enum_map::EnumMap;
use thiserror::Error;

/// Events from any number of hosts, in delivery order.
#[derive(Clone, Debug, Default)]
pub struct Journal {
    entries: Rc<RefCell<Vec<(HostId, WindowEvent)>>>,
}

impl Journal {
    /// Creates an empty journal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A listener that appends to this journal.
    #[must_use]
    pub fn listener(&self) -> RecordingListener {
        RecordingListener {
            journal: self.clone(),
            fail_on: None,
        }
    }

    /// Every entry so far.
    #[must_use]
    pub fn entries(&self) -> Vec<(HostId, WindowEvent)> {
        self.entries.borrow().clone()
    }

    /// The events delivered to `host`.
    #[must_use]
    pub fn events_for(&self, host: HostId) -> Vec<WindowEvent> {
        self.entries
            .borrow()
            .iter()
            .filter(|(id, _)| *id == host)
            .map(|(_, e)| *e)
            .collect()
    }

    /// How many times `event` was delivered to `host`.
    #[must_use]
    pub fn count(&self, host: HostId, event: WindowEvent) -> usize {
        self.events_for(host).iter().filter(|e| **e == event).count()
    }

    /// Position of the first `event` delivered to `host`.
    #[must_use]
    pub fn position(&self, host: HostId, event: WindowEvent) -> Option<usize> {
        self.entries
            .borrow()
            .iter()
            .position(|entry| *entry == (host, event))
    }

    /// Forgets everything recorded so far.
    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }
}

/// A [`ClientListener`] that appends to a [`Journal`].
#[derive(Clone, Debug)]
pub struct RecordingListener {
    journal: Journal,
    fail_on: Option<WindowEvent>,
}

impl RecordingListener {
    /// Returns an error the first time `event` is delivered. The event is
    /// still recorded.
    #[must_use]
    pub fn fail_once_on(mut self, event: WindowEvent) -> Self {
        self.fail_on = Some(event);
        self
    }
}

impl ClientListener for RecordingListener {
    fn on_event(
        &mut self,
        event: WindowEvent,
        host: &mut HostControl<'_>,
    ) -> Result<(), ListenerError> {
        self.journal.entries.borrow_mut().push((host.id(), event));
        if self.fail_on == Some(event) {
            self.fail_on = None;
            return Err(ListenerError::new(format!("scripted failure on {event:?}")));
        }
        Ok(())
    }
}

/// An event that breaks the ordering contract.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("event #{index} ({event:?}): {reason}")]
pub struct SequenceViolation {
    /// Position in the checked sequence.
    pub index: usize,
    /// The offending event.
    pub event: WindowEvent,
    /// What was wrong.
    pub reason: &'static str,
}

/// Replays one host's events against the ordering contract.
#[derive(Clone, Debug, Default)]
pub struct SequenceChecker {
    state: EnumMap<Axis, bool>,
    closed: bool,
    seen: usize,
}

impl SequenceChecker {
    /// Creates a checker for a host that starts hidden.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks a whole sequence.
    pub fn check_all(events: &[WindowEvent]) -> Result<(), SequenceViolation> {
        let mut checker = Self::new();
        events.iter().try_for_each(|e| checker.check(*e))
    }

    /// Checks the next event.
    pub fn check(&mut self, event: WindowEvent) -> Result<(), SequenceViolation> {
        let index = self.seen;
        self.seen += 1;
        let fail = |reason| {
            Err(SequenceViolation {
                index,
                event,
                reason,
            })
        };
        if self.closed {
            return fail("event after Closed");
        }
        let showing = self.state[Axis::Visibility];
        let live = showing && !self.state[Axis::Iconification];
        match event {
            WindowEvent::Closed => {
                if showing || self.state[Axis::Focus] {
                    return fail("Closed while showing or focused");
                }
                self.closed = true;
                return Ok(());
            }
            WindowEvent::Moved | WindowEvent::Resized => {
                if !live {
                    return fail("bounds event while not live");
                }
                return Ok(());
            }
            WindowEvent::Hidden | WindowEvent::Iconified if self.state[Axis::Focus] => {
                return fail("focused when hiding or iconifying");
            }
            WindowEvent::Iconified | WindowEvent::Deiconified if !showing => {
                return fail("iconification change while hidden");
            }
            WindowEvent::Maximized
            | WindowEvent::Demaximized
            | WindowEvent::FocusGained
            | WindowEvent::FocusLost
                if !live =>
            {
                return fail("change while hidden or iconified");
            }
            _ => {}
        }
        if let Some((axis, value)) = event.axis() {
            if self.state[axis] == value {
                return fail("repeats the current state");
            }
            self.state[axis] = value;
        }
        Ok(())
    }
}

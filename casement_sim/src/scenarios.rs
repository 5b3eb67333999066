// Copyright 2026 the Casement Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end scenarios against the simulated backend.

use std::cell::RefCell;
use std::rc::Rc;

use casement_core::backing::{BackingNotification, BackingOp};
use casement_core::clock::ManualClock;
use casement_core::config::HostConfig;
use casement_core::error::{HostError, ListenerError};
use casement_core::event::{HostControl, StateEvent, WindowEvent};
use casement_core::geometry::{Rect, Vec2};
use casement_core::host::{Host, HostBuilder, SmartBounds};
use casement_core::id::HostId;
use casement_core::stability::GateOutcome;
use casement_core::time::{Duration, HostTime};
use casement_core::trace::{
    BackingCallEvent, FireEvent, GateEvent, PaintEvent, PassEvent, StallEvent, TraceSink,
};
use casement_debug::recorder::{RecordedEvent, RecorderSink, decode};

use crate::Stepper;
use crate::backing::{SimCall, SimHandle, SimState, sim_window_with};
use crate::listener::{Journal, RecordingListener, SequenceChecker};
use crate::painter::RecordingPainter;

use WindowEvent::*;

const START: HostTime = HostTime(1_000);
const B0: Rect = Rect::new(100.0, 100.0, 500.0, 400.0);
const CLIENT_AREA: Rect = Rect::new(0.0, 0.0, 400.0, 300.0);

struct Rig {
    host: Host,
    sim: SimHandle,
    journal: Journal,
    stepper: Stepper,
    painter: RecordingPainter,
}

impl Rig {
    fn new(config: HostConfig) -> Self {
        Self::custom(config, SimState::default(), Journal::listener, |b| b)
    }

    fn custom(
        config: HostConfig,
        state: SimState,
        listener: impl FnOnce(&Journal) -> RecordingListener,
        customize: impl FnOnce(HostBuilder) -> HostBuilder,
    ) -> Self {
        _ = env_logger::builder().is_test(true).try_init();
        let (backing, sim) = sim_window_with(state);
        let journal = Journal::new();
        let clock = ManualClock::starting_at(START);
        let painter = RecordingPainter::new();
        let builder = HostBuilder::new(backing, listener(&journal))
            .title("scenario")
            .config(config)
            .clock(clock.clone())
            .painter(painter.clone());
        let host = customize(builder).build().unwrap();
        Self {
            host,
            sim,
            journal,
            stepper: Stepper::new(clock),
            painter,
        }
    }

    fn events(&self) -> Vec<WindowEvent> {
        self.journal.events_for(self.host.id())
    }

    fn advance(&mut self, ms: u64) {
        self.stepper.advance(&mut self.host, Duration(ms)).unwrap();
    }

    fn now(&self) -> HostTime {
        self.stepper.now()
    }

    fn assert_well_ordered(&self, host: HostId) {
        let events = self.journal.events_for(host);
        if let Err(violation) = SequenceChecker::check_all(&events) {
            panic!("{violation} in {events:?}");
        }
    }
}

/// Immediate stability, no automatic focus.
fn quiet() -> HostConfig {
    HostConfig {
        request_focus_on_show: false,
        ..HostConfig::immediate()
    }
}

/// Default stability delays, no automatic focus.
fn quiet_default() -> HostConfig {
    HostConfig {
        request_focus_on_show: false,
        ..HostConfig::default()
    }
}

fn dialog_builder(journal: &Journal) -> HostBuilder {
    let (backing, _sim) = sim_window_with(SimState::default());
    HostBuilder::new(backing, journal.listener())
        .title("dialog")
        .modal(true)
        .config(quiet())
}

#[derive(Clone, Debug, Default)]
struct SharedRecorder(Rc<RefCell<RecorderSink>>);

impl SharedRecorder {
    fn events(&self) -> Vec<RecordedEvent> {
        decode(self.0.borrow().as_bytes()).collect()
    }
}

impl TraceSink for SharedRecorder {
    fn on_pass(&mut self, e: &PassEvent) {
        self.0.borrow_mut().on_pass(e);
    }
    fn on_gate(&mut self, e: &GateEvent) {
        self.0.borrow_mut().on_gate(e);
    }
    fn on_event(&mut self, e: &FireEvent) {
        self.0.borrow_mut().on_event(e);
    }
    fn on_backing_call(&mut self, e: &BackingCallEvent) {
        self.0.borrow_mut().on_backing_call(e);
    }
    fn on_stall(&mut self, e: &StallEvent) {
        self.0.borrow_mut().on_stall(e);
    }
    fn on_paint(&mut self, e: &PaintEvent) {
        self.0.borrow_mut().on_paint(e);
    }
}

// ---------------------------------------------------------------------------
// Event order
// ---------------------------------------------------------------------------

#[test]
fn repeated_show_delivers_one_shown() {
    let mut r = Rig::new(HostConfig::immediate());
    assert!(r.host.show().unwrap());
    assert!(!r.host.show().unwrap());
    r.advance(500);
    assert!(!r.host.show().unwrap());
    assert_eq!(r.journal.count(r.host.id(), Shown), 1);
    assert_eq!(r.sim.count(BackingOp::Show), 1);
}

#[test]
fn scripted_lifecycle_is_well_ordered() {
    let mut r = Rig::new(HostConfig::immediate());
    r.host.show().unwrap();
    r.host.maximize().unwrap();
    r.host.iconify().unwrap();
    r.advance(20);
    r.host.deiconify().unwrap();
    r.host.demaximize().unwrap();
    r.advance(20);
    r.host.hide().unwrap();
    r.host.close().unwrap();

    assert_eq!(
        r.events(),
        [
            Shown,
            FocusGained,
            Maximized,
            FocusLost,
            Iconified,
            Deiconified,
            FocusGained,
            Demaximized,
            FocusLost,
            Hidden,
            Closed,
        ]
    );
    r.assert_well_ordered(r.host.id());
}

#[test]
fn external_show_and_maximize_arrive_in_order() {
    let mut r = Rig::new(HostConfig::immediate());
    r.sim.user_set_showing(true);
    r.sim.user_set_maximized(true);
    r.host.notify(BackingNotification::AnyEvent).unwrap();

    let id = r.host.id();
    let shown = r.journal.position(id, Shown).unwrap();
    let maximized = r.journal.position(id, Maximized).unwrap();
    assert!(shown < maximized);
    assert!(r.host.state().is_maximized());
    r.assert_well_ordered(id);
}

#[test]
fn listener_requests_apply_after_it_returns() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let record = Rc::clone(&seen);
    let (backing, _sim) = sim_window_with(SimState::default());
    let listener = move |event: WindowEvent,
                         host: &mut HostControl<'_>|
          -> Result<(), ListenerError> {
        record.borrow_mut().push(event);
        if event == Shown {
            host.hide();
            // The request is queued; state is still what was just delivered.
            assert!(host.state().is_showing());
        }
        Ok(())
    };
    let mut host = HostBuilder::new(backing, listener)
        .config(quiet())
        .clock(ManualClock::starting_at(START))
        .build()
        .unwrap();

    host.show().unwrap();
    assert_eq!(*seen.borrow(), [Shown, Hidden]);
    assert!(!host.state().is_showing());
}

// ---------------------------------------------------------------------------
// Close
// ---------------------------------------------------------------------------

#[test]
fn dialogs_close_before_their_owner() {
    let mut r = Rig::new(HostConfig::immediate());
    r.host.show().unwrap();
    let d1 = r.host.create_dialog(dialog_builder(&r.journal)).unwrap();
    let d2 = r.host.create_dialog(dialog_builder(&r.journal)).unwrap();
    for d in [d1, d2] {
        r.host.dialog_mut(d).unwrap().show().unwrap();
    }

    r.host.close().unwrap();

    let owner_closed = r.journal.position(r.host.id(), Closed).unwrap();
    for d in [d1, d2] {
        assert_eq!(r.journal.events_for(d), [Shown, Hidden, Closed]);
        assert!(r.journal.position(d, Closed).unwrap() < owner_closed);
        r.assert_well_ordered(d);
    }
    r.assert_well_ordered(r.host.id());
    assert!(r.host.is_closed());
    assert_eq!(r.host.dialogs().count(), 0);
}

#[test]
fn owner_close_waits_for_a_failed_dialog() {
    let mut r = Rig::new(HostConfig::immediate());
    r.host.show().unwrap();
    let (backing, _sim) = sim_window_with(SimState::default());
    let d = r
        .host
        .create_dialog(
            HostBuilder::new(backing, r.journal.listener().fail_once_on(Hidden)).config(quiet()),
        )
        .unwrap();
    r.host.dialog_mut(d).unwrap().show().unwrap();

    let err = r.host.close().unwrap_err();
    assert!(matches!(err, HostError::Listener { event: Hidden, .. }));
    assert!(!r.host.is_closed());
    assert_eq!(r.journal.count(r.host.id(), Closed), 0);
    assert_eq!(r.journal.count(r.host.id(), Hidden), 1);

    r.host.run_due().unwrap();
    assert!(r.host.is_closed());
    let dialog_closed = r.journal.position(d, Closed).unwrap();
    let owner_closed = r.journal.position(r.host.id(), Closed).unwrap();
    assert!(dialog_closed < owner_closed);
    r.assert_well_ordered(d);
    r.assert_well_ordered(r.host.id());
}

#[test]
fn native_close_request_closes_once() {
    let mut r = Rig::new(HostConfig::immediate());
    r.host.show().unwrap();
    r.host.notify(BackingNotification::Closing).unwrap();
    r.host.notify(BackingNotification::Closed).unwrap();
    r.host.close().unwrap();

    assert_eq!(r.events(), [Shown, FocusGained, FocusLost, Hidden, Closed]);
    assert_eq!(r.sim.count(BackingOp::Close), 1);
    assert_eq!(r.host.next_deadline(), None);
}

// ---------------------------------------------------------------------------
// Stability
// ---------------------------------------------------------------------------

#[test]
fn iconify_flicker_is_absorbed() {
    let mut r = Rig::new(quiet_default());
    r.host.show().unwrap();
    let id = r.host.id();

    for i in 0..10 {
        let iconified = i % 2 == 0;
        r.sim.user_set_iconified(iconified);
        r.host
            .notify(if iconified {
                BackingNotification::Iconified
            } else {
                BackingNotification::Deiconified
            })
            .unwrap();
        r.advance(30);
    }
    r.advance(1_000);
    assert_eq!(r.journal.count(id, Iconified), 0);
    assert_eq!(r.journal.count(id, Deiconified), 0);

    r.sim.user_set_iconified(true);
    r.host.notify(BackingNotification::Iconified).unwrap();
    r.advance(1_000);
    assert_eq!(r.journal.count(id, Iconified), 1);
    assert_eq!(r.events(), [Shown, Iconified]);
}

#[test]
fn programmatic_change_skips_stability_delay() {
    let mut r = Rig::new(quiet_default());
    r.host.show().unwrap();
    r.sim.set_deferred(true);

    assert!(r.host.iconify().unwrap());
    assert_eq!(r.journal.count(r.host.id(), Iconified), 0);

    let before = r.now();
    r.sim.flush();
    r.host.notify(BackingNotification::Iconified).unwrap();
    assert_eq!(r.now(), before);
    assert_eq!(r.events(), [Shown, Iconified]);
}

#[test]
fn show_after_a_no_op_round_trip_still_works() {
    let mut r = Rig::new(quiet());
    r.host.show().unwrap();
    r.sim.set_deferred(true);

    // Hide then show before the backend applies either.
    assert!(r.host.hide().unwrap());
    assert!(r.host.show().unwrap());
    r.sim.flush();
    r.host.notify(BackingNotification::AnyEvent).unwrap();
    assert!(!r.host.stability().is_pending(StateEvent::Shown));
    assert!(!r.host.stability().is_pending(StateEvent::Hidden));
    r.sim.set_deferred(false);

    r.sim.user_set_showing(false);
    r.host.notify(BackingNotification::Hidden).unwrap();
    r.advance(100);
    assert!(r.host.show().unwrap());
    assert!(r.sim.state().showing);
    assert_eq!(r.events(), [Shown, Hidden, Shown]);
}

#[test]
fn external_show_after_a_no_op_round_trip_is_gated() {
    let mut r = Rig::new(quiet_default());
    r.host.show().unwrap();
    r.sim.set_deferred(true);
    r.host.hide().unwrap();
    r.host.show().unwrap();
    r.sim.flush();
    r.sim.set_deferred(false);
    r.host.notify(BackingNotification::AnyEvent).unwrap();

    r.sim.user_set_showing(false);
    r.host.notify(BackingNotification::Hidden).unwrap();
    r.advance(1_000);
    assert_eq!(r.events(), [Shown, Hidden]);

    // The window manager re-shows it; the stability delay still applies.
    r.sim.user_set_showing(true);
    r.host.notify(BackingNotification::Shown).unwrap();
    assert_eq!(r.events(), [Shown, Hidden]);
    r.advance(300);
    assert_eq!(r.events(), [Shown, Hidden, Shown]);
}

#[test]
fn gate_waits_are_traced() {
    let recorder = SharedRecorder::default();
    let sink = recorder.clone();
    let mut r = Rig::custom(
        quiet_default(),
        SimState::default(),
        Journal::listener,
        |b| b.trace_sink(sink),
    );
    r.host.show().unwrap();
    r.advance(10);
    r.sim.user_set_iconified(true);
    r.host.notify(BackingNotification::Iconified).unwrap();

    // Deiconified was seen at 1000, so anti-flicker holds until 1200.
    let waited = GateEvent {
        host: r.host.id(),
        now: HostTime(1_010),
        event: StateEvent::Iconified,
        outcome: GateOutcome::Wait(HostTime(1_200)),
    };
    assert!(recorder.events().contains(&RecordedEvent::Gate(waited)));
    assert_eq!(r.journal.count(r.host.id(), Iconified), 0);

    r.advance(190);
    assert_eq!(r.journal.count(r.host.id(), Iconified), 1);
    let fired = FireEvent {
        host: r.host.id(),
        now: HostTime(1_200),
        event: Iconified,
    };
    assert!(recorder.events().contains(&RecordedEvent::Fire(fired)));
}

#[test]
fn stalled_loop_postpones_trust() {
    let mut r = Rig::new(quiet_default());
    r.host.show().unwrap();
    r.advance(10);
    r.sim.user_set_iconified(true);
    r.host.notify(BackingNotification::Iconified).unwrap();

    // The loop blocks past both the 1050 poll and the 1200 re-check.
    r.stepper.clock().set(HostTime(1_500));
    r.host.run_due().unwrap();
    assert_eq!(r.host.stability().newest_unstability(), HostTime(1_500));
    assert_eq!(r.journal.count(r.host.id(), Iconified), 0);

    r.advance(99);
    assert_eq!(r.journal.count(r.host.id(), Iconified), 0);
    r.advance(1);
    assert_eq!(r.journal.count(r.host.id(), Iconified), 1);
}

// ---------------------------------------------------------------------------
// Bounds
// ---------------------------------------------------------------------------

#[test]
fn drag_freezes_bounds_and_defers_writes() {
    let mut r = Rig::new(HostConfig::immediate());
    r.host.show().unwrap();
    assert!(r.host.state().is_active());
    let b1 = Rect::new(0.0, 0.0, 300.0, 200.0);

    r.host
        .notify(BackingNotification::ButtonPressed {
            inside_client: true,
        })
        .unwrap();
    for (i, dx) in [5.0, -40.0, 12.0, 90.0].into_iter().enumerate() {
        r.sim.user_move_to(B0 + Vec2::new(dx, dx / 2.0));
        r.host.notify(BackingNotification::Moved).unwrap();
        assert_eq!(r.host.client_bounds(), B0);
        if i == 1 {
            assert!(r.host.set_client_bounds(b1).unwrap());
        }
        r.advance(5);
    }
    assert_eq!(r.sim.count(BackingOp::SetClientBounds), 0);
    assert!(r.journal.count(r.host.id(), Moved) >= 1);

    r.host.notify(BackingNotification::ButtonReleased).unwrap();
    assert_eq!(
        r.sim.calls().last(),
        Some(&SimCall {
            op: BackingOp::SetClientBounds,
            bounds: Some(b1),
        })
    );
    assert_eq!(r.sim.count(BackingOp::SetClientBounds), 1);
    assert_eq!(r.host.client_bounds(), b1);
    assert!(r.host.drag_session().is_none());
}

#[test]
fn move_right_after_bounds_write_is_not_a_drag() {
    let mut r = Rig::new(HostConfig::immediate());
    r.host.show().unwrap();
    let b1 = Rect::new(0.0, 0.0, 300.0, 200.0);
    let b2 = Rect::new(10.0, 10.0, 310.0, 210.0);

    r.host.set_client_bounds(b1).unwrap();
    r.host
        .notify(BackingNotification::ButtonPressed {
            inside_client: true,
        })
        .unwrap();
    r.advance(50);
    r.host.notify(BackingNotification::Moved).unwrap();
    assert!(r.host.drag_session().is_some_and(|s| !s.is_moving()));

    r.host.set_client_bounds(b2).unwrap();
    assert_eq!(r.sim.client_bounds(), b2);
}

#[test]
fn smart_bounds_pin_right_edge() {
    let mut state = SimState::default();
    state.max_client_width = Some(400.0);
    let mut r = Rig::custom(quiet(), state, Journal::listener, |b| b);
    r.host.show().unwrap();

    let asked = Rect::new(0.0, 100.0, 600.0, 400.0);
    let changed = r
        .host
        .set_client_bounds_smart(
            asked,
            SmartBounds {
                fix_right: true,
                ..SmartBounds::default()
            },
        )
        .unwrap();
    assert!(changed);
    assert_eq!(r.host.client_bounds(), Rect::new(200.0, 100.0, 600.0, 400.0));
}

#[test]
fn smart_bounds_roll_back_inexact_result() {
    let mut state = SimState::default();
    state.max_client_width = Some(400.0);
    let mut r = Rig::custom(quiet(), state, Journal::listener, |b| b);
    r.host.show().unwrap();

    let changed = r
        .host
        .set_client_bounds_smart(
            Rect::new(0.0, 100.0, 600.0, 400.0),
            SmartBounds {
                rollback_if_inexact: true,
                ..SmartBounds::default()
            },
        )
        .unwrap();
    assert!(!changed);
    assert_eq!(r.host.client_bounds(), B0);
    assert_eq!(r.sim.count(BackingOp::SetClientBounds), 2);
}

#[test]
fn bounds_set_while_maximized_apply_after_demaximize() {
    let mut r = Rig::new(quiet());
    r.host.show().unwrap();
    r.host.maximize().unwrap();
    let b1 = Rect::new(50.0, 60.0, 350.0, 260.0);

    assert!(r.host.set_client_bounds(b1).unwrap());
    assert_eq!(r.sim.count(BackingOp::SetClientBounds), 0);

    r.host.demaximize().unwrap();
    assert_eq!(r.sim.client_bounds(), b1);
    assert_eq!(r.events(), [Shown, Maximized, Demaximized]);
}

#[test]
fn demaximize_restores_last_demaximized_bounds() {
    let config = HostConfig {
        restore_bounds_on_demaximize: true,
        ..quiet()
    };
    let mut r = Rig::new(config);
    r.host.show().unwrap();
    let b1 = Rect::new(200.0, 150.0, 600.0, 450.0);
    r.sim.user_move_to(b1);
    r.host.notify(BackingNotification::Moved).unwrap();

    r.host.maximize().unwrap();
    assert_ne!(r.sim.client_bounds(), b1);
    r.host.demaximize().unwrap();

    assert_eq!(r.sim.client_bounds(), b1);
    assert_eq!(
        r.sim.calls().last(),
        Some(&SimCall {
            op: BackingOp::SetWindowBounds,
            bounds: Some(Rect::new(196.0, 126.0, 604.0, 454.0)),
        })
    );
}

#[test]
fn demaximize_keeps_bounds_without_restore() {
    let mut r = Rig::new(quiet());
    r.host.show().unwrap();
    r.host.maximize().unwrap();
    let maximized = r.sim.client_bounds();
    r.host.demaximize().unwrap();
    assert_eq!(r.sim.client_bounds(), maximized);
    assert_eq!(r.sim.count(BackingOp::SetWindowBounds), 0);
}

#[test]
fn external_maximize_enforces_work_area() {
    let config = HostConfig {
        enforce_bounds_on_maximize: true,
        ..quiet()
    };
    let mut state = SimState::default();
    state.work_area = Some(Rect::new(0.0, 0.0, 1600.0, 900.0));
    let mut r = Rig::custom(config, state, Journal::listener, |b| b);
    r.host.show().unwrap();

    r.sim.user_set_maximized(true);
    r.host.notify(BackingNotification::Maximized).unwrap();

    assert_eq!(r.events(), [Shown, Maximized]);
    assert_eq!(
        r.sim.calls().last(),
        Some(&SimCall {
            op: BackingOp::SetWindowBounds,
            bounds: Some(Rect::new(0.0, 0.0, 1600.0, 900.0)),
        })
    );
    assert_eq!(r.sim.count(BackingOp::SetWindowBounds), 1);
    assert_eq!(r.host.window_bounds(), Rect::new(0.0, 0.0, 1600.0, 900.0));
}

#[test]
fn iconify_remembers_maximized_state() {
    let mut r = Rig::new(quiet());
    r.host.show().unwrap();
    r.host.maximize().unwrap();
    r.host.iconify().unwrap();

    // The window manager restores the window but drops maximized.
    r.sim.user_set_maximized(false);
    r.sim.user_set_iconified(false);
    r.host.notify(BackingNotification::Deiconified).unwrap();

    assert!(r.sim.state().maximized);
    assert_eq!(r.sim.count(BackingOp::SetMaximized(true)), 2);
    assert!(r.host.state().is_maximized());
    assert_eq!(r.events(), [Shown, Maximized, Iconified, Deiconified, FocusGained]);

    // A later user demaximize leaves maximize() working.
    r.sim.user_set_maximized(false);
    r.host.notify(BackingNotification::Demaximized).unwrap();
    r.advance(100);
    assert!(r.host.maximize().unwrap());
    assert!(r.sim.state().maximized);
    assert_eq!(r.journal.count(r.host.id(), Maximized), 2);
    r.assert_well_ordered(r.host.id());
}

#[test]
fn iconify_forgets_maximized_state_when_disabled() {
    let config = HostConfig {
        restore_maximized_across_iconify: false,
        ..quiet()
    };
    let mut r = Rig::new(config);
    r.host.show().unwrap();
    r.host.maximize().unwrap();
    r.host.iconify().unwrap();

    r.sim.user_set_maximized(false);
    r.sim.user_set_iconified(false);
    r.host.notify(BackingNotification::Deiconified).unwrap();

    assert!(!r.sim.state().maximized);
    assert_eq!(r.sim.count(BackingOp::SetMaximized(true)), 1);
    assert!(!r.host.state().is_maximized());
    assert_eq!(r.journal.count(r.host.id(), Demaximized), 1);
}

#[test]
fn show_deiconifies() {
    let mut r = Rig::new(quiet());
    r.host.show().unwrap();
    r.host.iconify().unwrap();

    assert!(r.host.show().unwrap());
    assert!(!r.sim.state().iconified);
    assert_eq!(r.sim.count(BackingOp::Show), 1);
    assert_eq!(r.events(), [Shown, Iconified, Deiconified, FocusGained]);
}

#[test]
fn show_leaves_iconified_window_alone_when_disabled() {
    let config = HostConfig {
        deiconify_on_show: false,
        ..quiet()
    };
    let mut r = Rig::new(config);
    r.host.show().unwrap();
    r.host.iconify().unwrap();

    assert!(!r.host.show().unwrap());
    assert!(r.sim.state().iconified);
    assert_eq!(r.sim.count(BackingOp::SetIconified(false)), 0);
    assert_eq!(r.events(), [Shown, Iconified]);
}

#[test]
fn maximize_without_backend_support_fills_work_area() {
    let mut state = SimState::default();
    state.maximize_works = false;
    let mut r = Rig::custom(quiet(), state, Journal::listener, |b| b);
    r.host.show().unwrap();

    assert!(r.host.maximize().unwrap());
    assert_eq!(r.host.window_bounds(), Rect::new(0.0, 0.0, 1920.0, 1080.0));
    assert_eq!(r.journal.count(r.host.id(), Maximized), 0);
    assert_eq!(r.sim.count(BackingOp::SetMaximized(true)), 0);
}

// ---------------------------------------------------------------------------
// Paint
// ---------------------------------------------------------------------------

#[test]
fn invalidations_within_the_window_coalesce() {
    let mut r = Rig::new(quiet());
    r.host.show().unwrap();
    let r0 = Rect::new(0.0, 0.0, 50.0, 50.0);
    r.host.invalidate(r0);
    r.advance(0);
    assert_eq!(r.painter.paints(), [r0]);

    r.advance(2);
    r.host.invalidate(Rect::new(0.0, 0.0, 10.0, 10.0));
    r.advance(3);
    r.host.invalidate(Rect::new(20.0, 5.0, 30.0, 40.0));
    r.advance(3);
    r.host.invalidate(Rect::new(5.0, 50.0, 15.0, 60.0));
    r.advance(5);
    assert_eq!(r.painter.paints(), [r0], "still inside the coalescing window");

    r.advance(20);
    assert_eq!(
        r.painter.paints(),
        [r0, Rect::new(0.0, 0.0, 30.0, 60.0)]
    );
}

#[test]
fn paint_while_hidden_waits_for_show() {
    let mut r = Rig::new(quiet());
    let dirty = Rect::new(10.0, 10.0, 20.0, 20.0);
    r.host.invalidate(dirty);
    r.advance(100);
    assert!(r.painter.paints().is_empty());

    r.host.show().unwrap();
    r.advance(0);
    assert_eq!(r.painter.paints(), [dirty]);
}

#[test]
fn move_burst_paints_once_settled() {
    let mut r = Rig::new(quiet());
    r.host.show().unwrap();
    r.advance(50);
    r.painter.clear();

    for _ in 0..3 {
        r.host.notify(BackingNotification::Moved).unwrap();
        r.advance(10);
    }
    r.advance(80);
    assert!(r.painter.paints().is_empty(), "still moving");

    // Quiet since 1070; the burst ends at 1170.
    r.advance(20);
    assert_eq!(r.painter.paints(), [CLIENT_AREA]);
}

#[test]
fn paint_during_move_paints_first_move_and_settle() {
    let config = HostConfig {
        paint_during_move: true,
        ..quiet()
    };
    let mut r = Rig::new(config);
    r.host.show().unwrap();
    r.advance(50);
    r.painter.clear();

    r.host.notify(BackingNotification::Moved).unwrap();
    r.advance(0);
    assert_eq!(r.painter.paints(), [CLIENT_AREA]);
    for _ in 0..2 {
        r.advance(10);
        r.host.notify(BackingNotification::Moved).unwrap();
    }
    r.advance(99);
    assert_eq!(r.painter.paints(), [CLIENT_AREA]);

    r.advance(10);
    assert_eq!(r.painter.paints(), [CLIENT_AREA, CLIENT_AREA]);
}

#[test]
fn resize_burst_paints_at_once_by_default() {
    let mut r = Rig::new(quiet());
    r.host.show().unwrap();
    r.advance(50);
    r.painter.clear();

    r.host.notify(BackingNotification::Resized).unwrap();
    r.advance(0);
    assert_eq!(r.painter.paints(), [CLIENT_AREA]);
    r.advance(200);
    assert_eq!(r.painter.paints(), [CLIENT_AREA, CLIENT_AREA]);
    assert_eq!(r.journal.count(r.host.id(), Resized), 1);
}

#[test]
fn resize_burst_waits_when_paint_during_resize_is_off() {
    let config = HostConfig {
        paint_during_resize: false,
        ..quiet()
    };
    let mut r = Rig::new(config);
    r.host.show().unwrap();
    r.advance(50);
    r.painter.clear();

    r.host.notify(BackingNotification::Resized).unwrap();
    r.advance(50);
    assert!(r.painter.paints().is_empty());
    r.advance(60);
    assert_eq!(r.painter.paints(), [CLIENT_AREA]);
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[test]
fn listener_error_surfaces_and_state_holds() {
    let mut r = Rig::custom(
        HostConfig::immediate(),
        SimState::default(),
        |j| j.listener().fail_once_on(Shown),
        |b| b,
    );
    let err = r.host.show().unwrap_err();
    assert!(matches!(err, HostError::Listener { event: Shown, .. }));
    assert!(r.host.state().is_showing());

    // The interrupted loop resumes on the next turn.
    r.advance(0);
    assert_eq!(r.events(), [Shown, FocusGained]);
}

#[test]
fn collaborator_failures_reach_the_error_hook() {
    let reports = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&reports);
    let mut r = Rig::custom(quiet(), SimState::default(), Journal::listener, |b| {
        b.error_hook(move |_, err: &HostError| sink.borrow_mut().push(err.clone()))
    });

    r.sim.fail_next(BackingOp::Show);
    assert!(r.host.show().unwrap());
    assert!(r.events().is_empty());
    assert!(matches!(
        reports.borrow()[0],
        HostError::Backing {
            op: BackingOp::Show,
            ..
        }
    ));

    // The refused show does not block a retry.
    assert!(r.host.show().unwrap());
    assert_eq!(r.events(), [Shown]);

    r.painter.fail_next();
    r.host.invalidate_all();
    r.advance(0);
    assert!(matches!(reports.borrow()[1], HostError::Paint(_)));
    assert_eq!(reports.borrow().len(), 2);
}

#[test]
fn refused_focus_request_reports_no_change() {
    let mut r = Rig::new(quiet());
    r.host.show().unwrap();

    r.sim.fail_next(BackingOp::RequestFocusGain);
    assert!(!r.host.request_focus_gain().unwrap());
    assert_eq!(r.events(), [Shown]);

    assert!(r.host.request_focus_gain().unwrap());
    assert_eq!(r.events(), [Shown, FocusGained]);
}

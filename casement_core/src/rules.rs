// Copyright 2026 the Casement Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The reconciliation rule table.
//!
//! A reconciliation pass evaluates [`RULES`] top to bottom against one fresh
//! [`BackingSnapshot`]. The first rule that fires an event or acts wins; the
//! host carries out that step and starts a new pass. Rules whose stability
//! gate is not yet satisfied contribute a re-check time and let evaluation
//! continue. When no rule matches, the pass is idle and the loop stops.
//!
//! Rule order encodes the event-order contract:
//!
//! 1. `pending_bounds`: Moved / Resized once live.
//! 2. `terminal`: FocusLost, then Hidden, then Closed while closing.
//! 3. `visibility`: Shown / Hidden, draining FocusLost before Hidden.
//! 4. `iconification`: only while showing, draining FocusLost before
//!    Iconified.
//! 5. `restore_maximized`: re-maximize after a deiconify.
//! 6. `maximization`: only while live.
//! 7. `focus`: only while live; not gated.
//! 8. `deferred_focus`: a focus request armed by an earlier event.
//! 9. `enforce_bounds`: parked bounds, once settled.

use crate::backing::BackingSnapshot;
use crate::config::HostConfig;
use crate::dispatch::Intents;
use crate::enforce::Enforcement;
use crate::event::{StateAxis, StateEvent, WindowEvent};
use crate::stability::{GateOutcome, StabilityTracker};
use crate::state::ClientObservedState;
use crate::time::HostTime;

/// Everything a rule may look at.
#[derive(Debug)]
pub(crate) struct Pass<'a> {
    pub(crate) now: HostTime,
    pub(crate) snapshot: BackingSnapshot,
    pub(crate) observed: ClientObservedState,
    pub(crate) intents: Intents,
    pub(crate) enforcement: Enforcement,
    pub(crate) closing: bool,
    pub(crate) dialogs_open: bool,
    pub(crate) maximize_works: bool,
    pub(crate) config: &'a HostConfig,
    pub(crate) stability: &'a mut StabilityTracker,
    /// Gate checks made during this pass, for tracing.
    pub(crate) gates: Vec<(StateEvent, GateOutcome)>,
}

impl Pass<'_> {
    fn gate(&mut self, event: StateEvent) -> GateOutcome {
        let outcome = self.stability.gate(event, self.now, self.config);
        log::trace!("gate {event:?} at {:?}: {outcome:?}", self.now);
        self.gates.push((event, outcome));
        outcome
    }

    /// The change event on `axis` if the backend disagrees with the client.
    ///
    /// When they agree, or the backend value is unreadable, any detection in
    /// progress on that axis is forgotten.
    fn diff(&mut self, axis: StateAxis, backend: Option<bool>, observed: bool) -> Option<StateEvent> {
        match backend {
            Some(b) if b != observed => Some(StateEvent::for_value(axis, b)),
            agreed => {
                self.stability
                    .clear_detection(StateEvent::for_value(axis, !observed));
                if agreed.is_some() {
                    // Already there; no event will fire to clear the mark.
                    self.stability
                        .cancel_programmatic(StateEvent::for_value(axis, observed));
                }
                None
            }
        }
    }

    /// Gates `event`; fires `drain` first if given, then `event`.
    fn gated_fire(&mut self, event: StateEvent, drain: Option<WindowEvent>) -> Step {
        match self.gate(event) {
            GateOutcome::Wait(at) => Step::Wait(at),
            _ => Step::Fire(drain.unwrap_or(event.into())),
        }
    }

    fn settled(&self) -> Result<(), HostTime> {
        let at = self
            .stability
            .settled_at(self.config.state_stability_delay());
        if self.now.has_reached(at) { Ok(()) } else { Err(at) }
    }
}

/// Non-event work a pass can ask the host to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Action {
    /// Ask the backend for focus.
    RequestFocus,
    /// Re-maximize after a deiconify.
    RestoreMaximized,
    /// Apply the armed bounds enforcement.
    Enforce,
}

/// What a single rule decided.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Step {
    Fire(WindowEvent),
    Act(Action),
    Wait(HostTime),
    /// Stop evaluating; nothing else may happen.
    Halt,
}

/// A named guard and action.
pub(crate) struct Rule {
    pub(crate) name: &'static str,
    pub(crate) eval: fn(&mut Pass<'_>) -> Option<Step>,
}

/// What a whole pass decided.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Decision {
    Fire {
        rule: &'static str,
        event: WindowEvent,
    },
    Act {
        rule: &'static str,
        action: Action,
    },
    Idle {
        recheck_at: Option<HostTime>,
    },
}

impl Decision {
    pub(crate) fn rule(&self) -> Option<&'static str> {
        match *self {
            Self::Fire { rule, .. } | Self::Act { rule, .. } => Some(rule),
            Self::Idle { .. } => None,
        }
    }
}

pub(crate) const RULES: &[Rule] = &[
    Rule {
        name: "pending_bounds",
        eval: pending_bounds,
    },
    Rule {
        name: "terminal",
        eval: terminal,
    },
    Rule {
        name: "visibility",
        eval: visibility,
    },
    Rule {
        name: "iconification",
        eval: iconification,
    },
    Rule {
        name: "restore_maximized",
        eval: restore_maximized,
    },
    Rule {
        name: "maximization",
        eval: maximization,
    },
    Rule {
        name: "focus",
        eval: focus,
    },
    Rule {
        name: "deferred_focus",
        eval: deferred_focus,
    },
    Rule {
        name: "enforce_bounds",
        eval: enforce_bounds,
    },
];

/// Runs the rule table once.
pub(crate) fn evaluate(pass: &mut Pass<'_>) -> Decision {
    let mut recheck_at: Option<HostTime> = None;
    for rule in RULES {
        match (rule.eval)(pass) {
            None => {}
            Some(Step::Wait(at)) => {
                recheck_at = Some(recheck_at.map_or(at, |t| t.min(at)));
            }
            Some(Step::Fire(event)) => {
                return Decision::Fire {
                    rule: rule.name,
                    event,
                };
            }
            Some(Step::Act(action)) => {
                return Decision::Act {
                    rule: rule.name,
                    action,
                };
            }
            Some(Step::Halt) => return Decision::Idle { recheck_at: None },
        }
    }
    Decision::Idle { recheck_at }
}

fn pending_bounds(p: &mut Pass<'_>) -> Option<Step> {
    if !p.observed.is_live() {
        return None;
    }
    if p.observed.is_moved_pending() {
        Some(Step::Fire(WindowEvent::Moved))
    } else if p.observed.is_resized_pending() {
        Some(Step::Fire(WindowEvent::Resized))
    } else {
        None
    }
}

fn terminal(p: &mut Pass<'_>) -> Option<Step> {
    let o = p.observed;
    if o.is_closed() {
        return Some(Step::Halt);
    }
    if !p.closing {
        return None;
    }
    Some(if o.is_focused() {
        Step::Fire(WindowEvent::FocusLost)
    } else if o.is_showing() {
        Step::Fire(WindowEvent::Hidden)
    } else if p.dialogs_open {
        Step::Halt
    } else {
        Step::Fire(WindowEvent::Closed)
    })
}

fn visibility(p: &mut Pass<'_>) -> Option<Step> {
    let o = p.observed;
    let event = p.diff(StateAxis::Visibility, Some(p.snapshot.showing), o.is_showing())?;
    let drain = (event == StateEvent::Hidden && o.is_focused()).then_some(WindowEvent::FocusLost);
    Some(p.gated_fire(event, drain))
}

fn iconification(p: &mut Pass<'_>) -> Option<Step> {
    let o = p.observed;
    if !o.is_showing() {
        return None;
    }
    let event = p.diff(StateAxis::Iconification, p.snapshot.iconified, o.is_iconified())?;
    let drain =
        (event == StateEvent::Iconified && o.is_focused()).then_some(WindowEvent::FocusLost);
    Some(p.gated_fire(event, drain))
}

fn restore_maximized(p: &mut Pass<'_>) -> Option<Step> {
    (p.intents.restore_maximized && p.observed.is_live() && p.snapshot.is_live())
        .then_some(Step::Act(Action::RestoreMaximized))
}

fn maximization(p: &mut Pass<'_>) -> Option<Step> {
    let o = p.observed;
    if !o.is_live() {
        return None;
    }
    let event = p.diff(StateAxis::Maximization, p.snapshot.maximized, o.is_maximized())?;
    Some(p.gated_fire(event, None))
}

fn focus(p: &mut Pass<'_>) -> Option<Step> {
    if !p.observed.is_live() {
        return None;
    }
    match p.snapshot.focused {
        Some(true) if !p.observed.is_focused() => Some(Step::Fire(WindowEvent::FocusGained)),
        Some(false) if p.observed.is_focused() => Some(Step::Fire(WindowEvent::FocusLost)),
        _ => None,
    }
}

fn deferred_focus(p: &mut Pass<'_>) -> Option<Step> {
    (p.intents.focus_request && p.observed.is_live() && p.snapshot.is_live())
        .then_some(Step::Act(Action::RequestFocus))
}

fn enforce_bounds(p: &mut Pass<'_>) -> Option<Step> {
    let o = p.observed;
    let s = p.snapshot;
    if !o.is_live() || !s.is_live() {
        return None;
    }
    let ready = match p.enforcement {
        Enforcement::None => false,
        Enforcement::OnMaximize => {
            !p.maximize_works || (o.is_maximized() && s.maximized == Some(true))
        }
        Enforcement::OnDemaximize(_) => !o.is_maximized() && s.maximized == Some(false),
    };
    if !ready {
        return None;
    }
    Some(match p.settled() {
        Ok(()) => Step::Act(Action::Enforce),
        Err(at) => Step::Wait(at),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drag::BoundsTarget;
    use crate::geometry::Rect;

    const LIVE: BackingSnapshot = BackingSnapshot {
        showing: true,
        iconified: Some(false),
        maximized: Some(false),
        focused: Some(false),
    };

    fn observed(showing: bool, focused: bool, iconified: bool, maximized: bool) -> ClientObservedState {
        ClientObservedState {
            showing,
            focused,
            iconified,
            maximized,
            ..ClientObservedState::default()
        }
    }

    struct Fixture {
        config: HostConfig,
        stability: StabilityTracker,
    }

    impl Fixture {
        fn immediate() -> Self {
            Self {
                config: HostConfig::immediate(),
                stability: StabilityTracker::new(),
            }
        }

        fn pass(&mut self, snapshot: BackingSnapshot, observed: ClientObservedState) -> Pass<'_> {
            Pass {
                now: HostTime(1000),
                snapshot,
                observed,
                intents: Intents::default(),
                enforcement: Enforcement::None,
                closing: false,
                dialogs_open: false,
                maximize_works: true,
                config: &self.config,
                stability: &mut self.stability,
                gates: Vec::new(),
            }
        }
    }

    #[test]
    fn agreement_is_idle() {
        let mut f = Fixture::immediate();
        let mut p = f.pass(LIVE, observed(true, false, false, false));
        assert_eq!(evaluate(&mut p), Decision::Idle { recheck_at: None });
    }

    #[test]
    fn agreement_settles_a_pending_change() {
        let mut f = Fixture::immediate();
        // show() issued while the client already counts as showing.
        f.stability.begin_programmatic(StateEvent::Shown, HostTime(900));
        let mut p = f.pass(LIVE, observed(true, false, false, false));
        assert_eq!(evaluate(&mut p), Decision::Idle { recheck_at: None });
        assert!(
            !f.stability.is_pending(StateEvent::Shown),
            "the pending Shown has nothing left to fire"
        );
    }

    #[test]
    fn pending_change_survives_while_backend_lags() {
        let mut f = Fixture::immediate();
        f.stability.begin_programmatic(StateEvent::Iconified, HostTime(900));
        let mut p = f.pass(LIVE, observed(true, false, false, false));
        assert_eq!(evaluate(&mut p), Decision::Idle { recheck_at: None });
        assert!(f.stability.is_pending(StateEvent::Iconified));
    }

    #[test]
    fn pending_move_fires_before_anything_else() {
        let mut f = Fixture::immediate();
        let mut o = observed(true, false, false, false);
        o.moved_pending = true;
        let mut p = f.pass(BackingSnapshot::HIDDEN, o);
        p.closing = true;
        assert_eq!(
            evaluate(&mut p),
            Decision::Fire {
                rule: "pending_bounds",
                event: WindowEvent::Moved
            }
        );
    }

    #[test]
    fn terminal_sequence_order() {
        let mut f = Fixture::immediate();
        let cases = [
            (observed(true, true, false, false), WindowEvent::FocusLost),
            (observed(true, false, false, false), WindowEvent::Hidden),
            (observed(false, false, true, false), WindowEvent::Closed),
        ];
        for (o, expected) in cases {
            let mut p = f.pass(BackingSnapshot::HIDDEN, o);
            p.closing = true;
            assert_eq!(
                evaluate(&mut p),
                Decision::Fire {
                    rule: "terminal",
                    event: expected
                }
            );
        }
    }

    #[test]
    fn closed_waits_for_dialogs() {
        let mut f = Fixture::immediate();
        let mut p = f.pass(BackingSnapshot::HIDDEN, observed(false, false, false, false));
        p.closing = true;
        p.dialogs_open = true;
        assert_eq!(evaluate(&mut p), Decision::Idle { recheck_at: None });
    }

    #[test]
    fn hide_drains_focus_first() {
        let mut f = Fixture::immediate();
        let mut p = f.pass(BackingSnapshot::HIDDEN, observed(true, true, false, false));
        assert_eq!(
            evaluate(&mut p),
            Decision::Fire {
                rule: "visibility",
                event: WindowEvent::FocusLost
            }
        );
    }

    #[test]
    fn iconify_drains_focus_first() {
        let mut f = Fixture::immediate();
        let snap = BackingSnapshot {
            showing: true,
            iconified: Some(true),
            maximized: None,
            focused: None,
        };
        let mut p = f.pass(snap, observed(true, true, false, false));
        assert_eq!(
            evaluate(&mut p),
            Decision::Fire {
                rule: "iconification",
                event: WindowEvent::FocusLost
            }
        );
        let mut p = f.pass(snap, observed(true, false, false, false));
        assert_eq!(
            evaluate(&mut p),
            Decision::Fire {
                rule: "iconification",
                event: WindowEvent::Iconified
            }
        );
    }

    #[test]
    fn maximized_never_precedes_shown() {
        let mut f = Fixture::immediate();
        let snap = BackingSnapshot {
            maximized: Some(true),
            ..LIVE
        };
        let mut p = f.pass(snap, observed(false, false, false, false));
        assert_eq!(
            evaluate(&mut p),
            Decision::Fire {
                rule: "visibility",
                event: WindowEvent::Shown
            }
        );
    }

    #[test]
    fn unmet_gate_reports_recheck_time() {
        let mut f = Fixture {
            config: HostConfig::default(),
            stability: StabilityTracker::new(),
        };
        let snap = BackingSnapshot {
            maximized: Some(true),
            ..LIVE
        };
        let mut p = f.pass(snap, observed(true, false, false, false));
        let stability = p.config.state_stability_delay();
        let decision = evaluate(&mut p);
        assert_eq!(
            decision,
            Decision::Idle {
                recheck_at: Some(HostTime(1000) + stability)
            }
        );
        assert_eq!(p.gates.len(), 1);
    }

    #[test]
    fn focus_is_not_gated() {
        let mut f = Fixture {
            config: HostConfig::default(),
            stability: StabilityTracker::new(),
        };
        let snap = BackingSnapshot {
            focused: Some(true),
            ..LIVE
        };
        let mut p = f.pass(snap, observed(true, false, false, false));
        assert_eq!(
            evaluate(&mut p),
            Decision::Fire {
                rule: "focus",
                event: WindowEvent::FocusGained
            }
        );
    }

    #[test]
    fn deferred_focus_waits_for_live_backend() {
        let mut f = Fixture::immediate();
        let snap = BackingSnapshot {
            showing: true,
            iconified: Some(true),
            maximized: None,
            focused: None,
        };
        // Observed iconified too, so no diff fires.
        let mut p = f.pass(snap, observed(true, false, true, false));
        p.intents.focus_request = true;
        assert_eq!(evaluate(&mut p), Decision::Idle { recheck_at: None });

        let mut p = f.pass(LIVE, observed(true, false, false, false));
        p.intents.focus_request = true;
        assert_eq!(
            evaluate(&mut p),
            Decision::Act {
                rule: "deferred_focus",
                action: Action::RequestFocus
            }
        );
    }

    #[test]
    fn enforcement_waits_for_settle() {
        let mut f = Fixture {
            config: HostConfig::default(),
            stability: StabilityTracker::new(),
        };
        f.stability.bump(HostTime(950));
        let mut p = f.pass(LIVE, observed(true, false, false, false));
        p.enforcement = Enforcement::OnDemaximize(BoundsTarget::Client(Rect::ZERO));
        assert_eq!(
            evaluate(&mut p),
            Decision::Idle {
                recheck_at: Some(HostTime(1050))
            }
        );
        p.now = HostTime(1050);
        assert_eq!(
            evaluate(&mut p),
            Decision::Act {
                rule: "enforce_bounds",
                action: Action::Enforce
            }
        );
    }

    #[test]
    fn enforce_on_maximize_needs_agreement() {
        let mut f = Fixture::immediate();
        let mut p = f.pass(LIVE, observed(true, false, false, false));
        p.enforcement = Enforcement::OnMaximize;
        assert_eq!(evaluate(&mut p), Decision::Idle { recheck_at: None });
        p.maximize_works = false;
        assert_eq!(
            evaluate(&mut p),
            Decision::Act {
                rule: "enforce_bounds",
                action: Action::Enforce
            }
        );
    }
}

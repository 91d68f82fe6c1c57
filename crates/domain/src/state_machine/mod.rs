//! Lighting state machine.
//!
//! [`next_state`] is the pure transition table. [`StateMachine`] wraps it
//! and remembers where it came from and why, for diagnostics. Neither
//! performs side effects: turning lights on or off and starting timers is
//! the coordinator's job once it sees the resulting [`Transition`].
//!
//! `OverrideOn` is checked before anything else and always yields
//! [`LightingState::Disabled`]. Pairs not in the table return `None`.

mod event;
mod state;

pub use event::{TimerKind, TransitionEvent};
pub use state::{LightingState, UnknownStateError};

use crate::time::{Timestamp, now};

/// Compute the state reached from `current` on `event`.
///
/// `reevaluated` is the state the caller derived from current motion and
/// light readings; it is only consulted when leaving
/// [`LightingState::Disabled`] and defaults to
/// [`LightingState::Standby`].
#[must_use]
pub fn next_state(
    current: LightingState,
    event: TransitionEvent,
    reevaluated: Option<LightingState>,
) -> Option<LightingState> {
    use LightingState::{
        AutoTimeout, Disabled, ManualOff, ManualTimeout, MotionAdjusted, MotionDetected, Standby,
    };
    use TransitionEvent::{
        LightsAllOff, ManualIntervention, ManualOffIntervention, MotionOff, MotionOn, OverrideOff,
        OverrideOn, TimerExpired,
    };

    if event == OverrideOn {
        return Some(Disabled);
    }

    let next = match (current, event) {
        (Standby | ManualOff | AutoTimeout, MotionOn) => MotionDetected,
        (ManualTimeout, MotionOn) => MotionAdjusted,

        (MotionDetected, MotionOff) => AutoTimeout,
        (MotionAdjusted, MotionOff) => ManualTimeout,

        (MotionDetected | MotionAdjusted, ManualIntervention) => MotionAdjusted,
        (Standby | AutoTimeout | ManualTimeout | ManualOff, ManualIntervention) => ManualTimeout,

        (
            MotionDetected | AutoTimeout | MotionAdjusted | ManualTimeout,
            LightsAllOff | ManualOffIntervention,
        ) => ManualOff,

        (AutoTimeout, TimerExpired(TimerKind::Motion))
        | (ManualTimeout | ManualOff, TimerExpired(TimerKind::Extended)) => Standby,

        (Disabled, OverrideOff) => reevaluated
            .filter(|state| *state != Disabled)
            .unwrap_or(Standby),

        _ => return None,
    };
    Some(next)
}

/// State to resume in when the override switch is released.
#[must_use]
pub fn reevaluate(lights_on: bool, motion_active: bool, motion_activation: bool) -> LightingState {
    match (lights_on, motion_active) {
        (true, true) => LightingState::MotionAdjusted,
        (true, false) => LightingState::ManualTimeout,
        (false, true) if motion_activation => LightingState::MotionDetected,
        (false, _) => LightingState::Standby,
    }
}

/// A state change accepted by the [`StateMachine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: LightingState,
    pub to: LightingState,
    pub event: TransitionEvent,
}

impl Transition {
    /// Whether the transition returned to the state it started from.
    #[must_use]
    pub fn is_self_loop(&self) -> bool {
        self.from == self.to
    }
}

/// Current lighting state plus transition bookkeeping.
#[derive(Debug, Clone)]
pub struct StateMachine {
    current: LightingState,
    previous: Option<LightingState>,
    last_reason: Option<String>,
    last_transition_at: Option<Timestamp>,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new(LightingState::Standby)
    }
}

impl StateMachine {
    #[must_use]
    pub fn new(initial: LightingState) -> Self {
        Self {
            current: initial,
            previous: None,
            last_reason: None,
            last_transition_at: None,
        }
    }

    #[must_use]
    pub fn current(&self) -> LightingState {
        self.current
    }

    #[must_use]
    pub fn previous(&self) -> Option<LightingState> {
        self.previous
    }

    #[must_use]
    pub fn last_reason(&self) -> Option<&str> {
        self.last_reason.as_deref()
    }

    #[must_use]
    pub fn last_transition_at(&self) -> Option<Timestamp> {
        self.last_transition_at
    }

    /// Apply `event`, returning the transition when the pair is defined.
    ///
    /// Undefined pairs leave the machine untouched.
    pub fn dispatch(
        &mut self,
        event: TransitionEvent,
        reevaluated: Option<LightingState>,
    ) -> Option<Transition> {
        let from = self.current;
        let to = next_state(from, event, reevaluated)?;
        if from != to {
            self.previous = Some(from);
            self.current = to;
        }
        self.last_reason = Some(event.to_string());
        self.last_transition_at = Some(now());
        Some(Transition { from, to, event })
    }

    /// Jump to `state` outside the transition table (initial placement,
    /// reconfiguration).
    pub fn reset(&mut self, state: LightingState, reason: impl Into<String>) {
        if state != self.current {
            self.previous = Some(self.current);
        }
        self.current = state;
        self.last_reason = Some(reason.into());
        self.last_transition_at = Some(now());
    }
}

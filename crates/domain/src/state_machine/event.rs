//! Events that drive the lighting state machine.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The two auto-off timers of a light group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerKind {
    /// Runs after motion stops while lights are automatic.
    Motion,
    /// Runs after a manual intervention.
    Extended,
}

impl TimerKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Motion => "motion",
            Self::Extended => "extended",
        }
    }
}

impl fmt::Display for TimerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input to [`next_state`](super::next_state).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "event", content = "timer")]
pub enum TransitionEvent {
    MotionOn,
    MotionOff,
    OverrideOn,
    OverrideOff,
    ManualIntervention,
    ManualOffIntervention,
    TimerExpired(TimerKind),
    LightsAllOff,
}

impl fmt::Display for TransitionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MotionOn => f.write_str("motion_on"),
            Self::MotionOff => f.write_str("motion_off"),
            Self::OverrideOn => f.write_str("override_on"),
            Self::OverrideOff => f.write_str("override_off"),
            Self::ManualIntervention => f.write_str("manual_intervention"),
            Self::ManualOffIntervention => f.write_str("manual_off_intervention"),
            Self::TimerExpired(kind) => write!(f, "timer_expired({kind})"),
            Self::LightsAllOff => f.write_str("lights_all_off"),
        }
    }
}

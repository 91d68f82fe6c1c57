//! Lighting states of a light group.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Where a light group currently is in its automation lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightingState {
    /// Lights off, waiting for motion.
    #[default]
    Standby,
    /// Motion turned the lights on automatically.
    MotionDetected,
    /// Motion stopped, the motion timer is counting down.
    AutoTimeout,
    /// User adjusted the lights while motion is still present.
    MotionAdjusted,
    /// User took control, the extended timer is counting down.
    ManualTimeout,
    /// User switched everything off, automatic turn-on is blocked.
    ManualOff,
    /// Override switch is on, automation is suspended.
    Disabled,
}

impl LightingState {
    pub const ALL: [Self; 7] = [
        Self::Standby,
        Self::MotionDetected,
        Self::AutoTimeout,
        Self::MotionAdjusted,
        Self::ManualTimeout,
        Self::ManualOff,
        Self::Disabled,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Standby => "standby",
            Self::MotionDetected => "motion_detected",
            Self::AutoTimeout => "auto_timeout",
            Self::MotionAdjusted => "motion_adjusted",
            Self::ManualTimeout => "manual_timeout",
            Self::ManualOff => "manual_off",
            Self::Disabled => "disabled",
        }
    }

    /// Label used by older dashboards and stored automations.
    #[must_use]
    pub fn legacy_label(self) -> &'static str {
        match self {
            Self::Standby => "idle",
            Self::MotionDetected => "motion-auto",
            Self::AutoTimeout => "auto",
            Self::MotionAdjusted => "motion-manual",
            Self::ManualTimeout => "manual",
            Self::ManualOff => "manual-off",
            Self::Disabled => "overridden",
        }
    }

    /// Whether the user currently owns the lights.
    #[must_use]
    pub fn is_manual(self) -> bool {
        matches!(
            self,
            Self::MotionAdjusted | Self::ManualTimeout | Self::ManualOff
        )
    }
}

impl fmt::Display for LightingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a label matches neither a current nor a legacy state name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown lighting state: {0}")]
pub struct UnknownStateError(pub String);

impl FromStr for LightingState {
    type Err = UnknownStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|state| state.as_str() == s || state.legacy_label() == s)
            .ok_or_else(|| UnknownStateError(s.to_string()))
    }
}

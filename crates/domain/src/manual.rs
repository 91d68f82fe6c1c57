//! Manual-intervention classification of light changes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entity::EntitySnapshot;

/// Brightness moves larger than this many percentage points count as manual.
pub const BRIGHTNESS_TOLERANCE: u8 = 10;

/// Why a light change was attributed to a person.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManualReason {
    Toggled,
    BrightnessChanged,
}

impl ManualReason {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Toggled => "state toggled externally",
            Self::BrightnessChanged => "brightness changed significantly",
        }
    }
}

impl fmt::Display for ManualReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of classifying one light change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Echo of a command this group issued.
    OwnCommand,
    Manual(ManualReason),
    /// Change too small to matter.
    Insignificant,
}

impl Classification {
    #[must_use]
    pub fn is_manual(self) -> bool {
        matches!(self, Self::Manual(_))
    }

    #[must_use]
    pub fn reason(self) -> Option<ManualReason> {
        match self {
            Self::Manual(reason) => Some(reason),
            Self::OwnCommand | Self::Insignificant => None,
        }
    }
}

/// Classify a light change.
///
/// `own_command` is whether the change carried a token this group issued
/// within its retention window; such changes are never manual.
#[must_use]
pub fn classify(
    old: Option<&EntitySnapshot>,
    new: &EntitySnapshot,
    own_command: bool,
) -> Classification {
    if own_command {
        return Classification::OwnCommand;
    }
    let Some(old) = old else {
        return Classification::Insignificant;
    };

    let toggled = (old.state.is_on() && new.state.is_off())
        || (old.state.is_off() && new.state.is_on());
    if toggled {
        return Classification::Manual(ManualReason::Toggled);
    }

    if let (Some(before), Some(after)) = (old.brightness, new.brightness)
        && before.abs_diff(after) > BRIGHTNESS_TOLERANCE
    {
        return Classification::Manual(ManualReason::BrightnessChanged);
    }

    Classification::Insignificant
}

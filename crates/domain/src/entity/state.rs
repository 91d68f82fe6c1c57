//! Entity state — the value an observed entity currently reports.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// State of a light, switch or sensor as reported by the host platform.
///
/// On the wire this is either a number (`412.5`) or a string (`"on"`,
/// `"off"`, `"unknown"`, `"unavailable"`, or any other free-form value).
#[derive(Debug, Clone, PartialEq, Default)]
pub enum EntityState {
    On,
    Off,
    Numeric(f64),
    Text(String),
    #[default]
    Unknown,
    Unavailable,
}

impl EntityState {
    /// Whether the entity reports `on`.
    #[must_use]
    pub fn is_on(&self) -> bool {
        matches!(self, Self::On)
    }

    /// Whether the entity reports `off`.
    #[must_use]
    pub fn is_off(&self) -> bool {
        matches!(self, Self::Off)
    }

    /// Numeric reading, if the state is one.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Numeric(value) => Some(*value),
            _ => None,
        }
    }

    /// Whether the entity is reachable (anything but [`Unavailable`](Self::Unavailable)).
    #[must_use]
    pub fn is_available(&self) -> bool {
        !matches!(self, Self::Unavailable)
    }
}

impl FromStr for EntityState {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "on" => Self::On,
            "off" => Self::Off,
            "unknown" | "" => Self::Unknown,
            "unavailable" => Self::Unavailable,
            other => match other.parse::<f64>() {
                Ok(value) if value.is_finite() => Self::Numeric(value),
                _ => Self::Text(other.to_string()),
            },
        })
    }
}

impl fmt::Display for EntityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::On => f.write_str("on"),
            Self::Off => f.write_str("off"),
            Self::Numeric(value) => value.fmt(f),
            Self::Text(text) => f.write_str(text),
            Self::Unknown => f.write_str("unknown"),
            Self::Unavailable => f.write_str("unavailable"),
        }
    }
}

impl Serialize for EntityState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Numeric(value) => serializer.serialize_f64(*value),
            other => serializer.collect_str(other),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawState {
    Number(f64),
    Flag(bool),
    Text(String),
}

impl<'de> Deserialize<'de> for EntityState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawState::deserialize(deserializer)? {
            RawState::Number(value) => Self::Numeric(value),
            RawState::Flag(true) => Self::On,
            RawState::Flag(false) => Self::Off,
            RawState::Text(text) => {
                let Ok(state) = text.parse();
                state
            }
        })
    }
}

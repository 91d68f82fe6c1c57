//! Observed entities — the lights, sensors and switches a light group watches.
//!
//! Entities are addressed by the host's string id (`light.kitchen`,
//! `binary_sensor.hall_motion`, …). The domain only cares about the
//! reported [`EntityState`] and, for lights, the brightness percentage.

mod state;

pub use state::EntityState;

use serde::{Deserialize, Serialize};

use crate::id::AttributionToken;

/// Point-in-time reading of an entity.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EntitySnapshot {
    pub state: EntityState,
    /// Brightness in percent (0–100), lights only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brightness: Option<u8>,
}

impl EntitySnapshot {
    #[must_use]
    pub fn new(state: EntityState) -> Self {
        Self {
            state,
            brightness: None,
        }
    }

    #[must_use]
    pub fn with_brightness(mut self, brightness: u8) -> Self {
        self.brightness = Some(brightness.min(100));
        self
    }

    #[must_use]
    pub fn is_on(&self) -> bool {
        self.state.is_on()
    }
}

/// Notification delivered to subscribers when an entity changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateChange {
    pub entity_id: String,
    /// `None` when the entity had never been seen before.
    #[serde(default)]
    pub old: Option<EntitySnapshot>,
    pub new: EntitySnapshot,
    /// Token of the command that caused the change, if any.
    #[serde(default)]
    pub token: Option<AttributionToken>,
}

//! Published coordinator status and its human-readable event log.

use std::collections::{BTreeMap, VecDeque};

use motionlights_domain::brightness::BrightnessMode;
use motionlights_domain::manual::ManualReason;
use motionlights_domain::state_machine::{LightingState, TimerKind};
use motionlights_domain::time::{Timestamp, now};
use serde::Serialize;

use crate::timer_manager::TimerStatus;

/// Number of entries kept in [`EventLog`].
pub const EVENT_LOG_CAPACITY: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventLogEntry {
    pub at: Timestamp,
    pub message: String,
}

/// Ring buffer of the most recent coordinator events.
#[derive(Debug, Clone)]
pub struct EventLog {
    entries: VecDeque<EventLogEntry>,
    capacity: usize,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::with_capacity(EVENT_LOG_CAPACITY)
    }
}

impl EventLog {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, message: impl Into<String>) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(EventLogEntry {
            at: now(),
            message: message.into(),
        });
    }

    /// Entries, oldest first.
    #[must_use]
    pub fn entries(&self) -> Vec<EventLogEntry> {
        self.entries.iter().cloned().collect()
    }
}

/// Everything a dashboard needs to show about one light group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoordinatorStatus {
    pub name: String,
    pub current_state: LightingState,
    pub previous_state: Option<LightingState>,
    pub last_transition_reason: Option<String>,
    pub last_transition_time: Option<Timestamp>,
    pub motion_active: bool,
    pub override_active: bool,
    pub motion_activation_enabled: bool,
    pub timers: BTreeMap<TimerKind, TimerStatus>,
    pub lights_on: usize,
    pub total_lights: usize,
    pub brightness_mode: Option<BrightnessMode>,
    pub last_manual_reason: Option<ManualReason>,
    pub event_log: Vec<EventLogEntry>,
}

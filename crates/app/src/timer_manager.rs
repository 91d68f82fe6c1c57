//! Named, cancelable, single-shot timers.
//!
//! A light group owns at most one timer per [`TimerKind`]. Starting a timer
//! replaces any running timer of the same kind. Each start gets a fresh
//! generation number; the expiry callback receives it so late deliveries
//! from a replaced or cancelled timer can be told apart with
//! [`TimerManager::acknowledge`].

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use motionlights_domain::error::SchedulerError;
use motionlights_domain::state_machine::TimerKind;
use motionlights_domain::time::{Timestamp, after};
use serde::Serialize;
use tokio::time::Instant;

use crate::ports::{ScheduleHandle, Scheduler};

/// Delivered to the expiry callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerExpiry {
    pub kind: TimerKind,
    pub generation: u64,
}

/// Snapshot of a running timer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimerStatus {
    pub duration_seconds: u64,
    pub remaining_seconds: f64,
    pub end_time: Timestamp,
}

#[derive(Debug)]
struct ActiveTimer {
    handle: ScheduleHandle,
    generation: u64,
    duration: Duration,
    deadline: Instant,
    end_time: Timestamp,
}

impl ActiveTimer {
    fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    fn status(&self) -> TimerStatus {
        TimerStatus {
            duration_seconds: self.duration.as_secs(),
            remaining_seconds: self.remaining().as_secs_f64(),
            end_time: self.end_time,
        }
    }
}

/// Owns the timers of one light group.
#[derive(Debug)]
pub struct TimerManager<S> {
    scheduler: S,
    timers: HashMap<TimerKind, ActiveTimer>,
    generation: u64,
}

impl<S: Scheduler> TimerManager<S> {
    #[must_use]
    pub fn new(scheduler: S) -> Self {
        Self {
            scheduler,
            timers: HashMap::new(),
            generation: 0,
        }
    }

    /// Start (or restart) the timer of `kind`.
    ///
    /// # Errors
    ///
    /// Returns the [`SchedulerError`] when the task cannot be scheduled; any
    /// previous timer of the same kind is cancelled regardless.
    pub fn start(
        &mut self,
        kind: TimerKind,
        duration: Duration,
        on_expire: impl FnOnce(TimerExpiry) + Send + 'static,
    ) -> Result<TimerStatus, SchedulerError> {
        self.cancel(kind);

        self.generation += 1;
        let expiry = TimerExpiry {
            kind,
            generation: self.generation,
        };
        let handle = self
            .scheduler
            .schedule(duration, Box::new(move || on_expire(expiry)))?;

        let timer = ActiveTimer {
            handle,
            generation: expiry.generation,
            duration,
            deadline: Instant::now() + duration,
            end_time: after(duration),
        };
        let status = timer.status();
        tracing::debug!(timer = %kind, seconds = duration.as_secs(), "timer started");
        self.timers.insert(kind, timer);
        Ok(status)
    }

    /// Cancel the timer of `kind`; returns whether one was running.
    pub fn cancel(&mut self, kind: TimerKind) -> bool {
        match self.timers.remove(&kind) {
            Some(timer) => {
                timer.handle.cancel();
                tracing::debug!(timer = %kind, "timer cancelled");
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&mut self) {
        for (_, timer) in self.timers.drain() {
            timer.handle.cancel();
        }
    }

    /// Consume an expiry notification.
    ///
    /// Returns `true` when it belongs to the currently running timer of its
    /// kind, which is then considered finished.
    pub fn acknowledge(&mut self, expiry: TimerExpiry) -> bool {
        match self.timers.get(&expiry.kind) {
            Some(timer) if timer.generation == expiry.generation => {
                self.timers.remove(&expiry.kind);
                true
            }
            _ => false,
        }
    }

    #[must_use]
    pub fn is_active(&self, kind: TimerKind) -> bool {
        self.timers.contains_key(&kind)
    }

    /// Seconds left on the timer of `kind`, `None` when it is not running.
    #[must_use]
    pub fn remaining_seconds(&self, kind: TimerKind) -> Option<f64> {
        self.timers
            .get(&kind)
            .map(|timer| timer.remaining().as_secs_f64())
    }

    #[must_use]
    pub fn active_kinds(&self) -> Vec<TimerKind> {
        let mut kinds: Vec<_> = self.timers.keys().copied().collect();
        kinds.sort();
        kinds
    }

    #[must_use]
    pub fn statuses(&self) -> BTreeMap<TimerKind, TimerStatus> {
        self.timers
            .iter()
            .map(|(kind, timer)| (*kind, timer.status()))
            .collect()
    }
}

//! Scheduler port — run a task once after a delay.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use motionlights_domain::error::SchedulerError;

/// Work to run when a delay elapses.
pub type ScheduledTask = Box<dyn FnOnce() + Send + 'static>;

/// Cancels a scheduled task. Cancelling after the task ran is a no-op.
pub struct ScheduleHandle {
    cancel: Box<dyn FnOnce() + Send + Sync + 'static>,
}

impl ScheduleHandle {
    #[must_use]
    pub fn new(cancel: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            cancel: Box::new(cancel),
        }
    }

    pub fn cancel(self) {
        (self.cancel)();
    }
}

impl fmt::Debug for ScheduleHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduleHandle").finish_non_exhaustive()
    }
}

/// Runs tasks after a delay.
///
/// A zero delay runs the task at the next scheduling opportunity, never
/// synchronously inside [`schedule`](Self::schedule).
pub trait Scheduler {
    /// # Errors
    ///
    /// Returns a [`SchedulerError`] when the task cannot be scheduled.
    fn schedule(
        &self,
        delay: Duration,
        task: ScheduledTask,
    ) -> Result<ScheduleHandle, SchedulerError>;
}

impl<T: Scheduler> Scheduler for Arc<T> {
    fn schedule(
        &self,
        delay: Duration,
        task: ScheduledTask,
    ) -> Result<ScheduleHandle, SchedulerError> {
        (**self).schedule(delay, task)
    }
}

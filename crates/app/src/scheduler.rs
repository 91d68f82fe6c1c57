//! Tokio-backed [`Scheduler`].

use std::time::Duration;

use motionlights_domain::error::SchedulerError;
use tokio::runtime::Handle;

use crate::ports::{ScheduleHandle, ScheduledTask, Scheduler};

/// Spawns one sleeping task per scheduled job on the current tokio runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioScheduler;

impl Scheduler for TokioScheduler {
    fn schedule(
        &self,
        delay: Duration,
        task: ScheduledTask,
    ) -> Result<ScheduleHandle, SchedulerError> {
        let runtime = Handle::try_current().map_err(|_| SchedulerError::NoRuntime)?;
        let join = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            task();
        });
        let abort = join.abort_handle();
        Ok(ScheduleHandle::new(move || abort.abort()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;

    fn flag_task() -> (Arc<AtomicBool>, ScheduledTask) {
        let flag = Arc::new(AtomicBool::new(false));
        let inner = Arc::clone(&flag);
        (flag, Box::new(move || inner.store(true, Ordering::SeqCst)))
    }

    #[tokio::test(start_paused = true)]
    async fn should_run_task_after_delay() {
        let (flag, task) = flag_task();
        let _handle = TokioScheduler.schedule(Duration::from_secs(5), task).unwrap();

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert!(!flag.load(Ordering::SeqCst));

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(flag.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn should_not_run_task_when_cancelled() {
        let (flag, task) = flag_task();
        let handle = TokioScheduler.schedule(Duration::from_secs(5), task).unwrap();
        handle.cancel();

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(!flag.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn should_run_zero_delay_task_asynchronously() {
        let (flag, task) = flag_task();
        let _handle = TokioScheduler.schedule(Duration::ZERO, task).unwrap();
        assert!(!flag.load(Ordering::SeqCst));

        tokio::time::sleep(Duration::from_millis(1)).await;
        assert!(flag.load(Ordering::SeqCst));
    }

    #[test]
    fn should_fail_when_no_runtime_available() {
        let (_flag, task) = flag_task();
        let result = TokioScheduler.schedule(Duration::from_secs(1), task);
        assert!(matches!(result, Err(SchedulerError::NoRuntime)));
    }
}

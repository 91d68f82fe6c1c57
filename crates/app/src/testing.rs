//! In-memory fakes shared by the unit tests of this crate.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use motionlights_domain::entity::{EntitySnapshot, EntityState, StateChange};
use motionlights_domain::error::{MotionLightsError, SchedulerError};
use motionlights_domain::id::SubscriptionId;

use crate::ports::{
    EntityStates, LightCommand, LightCommander, ScheduleHandle, ScheduledTask, Scheduler,
    StateCallback,
};

struct Job {
    delay: Duration,
    task: Option<ScheduledTask>,
    cancelled: Arc<AtomicBool>,
}

#[derive(Default)]
struct SchedulerState {
    jobs: Vec<Job>,
    failures: usize,
}

/// Scheduler whose tasks only run when the test says so.
#[derive(Clone, Default)]
pub(crate) struct ManualScheduler {
    inner: Arc<Mutex<SchedulerState>>,
}

impl ManualScheduler {
    fn lock(&self) -> std::sync::MutexGuard<'_, SchedulerState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make the next `count` calls to `schedule` fail.
    pub(crate) fn fail_next(&self, count: usize) {
        self.lock().failures = count;
    }

    /// Number of tasks ever accepted.
    pub(crate) fn scheduled_count(&self) -> usize {
        self.lock().jobs.len()
    }

    /// Delays of tasks that are neither cancelled nor run yet.
    pub(crate) fn pending(&self) -> Vec<Duration> {
        self.lock()
            .jobs
            .iter()
            .filter(|job| job.task.is_some() && !job.cancelled.load(Ordering::SeqCst))
            .map(|job| job.delay)
            .collect()
    }

    /// Run every pending task scheduled with `delay`.
    pub(crate) fn run_with_delay(&self, delay: Duration) -> usize {
        self.run_matching(|job| job.delay == delay)
    }

    /// Run every pending task.
    pub(crate) fn run_all(&self) -> usize {
        self.run_matching(|_| true)
    }

    fn run_matching(&self, predicate: impl Fn(&Job) -> bool) -> usize {
        let tasks: Vec<ScheduledTask> = self
            .lock()
            .jobs
            .iter_mut()
            .filter(|job| !job.cancelled.load(Ordering::SeqCst) && predicate(job))
            .filter_map(|job| job.task.take())
            .collect();
        let count = tasks.len();
        for task in tasks {
            task();
        }
        count
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(
        &self,
        delay: Duration,
        task: ScheduledTask,
    ) -> Result<ScheduleHandle, SchedulerError> {
        let mut state = self.lock();
        if state.failures > 0 {
            state.failures -= 1;
            return Err(SchedulerError::Rejected("scheduler unavailable"));
        }
        let cancelled = Arc::new(AtomicBool::new(false));
        state.jobs.push(Job {
            delay,
            task: Some(task),
            cancelled: Arc::clone(&cancelled),
        });
        Ok(ScheduleHandle::new(move || {
            cancelled.store(true, Ordering::SeqCst);
        }))
    }
}

#[derive(Default)]
struct HomeState {
    entities: HashMap<String, EntitySnapshot>,
    subscribers: Vec<(SubscriptionId, Vec<String>, StateCallback)>,
    commands: Vec<LightCommand>,
}

/// Entity host that echoes light commands back as token-stamped changes.
#[derive(Clone, Default)]
pub(crate) struct FakeHome {
    inner: Arc<Mutex<HomeState>>,
}

impl FakeHome {
    fn lock(&self) -> std::sync::MutexGuard<'_, HomeState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn with(self, entity_id: &str, snapshot: EntitySnapshot) -> Self {
        self.lock().entities.insert(entity_id.to_string(), snapshot);
        self
    }

    pub(crate) fn commands(&self) -> Vec<LightCommand> {
        self.lock().commands.clone()
    }

    pub(crate) fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }

    /// Change an entity as a person would: no attribution token.
    pub(crate) fn set(&self, entity_id: &str, snapshot: EntitySnapshot) {
        self.apply(entity_id, snapshot, None);
    }

    pub(crate) fn set_state(&self, entity_id: &str, state: EntityState) {
        self.set(entity_id, EntitySnapshot::new(state));
    }

    fn apply(
        &self,
        entity_id: &str,
        snapshot: EntitySnapshot,
        token: Option<motionlights_domain::id::AttributionToken>,
    ) {
        let (change, callbacks) = {
            let mut state = self.lock();
            let old = state
                .entities
                .insert(entity_id.to_string(), snapshot.clone());
            let callbacks: Vec<StateCallback> = state
                .subscribers
                .iter()
                .filter(|(_, ids, _)| ids.iter().any(|id| id == entity_id))
                .map(|(_, _, callback)| Arc::clone(callback))
                .collect();
            let change = StateChange {
                entity_id: entity_id.to_string(),
                old,
                new: snapshot,
                token,
            };
            (change, callbacks)
        };
        for callback in callbacks {
            callback(&change);
        }
    }
}

impl EntityStates for FakeHome {
    async fn get_state(&self, entity_id: &str) -> Option<EntitySnapshot> {
        self.lock().entities.get(entity_id).cloned()
    }

    async fn subscribe(
        &self,
        entity_ids: &[String],
        callback: StateCallback,
    ) -> Result<SubscriptionId, MotionLightsError> {
        let id = SubscriptionId::new();
        self.lock()
            .subscribers
            .push((id, entity_ids.to_vec(), callback));
        Ok(id)
    }

    async fn unsubscribe(&self, subscription: SubscriptionId) {
        self.lock()
            .subscribers
            .retain(|(id, _, _)| *id != subscription);
    }
}

impl LightCommander for FakeHome {
    async fn command_lights(&self, command: LightCommand) -> Result<(), MotionLightsError> {
        self.lock().commands.push(command.clone());
        for entity_id in &command.entity_ids {
            let snapshot = if command.on {
                let snapshot = EntitySnapshot::new(EntityState::On);
                match command.brightness_pct {
                    Some(pct) => snapshot.with_brightness(pct),
                    None => snapshot,
                }
            } else {
                EntitySnapshot::new(EntityState::Off)
            };
            self.apply(entity_id, snapshot, Some(command.token));
        }
        Ok(())
    }
}

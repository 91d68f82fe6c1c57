//! Trigger manager — entity subscriptions that raise activation signals.
//!
//! A motion trigger folds several sensors into one signal: it fires
//! [`TriggerSignal::Activated`] whenever any sensor reports `on`, and
//! [`TriggerSignal::Deactivated`] only once every sensor is off. An
//! override trigger fires whenever its switch flips. Triggers fire
//! regardless of whether motion may turn lights on; that decision belongs
//! to the coordinator.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use motionlights_domain::entity::StateChange;
use motionlights_domain::error::MotionLightsError;
use motionlights_domain::id::SubscriptionId;

use crate::ports::{EntityStates, StateCallback};

pub const MOTION_TRIGGER: &str = "motion";
pub const OVERRIDE_TRIGGER: &str = "override";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerSignal {
    Activated,
    Deactivated,
}

pub type TriggerCallback = Arc<dyn Fn(TriggerSignal) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TriggerKind {
    Motion,
    Override,
}

type Readings = Arc<Mutex<HashMap<String, bool>>>;

fn lock(readings: &Readings) -> MutexGuard<'_, HashMap<String, bool>> {
    readings.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A subscription over one or more on/off entities.
pub struct EntityTrigger {
    kind: TriggerKind,
    entity_ids: Vec<String>,
    callbacks: Vec<TriggerCallback>,
    readings: Readings,
    subscription: Option<SubscriptionId>,
}

impl EntityTrigger {
    #[must_use]
    pub fn motion(sensors: Vec<String>) -> Self {
        Self::new(TriggerKind::Motion, sensors)
    }

    #[must_use]
    pub fn override_switch(switch: String) -> Self {
        Self::new(TriggerKind::Override, vec![switch])
    }

    fn new(kind: TriggerKind, entity_ids: Vec<String>) -> Self {
        Self {
            kind,
            entity_ids,
            callbacks: Vec::new(),
            readings: Arc::new(Mutex::new(HashMap::new())),
            subscription: None,
        }
    }

    /// Register a callback; it takes effect at the next setup.
    #[must_use]
    pub fn on_signal(mut self, callback: impl Fn(TriggerSignal) + Send + Sync + 'static) -> Self {
        self.callbacks.push(Arc::new(callback));
        self
    }

    /// Whether any watched entity currently reads `on`.
    #[must_use]
    pub fn is_active(&self) -> bool {
        lock(&self.readings).values().any(|on| *on)
    }

    #[must_use]
    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    async fn setup<H: EntityStates>(&mut self, host: &H) -> Result<(), MotionLightsError> {
        let mut seeded = HashMap::with_capacity(self.entity_ids.len());
        for entity_id in &self.entity_ids {
            let on = host
                .get_state(entity_id)
                .await
                .is_some_and(|snapshot| snapshot.is_on());
            seeded.insert(entity_id.clone(), on);
        }
        *lock(&self.readings) = seeded;

        let kind = self.kind;
        let readings = Arc::clone(&self.readings);
        let callbacks = self.callbacks.clone();
        let on_change: StateCallback = Arc::new(move |change: &StateChange| {
            let Some(signal) = fold(kind, &readings, change) else {
                return;
            };
            for callback in &callbacks {
                callback(signal);
            }
        });

        self.subscription = Some(host.subscribe(&self.entity_ids, on_change).await?);
        Ok(())
    }

    async fn cleanup<H: EntityStates>(&mut self, host: &H) {
        if let Some(subscription) = self.subscription.take() {
            host.unsubscribe(subscription).await;
        }
    }
}

/// Record a change and decide which signal, if any, it raises.
fn fold(kind: TriggerKind, readings: &Readings, change: &StateChange) -> Option<TriggerSignal> {
    let on = change.new.is_on();
    let mut readings = lock(readings);
    let was_active = readings.values().any(|reading| *reading);
    readings.insert(change.entity_id.clone(), on);
    let is_active = readings.values().any(|reading| *reading);

    match kind {
        TriggerKind::Motion if on => Some(TriggerSignal::Activated),
        TriggerKind::Motion if was_active && !is_active => Some(TriggerSignal::Deactivated),
        TriggerKind::Override if was_active != is_active => Some(if is_active {
            TriggerSignal::Activated
        } else {
            TriggerSignal::Deactivated
        }),
        TriggerKind::Motion | TriggerKind::Override => None,
    }
}

/// Named triggers with a shared lifecycle.
#[derive(Default)]
pub struct TriggerManager {
    triggers: Vec<(String, EntityTrigger)>,
}

impl TriggerManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a trigger under `name`, replacing any trigger with that name.
    pub fn add_trigger(&mut self, name: impl Into<String>, trigger: EntityTrigger) {
        let name = name.into();
        self.triggers.retain(|(existing, _)| *existing != name);
        self.triggers.push((name, trigger));
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&EntityTrigger> {
        self.triggers
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, trigger)| trigger)
    }

    /// Whether the trigger `name` exists and reads active.
    #[must_use]
    pub fn is_active(&self, name: &str) -> bool {
        self.get(name).is_some_and(EntityTrigger::is_active)
    }

    /// Subscribe every trigger.
    ///
    /// # Errors
    ///
    /// Returns the first subscription failure; triggers already set up stay
    /// subscribed until [`cleanup_all`](Self::cleanup_all).
    pub async fn setup_all<H: EntityStates>(&mut self, host: &H) -> Result<(), MotionLightsError> {
        for (name, trigger) in &mut self.triggers {
            trigger.setup(host).await?;
            tracing::debug!(trigger = %name, entities = ?trigger.entity_ids, "trigger subscribed");
        }
        Ok(())
    }

    /// Unsubscribe and drop every trigger.
    pub async fn cleanup_all<H: EntityStates>(&mut self, host: &H) {
        for (_, trigger) in &mut self.triggers {
            trigger.cleanup(host).await;
        }
        self.triggers.clear();
    }
}

//! # motionlights-adapter-virtual
//!
//! In-memory home used for demonstrations and tests: it stores entity
//! snapshots, notifies subscribers on every change and applies light
//! commands the way a real home platform would, echoing the command's
//! attribution token with the resulting state changes.
//!
//! ## Implemented ports
//!
//! | Port | Behaviour |
//! |------|-----------|
//! | `EntityStates` | Point reads and per-entity subscriptions |
//! | `LightCommander` | Sets every addressed light `on`/`off`, keeping the last brightness when none is given |
//! | `EntityStateWriter` | Changes any entity as a person would, without a token |
//!
//! ## Dependency rule
//!
//! Depends on `motionlights-app` (port traits) and `motionlights-domain` only.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use motionlights_app::ports::{
    EntityStateWriter, EntityStates, LightCommand, LightCommander, StateCallback,
};
use motionlights_domain::entity::{EntitySnapshot, EntityState, StateChange};
use motionlights_domain::error::{MotionLightsError, ValidationError};
use motionlights_domain::id::{AttributionToken, SubscriptionId};

struct Subscriber {
    id: SubscriptionId,
    entity_ids: Vec<String>,
    callback: StateCallback,
}

#[derive(Default)]
struct Inner {
    entities: BTreeMap<String, EntitySnapshot>,
    subscribers: Vec<Subscriber>,
}

/// Simulated home. Clones share the same entities and subscribers.
#[derive(Clone, Default)]
pub struct VirtualHome {
    inner: Arc<Mutex<Inner>>,
}

impl VirtualHome {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an entity without notifying anyone.
    #[must_use]
    pub fn with_entity(self, entity_id: impl Into<String>, snapshot: EntitySnapshot) -> Self {
        self.insert(entity_id, snapshot);
        self
    }

    /// Seed an entity without notifying anyone.
    pub fn insert(&self, entity_id: impl Into<String>, snapshot: EntitySnapshot) {
        self.lock().entities.insert(entity_id.into(), snapshot);
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store `snapshot` and notify the matching subscribers outside the lock.
    fn apply(
        &self,
        entity_id: &str,
        snapshot: EntitySnapshot,
        token: Option<AttributionToken>,
    ) -> StateChange {
        let (change, callbacks) = {
            let mut inner = self.lock();
            let old = inner
                .entities
                .insert(entity_id.to_string(), snapshot.clone());
            let callbacks: Vec<StateCallback> = inner
                .subscribers
                .iter()
                .filter(|subscriber| subscriber.entity_ids.iter().any(|id| id == entity_id))
                .map(|subscriber| Arc::clone(&subscriber.callback))
                .collect();
            let change = StateChange {
                entity_id: entity_id.to_string(),
                old,
                new: snapshot,
                token,
            };
            (change, callbacks)
        };

        tracing::debug!(
            entity_id,
            state = %change.new.state,
            subscribers = callbacks.len(),
            "entity changed"
        );
        for callback in callbacks {
            callback(&change);
        }
        change
    }

    fn commanded_snapshot(&self, entity_id: &str, command: &LightCommand) -> EntitySnapshot {
        if !command.on {
            return EntitySnapshot::new(EntityState::Off);
        }
        let previous = self
            .lock()
            .entities
            .get(entity_id)
            .and_then(|snapshot| snapshot.brightness);
        let snapshot = EntitySnapshot::new(EntityState::On);
        match command.brightness_pct.or(previous) {
            Some(brightness) => snapshot.with_brightness(brightness),
            None => snapshot,
        }
    }
}

impl EntityStates for VirtualHome {
    async fn get_state(&self, entity_id: &str) -> Option<EntitySnapshot> {
        self.lock().entities.get(entity_id).cloned()
    }

    async fn subscribe(
        &self,
        entity_ids: &[String],
        callback: StateCallback,
    ) -> Result<SubscriptionId, MotionLightsError> {
        let id = SubscriptionId::new();
        self.lock().subscribers.push(Subscriber {
            id,
            entity_ids: entity_ids.to_vec(),
            callback,
        });
        tracing::debug!(subscription = %id, entities = ?entity_ids, "subscribed");
        Ok(id)
    }

    async fn unsubscribe(&self, subscription: SubscriptionId) {
        self.lock()
            .subscribers
            .retain(|subscriber| subscriber.id != subscription);
    }
}

impl LightCommander for VirtualHome {
    async fn command_lights(&self, command: LightCommand) -> Result<(), MotionLightsError> {
        for entity_id in &command.entity_ids {
            let snapshot = self.commanded_snapshot(entity_id, &command);
            self.apply(entity_id, snapshot, Some(command.token));
        }
        Ok(())
    }
}

impl EntityStateWriter for VirtualHome {
    async fn set_state(
        &self,
        entity_id: &str,
        snapshot: EntitySnapshot,
    ) -> Result<StateChange, MotionLightsError> {
        if entity_id.trim().is_empty() {
            return Err(ValidationError::EmptyEntityId { field: "entity_id" }.into());
        }
        Ok(self.apply(entity_id, snapshot, None))
    }

    async fn list_states(&self) -> Vec<(String, EntitySnapshot)> {
        self.lock()
            .entities
            .iter()
            .map(|(id, snapshot)| (id.clone(), snapshot.clone()))
            .collect()
    }
}

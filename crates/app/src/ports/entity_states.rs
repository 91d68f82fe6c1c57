//! Entity-state port — point reads and change subscriptions.

use std::future::Future;
use std::sync::Arc;

use motionlights_domain::entity::{EntitySnapshot, StateChange};
use motionlights_domain::error::MotionLightsError;
use motionlights_domain::id::SubscriptionId;

/// Callback invoked for every change of a subscribed entity.
///
/// Implementations must not block: the coordinator's callbacks only push a
/// message onto the instance queue.
pub type StateCallback = Arc<dyn Fn(&StateChange) + Send + Sync>;

/// Read access to the host platform's entities.
pub trait EntityStates {
    /// Current snapshot of an entity, `None` if the host does not know it.
    fn get_state(&self, entity_id: &str) -> impl Future<Output = Option<EntitySnapshot>> + Send;

    /// Register `callback` for changes of any entity in `entity_ids`.
    fn subscribe(
        &self,
        entity_ids: &[String],
        callback: StateCallback,
    ) -> impl Future<Output = Result<SubscriptionId, MotionLightsError>> + Send;

    /// Drop a subscription. Unknown ids are ignored.
    fn unsubscribe(&self, subscription: SubscriptionId) -> impl Future<Output = ()> + Send;
}

impl<T: EntityStates + Send + Sync> EntityStates for Arc<T> {
    fn get_state(&self, entity_id: &str) -> impl Future<Output = Option<EntitySnapshot>> + Send {
        (**self).get_state(entity_id)
    }

    fn subscribe(
        &self,
        entity_ids: &[String],
        callback: StateCallback,
    ) -> impl Future<Output = Result<SubscriptionId, MotionLightsError>> + Send {
        (**self).subscribe(entity_ids, callback)
    }

    fn unsubscribe(&self, subscription: SubscriptionId) -> impl Future<Output = ()> + Send {
        (**self).unsubscribe(subscription)
    }
}

/// Write access used to simulate changes made outside any light group.
pub trait EntityStateWriter {
    /// Set an entity's state, notifying subscribers without an attribution token.
    fn set_state(
        &self,
        entity_id: &str,
        snapshot: EntitySnapshot,
    ) -> impl Future<Output = Result<StateChange, MotionLightsError>> + Send;

    /// Every known entity with its current snapshot, sorted by id.
    fn list_states(&self) -> impl Future<Output = Vec<(String, EntitySnapshot)>> + Send;
}

impl<T: EntityStateWriter + Send + Sync> EntityStateWriter for Arc<T> {
    fn set_state(
        &self,
        entity_id: &str,
        snapshot: EntitySnapshot,
    ) -> impl Future<Output = Result<StateChange, MotionLightsError>> + Send {
        (**self).set_state(entity_id, snapshot)
    }

    fn list_states(&self) -> impl Future<Output = Vec<(String, EntitySnapshot)>> + Send {
        (**self).list_states()
    }
}

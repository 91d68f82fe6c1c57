//! Shared application state for axum handlers.

use std::sync::Arc;

use motionlights_app::ports::{EntityStateWriter, EntityStates};
use motionlights_app::registry::LightGroups;

/// Application state shared across all axum handlers.
///
/// Generic over the entity host to avoid dynamic dispatch. `Clone` is
/// implemented manually so the host itself does not need to be `Clone`;
/// only the `Arc` wrappers are cloned.
pub struct AppState<W> {
    /// Running light groups.
    pub groups: Arc<LightGroups>,
    /// Entity host, read and written by the entity endpoints.
    pub entities: Arc<W>,
}

impl<W> Clone for AppState<W> {
    fn clone(&self) -> Self {
        Self {
            groups: Arc::clone(&self.groups),
            entities: Arc::clone(&self.entities),
        }
    }
}

impl<W> AppState<W>
where
    W: EntityStates + EntityStateWriter + Send + Sync + 'static,
{
    pub fn new(groups: LightGroups, entities: W) -> Self {
        Self {
            groups: Arc::new(groups),
            entities: Arc::new(entities),
        }
    }

    /// Create a new application state from pre-wrapped `Arc`s.
    ///
    /// Use this when the registry is also needed elsewhere, e.g. to shut the
    /// groups down after the server stops.
    pub fn from_arcs(groups: Arc<LightGroups>, entities: Arc<W>) -> Self {
        Self { groups, entities }
    }
}

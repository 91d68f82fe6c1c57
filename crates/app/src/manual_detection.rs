//! Manual-intervention detector: token lookup plus domain classification.

use motionlights_domain::entity::StateChange;
use motionlights_domain::manual::{Classification, classify};

use crate::attribution::AttributionRegistry;

#[derive(Debug, Clone)]
pub struct ManualDetector {
    registry: AttributionRegistry,
}

impl ManualDetector {
    #[must_use]
    pub fn new(registry: AttributionRegistry) -> Self {
        Self { registry }
    }

    /// Classify a light change reported by the host.
    #[must_use]
    pub fn check(&self, change: &StateChange) -> Classification {
        let own_command = change
            .token
            .as_ref()
            .is_some_and(|token| self.registry.is_recent(token));
        classify(change.old.as_ref(), &change.new, own_command)
    }
}

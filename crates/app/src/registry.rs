//! Registry of running light groups, keyed by name.

use std::collections::BTreeMap;

use motionlights_domain::error::{MotionLightsError, NotFoundError};

use crate::runtime::CoordinatorHandle;

#[derive(Debug, Clone, Default)]
pub struct LightGroups {
    groups: BTreeMap<String, CoordinatorHandle>,
}

impl LightGroups {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a running group, returning any handle it replaces.
    pub fn insert(&mut self, handle: CoordinatorHandle) -> Option<CoordinatorHandle> {
        self.groups.insert(handle.name().to_string(), handle)
    }

    /// # Errors
    ///
    /// Returns [`MotionLightsError::NotFound`] when no group is named `name`.
    pub fn get(&self, name: &str) -> Result<&CoordinatorHandle, MotionLightsError> {
        self.groups.get(name).ok_or_else(|| {
            NotFoundError {
                entity: "LightGroup",
                id: name.to_string(),
            }
            .into()
        })
    }

    /// Groups in name order.
    pub fn iter(&self) -> impl Iterator<Item = &CoordinatorHandle> {
        self.groups.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub async fn shutdown_all(&self) {
        for handle in self.groups.values() {
            handle.shutdown().await;
        }
        tracing::info!(count = self.groups.len(), "all light groups stopped");
    }
}

#[cfg(test)]
mod tests {
    use motionlights_domain::config::LightGroupConfig;

    use super::*;
    use crate::runtime::spawn;
    use crate::scheduler::TokioScheduler;
    use crate::testing::FakeHome;

    async fn group(name: &str, home: &FakeHome) -> CoordinatorHandle {
        let config = LightGroupConfig::builder()
            .light(format!("light.{name}"))
            .build()
            .unwrap();
        spawn(name, config, home.clone(), TokioScheduler)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn should_list_groups_in_name_order() {
        let home = FakeHome::default();
        let mut groups = LightGroups::new();
        groups.insert(group("stairs", &home).await);
        groups.insert(group("hall", &home).await);

        let names: Vec<_> = groups.iter().map(CoordinatorHandle::name).collect();

        assert_eq!(names, vec!["hall", "stairs"]);
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn should_return_not_found_for_unknown_group() {
        let groups = LightGroups::new();

        let err = groups.get("attic").unwrap_err();

        match err {
            MotionLightsError::NotFound(inner) => {
                assert_eq!(inner.to_string(), "LightGroup not found: attic");
            }
            other => panic!("expected not found, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn should_stop_every_group() {
        let home = FakeHome::default();
        let mut groups = LightGroups::new();
        groups.insert(group("hall", &home).await);
        groups.insert(group("stairs", &home).await);
        assert_eq!(home.subscriber_count(), 2);

        groups.shutdown_all().await;

        assert_eq!(home.subscriber_count(), 0);
        assert!(groups.get("hall").unwrap().status().await.is_err());
    }
}

//! Registry of recently issued attribution tokens.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use motionlights_domain::id::AttributionToken;
use tokio::time::Instant;

/// How long an issued token still identifies one of our own commands.
pub const TOKEN_RETENTION: Duration = Duration::from_secs(3600);

/// How often stale tokens are dropped.
pub const TOKEN_PRUNE_INTERVAL: Duration = Duration::from_secs(3600);

/// Tokens stamped on light commands, shared by the light controller
/// (which issues them) and the manual detector (which checks them).
#[derive(Debug, Clone)]
pub struct AttributionRegistry {
    issued: Arc<Mutex<HashMap<AttributionToken, Instant>>>,
    retention: Duration,
}

impl Default for AttributionRegistry {
    fn default() -> Self {
        Self::new(TOKEN_RETENTION)
    }
}

impl AttributionRegistry {
    #[must_use]
    pub fn new(retention: Duration) -> Self {
        Self {
            issued: Arc::new(Mutex::new(HashMap::new())),
            retention,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<AttributionToken, Instant>> {
        self.issued.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create and remember a fresh token.
    #[must_use]
    pub fn issue(&self) -> AttributionToken {
        let token = AttributionToken::new();
        self.lock().insert(token, Instant::now());
        token
    }

    /// Whether `token` was issued here within the retention window.
    #[must_use]
    pub fn is_recent(&self, token: &AttributionToken) -> bool {
        self.lock()
            .get(token)
            .is_some_and(|issued_at| issued_at.elapsed() <= self.retention)
    }

    /// Drop tokens older than the retention window; returns how many went.
    pub fn prune(&self) -> usize {
        let retention = self.retention;
        let mut issued = self.lock();
        let before = issued.len();
        issued.retain(|_, issued_at| issued_at.elapsed() <= retention);
        before - issued.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_recognise_issued_token() {
        let registry = AttributionRegistry::default();
        let token = registry.issue();
        assert!(registry.is_recent(&token));
    }

    #[test]
    fn should_not_recognise_foreign_token() {
        let registry = AttributionRegistry::default();
        let _ = registry.issue();
        assert!(!registry.is_recent(&AttributionToken::new()));
    }

    #[test]
    fn should_share_tokens_between_clones() {
        let registry = AttributionRegistry::default();
        let detector_view = registry.clone();
        let token = registry.issue();
        assert!(detector_view.is_recent(&token));
    }

    #[tokio::test(start_paused = true)]
    async fn should_forget_token_after_retention() {
        let registry = AttributionRegistry::default();
        let token = registry.issue();

        tokio::time::advance(TOKEN_RETENTION + Duration::from_secs(1)).await;

        assert!(!registry.is_recent(&token));
        assert_eq!(registry.prune(), 1);
        assert!(registry.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn should_keep_fresh_tokens_when_pruning() {
        let registry = AttributionRegistry::default();
        let _old = registry.issue();
        tokio::time::advance(Duration::from_secs(3000)).await;
        let fresh = registry.issue();
        tokio::time::advance(Duration::from_secs(700)).await;

        assert_eq!(registry.prune(), 1);
        assert!(registry.is_recent(&fresh));
        assert_eq!(registry.len(), 1);
    }
}

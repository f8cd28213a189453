//! Active-strategy coordination.

use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{AuthStrategy, TokenResolution};

/// Owns exactly one active authentication strategy at a time and allows
/// atomic replacement.
///
/// The slot is shared mutable state: every read and swap goes through a
/// single critical section, so no caller observes a strategy
/// mid-replacement. Strategy handles are cloned out of the lock and awaited
/// outside it.
///
/// There is deliberately no process-wide instance; the coordinator is owned
/// by the host's [`Sdk`](crate::Sdk) context and passed to call-handling
/// code.
#[derive(Debug, Default)]
pub struct StrategyCoordinator {
    active: Mutex<AuthStrategy>,
}

impl StrategyCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, AuthStrategy> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Atomically replace the active strategy.
    ///
    /// The displaced strategy's pending resolutions settle with `None`; they
    /// are never silently dropped.
    pub fn set_active_strategy(&self, strategy: AuthStrategy) {
        tracing::debug!(strategy = strategy.name(), "activating strategy");
        let previous = std::mem::replace(&mut *self.lock(), strategy);
        previous.invalidate_pending();
    }

    /// Handle to the currently active strategy.
    pub fn active_strategy(&self) -> AuthStrategy {
        self.lock().clone()
    }

    /// Delegates to the active strategy.
    pub fn authorized(&self) -> bool {
        self.lock().is_authorized()
    }

    /// Begin a token resolution against the active strategy.
    pub fn resolve_access_token(&self) -> TokenResolution {
        let strategy = self.lock().clone();
        strategy.resolve_access_token()
    }

    /// Deauthorize the active strategy and reset the slot.
    ///
    /// Idempotent; deauthorizing an unauthenticated coordinator is a no-op.
    /// Clearing the persisted configuration is the owning context's job.
    pub fn deauthorize(&self) {
        let previous = std::mem::replace(&mut *self.lock(), AuthStrategy::Unauthenticated);
        previous.deauthorize();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::Result;
    use crate::auth::{
        DirectTokenStrategy, OAuthCredential, OAuthParameters, OAuthStrategy, TokenExchange,
    };

    use super::*;

    struct InertExchange;

    #[async_trait::async_trait]
    impl TokenExchange for InertExchange {
        async fn authorize(&self, _: &OAuthParameters) -> Result<OAuthCredential> {
            Err(crate::Error::auth("no interactive flow in tests"))
        }

        async fn refresh(
            &self,
            _: &OAuthParameters,
            _: &OAuthCredential,
        ) -> Result<OAuthCredential> {
            Err(crate::Error::auth("no refresh in tests"))
        }
    }

    fn pending_oauth() -> OAuthStrategy {
        OAuthStrategy::new(
            OAuthParameters::new(
                "client-id",
                "client-secret",
                "huddle:all",
                url::Url::parse("https://example.invalid/redirect").unwrap(),
            ),
            Arc::new(InertExchange),
        )
    }

    #[tokio::test]
    async fn test_starts_unauthenticated() {
        let coordinator = StrategyCoordinator::new();
        assert!(!coordinator.authorized());
        assert_eq!(coordinator.resolve_access_token().await, None);
    }

    #[tokio::test]
    async fn test_direct_token_lifecycle() {
        let coordinator = StrategyCoordinator::new();
        coordinator.set_active_strategy(AuthStrategy::DirectToken(DirectTokenStrategy::new(
            "abc123",
        )));

        assert!(coordinator.authorized());
        assert_eq!(
            coordinator.resolve_access_token().await,
            Some("abc123".to_string())
        );

        coordinator.deauthorize();
        assert!(!coordinator.authorized());
        assert_eq!(coordinator.resolve_access_token().await, None);
        assert_eq!(coordinator.active_strategy().name(), "unauthenticated");
    }

    #[tokio::test]
    async fn test_swap_settles_pending_resolution() {
        let coordinator = StrategyCoordinator::new();
        coordinator.set_active_strategy(AuthStrategy::OAuth(pending_oauth()));

        let in_flight = coordinator.resolve_access_token();
        coordinator.set_active_strategy(AuthStrategy::DirectToken(DirectTokenStrategy::new(
            "fresh",
        )));

        // The superseded resolution settles with None, exactly once; the new
        // strategy answers subsequent resolutions.
        assert_eq!(in_flight.await, None);
        assert_eq!(
            coordinator.resolve_access_token().await,
            Some("fresh".to_string())
        );
    }

    #[tokio::test]
    async fn test_deauthorize_settles_pending_resolution() {
        let coordinator = StrategyCoordinator::new();
        coordinator.set_active_strategy(AuthStrategy::OAuth(pending_oauth()));

        let in_flight = coordinator.resolve_access_token();
        coordinator.deauthorize();

        assert_eq!(in_flight.await, None);
        assert!(!coordinator.authorized());
    }

    #[tokio::test]
    async fn test_double_deauthorize_is_noop() {
        let coordinator = StrategyCoordinator::new();
        coordinator.deauthorize();
        coordinator.deauthorize();
        assert!(!coordinator.authorized());
    }
}

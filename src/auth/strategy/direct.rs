//! Direct-token authentication strategy.

use std::sync::{Arc, Mutex, PoisonError};

use super::TokenResolution;

/// Strategy configured with a single opaque access token.
///
/// Authorized from construction until deauthorized; resolutions settle
/// immediately with the stored token.
#[derive(Clone, Debug)]
pub struct DirectTokenStrategy {
    token: Arc<Mutex<Option<String>>>,
}

impl DirectTokenStrategy {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Arc::new(Mutex::new(Some(token.into()))),
        }
    }

    fn token(&self) -> Option<String> {
        self.token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_authorized(&self) -> bool {
        self.token().is_some()
    }

    pub fn resolve_access_token(&self) -> TokenResolution {
        TokenResolution::ready(self.token())
    }

    /// Discard the token. Idempotent.
    pub fn deauthorize(&self) {
        self.token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolves_stored_token() {
        let strategy = DirectTokenStrategy::new("abc123");
        assert!(strategy.is_authorized());
        assert_eq!(
            strategy.resolve_access_token().await,
            Some("abc123".to_string())
        );
        // Resolutions keep yielding the token until deauthorized.
        assert_eq!(
            strategy.resolve_access_token().await,
            Some("abc123".to_string())
        );
    }

    #[tokio::test]
    async fn test_deauthorize_is_idempotent() {
        let strategy = DirectTokenStrategy::new("abc123");
        strategy.deauthorize();
        strategy.deauthorize();
        assert!(!strategy.is_authorized());
        assert_eq!(strategy.resolve_access_token().await, None);
    }
}

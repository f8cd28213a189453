//! Authentication strategies.
//!
//! The capability set is a closed tagged variant rather than a trait object,
//! so every transition handles all three states exhaustively.

mod direct;
mod oauth;
mod resolution;

pub use direct::DirectTokenStrategy;
pub use oauth::{OAuthStrategy, TokenExchange};
pub use resolution::TokenResolution;

/// A pluggable implementation of the authentication capability set.
#[derive(Clone, Debug, Default)]
pub enum AuthStrategy {
    /// No credential configured; every resolution settles with `None`.
    #[default]
    Unauthenticated,
    /// A single opaque access token supplied by the host.
    DirectToken(DirectTokenStrategy),
    /// OAuth client identity; tokens come from the external exchange.
    OAuth(OAuthStrategy),
}

impl AuthStrategy {
    /// Whether the strategy holds a non-expired credential able to produce a
    /// token without further user interaction.
    pub fn is_authorized(&self) -> bool {
        match self {
            AuthStrategy::Unauthenticated => false,
            AuthStrategy::DirectToken(strategy) => strategy.is_authorized(),
            AuthStrategy::OAuth(strategy) => strategy.is_authorized(),
        }
    }

    /// Begin a token resolution. Never blocks; the returned future settles
    /// exactly once.
    pub fn resolve_access_token(&self) -> TokenResolution {
        match self {
            AuthStrategy::Unauthenticated => TokenResolution::ready(None),
            AuthStrategy::DirectToken(strategy) => strategy.resolve_access_token(),
            AuthStrategy::OAuth(strategy) => strategy.resolve_access_token(),
        }
    }

    /// Discard credential material and settle pending resolutions with
    /// `None`. Idempotent.
    pub fn deauthorize(&self) {
        match self {
            AuthStrategy::Unauthenticated => {}
            AuthStrategy::DirectToken(strategy) => strategy.deauthorize(),
            AuthStrategy::OAuth(strategy) => strategy.deauthorize(),
        }
    }

    /// Settle pending resolutions with `None` after this strategy has been
    /// replaced in the coordinator.
    pub(crate) fn invalidate_pending(&self) {
        match self {
            // Unauthenticated and direct-token resolutions settle
            // immediately; there is never anything pending.
            AuthStrategy::Unauthenticated | AuthStrategy::DirectToken(_) => {}
            AuthStrategy::OAuth(strategy) => strategy.invalidate_pending(),
        }
    }

    /// Strategy name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            AuthStrategy::Unauthenticated => "unauthenticated",
            AuthStrategy::DirectToken(_) => "direct_token",
            AuthStrategy::OAuth(_) => "oauth",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unauthenticated_resolves_none() {
        let strategy = AuthStrategy::default();
        assert!(!strategy.is_authorized());
        assert_eq!(strategy.resolve_access_token().await, None);
    }

    #[tokio::test]
    async fn test_unauthenticated_deauthorize_is_noop() {
        let strategy = AuthStrategy::Unauthenticated;
        strategy.deauthorize();
        assert!(!strategy.is_authorized());
        assert_eq!(strategy.name(), "unauthenticated");
    }

    #[tokio::test]
    async fn test_direct_token_dispatch() {
        let strategy = AuthStrategy::DirectToken(DirectTokenStrategy::new("abc123"));
        assert!(strategy.is_authorized());
        assert_eq!(strategy.name(), "direct_token");
        assert_eq!(
            strategy.resolve_access_token().await,
            Some("abc123".to_string())
        );

        strategy.deauthorize();
        assert!(!strategy.is_authorized());
        assert_eq!(strategy.resolve_access_token().await, None);
    }
}

//! Authentication strategy delegation.
//!
//! The subsystem that decides which credential authenticates the SDK's
//! outbound calls:
//! - **Unauthenticated**: no identity; resolutions settle empty
//! - **DirectToken**: a single opaque token supplied by the host
//! - **OAuth**: client identity whose tokens come from an external exchange
//!
//! A [`StrategyCoordinator`] holds exactly one active strategy at a time;
//! [`CredentialStore`] persists the last-configured strategy so a later
//! process can reconstruct it without re-running the interactive flow.

mod coordinator;
mod credential;
mod store;
mod strategy;

pub use coordinator::StrategyCoordinator;
pub use credential::{Credential, OAuthCredential, OAuthParameters};
pub use store::{CredentialStore, StoredCredential};
pub use strategy::{
    AuthStrategy, DirectTokenStrategy, OAuthStrategy, TokenExchange, TokenResolution,
};

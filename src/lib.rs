//! # huddle-sdk
//!
//! Rust SDK entry point for the Huddle collaboration cloud.
//!
//! The crate owns two coupled subsystems: credential strategy delegation
//! (which strategy authenticates the SDK's outbound calls) and metrics
//! dispatch (structured telemetry built from call feedback and usage
//! counters). Everything else on the platform - resource clients, the media
//! pipeline, log capture - is consumed through narrow trait interfaces.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use huddle_sdk::Sdk;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), huddle_sdk::Error> {
//!     let sdk = Sdk::builder().build().await?;
//!     sdk.configure_with_token("abc123").await?;
//!     assert!(sdk.authorized());
//!
//!     if let Some(token) = sdk.access_token().await {
//!         println!("authenticated as {}", token);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Call rating telemetry
//!
//! ```rust,no_run
//! use huddle_sdk::{Feedback, Sdk};
//!
//! # fn rate(sdk: &Sdk, call: &huddle_sdk::CallRecord) -> Result<(), huddle_sdk::Error> {
//! let feedback = Feedback::new(4).comments("clear audio").include_logs(true);
//! sdk.submit_call_rating(feedback, call)?;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod auth;
pub mod config;
pub mod device;
pub mod logs;
pub mod media;
pub mod metrics;
pub mod sdk;

// Re-exports for convenience
pub use auth::{
    AuthStrategy, Credential, CredentialStore, DirectTokenStrategy, OAuthCredential,
    OAuthParameters, OAuthStrategy, StoredCredential, StrategyCoordinator, TokenExchange,
    TokenResolution,
};
pub use config::{SdkConfig, SdkConfigBuilder};
pub use device::{DeviceService, StaticDevice};
pub use logs::{LogCollector, MemoryLogCollector, NoopLogCollector};
pub use media::{MediaEngine, StaticMediaEngine};
pub use metrics::{
    CallMetricContext, CallMetrics, CallRecord, Feedback, HttpMetricsSink, Metric, MetricEnvelope,
    MetricsCategory, MetricsEngine, MetricsEnvironment, MetricsSink,
};
pub use sdk::{Sdk, SdkBuilder};

/// Error type for huddle-sdk operations.
///
/// All errors include actionable context to help diagnose and resolve issues.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// API returned an error response.
    #[error("API error (HTTP {status}): {message}", status = status.map(|s| s.to_string()).unwrap_or_else(|| "unknown".into()))]
    Api {
        message: String,
        status: Option<u16>,
    },

    /// Authentication failed.
    #[error("Authentication failed: {message}")]
    Auth { message: String },

    /// Network connectivity or request failed.
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON serialization or deserialization failed.
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// File system operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A call record reached metric construction without a required field.
    ///
    /// Call records are expected to be fully populated by the time a call is
    /// rated; hitting this is a precondition violation in the calling layer.
    #[error("Call record incomplete: missing {0}")]
    IncompleteCallRecord(&'static str),
}

/// Error category for unified error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Authentication or authorization failures (401, 403)
    Authorization,
    /// Configuration, parsing, or caller precondition errors
    Configuration,
    /// Network or transient errors that may succeed on retry
    Transient,
    /// Internal errors (IO, JSON, unexpected states)
    Internal,
}

impl Error {
    pub fn auth(message: impl Into<String>) -> Self {
        Error::Auth {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Auth { .. } => ErrorCategory::Authorization,
            Error::Api {
                status: Some(401 | 403),
                ..
            } => ErrorCategory::Authorization,

            Error::Config(_) | Error::IncompleteCallRecord(_) => ErrorCategory::Configuration,

            Error::Network(_) => ErrorCategory::Transient,
            Error::Api {
                status: Some(500..=599),
                ..
            } => ErrorCategory::Transient,

            Error::Io(_) | Error::Json(_) | Error::Api { .. } => ErrorCategory::Internal,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.category() == ErrorCategory::Transient
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            Error::Api {
                status: Some(401),
                ..
            } | Error::Auth { .. }
        )
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => *status,
            _ => None,
        }
    }
}

/// Result type alias for huddle-sdk operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        assert_eq!(
            Error::auth("bad token").category(),
            ErrorCategory::Authorization
        );
        assert_eq!(
            Error::Api {
                message: "forbidden".into(),
                status: Some(403),
            }
            .category(),
            ErrorCategory::Authorization
        );
        assert_eq!(
            Error::Config("missing endpoint".into()).category(),
            ErrorCategory::Configuration
        );
        assert_eq!(
            Error::IncompleteCallRecord("locusId").category(),
            ErrorCategory::Configuration
        );
        assert_eq!(
            Error::Api {
                message: "server error".into(),
                status: Some(503),
            }
            .category(),
            ErrorCategory::Transient
        );
    }

    #[test]
    fn test_retryable() {
        let err = Error::Api {
            message: "overloaded".into(),
            status: Some(529),
        };
        assert!(err.is_retryable());
        assert!(!Error::auth("nope").is_retryable());
    }

    #[test]
    fn test_unauthorized() {
        let err = Error::Api {
            message: "expired".into(),
            status: Some(401),
        };
        assert!(err.is_unauthorized());
        assert_eq!(err.status_code(), Some(401));
    }
}

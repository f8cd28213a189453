//! SDK configuration.

use std::path::PathBuf;

use url::Url;

use crate::metrics::MetricsEnvironment;

/// Default metrics service endpoint.
pub const DEFAULT_METRICS_ENDPOINT: &str = "https://metrics.huddleapis.com/v1/metrics";

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// SDK configuration.
/// All fields have sensible defaults that can be overridden via environment
/// variables or the builder.
#[derive(Clone, Debug)]
pub struct SdkConfig {
    /// Metrics service endpoint.
    pub metrics_endpoint: Url,
    /// Environment tag applied to call metrics.
    pub environment: MetricsEnvironment,
    /// Override for the persisted credential location.
    pub credentials_path: Option<PathBuf>,
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            metrics_endpoint: Url::parse(DEFAULT_METRICS_ENDPOINT)
                .expect("default metrics endpoint is a valid URL"),
            environment: MetricsEnvironment::Production,
            credentials_path: None,
        }
    }
}

impl SdkConfig {
    /// Create configuration with defaults, then apply environment variable
    /// overrides.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(endpoint) = env_opt("HUDDLE_METRICS_ENDPOINT") {
            match Url::parse(&endpoint) {
                Ok(url) => config.metrics_endpoint = url,
                Err(err) => {
                    tracing::warn!("ignoring invalid HUDDLE_METRICS_ENDPOINT: {err}");
                }
            }
        }
        if let Some(environment) = env_opt("HUDDLE_ENV")
            && environment.eq_ignore_ascii_case("test")
        {
            config.environment = MetricsEnvironment::Test;
        }
        if let Some(path) = env_opt("HUDDLE_CREDENTIALS_PATH") {
            config.credentials_path = Some(PathBuf::from(path));
        }

        config
    }

    /// Create a builder for custom configuration.
    pub fn builder() -> SdkConfigBuilder {
        SdkConfigBuilder::default()
    }
}

/// Builder for SdkConfig.
pub struct SdkConfigBuilder {
    config: SdkConfig,
}

impl Default for SdkConfigBuilder {
    fn default() -> Self {
        Self {
            config: SdkConfig::from_env(),
        }
    }
}

impl SdkConfigBuilder {
    /// Set the metrics service endpoint.
    pub fn metrics_endpoint(mut self, endpoint: Url) -> Self {
        self.config.metrics_endpoint = endpoint;
        self
    }

    /// Set the metric environment tag.
    pub fn environment(mut self, environment: MetricsEnvironment) -> Self {
        self.config.environment = environment;
        self
    }

    /// Set the persisted credential location.
    pub fn credentials_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.credentials_path = Some(path.into());
        self
    }

    /// Build the configuration.
    pub fn build(self) -> SdkConfig {
        self.config
    }
}

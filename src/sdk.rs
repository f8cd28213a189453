//! SDK entry point.

use std::sync::Arc;

use crate::auth::{
    AuthStrategy, Credential, CredentialStore, DirectTokenStrategy, OAuthParameters, OAuthStrategy,
    StrategyCoordinator, TokenExchange,
};
use crate::config::SdkConfig;
use crate::device::{DeviceService, StaticDevice};
use crate::logs::{LogCollector, NoopLogCollector};
use crate::media::{MediaEngine, StaticMediaEngine};
use crate::metrics::{
    CallMetricContext, CallMetrics, CallRecord, Feedback, HttpMetricsSink, MetricsEngine,
    MetricsSink,
};
use crate::Result;

/// The version number of this SDK.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

const UNREGISTERED_DEVICE_URL: &str = "https://devices.huddleapis.com/devices/unregistered";

/// The main entry point into the SDK.
///
/// Owns the strategy coordinator, the persisted credential slot, and the
/// metrics pipeline. One instance per host application; call-handling code
/// receives a reference instead of reaching for process-wide state.
pub struct Sdk {
    coordinator: Arc<StrategyCoordinator>,
    store: Arc<CredentialStore>,
    engine: Arc<MetricsEngine>,
    call_metrics: CallMetrics,
    device: Arc<dyn DeviceService>,
    media: Arc<dyn MediaEngine>,
}

impl Sdk {
    pub fn builder() -> SdkBuilder {
        SdkBuilder::new()
    }

    /// Configure the SDK with an access token directly.
    ///
    /// Replaces the active strategy and persists the configuration.
    pub async fn configure_with_token(&self, token: impl Into<String>) -> Result<()> {
        let token = token.into();
        self.coordinator
            .set_active_strategy(AuthStrategy::DirectToken(DirectTokenStrategy::new(
                token.clone(),
            )));
        self.store.save(&Credential::direct_token(token)).await
    }

    /// Configure the SDK with OAuth client identity.
    ///
    /// Replaces the active strategy, persists the configuration, and drives
    /// the interactive authorization step through the supplied exchange.
    /// Once the exchange completes, the resolved credential is persisted so
    /// a later process can restore the session without user interaction.
    pub async fn configure_oauth(
        &self,
        parameters: OAuthParameters,
        exchange: Arc<dyn TokenExchange>,
    ) -> Result<()> {
        let strategy = OAuthStrategy::new(parameters.clone(), exchange);
        self.coordinator
            .set_active_strategy(AuthStrategy::OAuth(strategy.clone()));
        self.store.save(&Credential::oauth(parameters.clone())).await?;

        strategy.begin_authorization();

        let store = self.store.clone();
        tokio::spawn(async move {
            if strategy.resolve_access_token().await.is_some()
                && let Some(resolved) = strategy.credential()
            {
                let credential = Credential::OAuth {
                    parameters,
                    credential: Some(resolved),
                };
                if let Err(err) = store.save(&credential).await {
                    tracing::warn!("failed to persist resolved OAuth credential: {err}");
                }
            }
        });
        Ok(())
    }

    /// Indicates whether the SDK has been authorized.
    pub fn authorized(&self) -> bool {
        self.coordinator.authorized()
    }

    /// Deauthorize the SDK and clear the persisted configuration.
    ///
    /// Pending token resolutions settle with `None`.
    pub async fn deauthorize(&self) -> Result<()> {
        self.coordinator.deauthorize();
        self.store.clear().await
    }

    /// Resolve the current access token.
    ///
    /// `None` means no identity is available - not an error.
    pub async fn access_token(&self) -> Option<String> {
        self.coordinator.resolve_access_token().await
    }

    /// Submit post-call quality feedback as a `call.rating` metric.
    ///
    /// Never blocks on transport. The call record must be fully populated;
    /// an incomplete record is a precondition violation surfaced as
    /// [`Error::IncompleteCallRecord`](crate::Error::IncompleteCallRecord).
    pub fn submit_call_rating(&self, feedback: Feedback, call: &CallRecord) -> Result<()> {
        let context = CallMetricContext::from_record(call, self.device.device_url())?;
        self.call_metrics
            .submit_rating(&feedback, &context, &self.media.version());
        Ok(())
    }

    /// Report a video license activation as a `call.activatingVideo`
    /// usage counter. Never blocks on transport.
    pub fn report_video_license_activation(&self) {
        self.call_metrics.report_video_license_activation();
    }

    /// The strategy coordinator, for call-handling code that resolves
    /// identity itself.
    pub fn coordinator(&self) -> Arc<StrategyCoordinator> {
        self.coordinator.clone()
    }

    /// The metrics engine, exposing local submission counters.
    pub fn metrics(&self) -> &MetricsEngine {
        &self.engine
    }
}

/// Builder for [`Sdk`].
pub struct SdkBuilder {
    config: SdkConfig,
    device: Option<Arc<dyn DeviceService>>,
    media: Option<Arc<dyn MediaEngine>>,
    logs: Option<Arc<dyn LogCollector>>,
    sink: Option<Arc<dyn MetricsSink>>,
    exchange: Option<Arc<dyn TokenExchange>>,
}

impl SdkBuilder {
    pub fn new() -> Self {
        Self {
            config: SdkConfig::from_env(),
            device: None,
            media: None,
            logs: None,
            sink: None,
            exchange: None,
        }
    }

    /// Use an explicit configuration instead of environment defaults.
    pub fn config(mut self, config: SdkConfig) -> Self {
        self.config = config;
        self
    }

    /// Device registration backing this SDK instance.
    pub fn device(mut self, device: Arc<dyn DeviceService>) -> Self {
        self.device = Some(device);
        self
    }

    /// Media engine whose version is reported in call metrics.
    pub fn media_engine(mut self, media: Arc<dyn MediaEngine>) -> Self {
        self.media = Some(media);
        self
    }

    /// Log collector queried when feedback asks to include logs.
    pub fn log_collector(mut self, logs: Arc<dyn LogCollector>) -> Self {
        self.logs = Some(logs);
        self
    }

    /// Metric transport; defaults to the HTTP sink at the configured
    /// endpoint.
    pub fn metrics_sink(mut self, sink: Arc<dyn MetricsSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Token exchange used to restore a persisted OAuth session at build
    /// time. Without one, a persisted OAuth slot is left untouched and the
    /// SDK starts unauthenticated.
    pub fn token_exchange(mut self, exchange: Arc<dyn TokenExchange>) -> Self {
        self.exchange = Some(exchange);
        self
    }

    /// Build the SDK, restoring the last-configured strategy from the
    /// persisted slot when possible.
    pub async fn build(self) -> Result<Sdk> {
        let store = Arc::new(match &self.config.credentials_path {
            Some(path) => CredentialStore::with_path(path.clone()),
            None => CredentialStore::new()?,
        });

        let coordinator = Arc::new(StrategyCoordinator::new());
        restore_strategy(&coordinator, &store, self.exchange.as_ref()).await;

        let device = self.device.unwrap_or_else(|| {
            Arc::new(StaticDevice::new(
                url::Url::parse(UNREGISTERED_DEVICE_URL)
                    .expect("unregistered device URL is valid"),
            ))
        });
        let media = self
            .media
            .unwrap_or_else(|| Arc::new(StaticMediaEngine::new("unknown")));
        let logs = self.logs.unwrap_or_else(|| Arc::new(NoopLogCollector));
        let sink = self
            .sink
            .unwrap_or_else(|| Arc::new(HttpMetricsSink::new(self.config.metrics_endpoint.clone())));

        let engine = Arc::new(MetricsEngine::new(
            coordinator.clone(),
            device.clone(),
            sink,
        ));
        let call_metrics = CallMetrics::new(engine.clone(), logs, self.config.environment);

        Ok(Sdk {
            coordinator,
            store,
            engine,
            call_metrics,
            device,
            media,
        })
    }
}

impl Default for SdkBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Reconstruct the last-configured strategy from the persisted slot.
///
/// An unreadable slot is logged and skipped rather than failing the build;
/// the host can still configure a fresh strategy.
async fn restore_strategy(
    coordinator: &Arc<StrategyCoordinator>,
    store: &Arc<CredentialStore>,
    exchange: Option<&Arc<dyn TokenExchange>>,
) {
    let credential = match store.load().await {
        Ok(Some(credential)) => credential,
        Ok(None) => return,
        Err(err) => {
            tracing::warn!("ignoring unreadable credential slot: {err}");
            return;
        }
    };

    match credential {
        Credential::DirectToken { token } => {
            coordinator.set_active_strategy(AuthStrategy::DirectToken(DirectTokenStrategy::new(
                token,
            )));
        }
        Credential::OAuth {
            parameters,
            credential,
        } => {
            let Some(exchange) = exchange else {
                tracing::debug!(
                    "persisted OAuth slot needs a token exchange to restore; starting unauthenticated"
                );
                return;
            };
            let strategy = match credential {
                Some(resolved) => {
                    OAuthStrategy::restored(parameters, exchange.clone(), resolved)
                }
                // No resolved token was persisted; the strategy starts
                // pending and needs a fresh resolution.
                None => OAuthStrategy::new(parameters, exchange.clone()),
            };
            coordinator.set_active_strategy(AuthStrategy::OAuth(strategy));
        }
    }
}

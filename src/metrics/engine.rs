//! Metric submission and dispatch.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use url::Url;
use uuid::Uuid;

use crate::auth::StrategyCoordinator;
use crate::device::DeviceService;
use crate::{Error, Result};

use super::Metric;

/// Thread-safe atomic counter.
#[derive(Debug, Default)]
pub struct Counter {
    value: AtomicU64,
}

impl Counter {
    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Local submission counters for the engine.
#[derive(Debug, Default)]
pub struct EngineStats {
    pub submitted: Counter,
    pub dropped_unauthenticated: Counter,
    pub transport_errors: Counter,
}

/// A metric wrapped with the submission context the transport needs.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricEnvelope {
    pub tracking_id: Uuid,
    pub reported_at: DateTime<Utc>,
    pub device_url: String,
    #[serde(flatten)]
    pub metric: Metric,
}

/// External transport contract for metric delivery.
///
/// Batching, retry, and delivery guarantees live behind this seam; the
/// engine treats it as a best-effort sink.
#[async_trait]
pub trait MetricsSink: Send + Sync {
    async fn dispatch(&self, access_token: &str, envelopes: Vec<MetricEnvelope>) -> Result<()>;
}

/// Sink posting envelope batches as JSON to the metrics service.
pub struct HttpMetricsSink {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpMetricsSink {
    pub fn new(endpoint: Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
        }
    }
}

#[async_trait]
impl MetricsSink for HttpMetricsSink {
    async fn dispatch(&self, access_token: &str, envelopes: Vec<MetricEnvelope>) -> Result<()> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(access_token)
            .json(&serde_json::json!({ "metrics": envelopes }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Api {
                message: response.text().await.unwrap_or_default(),
                status: Some(status.as_u16()),
            });
        }
        Ok(())
    }
}

/// Accepts fully-formed metrics and dispatches them to the sink.
///
/// Submission is fire-and-forget: `track` returns immediately, resolving the
/// authenticated identity and device context on a background task. Transport
/// failures never reach the caller; they are logged and counted.
pub struct MetricsEngine {
    coordinator: Arc<StrategyCoordinator>,
    device: Arc<dyn DeviceService>,
    sink: Arc<dyn MetricsSink>,
    stats: Arc<EngineStats>,
}

impl MetricsEngine {
    pub fn new(
        coordinator: Arc<StrategyCoordinator>,
        device: Arc<dyn DeviceService>,
        sink: Arc<dyn MetricsSink>,
    ) -> Self {
        Self {
            coordinator,
            device,
            sink,
            stats: Arc::new(EngineStats::default()),
        }
    }

    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }

    /// Submit a metric. Must be called within a tokio runtime.
    ///
    /// Every submission requires a resolved identity: a metric tracked while
    /// unauthenticated is dropped, not queued.
    pub fn track(&self, metric: Metric) {
        let coordinator = self.coordinator.clone();
        let device = self.device.clone();
        let sink = self.sink.clone();
        let stats = self.stats.clone();

        tokio::spawn(async move {
            let name = metric.name.clone();
            let Some(token) = coordinator.resolve_access_token().await else {
                stats.dropped_unauthenticated.inc();
                tracing::debug!(metric = %name, "dropping metric without authenticated identity");
                return;
            };

            let envelope = MetricEnvelope {
                tracking_id: Uuid::new_v4(),
                reported_at: Utc::now(),
                device_url: device.device_url().to_string(),
                metric,
            };

            match sink.dispatch(&token, vec![envelope]).await {
                Ok(()) => stats.submitted.inc(),
                Err(err) => {
                    stats.transport_errors.inc();
                    tracing::warn!(metric = %name, "metric dispatch failed: {err}");
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::auth::{AuthStrategy, DirectTokenStrategy};
    use crate::device::StaticDevice;
    use crate::metrics::{MetricsCategory, names};

    use super::*;

    /// Sink double capturing dispatched envelopes.
    #[derive(Default)]
    struct RecordingSink {
        dispatched: Mutex<Vec<(String, Vec<MetricEnvelope>)>>,
    }

    #[async_trait]
    impl MetricsSink for RecordingSink {
        async fn dispatch(&self, access_token: &str, envelopes: Vec<MetricEnvelope>) -> Result<()> {
            self.dispatched
                .lock()
                .unwrap()
                .push((access_token.to_string(), envelopes));
            Ok(())
        }
    }

    fn engine_with(sink: Arc<RecordingSink>, strategy: AuthStrategy) -> MetricsEngine {
        let coordinator = Arc::new(StrategyCoordinator::new());
        coordinator.set_active_strategy(strategy);
        let device = Arc::new(StaticDevice::new(
            Url::parse("https://devices.example.invalid/d/42").unwrap(),
        ));
        MetricsEngine::new(coordinator, device, sink)
    }

    async fn wait_for<F: Fn() -> bool>(condition: F) {
        for _ in 0..100 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("condition not reached within 1s");
    }

    #[tokio::test]
    async fn test_track_dispatches_with_identity_and_device() {
        let sink = Arc::new(RecordingSink::default());
        let engine = engine_with(
            sink.clone(),
            AuthStrategy::DirectToken(DirectTokenStrategy::new("abc123")),
        );

        engine.track(Metric::increment(
            names::CALL_ACTIVATING_VIDEO,
            MetricsCategory::Generic,
        ));

        wait_for(|| engine.stats().submitted.get() == 1).await;

        let dispatched = sink.dispatched.lock().unwrap();
        let (token, envelopes) = &dispatched[0];
        assert_eq!(token, "abc123");
        assert_eq!(envelopes.len(), 1);
        assert_eq!(envelopes[0].metric.name, "call.activatingVideo");
        assert_eq!(envelopes[0].device_url, "https://devices.example.invalid/d/42");
    }

    #[tokio::test]
    async fn test_track_drops_metric_when_unauthenticated() {
        let sink = Arc::new(RecordingSink::default());
        let engine = engine_with(sink.clone(), AuthStrategy::Unauthenticated);

        engine.track(Metric::increment(
            names::CALL_ACTIVATING_VIDEO,
            MetricsCategory::Generic,
        ));

        wait_for(|| engine.stats().dropped_unauthenticated.get() == 1).await;
        assert!(sink.dispatched.lock().unwrap().is_empty());
        assert_eq!(engine.stats().submitted.get(), 0);
    }

    /// Sink double that always fails.
    struct FailingSink;

    #[async_trait]
    impl MetricsSink for FailingSink {
        async fn dispatch(&self, _: &str, _: Vec<MetricEnvelope>) -> Result<()> {
            Err(Error::Api {
                message: "service unavailable".into(),
                status: Some(503),
            })
        }
    }

    #[tokio::test]
    async fn test_transport_failure_is_counted_not_surfaced() {
        let coordinator = Arc::new(StrategyCoordinator::new());
        coordinator.set_active_strategy(AuthStrategy::DirectToken(DirectTokenStrategy::new(
            "abc123",
        )));
        let device = Arc::new(StaticDevice::new(
            Url::parse("https://devices.example.invalid/d/42").unwrap(),
        ));
        let engine = MetricsEngine::new(coordinator, device, Arc::new(FailingSink));

        engine.track(Metric::increment(
            names::CALL_ACTIVATING_VIDEO,
            MetricsCategory::Generic,
        ));

        wait_for(|| engine.stats().transport_errors.get() == 1).await;
        assert_eq!(engine.stats().submitted.get(), 0);
    }

    #[tokio::test]
    async fn test_http_sink_posts_bearer_batch() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/metrics"))
            .and(header("authorization", "Bearer abc123"))
            .and(body_partial_json(serde_json::json!({
                "metrics": [{"name": "call.activatingVideo"}]
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let sink = HttpMetricsSink::new(Url::parse(&format!("{}/metrics", server.uri())).unwrap());
        let envelope = MetricEnvelope {
            tracking_id: Uuid::new_v4(),
            reported_at: Utc::now(),
            device_url: "https://devices.example.invalid/d/42".into(),
            metric: Metric::increment(names::CALL_ACTIVATING_VIDEO, MetricsCategory::Generic),
        };

        sink.dispatch("abc123", vec![envelope]).await.unwrap();
    }

    #[tokio::test]
    async fn test_http_sink_surfaces_status_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let sink = HttpMetricsSink::new(Url::parse(&server.uri()).unwrap());
        let envelope = MetricEnvelope {
            tracking_id: Uuid::new_v4(),
            reported_at: Utc::now(),
            device_url: "https://devices.example.invalid/d/42".into(),
            metric: Metric::increment(names::CALL_ACTIVATING_VIDEO, MetricsCategory::Generic),
        };

        let err = sink.dispatch("abc123", vec![envelope]).await.unwrap_err();
        assert_eq!(err.status_code(), Some(503));
        assert!(err.is_retryable());
    }
}

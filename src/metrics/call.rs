//! Call-quality feedback aggregation.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use url::Url;

use crate::logs::LogCollector;
use crate::{Error, Result};

use super::{Metric, MetricsCategory, MetricsEngine, MetricsEnvironment, names};

/// Post-call user feedback.
#[derive(Clone, Debug)]
pub struct Feedback {
    /// 0-5; 0 means the user declined to rate.
    pub rating: u8,
    pub comments: Option<String>,
    pub include_logs: bool,
}

impl Feedback {
    pub fn new(rating: u8) -> Self {
        Self {
            rating,
            comments: None,
            include_logs: false,
        }
    }

    pub fn comments(mut self, comments: impl Into<String>) -> Self {
        self.comments = Some(comments.into());
        self
    }

    pub fn include_logs(mut self, include: bool) -> Self {
        self.include_logs = include;
        self
    }

    /// Stringified metric fields derived from the feedback.
    ///
    /// `declinedRating` appears only for rating 0. The log payload is read
    /// from the collector at this point, never cached on the feedback.
    pub fn metric_data(&self, logs: &dyn LogCollector) -> HashMap<String, String> {
        let mut data = HashMap::new();

        data.insert("rating".to_string(), self.rating.to_string());

        if self.rating == 0 {
            data.insert("declinedRating".to_string(), true.to_string());
        }

        if self.include_logs {
            data.insert("log".to_string(), logs.memory_logs());
        }

        data
    }
}

/// Call state as supplied by the external call-handling layer.
///
/// Fields are optional on the wire; a record must be fully populated before
/// it reaches metric construction.
#[derive(Clone, Debug, Default)]
pub struct CallRecord {
    pub call_url: Option<String>,
    pub last_active: Option<DateTime<Utc>>,
    pub participant_id: Option<String>,
    pub one_on_one: Option<bool>,
}

/// Fully-populated call context required to build a rating metric.
#[derive(Clone, Debug)]
pub struct CallMetricContext {
    /// Call/session identifier.
    pub locus_id: String,
    pub last_active: DateTime<Utc>,
    pub device_url: Url,
    pub participant_id: String,
    pub is_group: bool,
}

impl CallMetricContext {
    /// Build from an external call record.
    ///
    /// A record reaching this point with a missing field is a precondition
    /// violation in the calling layer; the error is not recoverable there.
    pub fn from_record(record: &CallRecord, device_url: Url) -> Result<Self> {
        Ok(Self {
            locus_id: record
                .call_url
                .clone()
                .ok_or(Error::IncompleteCallRecord("locusId"))?,
            last_active: record
                .last_active
                .ok_or(Error::IncompleteCallRecord("locusTimestamp"))?,
            participant_id: record
                .participant_id
                .clone()
                .ok_or(Error::IncompleteCallRecord("participantId"))?,
            is_group: !record
                .one_on_one
                .ok_or(Error::IncompleteCallRecord("isGroup"))?,
            device_url,
        })
    }
}

/// Base fields merged with feedback data; feedback merged last, so its
/// fields win on key collision.
fn merge_metric_data(
    mut base: HashMap<String, String>,
    feedback: HashMap<String, String>,
) -> HashMap<String, String> {
    base.extend(feedback);
    base
}

/// Builds call metrics from call context, user feedback, and environment
/// tags, and hands them to the engine.
pub struct CallMetrics {
    engine: Arc<MetricsEngine>,
    logs: Arc<dyn LogCollector>,
    environment: MetricsEnvironment,
}

impl CallMetrics {
    pub fn new(
        engine: Arc<MetricsEngine>,
        logs: Arc<dyn LogCollector>,
        environment: MetricsEnvironment,
    ) -> Self {
        Self {
            engine,
            logs,
            environment,
        }
    }

    /// Deterministic rating-metric construction.
    pub fn build_rating_metric(
        &self,
        feedback: &Feedback,
        context: &CallMetricContext,
        wme_version: &str,
    ) -> Metric {
        let base = HashMap::from([
            ("locusId".to_string(), context.locus_id.clone()),
            (
                "locusTimestamp".to_string(),
                context
                    .last_active
                    .to_rfc3339_opts(SecondsFormat::Millis, true),
            ),
            ("deviceUrl".to_string(), context.device_url.to_string()),
            ("participantId".to_string(), context.participant_id.clone()),
            ("isGroup".to_string(), context.is_group.to_string()),
            ("wmeVersion".to_string(), wme_version.to_string()),
        ]);

        let data = merge_metric_data(base, feedback.metric_data(self.logs.as_ref()));
        Metric::generic(names::CALL_RATING, data, self.environment)
    }

    /// Fixed-shape usage counter for video license activation.
    pub fn build_video_activation_metric(&self) -> Metric {
        Metric::increment(names::CALL_ACTIVATING_VIDEO, MetricsCategory::Generic)
    }

    /// Hand a metric to the engine. Never blocks on transport.
    pub fn submit(&self, metric: Metric) {
        self.engine.track(metric);
    }

    /// Build and submit a rating metric.
    pub fn submit_rating(
        &self,
        feedback: &Feedback,
        context: &CallMetricContext,
        wme_version: &str,
    ) {
        self.submit(self.build_rating_metric(feedback, context, wme_version));
    }

    /// Submit the video activation counter.
    pub fn report_video_license_activation(&self) {
        self.submit(self.build_video_activation_metric());
    }
}

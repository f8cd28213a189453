//! Structured telemetry events.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Well-known metric names.
pub mod names {
    /// Post-call user rating.
    pub const CALL_RATING: &str = "call.rating";
    /// Video license activation counter.
    pub const CALL_ACTIVATING_VIDEO: &str = "call.activatingVideo";
}

/// Deployment environment a metric is reported against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricsEnvironment {
    Production,
    Test,
}

/// Coarse metric classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricsCategory {
    Generic,
    Operational,
}

/// A structured, named telemetry event with string-keyed data.
///
/// Every value is stringified at construction, numeric and boolean values
/// included; downstream consumers must not assume a typed payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    /// Namespaced event name, e.g. `call.rating`.
    pub name: String,
    pub data: HashMap<String, String>,
    pub environment: MetricsEnvironment,
    pub category: MetricsCategory,
}

impl Metric {
    /// General metric carrying per-event data.
    pub fn generic(
        name: impl Into<String>,
        data: HashMap<String, String>,
        environment: MetricsEnvironment,
    ) -> Self {
        Self {
            name: name.into(),
            data,
            environment,
            category: MetricsCategory::Generic,
        }
    }

    /// Fixed-shape increment counter with no per-event data.
    pub fn increment(name: impl Into<String>, category: MetricsCategory) -> Self {
        Self {
            name: name.into(),
            data: HashMap::new(),
            environment: MetricsEnvironment::Production,
            category,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generic_metric() {
        let data = HashMap::from([("rating".to_string(), "4".to_string())]);
        let metric = Metric::generic(names::CALL_RATING, data, MetricsEnvironment::Production);
        assert_eq!(metric.name, "call.rating");
        assert_eq!(metric.category, MetricsCategory::Generic);
        assert_eq!(metric.data["rating"], "4");
    }

    #[test]
    fn test_increment_metric_has_no_data() {
        let metric = Metric::increment(names::CALL_ACTIVATING_VIDEO, MetricsCategory::Generic);
        assert_eq!(metric.name, "call.activatingVideo");
        assert!(metric.data.is_empty());
    }

    #[test]
    fn test_metric_serializes_environment_lowercase() {
        let metric = Metric::increment("test.metric", MetricsCategory::Operational);
        let json = serde_json::to_string(&metric).unwrap();
        assert!(json.contains("\"environment\":\"production\""));
        assert!(json.contains("\"category\":\"operational\""));
    }
}

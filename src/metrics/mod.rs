//! Metrics dispatch.
//!
//! Structured telemetry events built from call-quality feedback and usage
//! counters, submitted fire-and-forget through an external transport sink.
//! Every submission carries a resolved authenticated identity and device
//! context, which is why this subsystem sits on top of
//! [`auth`](crate::auth).

mod call;
mod engine;
mod metric;

pub use call::{CallMetricContext, CallMetrics, CallRecord, Feedback};
pub use engine::{
    Counter, EngineStats, HttpMetricsSink, MetricEnvelope, MetricsEngine, MetricsSink,
};
pub use metric::{Metric, MetricsCategory, MetricsEnvironment, names};

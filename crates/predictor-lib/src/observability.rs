//! Observability infrastructure for the predictor
//!
//! Provides:
//! - Prometheus metrics (prediction latency, prediction counts, errors by kind,
//!   loaded artifact info)
//! - Structured logging of pipeline events with tracing

use prometheus::{
    register_gauge_vec, register_histogram, register_int_counter, register_int_counter_vec,
    register_int_gauge, GaugeVec, Histogram, IntCounter, IntCounterVec, IntGauge,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for prediction latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.00005, 0.0001, 0.00025, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.5,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<PredictorMetricsInner> = OnceLock::new();

struct PredictorMetricsInner {
    prediction_latency_seconds: Histogram,
    predictions_total: IntCounter,
    prediction_errors_total: IntCounterVec,
    artifact_info: GaugeVec,
    feature_columns: IntGauge,
    artifact_load_failures_total: IntCounter,
}

impl PredictorMetricsInner {
    fn new() -> Self {
        Self {
            prediction_latency_seconds: register_histogram!(
                "boxoffice_prediction_latency_seconds",
                "Time spent aligning, scaling and running inference for one prediction",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register prediction_latency_seconds"),

            predictions_total: register_int_counter!(
                "boxoffice_predictions_total",
                "Total number of successful predictions"
            )
            .expect("Failed to register predictions_total"),

            prediction_errors_total: register_int_counter_vec!(
                "boxoffice_prediction_errors_total",
                "Total number of failed predictions by error kind",
                &["kind"]
            )
            .expect("Failed to register prediction_errors_total"),

            artifact_info: register_gauge_vec!(
                "boxoffice_artifact_info",
                "Information about the currently loaded artifact set",
                &["fingerprint", "scheme", "model"]
            )
            .expect("Failed to register artifact_info"),

            feature_columns: register_int_gauge!(
                "boxoffice_feature_columns",
                "Number of columns in the loaded feature column list"
            )
            .expect("Failed to register feature_columns"),

            artifact_load_failures_total: register_int_counter!(
                "boxoffice_artifact_load_failures_total",
                "Total number of failed attempts to load the artifact set"
            )
            .expect("Failed to register artifact_load_failures_total"),
        }
    }
}

/// Predictor metrics for Prometheus exposition
///
/// Lightweight handle to the global metrics instance; clones share the same
/// underlying metrics.
#[derive(Clone)]
pub struct PredictorMetrics {
    _private: (),
}

impl Default for PredictorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl PredictorMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(PredictorMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &PredictorMetricsInner {
        GLOBAL_METRICS.get_or_init(PredictorMetricsInner::new)
    }

    pub fn observe_prediction_latency(&self, duration_secs: f64) {
        self.inner().prediction_latency_seconds.observe(duration_secs);
    }

    pub fn inc_predictions(&self) {
        self.inner().predictions_total.inc();
    }

    pub fn inc_prediction_errors(&self, kind: &str) {
        self.inner()
            .prediction_errors_total
            .with_label_values(&[kind])
            .inc();
    }

    /// Failed predictions recorded so far for `kind`
    pub fn prediction_error_count(&self, kind: &str) -> u64 {
        self.inner()
            .prediction_errors_total
            .with_label_values(&[kind])
            .get()
    }

    /// Record the artifact set now in use
    pub fn set_artifacts(&self, fingerprint: &str, scheme: &str, model: &str, columns: usize) {
        self.inner().artifact_info.reset();
        self.inner()
            .artifact_info
            .with_label_values(&[fingerprint, scheme, model])
            .set(1.0);
        self.inner().feature_columns.set(columns as i64);
    }

    pub fn inc_artifact_load_failures(&self) {
        self.inner().artifact_load_failures_total.inc();
    }
}

/// Structured logger for pipeline events
#[derive(Clone)]
pub struct StructuredLogger {
    service: String,
}

impl StructuredLogger {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    pub fn log_startup(&self, version: &str) {
        info!(
            event = "service_started",
            service = %self.service,
            version = %version,
            "Box office predictor started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "service_shutdown",
            service = %self.service,
            reason = %reason,
            "Box office predictor shutting down"
        );
    }

    pub fn log_artifacts_loaded(&self, fingerprint: &str, scheme: &str, columns: usize) {
        info!(
            event = "artifacts_loaded",
            service = %self.service,
            fingerprint = %fingerprint,
            scheme = %scheme,
            columns = columns,
            "Prediction artifacts ready"
        );
    }

    pub fn log_artifacts_unavailable(&self, artifact: &str, reason: &str) {
        warn!(
            event = "artifacts_unavailable",
            service = %self.service,
            artifact = %artifact,
            reason = %reason,
            "Prediction artifacts unavailable, predictions will be refused"
        );
    }

    pub fn log_prediction(&self, revenue: f64, log_revenue: f64, fingerprint: &str, elapsed_us: u64) {
        info!(
            event = "prediction_generated",
            service = %self.service,
            revenue = revenue,
            log_revenue = log_revenue,
            fingerprint = %fingerprint,
            elapsed_us = elapsed_us,
            "Generated box office prediction"
        );
    }

    pub fn log_prediction_failed(&self, kind: &str, error: &str) {
        warn!(
            event = "prediction_failed",
            service = %self.service,
            kind = %kind,
            error = %error,
            "Prediction request failed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predictor_metrics_handles_share_registry() {
        let metrics = PredictorMetrics::new();
        let clone = metrics.clone();

        metrics.observe_prediction_latency(0.0002);
        metrics.inc_predictions();
        clone.inc_prediction_errors("malformed_input");
        clone.set_artifacts("abc123", "categorical", "linear", 12);
        metrics.inc_artifact_load_failures();

        let families = prometheus::gather();
        assert!(families
            .iter()
            .any(|f| f.get_name() == "boxoffice_prediction_errors_total"));
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("boxoffice-test");
        assert_eq!(logger.service, "boxoffice-test");
    }
}

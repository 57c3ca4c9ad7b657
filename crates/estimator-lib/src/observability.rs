//! Observability infrastructure for the price estimator
//!
//! Provides:
//! - Prometheus metrics (estimate latency, outcome counters, loaded model info)
//! - Structured JSON logging with tracing

use prometheus::{
    register_gauge_vec, register_histogram, register_int_counter, GaugeVec, Histogram, IntCounter,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for estimate latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.00001, 0.00005, 0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<EstimatorMetricsInner> = OnceLock::new();

struct EstimatorMetricsInner {
    estimate_latency_seconds: Histogram,
    estimates_generated: IntCounter,
    unknown_locations: IntCounter,
    inference_errors: IntCounter,
    invalid_requests: IntCounter,
    artifact_loads: IntCounter,
    model_info: GaugeVec,
}

impl EstimatorMetricsInner {
    fn new() -> Self {
        Self {
            estimate_latency_seconds: register_histogram!(
                "price_estimator_estimate_latency_seconds",
                "Time spent encoding a query and running the model",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register estimate_latency_seconds"),

            estimates_generated: register_int_counter!(
                "price_estimator_estimates_total",
                "Total number of price estimates returned"
            )
            .expect("Failed to register estimates_total"),

            unknown_locations: register_int_counter!(
                "price_estimator_unknown_locations_total",
                "Estimates made without a location signal because the location was not in the schema"
            )
            .expect("Failed to register unknown_locations_total"),

            inference_errors: register_int_counter!(
                "price_estimator_inference_errors_total",
                "Total number of failed model predict calls"
            )
            .expect("Failed to register inference_errors_total"),

            invalid_requests: register_int_counter!(
                "price_estimator_invalid_requests_total",
                "Queries rejected by input validation"
            )
            .expect("Failed to register invalid_requests_total"),

            artifact_loads: register_int_counter!(
                "price_estimator_artifact_loads_total",
                "Successful schema and model loads"
            )
            .expect("Failed to register artifact_loads_total"),

            model_info: register_gauge_vec!(
                "price_estimator_model_info",
                "Information about the currently loaded model",
                &["format", "features"]
            )
            .expect("Failed to register model_info"),
        }
    }
}

/// Lightweight handle to the global metrics instance.
/// Multiple clones share the same underlying metrics.
#[derive(Clone)]
pub struct EstimatorMetrics {
    _private: (),
}

impl Default for EstimatorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl EstimatorMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(EstimatorMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &EstimatorMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    pub fn observe_estimate_latency(&self, duration_secs: f64) {
        self.inner().estimate_latency_seconds.observe(duration_secs);
    }

    pub fn inc_estimates_generated(&self) {
        self.inner().estimates_generated.inc();
    }

    pub fn inc_unknown_locations(&self) {
        self.inner().unknown_locations.inc();
    }

    pub fn inc_inference_errors(&self) {
        self.inner().inference_errors.inc();
    }

    pub fn inc_invalid_requests(&self) {
        self.inner().invalid_requests.inc();
    }

    pub fn inc_artifact_loads(&self) {
        self.inner().artifact_loads.inc();
    }

    pub fn artifact_loads(&self) -> u64 {
        self.inner().artifact_loads.get()
    }

    /// Update loaded model info
    pub fn set_model_info(&self, format: &str, features: usize) {
        self.inner().model_info.reset();
        self.inner()
            .model_info
            .with_label_values(&[format, &features.to_string()])
            .set(1.0);
    }
}

/// Structured logger for estimator events
#[derive(Clone)]
pub struct StructuredLogger {
    instance: String,
}

impl StructuredLogger {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
        }
    }

    pub fn log_startup(&self, version: &str) {
        info!(
            event = "estimator_started",
            instance = %self.instance,
            version = %version,
            "Price estimator starting"
        );
    }

    pub fn log_artifacts_loaded(
        &self,
        schema_path: &str,
        model_path: &str,
        model_format: &str,
        columns: usize,
        locations: usize,
    ) {
        info!(
            event = "artifacts_loaded",
            instance = %self.instance,
            schema_path = %schema_path,
            model_path = %model_path,
            model_format = %model_format,
            columns = columns,
            locations = locations,
            "Schema and model loaded"
        );
    }

    pub fn log_estimate(
        &self,
        location: &str,
        sqft: f64,
        bhk: u32,
        bath: u32,
        price_lakhs: f64,
        location_known: bool,
    ) {
        info!(
            event = "estimate_generated",
            instance = %self.instance,
            location = %location,
            sqft = sqft,
            bhk = bhk,
            bath = bath,
            price_lakhs = price_lakhs,
            location_known = location_known,
            "Generated price estimate"
        );
    }

    /// Not an error: the query was answered without a location signal
    pub fn log_unknown_location(&self, location: &str) {
        info!(
            event = "unknown_location",
            instance = %self.instance,
            location = %location,
            "Location not in schema, estimated without location signal"
        );
    }

    pub fn log_inference_failure(&self, location: &str, error: &str) {
        warn!(
            event = "inference_failed",
            instance = %self.instance,
            location = %location,
            error = %error,
            "Model predict call failed"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "estimator_shutdown",
            instance = %self.instance,
            reason = %reason,
            "Price estimator shutting down"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimator_metrics_creation() {
        let metrics = EstimatorMetrics::new();

        metrics.observe_estimate_latency(0.0002);
        metrics.inc_estimates_generated();
        metrics.inc_unknown_locations();
        metrics.inc_inference_errors();
        metrics.inc_invalid_requests();
        metrics.set_model_info("linear_json", 5);

        let before = metrics.artifact_loads();
        metrics.inc_artifact_loads();
        assert!(metrics.artifact_loads() > before);
    }

    #[test]
    fn test_metric_handles_share_state() {
        let a = EstimatorMetrics::new();
        let b = a.clone();
        let before = b.artifact_loads();
        a.inc_artifact_loads();
        assert!(b.artifact_loads() > before);
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("test-instance");
        assert_eq!(logger.instance, "test-instance");
    }
}

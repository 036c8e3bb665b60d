//! Prometheus metrics for the recognition service

use anyhow::Result;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Duration;
use tracing::info;

pub const REQUESTS_TOTAL: &str = "decimer_requests_total";
pub const OUTCOMES_TOTAL: &str = "decimer_outcomes_total";
pub const RECOGNITION_LATENCY_US: &str = "decimer_recognition_latency_us";
pub const ERRORS_TOTAL: &str = "decimer_errors_total";

/// Initialize metrics exporter and return handle for rendering
pub fn init_metrics() -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics: {}", e))?;

    metrics::describe_counter!(REQUESTS_TOTAL, "Total number of recognition requests");
    metrics::describe_counter!(
        OUTCOMES_TOTAL,
        "Recognition results by outcome (smiles, not_a_structure, undecodable)"
    );
    metrics::describe_histogram!(
        RECOGNITION_LATENCY_US,
        metrics::Unit::Microseconds,
        "Classifier plus predictor latency in microseconds"
    );
    metrics::describe_counter!(ERRORS_TOTAL, "Total number of errors by kind");

    info!("Metrics exporter initialized");
    Ok(handle)
}

pub fn record_request() {
    metrics::counter!(REQUESTS_TOTAL).increment(1);
}

pub fn record_outcome(outcome: &'static str, latency: Duration) {
    metrics::counter!(OUTCOMES_TOTAL, "outcome" => outcome).increment(1);
    metrics::histogram!(RECOGNITION_LATENCY_US).record(latency.as_micros() as f64);
}

pub fn record_error(kind: &'static str) {
    metrics::counter!(ERRORS_TOTAL, "kind" => kind).increment(1);
}

//! Relay-specific metrics.
//!
//! Recorded through the `metrics` facade; the Prometheus recorder installed
//! by `service_core::metrics::init_metrics` exports them on /metrics.

use metrics::{counter, histogram};
use std::time::Duration;

/// Record upstream call latency.
pub fn record_provider_latency(provider: &str, model: &str, elapsed: Duration) {
    histogram!(
        "relay_provider_latency_seconds",
        "provider" => provider.to_string(),
        "model" => model.to_string()
    )
    .record(elapsed.as_secs_f64());
}

/// Record an upstream failure.
pub fn record_provider_error(provider: &str, error_type: &'static str) {
    counter!(
        "relay_provider_errors_total",
        "provider" => provider.to_string(),
        "error_type" => error_type
    )
    .increment(1);
}

/// Record the outcome of one `/generate-image` request.
pub fn record_relay_outcome(outcome: &'static str) {
    counter!("relay_requests_total", "outcome" => outcome).increment(1);
}

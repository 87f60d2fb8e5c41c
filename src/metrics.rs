//! Prometheus request metrics.
//!
//! The recorder is installed lazily and at most once per process; repeated
//! router builds (tests) share the same handle.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Instant;
use tracing::warn;

static HANDLE: OnceLock<Option<PrometheusHandle>> = OnceLock::new();

/// Install the Prometheus recorder (first call) and return a render handle.
///
/// Returns `None` if another recorder is already installed globally.
pub fn prometheus_handle() -> Option<PrometheusHandle> {
    HANDLE
        .get_or_init(|| {
            PrometheusBuilder::new()
                .install_recorder()
                .map_err(|e| warn!("Prometheus recorder not installed: {}", e))
                .ok()
        })
        .clone()
}

/// Count a finished request by operation and response status.
pub fn record_request(operation: &'static str, status: u16) {
    counter!(
        "hls_relay_requests_total",
        "operation" => operation,
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record the wall-clock duration of a finished request.
pub fn record_duration(operation: &'static str, start: Instant) {
    histogram!(
        "hls_relay_request_duration_seconds",
        "operation" => operation
    )
    .record(start.elapsed().as_secs_f64());
}

/// Count a failed origin fetch.
pub fn record_upstream_error() {
    counter!("hls_relay_upstream_errors_total").increment(1);
}

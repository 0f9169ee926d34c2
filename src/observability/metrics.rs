//! Metrics collection and exposition.
//!
//! # Metrics
//! - `k8sflag_updates_total` (counter): values parsed from a file, by flag
//! - `k8sflag_defaults_total` (counter): fallbacks to the default, by flag
//! - `k8sflag_watch_errors_total` (counter): notification subsystem errors
//!
//! Without an installed recorder these calls are no-ops.

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

pub fn record_update(flag: &str) {
    metrics::counter!("k8sflag_updates_total", "flag" => flag.to_string()).increment(1);
}

pub fn record_default(flag: &str) {
    metrics::counter!("k8sflag_defaults_total", "flag" => flag.to_string()).increment(1);
}

pub fn record_watch_error() {
    metrics::counter!("k8sflag_watch_errors_total").increment(1);
}

/// Install the Prometheus exporter listening on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

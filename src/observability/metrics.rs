//! Metrics collection and exposition.
//!
//! # Metrics
//! - `edge_guard_rate_limited_total` (counter): throttled requests
//! - `edge_guard_tracked_clients` (gauge): client identities holding a bucket
//! - `edge_guard_health_checks_total` (counter): probe results by endpoint, status
//!
//! Recording goes through the `metrics` facade and is a no-op until a
//! recorder is installed.

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_rate_limited() {
    metrics::counter!("edge_guard_rate_limited_total").increment(1);
}

/// Set whenever a new client identity gets a bucket.
pub fn record_tracked_clients(count: usize) {
    metrics::gauge!("edge_guard_tracked_clients").set(count as f64);
}

pub fn record_health_check(endpoint: &'static str, healthy: bool) {
    let status = if healthy { "healthy" } else { "unhealthy" };
    metrics::counter!(
        "edge_guard_health_checks_total",
        "endpoint" => endpoint,
        "status" => status
    )
    .increment(1);
}

//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define registry metrics (requests, latency, conflicts, legacy traffic)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `registry_requests_total` (counter): requests by method, status
//! - `registry_request_duration_seconds` (histogram): latency distribution
//! - `registry_routes` (gauge): routes currently registered
//! - `registry_conflicts_total` (counter): rejected registrations by module
//! - `registry_legacy_redirects_total` (counter): forwarded calls by legacy route
//! - `registry_telemetry_flushes_total` (counter): flushes by outcome
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed, so tests need no setup
//! - Labels stay low-cardinality: route keys come from a fixed mapping table

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics recorder"),
    }
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    metrics::counter!(
        "registry_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("registry_request_duration_seconds", "method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_route_count(count: usize) {
    metrics::gauge!("registry_routes").set(count as f64);
}

pub fn record_conflict(module: &str) {
    metrics::counter!("registry_conflicts_total", "module" => module.to_string()).increment(1);
}

pub fn record_legacy_redirect(legacy_route: &str) {
    metrics::counter!(
        "registry_legacy_redirects_total",
        "legacy_route" => legacy_route.to_string()
    )
    .increment(1);
}

pub fn record_telemetry_flush(success: bool) {
    let outcome = if success { "ok" } else { "error" };
    metrics::counter!("registry_telemetry_flushes_total", "outcome" => outcome).increment(1);
}

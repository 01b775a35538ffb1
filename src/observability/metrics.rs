//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define proxy metrics (requests, latency, cache behaviour, connections)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `proxy_requests_total` (counter): finished connections by outcome
//! - `proxy_request_duration_seconds` (histogram): time from accept to close
//! - `proxy_cache_lookups_total` (counter): lookups by result (hit/miss)
//! - `proxy_cache_evictions_total` (counter): entries dropped for space
//! - `proxy_cache_bytes` / `proxy_cache_entries` (gauge): current cache usage
//! - `proxy_active_connections` (gauge): current connection count
//! - `proxy_origin_errors_total` (counter): origin failures by kind
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op, which is what tests rely on

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a finished connection.
pub fn record_request(outcome: &'static str, start: Instant) {
    counter!("proxy_requests_total", "outcome" => outcome).increment(1);
    histogram!("proxy_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_cache_lookup(hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    counter!("proxy_cache_lookups_total", "result" => result).increment(1);
}

pub fn record_cache_eviction() {
    counter!("proxy_cache_evictions_total").increment(1);
}

pub fn record_cache_size(bytes: usize, entries: usize) {
    gauge!("proxy_cache_bytes").set(bytes as f64);
    gauge!("proxy_cache_entries").set(entries as f64);
}

pub fn record_active_connections(count: u64) {
    gauge!("proxy_active_connections").set(count as f64);
}

pub fn record_origin_error(kind: &'static str) {
    counter!("proxy_origin_errors_total", "kind" => kind).increment(1);
}

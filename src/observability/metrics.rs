//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_fetches_total` (counter): fetches by outcome (hit, fresh,
//!   stale, unavailable)
//! - `gateway_probes_total` (counter): liveness probes by outcome
//! - `gateway_status_transitions_total` (counter): online/offline flips
//! - `gateway_backend_online` (gauge): 1=online, 0=offline
//! - `gateway_cache_entries` (gauge): current cache size

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on `addr`.
///
/// Call once from the host application, inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install Prometheus exporter"),
    }
}

pub fn record_fetch(outcome: &'static str) {
    counter!("gateway_fetches_total", "outcome" => outcome).increment(1);
}

pub fn record_probe(success: bool) {
    let outcome = if success { "success" } else { "failure" };
    counter!("gateway_probes_total", "outcome" => outcome).increment(1);
}

pub fn record_status_transition(online: bool) {
    let to = if online { "online" } else { "offline" };
    counter!("gateway_status_transitions_total", "to" => to).increment(1);
}

pub fn record_backend_online(online: bool) {
    gauge!("gateway_backend_online").set(if online { 1.0 } else { 0.0 });
}

pub fn record_cache_size(entries: usize) {
    gauge!("gateway_cache_entries").set(entries as f64);
}

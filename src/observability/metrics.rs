//! Metrics collection and exposition.
//!
//! # Metrics
//! - `matchtoken_decisions_total` (counter): gate decisions by outcome
//! - `matchtoken_reloads_total` (counter): matcher rebuilds by result
//! - `matchtoken_host_entries` (gauge): entries in the active host list
//! - `matchtoken_upstream_errors_total` (counter): failed forwards

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::matcher::MatchOutcome;

/// Start the Prometheus scrape endpoint. Requires a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to start metrics endpoint"),
    }
}

pub fn record_decision(outcome: MatchOutcome) {
    counter!("matchtoken_decisions_total", "outcome" => outcome.as_str()).increment(1);
}

pub fn record_reload(success: bool) {
    let result = if success { "success" } else { "failure" };
    counter!("matchtoken_reloads_total", "result" => result).increment(1);
}

pub fn record_host_entries(count: usize) {
    gauge!("matchtoken_host_entries").set(count as f64);
}

pub fn record_upstream_error() {
    counter!("matchtoken_upstream_errors_total").increment(1);
}

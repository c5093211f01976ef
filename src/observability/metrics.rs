//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_prompts_total` (counter): intake results by `result`
//! - `relay_resolutions_total` (counter): settled requests by `path`
//! - `relay_resolution_seconds` (histogram): time parked, by `path`
//! - `relay_pending_requests` (gauge): entries in the current table
//!
//! Recording is a no-op until an exporter is installed.

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;
use std::time::Duration;

/// Install the Prometheus exporter with its own scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_prompt(result: &'static str) {
    ::metrics::counter!("relay_prompts_total", "result" => result).increment(1);
}

pub fn record_resolution(path: &'static str, elapsed: Duration) {
    ::metrics::counter!("relay_resolutions_total", "path" => path).increment(1);
    ::metrics::histogram!("relay_resolution_seconds", "path" => path).record(elapsed.as_secs_f64());
}

pub fn record_pending(count: usize) {
    ::metrics::gauge!("relay_pending_requests").set(count as f64);
}

//! Metrics collection and exposition.
//!
//! # Metrics
//! - `newrelic_receiver_requests_total` (counter): requests by agent method and status
//! - `newrelic_receiver_request_duration_seconds` (histogram): handling latency by method
//! - `newrelic_receiver_spans_accepted_total` (counter): spans forwarded downstream
//! - `newrelic_receiver_spans_refused_total` (counter): spans dropped with their batch
//! - `newrelic_receiver_transactions_received_total` (counter): parsed transaction events
//! - `newrelic_receiver_connections` (gauge): registered applications

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Record one handled request.
pub fn record_request(method: &str, status: u16, start: Instant) {
    metrics::counter!(
        "newrelic_receiver_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!(
        "newrelic_receiver_request_duration_seconds",
        "method" => method.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_spans_accepted(count: usize) {
    metrics::counter!("newrelic_receiver_spans_accepted_total").increment(count as u64);
}

pub fn record_spans_refused(count: usize) {
    metrics::counter!("newrelic_receiver_spans_refused_total").increment(count as u64);
}

pub fn record_transactions(count: usize) {
    metrics::counter!("newrelic_receiver_transactions_received_total").increment(count as u64);
}

pub fn record_connections(count: usize) {
    metrics::gauge!("newrelic_receiver_connections").set(count as f64);
}

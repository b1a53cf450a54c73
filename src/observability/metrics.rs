//! Metrics collection and exposition.
//!
//! # Metrics
//! - `access_log_records_submitted_total` (counter): tasks accepted by the queue
//! - `access_log_records_delivered_total` (counter): records accepted by the sink
//! - `access_log_records_failed_total` (counter): dropped records, by `kind`
//! - `access_log_delivery_duration_seconds` (histogram): sink round trip
//! - `access_log_queue_depth` (gauge): tasks queued or running
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - Prometheus exporter is optional and owned by the binary

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and serve `/metrics` on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_submitted() {
    metrics::counter!("access_log_records_submitted_total").increment(1);
}

pub fn record_delivered(elapsed: Duration) {
    metrics::counter!("access_log_records_delivered_total").increment(1);
    metrics::histogram!("access_log_delivery_duration_seconds").record(elapsed.as_secs_f64());
}

pub fn record_failed(kind: &'static str) {
    metrics::counter!("access_log_records_failed_total", "kind" => kind).increment(1);
}

pub fn record_queue_depth(depth: usize) {
    metrics::gauge!("access_log_queue_depth").set(depth as f64);
}

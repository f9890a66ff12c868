//! Metrics collection and exposition.
//!
//! # Metrics
//! - `rosetta_requests_total` (counter): requests by endpoint, status
//! - `rosetta_request_duration_seconds` (histogram): latency by endpoint
//! - `rosetta_node_rpc_errors_total` (counter): failed node calls by RPC method
//! - `rosetta_node_process_up` (gauge): 1 while the supervised node runs

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;
use std::time::Instant;

pub const REQUESTS_TOTAL: &str = "rosetta_requests_total";
pub const REQUEST_DURATION: &str = "rosetta_request_duration_seconds";
pub const NODE_RPC_ERRORS: &str = "rosetta_node_rpc_errors_total";
pub const NODE_PROCESS_UP: &str = "rosetta_node_process_up";

/// Install the Prometheus recorder and its scrape listener on `addr`.
///
/// Must be called from within a tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "metrics exporter listening");
    Ok(())
}

pub fn record_request(endpoint: &str, status: u16, start: Instant) {
    metrics::counter!(
        REQUESTS_TOTAL,
        "endpoint" => endpoint.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!(REQUEST_DURATION, "endpoint" => endpoint.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_rpc_error(method: &'static str) {
    metrics::counter!(NODE_RPC_ERRORS, "method" => method).increment(1);
}

pub fn record_node_up(up: bool) {
    metrics::gauge!(NODE_PROCESS_UP).set(if up { 1.0 } else { 0.0 });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_exporter_is_noop() {
        record_request("/construction/derive", 200, Instant::now());
        record_rpc_error("eth_gasPrice");
        record_node_up(true);
        record_node_up(false);
    }
}

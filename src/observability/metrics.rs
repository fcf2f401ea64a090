//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): requests by method and final status
//! - `proxy_request_duration_seconds` (histogram): end-to-end latency,
//!   retries and backoff included
//! - `proxy_upstream_attempts_total` (counter): attempts by outcome
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;

    describe_counter!("proxy_requests_total", "Proxied requests by method and status");
    describe_histogram!(
        "proxy_request_duration_seconds",
        "Time from request arrival to response, retries included"
    );
    describe_counter!("proxy_upstream_attempts_total", "Upstream attempts by outcome");

    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    counter!(
        "proxy_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("proxy_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_attempt(outcome: &'static str) {
    counter!("proxy_upstream_attempts_total", "outcome" => outcome).increment(1);
}

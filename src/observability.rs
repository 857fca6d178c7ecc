use std::net::SocketAddr;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: engine operations executed. Labels: operation, outcome.
pub const OPERATIONS_TOTAL: &str = "folio_operations_total";

/// Counter: HTTP requests served. Labels: method, path, status.
pub const REQUESTS_TOTAL: &str = "folio_requests_total";

/// Histogram: HTTP request latency in seconds. Labels: method, path.
pub const REQUEST_DURATION_SECONDS: &str = "folio_request_duration_seconds";

// ── USE metrics (resource utilization) ──────────────────────────

/// Counter: swallowed audit/event sink write failures.
pub const SINK_WRITE_FAILURES_TOTAL: &str = "folio_sink_write_failures_total";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) {
    let Some(port) = port else { return };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .expect("failed to install Prometheus metrics exporter");
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
}

//! Prometheus metrics for monitoring the bingo server.
//!
//! Metrics are recorded through the `metrics` facade at all times and are
//! only exported when a Prometheus listener has been installed.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use bingo_server::metrics;
//! use std::net::SocketAddr;
//!
//! let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
//! metrics::init_metrics(addr).unwrap();
//!
//! metrics::numbers_called_total();
//! metrics::websocket_connections_active(3);
//! ```

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize Prometheus metrics exporter.
///
/// Metrics will be available at `http://<addr>/metrics`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

// ============================================================================
// HTTP Metrics
// ============================================================================

/// Record HTTP request.
pub fn http_requests_total(method: &str, path: &str, status: u16) {
    metrics::counter!("http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

// ============================================================================
// WebSocket Metrics
// ============================================================================

/// Set current active WebSocket connections count.
pub fn websocket_connections_active(count: u64) {
    metrics::gauge!("websocket_connections_active").set(count as f64);
}

/// Increment WebSocket messages sent counter.
pub fn websocket_messages_sent() {
    metrics::counter!("websocket_messages_sent").increment(1);
}

/// Increment WebSocket messages received counter.
pub fn websocket_messages_received() {
    metrics::counter!("websocket_messages_received").increment(1);
}

// ============================================================================
// Game Metrics
// ============================================================================

/// Set current running session actors count.
pub fn active_sessions(count: usize) {
    metrics::gauge!("active_sessions").set(count as f64);
}

/// Increment numbers called counter.
pub fn numbers_called_total() {
    metrics::counter!("numbers_called_total").increment(1);
}

/// Add to cards generated counter.
pub fn cards_generated_total(count: usize) {
    metrics::counter!("cards_generated_total").increment(count as u64);
}

/// Increment win claims counter by outcome (`winner`, `not_winner`, or an error kind).
pub fn win_claims_total(outcome: &str) {
    metrics::counter!("win_claims_total", "outcome" => outcome.to_string()).increment(1);
}

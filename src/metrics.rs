//! Prometheus/OpenTelemetry-compatible metrics for Tickweave.
//!
//! Records operational metrics (deliveries, drops, coalesces, failures) for
//! production observability. Use [`install_prometheus_recorder`] at startup
//! to expose metrics for scraping. The [`EventSink`](crate::event::EventSink)
//! surface stays backend-neutral; this module is the batteries-included
//! exporter for deployments that want one.
//!
//! If no recorder is installed, metrics recording is a no-op (metrics are
//! dropped).

use crate::edge::EdgeId;
use metrics::{counter, gauge};

/// Installs the Prometheus recorder as the global metrics recorder.
///
/// Spawns an HTTP server that serves Prometheus metrics at `GET /metrics` on
/// the default address. Call once at startup.
pub fn install_prometheus_recorder() {
  use metrics_exporter_prometheus::PrometheusBuilder;
  PrometheusBuilder::new()
    .install()
    .expect("failed to install Prometheus recorder");
}

/// Installs the Prometheus recorder and serves metrics on the given address.
pub fn install_prometheus_recorder_on(addr: std::net::SocketAddr) {
  use metrics_exporter_prometheus::PrometheusBuilder;
  PrometheusBuilder::new()
    .with_http_listener(addr)
    .install()
    .expect("failed to install Prometheus recorder");
}

/// Records a message dispatched to a node handler.
///
/// Feeds the `tickweave_delivered_total` counter; external collaborators can
/// derive per-port throughput (messages/sec) from its rate.
pub fn record_delivered(graph_id: &str, node_id: &str, port: &str, plane: &str) {
  counter!(
    "tickweave_delivered_total",
    "graph_id" => graph_id.to_string(),
    "node_id" => node_id.to_string(),
    "port" => port.to_string(),
    "plane" => plane.to_string()
  )
  .increment(1);
}

/// Records a message discarded by an edge under the `Drop` policy.
pub fn record_dropped(graph_id: &str, edge: EdgeId) {
  counter!(
    "tickweave_dropped_total",
    "graph_id" => graph_id.to_string(),
    "edge_id" => edge.to_string()
  )
  .increment(1);
}

/// Records a merge performed by an edge under the `Coalesce` policy.
pub fn record_coalesced(graph_id: &str, edge: EdgeId) {
  counter!(
    "tickweave_coalesced_total",
    "graph_id" => graph_id.to_string(),
    "edge_id" => edge.to_string()
  )
  .increment(1);
}

/// Records a node handler failure for the `tickweave_node_errors_total` counter.
pub fn record_node_error(graph_id: &str, node_id: &str) {
  counter!(
    "tickweave_node_errors_total",
    "graph_id" => graph_id.to_string(),
    "node_id" => node_id.to_string()
  )
  .increment(1);
}

/// Records the current queue depth of an edge.
///
/// The scheduler sets this gauge once per tick per edge; external controllers
/// can use it to watch backlog growth against fixed capacities.
pub fn record_queue_depth(graph_id: &str, edge: EdgeId, depth: usize) {
  gauge!(
    "tickweave_queue_depth",
    "graph_id" => graph_id.to_string(),
    "edge_id" => edge.to_string()
  )
  .set(depth as f64);
}

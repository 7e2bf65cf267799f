//! Prometheus metrics recorder and metric name constants.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::info;

/// Install the Prometheus metrics recorder (global).
///
/// Returns the `PrometheusHandle` used to render scrape output.
/// Must be called once at process startup before any metrics are recorded.
pub fn install_recorder() -> PrometheusHandle {
    let builder = PrometheusBuilder::new();
    let handle = builder
        .install_recorder()
        .expect("failed to install metrics recorder");
    info!("prometheus metrics recorder installed");
    handle
}

// Metric name constants to avoid typos across modules.

/// WebSocket connections opened total (counter).
pub const WS_CONNECTIONS_TOTAL: &str = "ws_connections_total";
/// WebSocket disconnections total (counter).
pub const WS_DISCONNECTIONS_TOTAL: &str = "ws_disconnections_total";
/// Active WebSocket connections (gauge).
pub const WS_CONNECTIONS_ACTIVE: &str = "ws_connections_active";
/// Events received total (counter, labels: type).
pub const EVENTS_RECEIVED_TOTAL: &str = "hub_events_received_total";
/// Events sent total (counter, labels: type).
pub const EVENTS_SENT_TOTAL: &str = "hub_events_sent_total";
/// Event processing errors total (counter, labels: code).
pub const EVENTS_ERRORS_TOTAL: &str = "hub_events_errors_total";
/// Frames dropped during fan-out total (counter).
pub const BROADCAST_DROPS_TOTAL: &str = "hub_broadcast_drops_total";
/// Dispatch duration seconds (histogram, labels: type).
pub const DISPATCH_DURATION_SECONDS: &str = "hub_dispatch_duration_seconds";

//! Outbound send primitives: broadcast and unicast, legacy and rich.
//!
//! Handlers hold the emitter (not the server) so they can reply and fan
//! out without owning any connection. All sends are fire-and-forget at
//! this layer: a failed unicast removes the peer from the registry and
//! never raises to the caller.

use std::sync::Arc;

use metrics::counter;
use serde_json::Value;
use tracing::{error, warn};

use atelier_events::{Envelope, LegacyMessage};

use crate::connection::ClientConnection;
use crate::metrics::EVENTS_SENT_TOTAL;
use crate::registry::ConnectionRegistry;

/// Broadcast / unicast sender over the connection registry.
pub struct EventEmitter {
    registry: Arc<ConnectionRegistry>,
}

impl EventEmitter {
    /// Create an emitter over a registry.
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// The registry this emitter fans out over.
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Send a legacy `{type, payload}` message to every connection.
    ///
    /// With no peers connected this is a logged no-op.
    pub async fn broadcast(&self, message_type: &str, payload: Value) {
        if self.registry.is_empty() {
            warn!(message_type, "No clients connected to broadcast message: {message_type}");
            return;
        }
        let message = LegacyMessage::new(message_type, payload);
        match message.to_text() {
            Ok(text) => {
                let delivered = self.registry.fan_out(&Arc::new(text)).await;
                counter!(EVENTS_SENT_TOTAL, "type" => message.message_type.clone())
                    .increment(delivered as u64);
            }
            Err(e) => error!(message_type, error = %e, "failed to serialize broadcast message"),
        }
    }

    /// Send a legacy `{type, payload}` message to one connection.
    ///
    /// On failure the connection is removed from the registry; the error
    /// never propagates to the caller.
    pub async fn send_to_client(
        &self,
        connection: &Arc<ClientConnection>,
        message_type: &str,
        payload: Value,
    ) {
        let message = LegacyMessage::new(message_type, payload);
        match message.to_text() {
            Ok(text) => {
                if connection.send(Arc::new(text)) {
                    counter!(EVENTS_SENT_TOTAL, "type" => message.message_type.clone())
                        .increment(1);
                } else {
                    error!(conn_id = %connection.id, "Error sending message to client");
                    self.registry.remove(&connection.id).await;
                }
            }
            Err(e) => error!(message_type, error = %e, "failed to serialize message"),
        }
    }

    /// Broadcast a rich envelope to every connection.
    ///
    /// Lifecycle events deliberately go to all peers, not only the
    /// originator: several observers may be watching the same session.
    pub async fn emit(&self, envelope: &Envelope) {
        match envelope.to_text() {
            Ok(text) => {
                let delivered = self.registry.fan_out(&Arc::new(text)).await;
                counter!(EVENTS_SENT_TOTAL, "type" => envelope.event_type.as_str().to_owned())
                    .increment(delivered as u64);
            }
            Err(e) => {
                error!(event_type = %envelope.event_type, error = %e, "failed to serialize event");
            }
        }
    }

    /// Send a rich envelope to one connection.
    pub async fn emit_to(&self, connection: &Arc<ClientConnection>, envelope: &Envelope) {
        match envelope.to_text() {
            Ok(text) => {
                if connection.send(Arc::new(text)) {
                    counter!(EVENTS_SENT_TOTAL, "type" => envelope.event_type.as_str().to_owned())
                        .increment(1);
                } else {
                    error!(conn_id = %connection.id, event_type = %envelope.event_type, "Error sending event to client");
                    self.registry.remove(&connection.id).await;
                }
            }
            Err(e) => {
                error!(event_type = %envelope.event_type, error = %e, "failed to serialize event");
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

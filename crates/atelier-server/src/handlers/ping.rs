//! Application-level keepalive.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::debug;

use atelier_events::{Envelope, EventType};

use crate::connection::ClientConnection;
use crate::dispatch::{EventContext, EventHandler, HandlerError};

/// Replies to PING with a PONG broadcast to every connection, echoing the
/// client's timestamp when present.
pub struct PingHandler;

#[async_trait]
impl EventHandler for PingHandler {
    async fn handle(
        &self,
        event: &Envelope,
        _origin: &Arc<ClientConnection>,
        ctx: &EventContext,
    ) -> Result<(), HandlerError> {
        debug!(payload = %event.payload, "ping received");

        let pong = event.reply(
            EventType::Pong,
            json!({
                "message": "Server is alive",
                "received_at": event.payload.get("time").cloned().unwrap_or(Value::Null),
                "server_time": chrono::Utc::now().to_rfc3339(),
            }),
        );
        ctx.emitter.emit(&pong).await;
        Ok(())
    }
}

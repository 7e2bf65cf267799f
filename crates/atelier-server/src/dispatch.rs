//! Handler dispatch table.
//!
//! Two protocols coexist on one socket. A frame that parsed into a rich
//! envelope dispatches by [`EventType`]; a legacy `{type, payload}` frame
//! dispatches by its raw type string. Multiple handlers per type are
//! allowed and all run, in registration order. A handler failure is
//! reported to the originating connection and never aborts dispatch of the
//! remaining handlers, and never the connection.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use metrics::{counter, histogram};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, warn};

use atelier_core::collab::{ContentGenerator, DesignSource};
use atelier_core::errors::CollabError;
use atelier_events::payloads::ErrorPayload;
use atelier_events::{Envelope, EventType, IncomingMessage, LegacyMessage};

use crate::connection::ClientConnection;
use crate::emitter::EventEmitter;
use crate::metrics::{DISPATCH_DURATION_SECONDS, EVENTS_ERRORS_TOTAL, EVENTS_RECEIVED_TOTAL};

/// Failure returned by a handler.
///
/// Carries the stable wire `code` and optional identifying `details`
/// alongside the human-readable message.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct HandlerError {
    /// Stable machine-readable code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Identifying fields from the causing request.
    pub details: Option<Value>,
}

impl HandlerError {
    /// Create a handler error.
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Attach identifying details.
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl From<CollabError> for HandlerError {
    fn from(e: CollabError) -> Self {
        Self {
            code: e.code(),
            message: e.to_string(),
            details: None,
        }
    }
}

/// Shared context handed to every handler invocation.
pub struct EventContext {
    /// Broadcast / unicast sender.
    pub emitter: Arc<EventEmitter>,
    /// Design-document source.
    pub design: Arc<dyn DesignSource>,
    /// Content-generation engine.
    pub generator: Arc<dyn ContentGenerator>,
}

/// Handler for rich-protocol events.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Process one event. `origin` is the connection the event arrived on;
    /// it must not be retained past this call.
    async fn handle(
        &self,
        event: &Envelope,
        origin: &Arc<ClientConnection>,
        ctx: &EventContext,
    ) -> Result<(), HandlerError>;
}

/// Handler for legacy `{type, payload}` messages.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Process one legacy message.
    async fn handle(
        &self,
        message: &LegacyMessage,
        origin: &Arc<ClientConnection>,
        ctx: &EventContext,
    ) -> Result<(), HandlerError>;
}

/// Event-type → ordered handler list, for both protocols.
pub struct HandlerTable {
    events: HashMap<EventType, Vec<Arc<dyn EventHandler>>>,
    messages: HashMap<String, Vec<Arc<dyn MessageHandler>>>,
}

impl HandlerTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            events: HashMap::new(),
            messages: HashMap::new(),
        }
    }

    /// Append a rich-protocol handler for an event type.
    pub fn register_event(&mut self, event_type: EventType, handler: impl EventHandler + 'static) {
        debug!(event_type = %event_type, "registered event handler");
        self.events
            .entry(event_type)
            .or_default()
            .push(Arc::new(handler));
    }

    /// Append a legacy-protocol handler for a message type.
    pub fn register_message(&mut self, message_type: &str, handler: impl MessageHandler + 'static) {
        debug!(message_type, "registered message handler");
        self.messages
            .entry(message_type.to_owned())
            .or_default()
            .push(Arc::new(handler));
    }

    /// Whether a legacy handler exists for a message type.
    pub fn has_message_handler(&self, message_type: &str) -> bool {
        self.messages
            .get(message_type)
            .is_some_and(|handlers| !handlers.is_empty())
    }

    /// Whether a rich handler exists for an event type.
    pub fn has_event_handler(&self, event_type: &EventType) -> bool {
        self.events
            .get(event_type)
            .is_some_and(|handlers| !handlers.is_empty())
    }

    /// Route one parsed frame to its handlers.
    pub async fn dispatch(
        &self,
        message: IncomingMessage,
        origin: &Arc<ClientConnection>,
        ctx: &EventContext,
    ) {
        let start = Instant::now();
        let type_label = match &message {
            IncomingMessage::Event(event) => event.event_type.as_str().to_owned(),
            IncomingMessage::Legacy(legacy) => legacy.message_type.clone(),
        };
        counter!(EVENTS_RECEIVED_TOTAL, "type" => type_label.clone()).increment(1);

        match message {
            IncomingMessage::Event(event) => self.dispatch_event(&event, origin, ctx).await,
            IncomingMessage::Legacy(legacy) => self.dispatch_legacy(&legacy, origin, ctx).await,
        }

        histogram!(DISPATCH_DURATION_SECONDS, "type" => type_label)
            .record(start.elapsed().as_secs_f64());
    }

    async fn dispatch_event(
        &self,
        event: &Envelope,
        origin: &Arc<ClientConnection>,
        ctx: &EventContext,
    ) {
        debug!(
            event_type = %event.event_type,
            correlation_id = %event.metadata.correlation_id,
            session_id = %event.metadata.session_id,
            "dispatching event"
        );

        let Some(handlers) = self.events.get(&event.event_type).filter(|h| !h.is_empty())
        else {
            warn!(event_type = %event.event_type, "no handlers registered for event type");
            counter!(EVENTS_ERRORS_TOTAL, "code" => "unknown_event_type").increment(1);
            let envelope = Envelope::error(
                "unknown_event_type",
                format!("No handlers registered for event type: {}", event.event_type),
                Some(event.metadata.correlation_id.clone()),
                Some(event.metadata.session_id.clone()),
                None,
            );
            ctx.emitter.emit_to(origin, &envelope).await;
            return;
        };

        for handler in handlers {
            if let Err(e) = handler.handle(event, origin, ctx).await {
                error!(
                    event_type = %event.event_type,
                    code = %e.code,
                    error = %e,
                    "error in event handler"
                );
                counter!(EVENTS_ERRORS_TOTAL, "code" => "handler_error").increment(1);
                let envelope = Envelope::error(
                    "handler_error",
                    format!("Error processing event {}: {e}", event.event_type),
                    Some(event.metadata.correlation_id.clone()),
                    Some(event.metadata.session_id.clone()),
                    e.details,
                );
                ctx.emitter.emit_to(origin, &envelope).await;
            }
        }
    }

    async fn dispatch_legacy(
        &self,
        message: &LegacyMessage,
        origin: &Arc<ClientConnection>,
        ctx: &EventContext,
    ) {
        let Some(handlers) = self
            .messages
            .get(&message.message_type)
            .filter(|h| !h.is_empty())
        else {
            warn!(message_type = %message.message_type, "unknown message type");
            counter!(EVENTS_ERRORS_TOTAL, "code" => "invalid_message").increment(1);
            let payload = ErrorPayload {
                code: "invalid_message".to_owned(),
                message: format!("Unknown message type: {}", message.message_type),
                details: None,
            };
            ctx.emitter
                .send_to_client(origin, EventType::Error.as_str(), payload.into_value())
                .await;
            return;
        };

        for handler in handlers {
            if let Err(e) = handler.handle(message, origin, ctx).await {
                error!(
                    message_type = %message.message_type,
                    code = %e.code,
                    error = %e,
                    "error in message handler"
                );
                counter!(EVENTS_ERRORS_TOTAL, "code" => "handler_error").increment(1);
                let payload = ErrorPayload {
                    code: "handler_error".to_owned(),
                    message: format!("Error processing message {}: {e}", message.message_type),
                    details: e.details,
                };
                ctx.emitter
                    .send_to_client(origin, EventType::Error.as_str(), payload.into_value())
                    .await;
            }
        }
    }
}

impl Default for HandlerTable {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

//! Envelope parsing, serialization, and construction.
//!
//! An incoming frame is routed to the rich protocol only when all three
//! top-level keys (`type`, `payload`, `metadata`) are present; a two-field
//! `{type, payload}` frame takes the legacy path. Metadata keys are
//! camelCase on the wire and snake_case internally.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use atelier_core::ids::{CorrelationId, SERVER_SESSION, SessionId};
use thiserror::Error;

use crate::payloads::ErrorPayload;
use crate::types::{EventSource, EventType};

/// Parse or validation failure for an incoming frame.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// The frame is not valid JSON, or not a JSON object.
    #[error("malformed envelope: {0}")]
    Malformed(String),
    /// A required top-level field is absent.
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    /// A `metadata` block is present but incomplete or ill-typed.
    #[error("invalid metadata: {0}")]
    Metadata(String),
}

/// Per-event metadata carried by the rich protocol.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventMetadata {
    /// ISO 8601 emission timestamp. Always stamped at emission time, never
    /// copied from a causing event.
    pub timestamp: String,
    /// Which side produced the event.
    pub source: EventSource,
    /// Links a request to every event it causes.
    pub correlation_id: CorrelationId,
    /// Scopes the interaction to one logical client session.
    pub session_id: SessionId,
}

impl EventMetadata {
    /// Server-side metadata with the current UTC timestamp.
    #[must_use]
    pub fn server(
        correlation_id: impl Into<CorrelationId>,
        session_id: impl Into<SessionId>,
    ) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            source: EventSource::Server,
            correlation_id: correlation_id.into(),
            session_id: session_id.into(),
        }
    }
}

/// A rich-protocol event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Event type tag.
    #[serde(rename = "type")]
    pub event_type: EventType,
    /// Type-specific payload, opaque at this layer.
    pub payload: Value,
    /// Correlation metadata.
    pub metadata: EventMetadata,
}

/// A legacy-protocol message: `{type, payload}` with no metadata.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LegacyMessage {
    /// Message type string.
    #[serde(rename = "type")]
    pub message_type: String,
    /// Type-specific payload.
    pub payload: Value,
}

impl LegacyMessage {
    /// Build a legacy message.
    #[must_use]
    pub fn new(message_type: impl Into<String>, payload: Value) -> Self {
        Self {
            message_type: message_type.into(),
            payload,
        }
    }

    /// Serialize to a wire frame.
    pub fn to_text(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// An incoming frame, discriminated by shape at parse time.
#[derive(Clone, Debug, PartialEq)]
pub enum IncomingMessage {
    /// Full envelope with metadata.
    Event(Envelope),
    /// Two-field legacy message.
    Legacy(LegacyMessage),
}

impl Envelope {
    /// Build a server-originated event with fresh metadata.
    #[must_use]
    pub fn new(
        event_type: EventType,
        payload: Value,
        correlation_id: impl Into<CorrelationId>,
        session_id: impl Into<SessionId>,
    ) -> Self {
        Self {
            event_type,
            payload,
            metadata: EventMetadata::server(correlation_id, session_id),
        }
    }

    /// Build an event caused by `self`: same correlation and session ids,
    /// fresh timestamp.
    #[must_use]
    pub fn reply(&self, event_type: EventType, payload: Value) -> Self {
        Self::new(
            event_type,
            payload,
            self.metadata.correlation_id.clone(),
            self.metadata.session_id.clone(),
        )
    }

    /// Build an ERROR event.
    ///
    /// Omitted ids fall back to a fresh random correlation id and the
    /// `server-session` sentinel so server-initiated errors stay traceable.
    #[must_use]
    pub fn error(
        code: impl Into<String>,
        message: impl Into<String>,
        correlation_id: Option<CorrelationId>,
        session_id: Option<SessionId>,
        details: Option<Value>,
    ) -> Self {
        let payload = ErrorPayload {
            code: code.into(),
            message: message.into(),
            details,
        };
        Self::new(
            EventType::Error,
            payload.into_value(),
            correlation_id.unwrap_or_default(),
            session_id.unwrap_or_else(|| SessionId::from(SERVER_SESSION)),
        )
    }

    /// Serialize to a wire frame. Lossless for round-tripping through
    /// [`parse`].
    pub fn to_text(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Parse a raw text frame into a rich event or a legacy message.
pub fn parse(raw: &str) -> Result<IncomingMessage, EnvelopeError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| EnvelopeError::Malformed(e.to_string()))?;
    let Some(object) = value.as_object() else {
        return Err(EnvelopeError::Malformed("not a JSON object".to_owned()));
    };

    match object.get("type") {
        None => return Err(EnvelopeError::MissingField("type")),
        Some(t) if !t.is_string() => {
            return Err(EnvelopeError::Malformed("`type` must be a string".to_owned()));
        }
        Some(_) => {}
    }
    if !object.contains_key("payload") {
        return Err(EnvelopeError::MissingField("payload"));
    }

    if object.contains_key("metadata") {
        let envelope: Envelope =
            serde_json::from_value(value).map_err(|e| EnvelopeError::Metadata(e.to_string()))?;
        Ok(IncomingMessage::Event(envelope))
    } else {
        let legacy: LegacyMessage =
            serde_json::from_value(value).map_err(|e| EnvelopeError::Malformed(e.to_string()))?;
        Ok(IncomingMessage::Legacy(legacy))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rich_frame() -> String {
        json!({
            "type": "UPDATE_NODE_REQUEST",
            "payload": {"nodeId": "1:2", "properties": {"width": 100}},
            "metadata": {
                "timestamp": "2025-06-01T12:00:00+00:00",
                "source": "plugin",
                "correlationId": "c1",
                "sessionId": "s1"
            }
        })
        .to_string()
    }

    // ── parse ────────────────────────────────────────────────────────

    #[test]
    fn parse_rich_frame() {
        let parsed = parse(&rich_frame()).unwrap();
        let IncomingMessage::Event(envelope) = parsed else {
            panic!("expected rich event");
        };
        assert_eq!(envelope.event_type, EventType::UpdateNodeRequest);
        assert_eq!(envelope.payload["nodeId"], "1:2");
        assert_eq!(envelope.metadata.correlation_id.as_str(), "c1");
        assert_eq!(envelope.metadata.session_id.as_str(), "s1");
        assert_eq!(envelope.metadata.source, EventSource::Plugin);
    }

    #[test]
    fn parse_legacy_frame() {
        let raw = json!({"type": "ECHO", "payload": {"text": "hi"}}).to_string();
        let parsed = parse(&raw).unwrap();
        let IncomingMessage::Legacy(message) = parsed else {
            panic!("expected legacy message");
        };
        assert_eq!(message.message_type, "ECHO");
        assert_eq!(message.payload["text"], "hi");
    }

    #[test]
    fn parse_invalid_json() {
        let err = parse("{bad").unwrap_err();
        assert!(matches!(err, EnvelopeError::Malformed(_)));
    }

    #[test]
    fn parse_non_object() {
        let err = parse("[1, 2, 3]").unwrap_err();
        assert!(matches!(err, EnvelopeError::Malformed(_)));
    }

    #[test]
    fn parse_missing_type() {
        let raw = json!({"payload": {}}).to_string();
        let err = parse(&raw).unwrap_err();
        assert!(matches!(err, EnvelopeError::MissingField("type")));
    }

    #[test]
    fn parse_missing_payload() {
        let raw = json!({"type": "PING"}).to_string();
        let err = parse(&raw).unwrap_err();
        assert!(matches!(err, EnvelopeError::MissingField("payload")));
    }

    #[test]
    fn parse_non_string_type() {
        let raw = json!({"type": 7, "payload": {}}).to_string();
        let err = parse(&raw).unwrap_err();
        assert!(matches!(err, EnvelopeError::Malformed(_)));
    }

    #[test]
    fn parse_metadata_missing_correlation_id() {
        let raw = json!({
            "type": "PING",
            "payload": {},
            "metadata": {
                "timestamp": "2025-06-01T12:00:00+00:00",
                "source": "plugin",
                "sessionId": "s1"
            }
        })
        .to_string();
        let err = parse(&raw).unwrap_err();
        assert!(matches!(err, EnvelopeError::Metadata(_)));
    }

    #[test]
    fn parse_metadata_missing_session_id() {
        let raw = json!({
            "type": "PING",
            "payload": {},
            "metadata": {
                "timestamp": "2025-06-01T12:00:00+00:00",
                "source": "plugin",
                "correlationId": "c1"
            }
        })
        .to_string();
        let err = parse(&raw).unwrap_err();
        assert!(matches!(err, EnvelopeError::Metadata(_)));
    }

    #[test]
    fn parse_unknown_rich_type_stays_typed() {
        let raw = json!({
            "type": "SOMETHING_NEW",
            "payload": {},
            "metadata": {
                "timestamp": "t",
                "source": "plugin",
                "correlationId": "c1",
                "sessionId": "s1"
            }
        })
        .to_string();
        let IncomingMessage::Event(envelope) = parse(&raw).unwrap() else {
            panic!("expected rich event");
        };
        assert_eq!(
            envelope.event_type,
            EventType::Custom("SOMETHING_NEW".into())
        );
    }

    // ── round trip ───────────────────────────────────────────────────

    #[test]
    fn serialize_parse_roundtrip() {
        let IncomingMessage::Event(original) = parse(&rich_frame()).unwrap() else {
            panic!("expected rich event");
        };
        let text = original.to_text().unwrap();
        let IncomingMessage::Event(back) = parse(&text).unwrap() else {
            panic!("expected rich event");
        };
        assert_eq!(back, original);
    }

    #[test]
    fn wire_field_names_are_camel_case() {
        let envelope = Envelope::new(EventType::Pong, json!({}), "c1", "s1");
        let value = serde_json::to_value(&envelope).unwrap();
        assert!(value.get("type").is_some());
        assert!(value["metadata"].get("correlationId").is_some());
        assert!(value["metadata"].get("sessionId").is_some());
        assert!(value["metadata"].get("correlation_id").is_none());
    }

    #[test]
    fn legacy_roundtrip() {
        let message = LegacyMessage::new("ECHO_RESPONSE", json!({"text": "hi"}));
        let text = message.to_text().unwrap();
        let IncomingMessage::Legacy(back) = parse(&text).unwrap() else {
            panic!("expected legacy message");
        };
        assert_eq!(back, message);
    }

    // ── factories ────────────────────────────────────────────────────

    #[test]
    fn new_stamps_server_source_and_timestamp() {
        let envelope = Envelope::new(EventType::Pong, json!({}), "c1", "s1");
        assert_eq!(envelope.metadata.source, EventSource::Server);
        assert!(!envelope.metadata.timestamp.is_empty());
        assert!(envelope.metadata.timestamp.contains('T'));
    }

    #[test]
    fn reply_carries_ids_with_fresh_timestamp() {
        let request = Envelope {
            event_type: EventType::UpdateNodeRequest,
            payload: json!({}),
            metadata: EventMetadata {
                timestamp: "2020-01-01T00:00:00+00:00".into(),
                source: EventSource::Plugin,
                correlation_id: "c1".into(),
                session_id: "s1".into(),
            },
        };
        let progress = request.reply(EventType::UpdateNodeProgress, json!({"status": "processing"}));
        assert_eq!(progress.metadata.correlation_id.as_str(), "c1");
        assert_eq!(progress.metadata.session_id.as_str(), "s1");
        assert_ne!(progress.metadata.timestamp, request.metadata.timestamp);
        assert_eq!(progress.metadata.source, EventSource::Server);
    }

    #[test]
    fn error_with_explicit_ids() {
        let envelope = Envelope::error(
            "handler_error",
            "boom",
            Some("c9".into()),
            Some("s9".into()),
            None,
        );
        assert_eq!(envelope.event_type, EventType::Error);
        assert_eq!(envelope.metadata.correlation_id.as_str(), "c9");
        assert_eq!(envelope.metadata.session_id.as_str(), "s9");
        assert_eq!(envelope.payload["code"], "handler_error");
        assert_eq!(envelope.payload["message"], "boom");
        assert!(envelope.payload.get("details").is_none());
    }

    #[test]
    fn error_defaults_generate_traceable_ids() {
        let envelope = Envelope::error("invalid_json", "bad frame", None, None, None);
        assert!(!envelope.metadata.correlation_id.as_str().is_empty());
        assert_eq!(envelope.metadata.session_id.as_str(), SERVER_SESSION);
    }

    #[test]
    fn error_details_carried_in_payload() {
        let envelope = Envelope::error(
            "update_error",
            "node vanished",
            None,
            None,
            Some(json!({"nodeId": "1:2"})),
        );
        assert_eq!(envelope.payload["details"]["nodeId"], "1:2");
    }

    #[test]
    fn fresh_errors_have_distinct_correlation_ids() {
        let a = Envelope::error("x", "m", None, None, None);
        let b = Envelope::error("x", "m", None, None, None);
        assert_ne!(a.metadata.correlation_id, b.metadata.correlation_id);
    }
}

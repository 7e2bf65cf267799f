//! Typed payloads for built-in events.
//!
//! Payloads are schema-free at the envelope layer; these structs give the
//! default handlers compile-time-safe access. Wire keys are camelCase.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Payload of an ERROR event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// Stable machine-readable code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Identifying fields from the causing request, when available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ErrorPayload {
    /// Convert into an opaque payload value.
    ///
    /// Serialization of this shape cannot fail, so the fallible serde
    /// result is collapsed here rather than at every call site.
    #[must_use]
    pub fn into_value(self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| Value::Null)
    }
}

/// Payload of an `UPDATE_NODE_REQUEST` event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNodeRequest {
    /// Target node.
    pub node_id: String,
    /// Properties to apply.
    pub properties: Value,
}

/// Payload of an `UPDATE_NODE_COMPLETE` event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNodeComplete {
    /// Target node.
    pub node_id: String,
    /// Whether the update was applied.
    pub success: bool,
    /// Properties as applied.
    pub updated_properties: Value,
}

impl UpdateNodeComplete {
    /// Convert into an opaque payload value.
    #[must_use]
    pub fn into_value(self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| Value::Null)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn error_payload_omits_empty_details() {
        let payload = ErrorPayload {
            code: "invalid_json".into(),
            message: "Invalid JSON format".into(),
            details: None,
        };
        let value = payload.into_value();
        assert_eq!(value["code"], "invalid_json");
        assert!(value.get("details").is_none());
    }

    #[test]
    fn error_payload_keeps_details() {
        let payload = ErrorPayload {
            code: "update_error".into(),
            message: "failed".into(),
            details: Some(json!({"nodeId": "1:2"})),
        };
        let value = payload.into_value();
        assert_eq!(value["details"]["nodeId"], "1:2");
    }

    #[test]
    fn update_request_from_camel_case_wire() {
        let value = json!({"nodeId": "1:2", "properties": {"width": 100}});
        let request: UpdateNodeRequest = serde_json::from_value(value).unwrap();
        assert_eq!(request.node_id, "1:2");
        assert_eq!(request.properties["width"], 100);
    }

    #[test]
    fn update_request_rejects_missing_node_id() {
        let value = json!({"properties": {}});
        let result = serde_json::from_value::<UpdateNodeRequest>(value);
        assert!(result.is_err());
    }

    #[test]
    fn update_complete_wire_keys() {
        let payload = UpdateNodeComplete {
            node_id: "1:2".into(),
            success: true,
            updated_properties: json!({"width": 100}),
        };
        let value = payload.into_value();
        assert_eq!(value["nodeId"], "1:2");
        assert_eq!(value["success"], true);
        assert_eq!(value["updatedProperties"]["width"], 100);
        assert!(value.get("node_id").is_none());
    }
}

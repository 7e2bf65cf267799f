//! External collaborator traits.
//!
//! The hub core never talks to the design API or the generation backend
//! directly — it goes through these seams, which keeps the dispatch path
//! testable with in-process fakes and the real clients swappable.

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::CollabError;

/// Read access to the design document source.
#[async_trait]
pub trait DesignSource: Send + Sync {
    /// Fetch a structured document for a resource id.
    ///
    /// The id is either a file key (`"a1b2c3"`) or a file-scoped node
    /// reference (`"a1b2c3:4:56"`).
    async fn get_resource(&self, id: &str) -> Result<Value, CollabError>;
}

/// The content-generation engine behind long-running requests.
///
/// Calls may take seconds; the hub invokes them only from inside a
/// request-lifecycle handler so other connections stay serviced.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Run a generation request, optionally constrained by a JSON schema.
    async fn run(&self, request: &Value, schema: Option<&Value>) -> Result<Value, CollabError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct FixedSource;

    #[async_trait]
    impl DesignSource for FixedSource {
        async fn get_resource(&self, id: &str) -> Result<Value, CollabError> {
            Ok(json!({"id": id, "name": "Frame"}))
        }
    }

    struct EchoGenerator;

    #[async_trait]
    impl ContentGenerator for EchoGenerator {
        async fn run(
            &self,
            request: &Value,
            schema: Option<&Value>,
        ) -> Result<Value, CollabError> {
            Ok(json!({"request": request, "constrained": schema.is_some()}))
        }
    }

    #[tokio::test]
    async fn design_source_object_safe() {
        let source: Box<dyn DesignSource> = Box::new(FixedSource);
        let doc = source.get_resource("key:1:2").await.unwrap();
        assert_eq!(doc["id"], "key:1:2");
    }

    #[tokio::test]
    async fn generator_object_safe() {
        let generator: Box<dyn ContentGenerator> = Box::new(EchoGenerator);
        let out = generator.run(&json!({"x": 1}), None).await.unwrap();
        assert_eq!(out["request"]["x"], 1);
        assert_eq!(out["constrained"], false);
    }

    #[tokio::test]
    async fn generator_sees_schema() {
        let generator = EchoGenerator;
        let schema = json!({"type": "object"});
        let out = generator.run(&json!({}), Some(&schema)).await.unwrap();
        assert_eq!(out["constrained"], true);
    }
}

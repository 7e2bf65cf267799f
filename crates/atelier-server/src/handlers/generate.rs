//! Code-generation request lifecycle.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use atelier_events::types::LifecycleDomain;
use atelier_events::Envelope;

use crate::connection::ClientConnection;
use crate::dispatch::{EventContext, EventHandler, HandlerError};
use crate::handlers::lifecycle::Lifecycle;

/// Handles `GENERATE_CODE_REQUEST`: progress, then the content-generation
/// collaborator (potentially seconds-slow), then completion or a generic
/// ERROR carrying the target node in `details`.
pub struct GenerateCodeHandler;

#[async_trait]
impl EventHandler for GenerateCodeHandler {
    async fn handle(
        &self,
        event: &Envelope,
        _origin: &Arc<ClientConnection>,
        ctx: &EventContext,
    ) -> Result<(), HandlerError> {
        let node_id = event
            .payload
            .get("nodeId")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_owned();
        info!(node_id, "generate code request received");

        let lifecycle = Lifecycle::begin(LifecycleDomain::GenerateCode, event, &ctx.emitter);
        lifecycle
            .progress(json!({
                "nodeId": node_id,
                "status": "processing",
                "message": "Generating code",
            }))
            .await;

        // The generation call is the slow part; only this request's
        // dispatch waits on it.
        let schema = event.payload.get("schema").cloned();
        match ctx.generator.run(&event.payload, schema.as_ref()).await {
            Ok(result) => {
                lifecycle
                    .complete(json!({"nodeId": node_id, "result": result}))
                    .await;
                info!(node_id, "code generation completed");
            }
            Err(e) => {
                lifecycle
                    .fail(
                        "generation_error",
                        format!("Error generating code: {e}"),
                        Some(json!({"nodeId": node_id})),
                    )
                    .await;
            }
        }
        Ok(())
    }
}

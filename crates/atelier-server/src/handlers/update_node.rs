//! Node-update request lifecycle.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::info;

use atelier_events::payloads::{UpdateNodeComplete, UpdateNodeRequest};
use atelier_events::types::LifecycleDomain;
use atelier_events::Envelope;

use crate::connection::ClientConnection;
use crate::dispatch::{EventContext, EventHandler, HandlerError};
use crate::handlers::lifecycle::Lifecycle;

/// Handles `UPDATE_NODE_REQUEST`: progress, then completion with the
/// applied properties.
///
/// The mutation itself is applied by the plugin on its side of the socket;
/// the hub validates the request, acknowledges it, and fans the result out
/// to every observer.
pub struct UpdateNodeHandler;

#[async_trait]
impl EventHandler for UpdateNodeHandler {
    async fn handle(
        &self,
        event: &Envelope,
        _origin: &Arc<ClientConnection>,
        ctx: &EventContext,
    ) -> Result<(), HandlerError> {
        let lifecycle = Lifecycle::begin(LifecycleDomain::UpdateNode, event, &ctx.emitter);

        let request: UpdateNodeRequest = match serde_json::from_value(event.payload.clone()) {
            Ok(request) => request,
            Err(e) => {
                let node_id = event.payload.get("nodeId").cloned().unwrap_or(Value::Null);
                lifecycle
                    .fail(
                        "update_error",
                        format!("Error updating node: {e}"),
                        Some(json!({"nodeId": node_id})),
                    )
                    .await;
                return Ok(());
            }
        };

        info!(node_id = %request.node_id, "update node request received");
        lifecycle
            .progress(json!({
                "nodeId": request.node_id,
                "status": "processing",
                "message": "Processing update request",
            }))
            .await;

        let result = UpdateNodeComplete {
            node_id: request.node_id.clone(),
            success: true,
            updated_properties: request.properties,
        };
        lifecycle.complete(result.into_value()).await;
        info!(node_id = %request.node_id, "node update completed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_events::EventType;

    use crate::handlers::test_support::{make_ctx, make_peer, next_json, plugin_event, StaticGenerator};

    #[tokio::test]
    async fn progress_then_complete_in_order() {
        let (ctx, registry) = make_ctx(Arc::new(StaticGenerator));
        let (origin, mut rx) = make_peer(&registry, "plugin").await;

        let request = plugin_event(
            EventType::UpdateNodeRequest,
            json!({"nodeId": "1:2", "properties": {"width": 100}}),
        );
        UpdateNodeHandler.handle(&request, &origin, &ctx).await.unwrap();

        let progress = next_json(&mut rx).await;
        assert_eq!(progress["type"], "UPDATE_NODE_PROGRESS");
        assert_eq!(progress["payload"]["nodeId"], "1:2");
        assert_eq!(progress["payload"]["status"], "processing");
        assert_eq!(progress["metadata"]["correlationId"], "c1");

        let complete = next_json(&mut rx).await;
        assert_eq!(complete["type"], "UPDATE_NODE_COMPLETE");
        assert_eq!(complete["payload"]["nodeId"], "1:2");
        assert_eq!(complete["payload"]["success"], true);
        assert_eq!(complete["payload"]["updatedProperties"]["width"], 100);
        assert_eq!(complete["metadata"]["correlationId"], "c1");
    }

    #[tokio::test]
    async fn malformed_payload_emits_domain_error() {
        let (ctx, registry) = make_ctx(Arc::new(StaticGenerator));
        let (origin, mut rx) = make_peer(&registry, "plugin").await;

        // Missing `properties`
        let request = plugin_event(EventType::UpdateNodeRequest, json!({"nodeId": "1:2"}));
        UpdateNodeHandler.handle(&request, &origin, &ctx).await.unwrap();

        let error = next_json(&mut rx).await;
        assert_eq!(error["type"], "UPDATE_NODE_ERROR");
        assert_eq!(error["payload"]["code"], "update_error");
        assert_eq!(error["payload"]["details"]["nodeId"], "1:2");
        assert_eq!(error["metadata"]["correlationId"], "c1");
    }

    #[tokio::test]
    async fn lifecycle_visible_to_every_observer() {
        let (ctx, registry) = make_ctx(Arc::new(StaticGenerator));
        let (origin, mut rx_origin) = make_peer(&registry, "plugin").await;
        let (_other, mut rx_other) = make_peer(&registry, "observer").await;

        let request = plugin_event(
            EventType::UpdateNodeRequest,
            json!({"nodeId": "9:9", "properties": {}}),
        );
        UpdateNodeHandler.handle(&request, &origin, &ctx).await.unwrap();

        for rx in [&mut rx_origin, &mut rx_other] {
            assert_eq!(next_json(rx).await["type"], "UPDATE_NODE_PROGRESS");
            assert_eq!(next_json(rx).await["type"], "UPDATE_NODE_COMPLETE");
        }
    }
}

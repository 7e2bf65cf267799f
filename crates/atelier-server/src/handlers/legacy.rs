//! Legacy request/response pairs.
//!
//! Each registered pair maps one inbound type to one reply type on the
//! same connection (`ANALYZE_DESIGN → ANALYSIS_RESULT`,
//! `GENERATE_CODE → CODE_GENERATED`, …). The work is delegated to the
//! content-generation collaborator; its failures propagate as handler
//! errors and surface to the origin as a legacy ERROR message.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use atelier_events::{EventType, LegacyMessage};

use crate::connection::ClientConnection;
use crate::dispatch::{EventContext, HandlerError, MessageHandler};

/// One legacy request/response pair backed by the generation collaborator.
pub struct RequestReplyHandler {
    operation: &'static str,
    reply_type: EventType,
}

impl RequestReplyHandler {
    /// Create a pair handler for `operation`, replying with `reply_type`.
    #[must_use]
    pub fn new(operation: &'static str, reply_type: EventType) -> Self {
        Self {
            operation,
            reply_type,
        }
    }
}

#[async_trait]
impl MessageHandler for RequestReplyHandler {
    async fn handle(
        &self,
        message: &LegacyMessage,
        origin: &Arc<ClientConnection>,
        ctx: &EventContext,
    ) -> Result<(), HandlerError> {
        debug!(operation = self.operation, "legacy request received");
        let request = json!({
            "operation": self.operation,
            "request": message.payload,
        });
        let result = ctx.generator.run(&request, None).await?;
        ctx.emitter
            .send_to_client(origin, self.reply_type.as_str(), result)
            .await;
        Ok(())
    }
}

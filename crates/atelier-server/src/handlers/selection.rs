//! Selection-change observers.
//!
//! The hub does not act on selection events; it records them for
//! observability, matching the plugin's fire-and-forget semantics.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use atelier_events::Envelope;

use crate::connection::ClientConnection;
use crate::dispatch::{EventContext, EventHandler, HandlerError};

/// Logs selection changes (`SELECTION_CHANGE`, `MULTI_SELECTION`).
pub struct SelectionObserver;

#[async_trait]
impl EventHandler for SelectionObserver {
    async fn handle(
        &self,
        event: &Envelope,
        _origin: &Arc<ClientConnection>,
        _ctx: &EventContext,
    ) -> Result<(), HandlerError> {
        let node_count = event
            .payload
            .get("nodes")
            .and_then(|v| v.as_array())
            .map_or_else(
                || usize::from(event.payload.get("nodeId").is_some()),
                Vec::len,
            );
        info!(
            event_type = %event.event_type,
            session_id = %event.metadata.session_id,
            node_count,
            "selection changed"
        );
        Ok(())
    }
}

//! Request-lifecycle emission.
//!
//! A long-running operation is reported as PROGRESS immediately, then
//! COMPLETE or the domain's ERROR type once the work finishes. Every
//! emitted event carries the causing request's correlation and session ids
//! and is broadcast to all connections — several observers may be watching
//! the same session.

use serde_json::Value;
use tracing::debug;

use atelier_events::payloads::ErrorPayload;
use atelier_events::types::LifecycleDomain;
use atelier_events::Envelope;

use crate::emitter::EventEmitter;

/// Emission helper scoped to one request.
pub struct Lifecycle<'a> {
    domain: LifecycleDomain,
    request: &'a Envelope,
    emitter: &'a EventEmitter,
}

impl<'a> Lifecycle<'a> {
    /// Start a lifecycle for a request event.
    #[must_use]
    pub fn begin(domain: LifecycleDomain, request: &'a Envelope, emitter: &'a EventEmitter) -> Self {
        Self {
            domain,
            request,
            emitter,
        }
    }

    /// Broadcast a PROGRESS event.
    pub async fn progress(&self, payload: Value) {
        let event = self.request.reply(self.domain.progress(), payload);
        self.emitter.emit(&event).await;
    }

    /// Broadcast the COMPLETE event.
    pub async fn complete(&self, payload: Value) {
        debug!(
            correlation_id = %self.request.metadata.correlation_id,
            "lifecycle complete"
        );
        let event = self.request.reply(self.domain.complete(), payload);
        self.emitter.emit(&event).await;
    }

    /// Broadcast the failure event for this domain.
    ///
    /// `details` should carry identifying fields from the request payload
    /// so clients can attribute the failure even when correlation ids are
    /// not surfaced in their UI.
    pub async fn fail(&self, code: &str, message: impl Into<String>, details: Option<Value>) {
        let payload = ErrorPayload {
            code: code.to_owned(),
            message: message.into(),
            details,
        };
        let event = self
            .request
            .reply(self.domain.error(), payload.into_value());
        self.emitter.emit(&event).await;
    }
}

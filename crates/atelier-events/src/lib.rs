//! # atelier-events
//!
//! The wire protocol between the design-tool plugin and the hub.
//!
//! Two coexisting message shapes travel over one socket:
//!
//! - **Legacy**: `{type, payload}` — simple request/response pairs.
//! - **Rich**: `{type, payload, metadata}` — lifecycle events carrying a
//!   correlation id and session id so multi-part sequences (request →
//!   progress → complete/error) can be stitched together client-side.
//!
//! [`parse`] discriminates the two at the top level; [`Envelope`] and
//! [`LegacyMessage`] round-trip losslessly through serde.

#![deny(unsafe_code)]

pub mod envelope;
pub mod payloads;
pub mod types;

pub use envelope::{
    Envelope, EnvelopeError, EventMetadata, IncomingMessage, LegacyMessage, parse,
};
pub use payloads::{ErrorPayload, UpdateNodeComplete, UpdateNodeRequest};
pub use types::{EventSource, EventType, LifecycleDomain};

/// Wire protocol version advertised in the WELCOME message.
pub const PROTOCOL_VERSION: &str = "1.0";

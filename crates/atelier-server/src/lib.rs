//! # atelier-server
//!
//! The event-driven connection hub between the design-tool plugin and the
//! backend:
//!
//! - Connection registry with broadcast fan-out and dead-peer pruning
//! - Handler dispatch table serving two coexisting protocols (rich typed
//!   envelopes and legacy `{type, payload}` messages)
//! - Server loop: accept, per-connection read/write tasks, welcome,
//!   graceful stop/restart
//! - Default handlers: keepalive, node-update and code-generation
//!   lifecycles, selection observers
//! - Prometheus metrics via the `metrics` facade

#![deny(unsafe_code)]

pub mod connection;
pub mod dispatch;
pub mod emitter;
pub mod handlers;
pub mod metrics;
pub mod registry;
pub mod server;
pub mod shutdown;

pub use connection::ClientConnection;
pub use dispatch::{EventContext, EventHandler, HandlerError, HandlerTable, MessageHandler};
pub use emitter::EventEmitter;
pub use registry::ConnectionRegistry;
pub use server::{HubError, HubServer, HubState};

/// Greeting carried by the WELCOME message sent on every new connection.
pub const WELCOME_MESSAGE: &str = "Connected to Atelier WebSocket hub";

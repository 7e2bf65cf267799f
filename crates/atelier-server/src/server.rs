//! `HubServer` — accept loop, per-connection tasks, and lifecycle.
//!
//! One task per connection for reads, one for writes; dispatch runs on the
//! reader task so frames from a single connection are processed in arrival
//! order, while the writer's queue serializes sends. `stop()` cancels the
//! shared token, drains connection tasks within a bounded grace period,
//! and leaves the hub restartable.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use metrics::{counter, gauge};
use parking_lot::Mutex;
use serde_json::{Value, json};
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use atelier_core::collab::{ContentGenerator, DesignSource};
use atelier_core::ids::ConnectionId;
use atelier_events::payloads::ErrorPayload;
use atelier_events::{Envelope, EnvelopeError, EventType, LegacyMessage, PROTOCOL_VERSION, parse};
use atelier_settings::ServerSettings;

use crate::WELCOME_MESSAGE;
use crate::connection::ClientConnection;
use crate::dispatch::{EventContext, HandlerTable};
use crate::emitter::EventEmitter;
use crate::metrics::{
    EVENTS_ERRORS_TOTAL, WS_CONNECTIONS_ACTIVE, WS_CONNECTIONS_TOTAL, WS_DISCONNECTIONS_TOTAL,
};
use crate::registry::ConnectionRegistry;
use crate::shutdown::ShutdownCoordinator;

/// Server lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HubState {
    /// Not listening.
    Stopped,
    /// Binding the listener.
    Starting,
    /// Accepting and serving connections.
    Running,
    /// Draining connections after a stop request.
    Stopping,
}

/// Fatal hub error. Only failing to bind the listener aborts startup.
#[derive(Debug, Error)]
pub enum HubError {
    /// The listener could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// The address that could not be bound.
        addr: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

/// Shared state cloned into every connection task.
#[derive(Clone)]
struct ServeShared {
    registry: Arc<ConnectionRegistry>,
    handlers: Arc<HandlerTable>,
    ctx: Arc<EventContext>,
    queue_depth: usize,
}

/// The WebSocket connection hub.
pub struct HubServer {
    settings: ServerSettings,
    registry: Arc<ConnectionRegistry>,
    emitter: Arc<EventEmitter>,
    handlers: Arc<HandlerTable>,
    ctx: Arc<EventContext>,
    shutdown: ShutdownCoordinator,
    state: Mutex<HubState>,
    local_addr: Mutex<Option<SocketAddr>>,
    accept_handle: Mutex<Option<JoinHandle<()>>>,
}

impl HubServer {
    /// Create a hub with a handler table and its external collaborators.
    pub fn new(
        settings: ServerSettings,
        handlers: HandlerTable,
        design: Arc<dyn DesignSource>,
        generator: Arc<dyn ContentGenerator>,
    ) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let emitter = Arc::new(EventEmitter::new(registry.clone()));
        let ctx = Arc::new(EventContext {
            emitter: emitter.clone(),
            design,
            generator,
        });
        Self {
            settings,
            registry,
            emitter,
            handlers: Arc::new(handlers),
            ctx,
            shutdown: ShutdownCoordinator::new(),
            state: Mutex::new(HubState::Stopped),
            local_addr: Mutex::new(None),
            accept_handle: Mutex::new(None),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> HubState {
        *self.state.lock()
    }

    /// The connection registry.
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// The send-primitive emitter.
    pub fn emitter(&self) -> &Arc<EventEmitter> {
        &self.emitter
    }

    /// The bound address while running.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock()
    }

    /// Bind and begin accepting connections.
    ///
    /// `port` overrides the configured port. Calling `start` on a hub that
    /// is already running logs a warning and returns the existing address
    /// without side effects. Binding failure is fatal and surfaces as
    /// [`HubError::Bind`].
    pub async fn start(&self, port: Option<u16>) -> Result<SocketAddr, HubError> {
        {
            let mut state = self.state.lock();
            if *state != HubState::Stopped {
                warn!(state = ?*state, "hub is already running");
                let addr = (*self.local_addr.lock())
                    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 0)));
                return Ok(addr);
            }
            *state = HubState::Starting;
        }

        let port = port.unwrap_or(self.settings.port);
        let bind_addr = format!("{}:{port}", self.settings.host);
        let listener = match TcpListener::bind(&bind_addr).await {
            Ok(listener) => listener,
            Err(e) => {
                *self.state.lock() = HubState::Stopped;
                return Err(HubError::Bind {
                    addr: bind_addr,
                    source: e,
                });
            }
        };
        let local = match listener.local_addr() {
            Ok(addr) => addr,
            Err(e) => {
                *self.state.lock() = HubState::Stopped;
                return Err(HubError::Bind {
                    addr: bind_addr,
                    source: e,
                });
            }
        };

        self.shutdown.reset();
        let token = self.shutdown.token();
        let shared = ServeShared {
            registry: self.registry.clone(),
            handlers: self.handlers.clone(),
            ctx: self.ctx.clone(),
            queue_depth: self.settings.send_queue_depth,
        };
        let grace = Duration::from_secs(self.settings.shutdown_grace_secs);
        let handle = tokio::spawn(accept_loop(listener, shared, token, grace));

        *self.local_addr.lock() = Some(local);
        *self.accept_handle.lock() = Some(handle);
        *self.state.lock() = HubState::Running;
        info!(addr = %local, "hub listening");
        Ok(local)
    }

    /// Stop accepting, close every connection, and wait (bounded) for the
    /// serve loop to terminate. Safe to call from any task; calling `stop`
    /// on a hub that is not running logs a warning and returns.
    pub async fn stop(&self) {
        {
            let mut state = self.state.lock();
            if *state != HubState::Running {
                warn!(state = ?*state, "hub is not running");
                return;
            }
            *state = HubState::Stopping;
        }
        info!("stopping hub");
        self.shutdown.shutdown();

        let handle = self.accept_handle.lock().take();
        if let Some(handle) = handle {
            let wait = Duration::from_secs(self.settings.shutdown_grace_secs + 1);
            if tokio::time::timeout(wait, handle).await.is_err() {
                warn!("accept loop did not terminate within the grace period");
            }
        }

        let closed = self.registry.clear().await;
        gauge!(WS_CONNECTIONS_ACTIVE).set(0.0);
        *self.local_addr.lock() = None;
        *self.state.lock() = HubState::Stopped;
        info!(closed_connections = closed, "hub stopped");
    }

    /// Send a legacy `{type, payload}` message to every connection.
    pub async fn broadcast(&self, message_type: &str, payload: Value) {
        self.emitter.broadcast(message_type, payload).await;
    }

    /// Send a legacy `{type, payload}` message to one connection.
    pub async fn send_to_client(
        &self,
        connection: &Arc<ClientConnection>,
        message_type: &str,
        payload: Value,
    ) {
        self.emitter
            .send_to_client(connection, message_type, payload)
            .await;
    }

    /// Broadcast a rich envelope to every connection.
    pub async fn emit(&self, envelope: &Envelope) {
        self.emitter.emit(envelope).await;
    }
}

/// Accept connections until cancelled, then drain connection tasks.
async fn accept_loop(
    listener: TcpListener,
    shared: ServeShared,
    token: CancellationToken,
    grace: Duration,
) {
    let mut tasks: Vec<JoinHandle<()>> = Vec::new();
    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    tasks.retain(|handle| !handle.is_finished());
                    tasks.push(tokio::spawn(serve_connection(
                        stream,
                        peer,
                        shared.clone(),
                        token.clone(),
                    )));
                }
                Err(e) => warn!(error = %e, "failed to accept connection"),
            },
            () = token.cancelled() => break,
        }
    }
    drop(listener);
    ShutdownCoordinator::drain(tasks, Some(grace)).await;
}

/// Serve one connection: handshake, welcome, then the receive loop.
async fn serve_connection(
    stream: TcpStream,
    peer: SocketAddr,
    shared: ServeShared,
    token: CancellationToken,
) {
    let ws = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!(%peer, error = %e, "websocket handshake failed");
            return;
        }
    };
    let (mut sink, mut stream) = ws.split();
    let (tx, mut rx) = mpsc::channel::<Arc<String>>(shared.queue_depth);
    let connection = Arc::new(ClientConnection::new(ConnectionId::new(), Some(peer), tx));
    shared.registry.add(connection.clone()).await;
    counter!(WS_CONNECTIONS_TOTAL).increment(1);
    gauge!(WS_CONNECTIONS_ACTIVE).increment(1.0);
    info!(conn_id = %connection.id, %peer, "client connected");

    // Single writer task per socket: sends stay serialized per connection.
    let writer_token = token.clone();
    let writer = tokio::spawn(async move {
        loop {
            tokio::select! {
                frame = rx.recv() => match frame {
                    Some(frame) => {
                        if sink.send(Message::text((*frame).clone())).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                },
                () = writer_token.cancelled() => {
                    let _ = sink.send(Message::Close(None)).await;
                    break;
                }
            }
        }
    });

    let welcome = LegacyMessage::new(
        EventType::Welcome.as_str(),
        json!({
            "message": WELCOME_MESSAGE,
            "version": PROTOCOL_VERSION,
        }),
    );
    if let Ok(text) = welcome.to_text() {
        let _ = connection.send(Arc::new(text));
    }

    loop {
        tokio::select! {
            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    handle_frame(text.as_str(), &connection, &shared).await;
                }
                Some(Ok(Message::Close(_))) | None => break,
                // Binary and protocol-level ping/pong frames are ignored.
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(conn_id = %connection.id, error = %e, "websocket read error");
                    break;
                }
            },
            () = token.cancelled() => break,
        }
    }

    shared.registry.remove(&connection.id).await;
    counter!(WS_DISCONNECTIONS_TOTAL).increment(1);
    gauge!(WS_CONNECTIONS_ACTIVE).decrement(1.0);
    info!(conn_id = %connection.id, "client disconnected");
    writer.abort();
}

/// Parse one text frame and dispatch it; parse failures are reported to
/// the connection and never close it.
async fn handle_frame(raw: &str, connection: &Arc<ClientConnection>, shared: &ServeShared) {
    match parse(raw) {
        Ok(message) => {
            shared
                .handlers
                .dispatch(message, connection, &shared.ctx)
                .await;
        }
        Err(e) => {
            warn!(conn_id = %connection.id, error = %e, "failed to parse frame");
            counter!(EVENTS_ERRORS_TOTAL, "code" => "invalid_json").increment(1);
            let message = match &e {
                EnvelopeError::Malformed(_) => "Invalid JSON format".to_owned(),
                other => other.to_string(),
            };
            let payload = ErrorPayload {
                code: "invalid_json".to_owned(),
                message,
                details: None,
            };
            shared
                .ctx
                .emitter
                .send_to_client(connection, EventType::Error.as_str(), payload.into_value())
                .await;
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

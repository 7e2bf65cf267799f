//! Per-socket connection handle.
//!
//! A [`ClientConnection`] is owned by the hub for the socket's lifetime and
//! referenced (never owned) by handler code. Outbound frames go through a
//! bounded queue drained by a single writer task per socket, which is what
//! serializes sends per connection.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tokio::sync::mpsc;

use atelier_core::ids::ConnectionId;

/// A connected WebSocket peer.
pub struct ClientConnection {
    /// Unique connection ID.
    pub id: ConnectionId,
    /// Remote address, when known.
    pub remote_addr: Option<SocketAddr>,
    /// Send channel to the connection's writer task.
    tx: mpsc::Sender<Arc<String>>,
    /// When this connection was established.
    pub connected_at: Instant,
    /// Count of frames dropped due to a full or closed queue.
    pub dropped_frames: AtomicU64,
}

impl ClientConnection {
    /// Create a new connection handle.
    pub fn new(id: ConnectionId, remote_addr: Option<SocketAddr>, tx: mpsc::Sender<Arc<String>>) -> Self {
        Self {
            id,
            remote_addr,
            tx,
            connected_at: Instant::now(),
            dropped_frames: AtomicU64::new(0),
        }
    }

    /// Queue a text frame for the writer task.
    ///
    /// Returns `false` if the queue is full or closed, and increments the
    /// dropped-frame counter.
    pub fn send(&self, frame: Arc<String>) -> bool {
        if self.tx.try_send(frame).is_ok() {
            true
        } else {
            let _ = self.dropped_frames.fetch_add(1, Ordering::Relaxed);
            false
        }
    }

    /// Serialize a JSON value and queue it.
    pub fn send_json(&self, value: &serde_json::Value) -> bool {
        match serde_json::to_string(value) {
            Ok(json) => self.send(Arc::new(json)),
            Err(_) => false,
        }
    }

    /// Total frames dropped for this connection.
    pub fn drop_count(&self) -> u64 {
        self.dropped_frames.load(Ordering::Relaxed)
    }

    /// Connection age.
    pub fn age(&self) -> Duration {
        self.connected_at.elapsed()
    }
}

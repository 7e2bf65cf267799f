//! Authoritative set of reachable peers.
//!
//! Mutated only by the hub: insert on connect, remove on disconnect, error,
//! or send failure. Reads take a snapshot so broadcast can iterate while
//! connection tasks add and remove concurrently.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use metrics::counter;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use atelier_core::ids::ConnectionId;

use crate::connection::ClientConnection;
use crate::metrics::BROADCAST_DROPS_TOTAL;

/// Live-connection registry.
pub struct ConnectionRegistry {
    /// Connected peers indexed by connection ID.
    connections: RwLock<HashMap<ConnectionId, Arc<ClientConnection>>>,
    /// Atomic count (avoids read-locking for count queries).
    active_count: AtomicUsize,
}

impl ConnectionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            active_count: AtomicUsize::new(0),
        }
    }

    /// Add a connection. Re-adding the same ID replaces the old handle.
    pub async fn add(&self, connection: Arc<ClientConnection>) {
        let mut connections = self.connections.write().await;
        if connections
            .insert(connection.id.clone(), connection)
            .is_none()
        {
            let _ = self.active_count.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Remove a connection by ID. Removing an absent ID is a no-op.
    pub async fn remove(&self, id: &ConnectionId) {
        let mut connections = self.connections.write().await;
        if connections.remove(id).is_some() {
            let _ = self.active_count.fetch_sub(1, Ordering::Relaxed);
        }
    }

    /// Point-in-time snapshot of all live connections.
    pub async fn snapshot(&self) -> Vec<Arc<ClientConnection>> {
        self.connections.read().await.values().cloned().collect()
    }

    /// Number of live connections.
    pub fn count(&self) -> usize {
        self.active_count.load(Ordering::Relaxed)
    }

    /// Whether no peers are connected.
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Remove every connection. Returns how many were removed.
    pub async fn clear(&self) -> usize {
        let mut connections = self.connections.write().await;
        let removed = connections.len();
        connections.clear();
        self.active_count.store(0, Ordering::Relaxed);
        removed
    }

    /// Deliver one serialized frame to every live connection.
    ///
    /// A failed send removes that connection from the registry; it never
    /// prevents delivery to the remaining connections. Returns the number
    /// of successful deliveries.
    pub async fn fan_out(&self, frame: &Arc<String>) -> usize {
        let mut to_remove = Vec::new();
        let mut delivered = 0usize;
        {
            let connections = self.connections.read().await;
            for connection in connections.values() {
                if connection.send(Arc::clone(frame)) {
                    delivered += 1;
                } else {
                    counter!(BROADCAST_DROPS_TOTAL).increment(1);
                    warn!(conn_id = %connection.id, "failed to send frame, removing connection");
                    to_remove.push(connection.id.clone());
                }
            }
            debug!(delivered, dropped = to_remove.len(), "fan-out complete");
        }
        if !to_remove.is_empty() {
            let mut connections = self.connections.write().await;
            for id in &to_remove {
                if connections.remove(id).is_some() {
                    let _ = self.active_count.fetch_sub(1, Ordering::Relaxed);
                }
            }
        }
        delivered
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn make_connection(id: &str) -> (Arc<ClientConnection>, mpsc::Receiver<Arc<String>>) {
        let (tx, rx) = mpsc::channel(32);
        let conn = ClientConnection::new(ConnectionId::from(id), None, tx);
        (Arc::new(conn), rx)
    }

    #[tokio::test]
    async fn add_connection() {
        let registry = ConnectionRegistry::new();
        let (conn, _rx) = make_connection("c1");
        registry.add(conn).await;
        assert_eq!(registry.count(), 1);
        assert!(!registry.is_empty());
    }

    #[tokio::test]
    async fn remove_connection() {
        let registry = ConnectionRegistry::new();
        let (conn, _rx) = make_connection("c1");
        registry.add(conn).await;
        registry.remove(&ConnectionId::from("c1")).await;
        assert_eq!(registry.count(), 0);
    }

    #[tokio::test]
    async fn remove_absent_is_noop() {
        let registry = ConnectionRegistry::new();
        registry.remove(&ConnectionId::from("no_such")).await;
        assert_eq!(registry.count(), 0);
    }

    #[tokio::test]
    async fn remove_twice_is_noop() {
        let registry = ConnectionRegistry::new();
        let (conn, _rx) = make_connection("c1");
        registry.add(conn).await;
        registry.remove(&ConnectionId::from("c1")).await;
        registry.remove(&ConnectionId::from("c1")).await;
        assert_eq!(registry.count(), 0);
    }

    #[tokio::test]
    async fn add_same_id_replaces() {
        let registry = ConnectionRegistry::new();
        let (first, _rx1) = make_connection("same");
        let (second, _rx2) = make_connection("same");
        registry.add(first).await;
        registry.add(second).await;
        assert_eq!(registry.count(), 1);
    }

    #[tokio::test]
    async fn snapshot_returns_all() {
        let registry = ConnectionRegistry::new();
        let (c1, _rx1) = make_connection("c1");
        let (c2, _rx2) = make_connection("c2");
        registry.add(c1).await;
        registry.add(c2).await;
        let snapshot = registry.snapshot().await;
        assert_eq!(snapshot.len(), 2);
    }

    #[tokio::test]
    async fn clear_removes_everything() {
        let registry = ConnectionRegistry::new();
        let (c1, _rx1) = make_connection("c1");
        let (c2, _rx2) = make_connection("c2");
        registry.add(c1).await;
        registry.add(c2).await;
        assert_eq!(registry.clear().await, 2);
        assert_eq!(registry.count(), 0);
        assert!(registry.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn fan_out_delivers_to_all() {
        let registry = ConnectionRegistry::new();
        let (c1, mut rx1) = make_connection("c1");
        let (c2, mut rx2) = make_connection("c2");
        registry.add(c1).await;
        registry.add(c2).await;

        let delivered = registry.fan_out(&Arc::new("frame".to_owned())).await;
        assert_eq!(delivered, 2);
        assert_eq!(&*rx1.recv().await.unwrap(), "frame");
        assert_eq!(&*rx2.recv().await.unwrap(), "frame");
    }

    #[tokio::test]
    async fn fan_out_prunes_dead_connection() {
        let registry = ConnectionRegistry::new();
        let (dead, dead_rx) = make_connection("dead");
        drop(dead_rx);
        let (live, mut live_rx) = make_connection("live");
        registry.add(dead).await;
        registry.add(live).await;

        let delivered = registry.fan_out(&Arc::new("frame".to_owned())).await;
        assert_eq!(delivered, 1);
        assert_eq!(registry.count(), 1);
        assert!(live_rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn fan_out_on_empty_registry() {
        let registry = ConnectionRegistry::new();
        let delivered = registry.fan_out(&Arc::new("frame".to_owned())).await;
        assert_eq!(delivered, 0);
    }

    #[tokio::test]
    async fn fan_out_shares_one_allocation() {
        let registry = ConnectionRegistry::new();
        let (c1, mut rx1) = make_connection("c1");
        let (c2, mut rx2) = make_connection("c2");
        registry.add(c1).await;
        registry.add(c2).await;

        let _ = registry.fan_out(&Arc::new("frame".to_owned())).await;
        let f1 = rx1.recv().await.unwrap();
        let f2 = rx2.recv().await.unwrap();
        assert!(Arc::ptr_eq(&f1, &f2));
    }

    #[tokio::test]
    async fn count_consistent_after_mixed_operations() {
        let registry = ConnectionRegistry::new();
        let (c1, _rx1) = make_connection("c1");
        let (c2, _rx2) = make_connection("c2");
        let (c1_dup, _rx3) = make_connection("c1");
        registry.add(c1).await;
        registry.add(c2).await;
        registry.add(c1_dup).await;
        assert_eq!(registry.count(), 2);
        registry.remove(&ConnectionId::from("c1")).await;
        assert_eq!(registry.count(), 1);
    }
}

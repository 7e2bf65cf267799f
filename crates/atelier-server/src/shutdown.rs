//! Shutdown coordination via `CancellationToken`.
//!
//! The token is renewable: `stop()` cancels the current token and a later
//! `start()` installs a fresh one, so the hub can be restarted in-process.

use std::time::Duration;

use parking_lot::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Default grace period for draining tasks before giving up.
const DEFAULT_GRACE: Duration = Duration::from_secs(5);

/// Coordinates cancellation across the accept loop and connection tasks.
pub struct ShutdownCoordinator {
    token: RwLock<CancellationToken>,
}

impl ShutdownCoordinator {
    /// Create a new coordinator with a live token.
    pub fn new() -> Self {
        Self {
            token: RwLock::new(CancellationToken::new()),
        }
    }

    /// Get a clone of the current cancellation token.
    pub fn token(&self) -> CancellationToken {
        self.token.read().clone()
    }

    /// Cancel the current token, signalling every task holding a clone.
    pub fn shutdown(&self) {
        self.token.read().cancel();
    }

    /// Whether the current token has been cancelled.
    pub fn is_shutting_down(&self) -> bool {
        self.token.read().is_cancelled()
    }

    /// Install a fresh token so the coordinator can be reused after a stop.
    pub fn reset(&self) {
        *self.token.write() = CancellationToken::new();
    }

    /// Wait up to `timeout` for the given task handles to complete.
    ///
    /// Tasks still running after the deadline are left to be dropped with
    /// the runtime; the wait itself is bounded.
    pub async fn drain(handles: Vec<JoinHandle<()>>, timeout: Option<Duration>) {
        let timeout = timeout.unwrap_or(DEFAULT_GRACE);
        if handles.is_empty() {
            return;
        }
        info!(
            task_count = handles.len(),
            timeout_secs = timeout.as_secs(),
            "waiting for connection tasks to complete"
        );
        let all = futures::future::join_all(handles);
        if tokio::time::timeout(timeout, all).await.is_err() {
            warn!("shutdown drain timed out after {timeout:?}, some tasks may still be running");
        }
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

//! Collaborator error type.
//!
//! External collaborators (the design-source REST client, the content
//! generation engine) fail with [`CollabError`]: a kind for classification,
//! a machine-readable code, an optional HTTP status, and a retryable flag.
//! The hub's lifecycle emitter surfaces these on the wire as domain ERROR
//! events, so the fields here map directly onto the error payload.

use std::fmt;

use thiserror::Error;

/// Classification of a collaborator failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CollabErrorKind {
    /// Connection-level failure (DNS, refused, reset, timeout).
    Network,
    /// Missing or rejected credentials.
    Auth,
    /// The request itself was malformed or referenced a missing resource.
    InvalidRequest,
    /// The upstream service failed or returned an unusable response.
    Upstream,
}

impl fmt::Display for CollabErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network => write!(f, "network"),
            Self::Auth => write!(f, "auth"),
            Self::InvalidRequest => write!(f, "invalid_request"),
            Self::Upstream => write!(f, "upstream"),
        }
    }
}

/// Error from an external collaborator call.
#[derive(Debug, Error)]
#[error("{kind} error: {message}")]
pub struct CollabError {
    /// Failure classification.
    pub kind: CollabErrorKind,
    /// Human-readable message.
    pub message: String,
    /// HTTP status code if the failure came from an HTTP response.
    pub status_code: Option<u16>,
    /// Whether retrying the same call may succeed.
    pub retryable: bool,
    /// Original cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl CollabError {
    /// Create a new collaborator error.
    #[must_use]
    pub fn new(kind: CollabErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status_code: None,
            retryable: matches!(kind, CollabErrorKind::Network),
            source: None,
        }
    }

    /// Network-level failure (retryable).
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(CollabErrorKind::Network, message)
    }

    /// Authentication / authorization failure.
    #[must_use]
    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(CollabErrorKind::Auth, message)
    }

    /// Malformed request or missing resource.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(CollabErrorKind::InvalidRequest, message)
    }

    /// Upstream service failure.
    #[must_use]
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::new(CollabErrorKind::Upstream, message)
    }

    /// Set the HTTP status code and infer kind/retryability from it.
    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status_code = Some(status);
        self.kind = match status {
            401 | 403 => CollabErrorKind::Auth,
            400 | 404 | 422 => CollabErrorKind::InvalidRequest,
            s if s >= 500 => CollabErrorKind::Upstream,
            _ => self.kind,
        };
        self.retryable = status == 429 || status >= 500;
        self
    }

    /// Set the retryable flag explicitly.
    #[must_use]
    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    /// Set the error cause.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Machine-readable code for the wire error payload.
    #[must_use]
    pub fn code(&self) -> String {
        format!("{}_error", self.kind)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

//! Event type tags and event sources.
//!
//! [`EventType`] enumerates every type string the hub knows about. The
//! plugin and the hub depend on the exact SCREAMING_SNAKE values; ad-hoc
//! types used by the legacy path pass through as [`EventType::Custom`].

use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

/// Typed tag of an event envelope.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum EventType {
    // ── System ───────────────────────────────────────────────────────
    /// Peer connected.
    Connect,
    /// Peer disconnected.
    Disconnect,
    /// Error report.
    Error,
    /// Application-level liveness probe.
    Ping,
    /// Liveness reply.
    Pong,
    /// First message the hub sends on every new connection.
    Welcome,

    // ── Selection ────────────────────────────────────────────────────
    /// Single-node selection changed in the editor.
    SelectionChange,
    /// Multi-node selection changed in the editor.
    MultiSelection,

    // ── Node update lifecycle ────────────────────────────────────────
    /// Request to update a node's properties.
    UpdateNodeRequest,
    /// Node update in progress.
    UpdateNodeProgress,
    /// Node update finished.
    UpdateNodeComplete,
    /// Node update failed.
    UpdateNodeError,

    // ── Code generation lifecycle ────────────────────────────────────
    /// Request to generate code for a node.
    GenerateCodeRequest,
    /// Code generation in progress.
    GenerateCodeProgress,
    /// Code generation finished.
    GenerateCodeComplete,

    // ── Legacy request/response pairs ────────────────────────────────
    /// Analyze a design document (legacy).
    AnalyzeDesign,
    /// Analysis reply (legacy).
    AnalysisResult,
    /// Generate code (legacy short form).
    GenerateCode,
    /// Generated code reply (legacy).
    CodeGenerated,
    /// Generate a responsive layout (legacy).
    GenerateResponsive,
    /// Responsive layout reply (legacy).
    ResponsiveGenerated,
    /// Generate component variants (legacy).
    GenerateVariants,
    /// Component variants reply (legacy).
    VariantsGenerated,

    /// Any other type string, accepted by the legacy path.
    Custom(String),
}

impl EventType {
    /// The wire string for this type.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Connect => "CONNECT",
            Self::Disconnect => "DISCONNECT",
            Self::Error => "ERROR",
            Self::Ping => "PING",
            Self::Pong => "PONG",
            Self::Welcome => "WELCOME",
            Self::SelectionChange => "SELECTION_CHANGE",
            Self::MultiSelection => "MULTI_SELECTION",
            Self::UpdateNodeRequest => "UPDATE_NODE_REQUEST",
            Self::UpdateNodeProgress => "UPDATE_NODE_PROGRESS",
            Self::UpdateNodeComplete => "UPDATE_NODE_COMPLETE",
            Self::UpdateNodeError => "UPDATE_NODE_ERROR",
            Self::GenerateCodeRequest => "GENERATE_CODE_REQUEST",
            Self::GenerateCodeProgress => "GENERATE_CODE_PROGRESS",
            Self::GenerateCodeComplete => "GENERATE_CODE_COMPLETE",
            Self::AnalyzeDesign => "ANALYZE_DESIGN",
            Self::AnalysisResult => "ANALYSIS_RESULT",
            Self::GenerateCode => "GENERATE_CODE",
            Self::CodeGenerated => "CODE_GENERATED",
            Self::GenerateResponsive => "GENERATE_RESPONSIVE",
            Self::ResponsiveGenerated => "RESPONSIVE_GENERATED",
            Self::GenerateVariants => "GENERATE_VARIANTS",
            Self::VariantsGenerated => "VARIANTS_GENERATED",
            Self::Custom(s) => s,
        }
    }

    /// Whether this type is part of a request lifecycle sequence.
    #[must_use]
    pub fn is_lifecycle(&self) -> bool {
        matches!(
            self,
            Self::UpdateNodeRequest
                | Self::UpdateNodeProgress
                | Self::UpdateNodeComplete
                | Self::UpdateNodeError
                | Self::GenerateCodeRequest
                | Self::GenerateCodeProgress
                | Self::GenerateCodeComplete
        )
    }
}

impl From<&str> for EventType {
    fn from(s: &str) -> Self {
        match s {
            "CONNECT" => Self::Connect,
            "DISCONNECT" => Self::Disconnect,
            "ERROR" => Self::Error,
            "PING" => Self::Ping,
            "PONG" => Self::Pong,
            "WELCOME" => Self::Welcome,
            "SELECTION_CHANGE" => Self::SelectionChange,
            "MULTI_SELECTION" => Self::MultiSelection,
            "UPDATE_NODE_REQUEST" => Self::UpdateNodeRequest,
            "UPDATE_NODE_PROGRESS" => Self::UpdateNodeProgress,
            "UPDATE_NODE_COMPLETE" => Self::UpdateNodeComplete,
            "UPDATE_NODE_ERROR" => Self::UpdateNodeError,
            "GENERATE_CODE_REQUEST" => Self::GenerateCodeRequest,
            "GENERATE_CODE_PROGRESS" => Self::GenerateCodeProgress,
            "GENERATE_CODE_COMPLETE" => Self::GenerateCodeComplete,
            "ANALYZE_DESIGN" => Self::AnalyzeDesign,
            "ANALYSIS_RESULT" => Self::AnalysisResult,
            "GENERATE_CODE" => Self::GenerateCode,
            "CODE_GENERATED" => Self::CodeGenerated,
            "GENERATE_RESPONSIVE" => Self::GenerateResponsive,
            "RESPONSIVE_GENERATED" => Self::ResponsiveGenerated,
            "GENERATE_VARIANTS" => Self::GenerateVariants,
            "VARIANTS_GENERATED" => Self::VariantsGenerated,
            other => Self::Custom(other.to_owned()),
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for EventType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TypeVisitor;

        impl Visitor<'_> for TypeVisitor {
            type Value = EventType;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an event type string")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<EventType, E> {
                Ok(EventType::from(v))
            }
        }

        deserializer.deserialize_str(TypeVisitor)
    }
}

/// Which side of the socket produced an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventSource {
    /// The design-tool plugin.
    Plugin,
    /// The hub itself.
    Server,
}

/// A long-running operation with a REQUEST/PROGRESS/COMPLETE/ERROR sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleDomain {
    /// Node property updates.
    UpdateNode,
    /// Code generation.
    GenerateCode,
}

impl LifecycleDomain {
    /// The request type that starts the sequence.
    #[must_use]
    pub fn request(self) -> EventType {
        match self {
            Self::UpdateNode => EventType::UpdateNodeRequest,
            Self::GenerateCode => EventType::GenerateCodeRequest,
        }
    }

    /// The progress type emitted while work is in flight.
    #[must_use]
    pub fn progress(self) -> EventType {
        match self {
            Self::UpdateNode => EventType::UpdateNodeProgress,
            Self::GenerateCode => EventType::GenerateCodeProgress,
        }
    }

    /// The completion type.
    #[must_use]
    pub fn complete(self) -> EventType {
        match self {
            Self::UpdateNode => EventType::UpdateNodeComplete,
            Self::GenerateCode => EventType::GenerateCodeComplete,
        }
    }

    /// The failure type. Domains without a dedicated error type fall back
    /// to the generic ERROR event.
    #[must_use]
    pub fn error(self) -> EventType {
        match self {
            Self::UpdateNode => EventType::UpdateNodeError,
            Self::GenerateCode => EventType::Error,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

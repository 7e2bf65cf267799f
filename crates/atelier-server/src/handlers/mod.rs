//! Built-in handlers and the request-lifecycle emitter.
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `lifecycle` | PROGRESS → COMPLETE/ERROR emission correlated to a request |
//! | `ping` | Application-level keepalive (PING → PONG broadcast) |
//! | `update_node` | Node-update request lifecycle |
//! | `generate` | Code-generation request lifecycle (slow collaborator) |
//! | `selection` | Selection-change observers (log + count) |
//! | `legacy` | Legacy request/response pairs (analyze, generate short forms) |

pub mod generate;
pub mod legacy;
pub mod lifecycle;
pub mod ping;
pub mod selection;
pub mod update_node;

pub use lifecycle::Lifecycle;

use atelier_events::EventType;

use crate::dispatch::HandlerTable;

/// Register every built-in handler on a table.
pub fn register_defaults(table: &mut HandlerTable) {
    table.register_event(EventType::Ping, ping::PingHandler);
    table.register_event(EventType::UpdateNodeRequest, update_node::UpdateNodeHandler);
    table.register_event(EventType::GenerateCodeRequest, generate::GenerateCodeHandler);
    table.register_event(EventType::SelectionChange, selection::SelectionObserver);
    table.register_event(EventType::MultiSelection, selection::SelectionObserver);

    table.register_message(
        "ANALYZE_DESIGN",
        legacy::RequestReplyHandler::new("ANALYZE_DESIGN", EventType::AnalysisResult),
    );
    table.register_message(
        "GENERATE_CODE",
        legacy::RequestReplyHandler::new("GENERATE_CODE", EventType::CodeGenerated),
    );
    table.register_message(
        "GENERATE_RESPONSIVE",
        legacy::RequestReplyHandler::new("GENERATE_RESPONSIVE", EventType::ResponsiveGenerated),
    );
    table.register_message(
        "GENERATE_VARIANTS",
        legacy::RequestReplyHandler::new("GENERATE_VARIANTS", EventType::VariantsGenerated),
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Shared test fixtures
// ─────────────────────────────────────────────────────────────────────────────

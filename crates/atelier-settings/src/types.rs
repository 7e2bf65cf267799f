//! Settings structs with compiled defaults.
//!
//! Field names are camelCase in the settings file to match what the plugin
//! tooling writes.

use serde::{Deserialize, Serialize};

/// Top-level settings for the hub process.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AtelierSettings {
    /// WebSocket server settings.
    pub server: ServerSettings,
    /// Design API client settings.
    pub figma: FigmaSettings,
    /// Content-generation backend settings.
    pub generation: GenerationSettings,
    /// Logging settings.
    pub logging: LoggingSettings,
}

/// Server network and lifecycle settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Bind address.
    pub host: String,
    /// WebSocket server port.
    pub port: u16,
    /// Maximum inbound frame size in bytes.
    pub max_message_size: usize,
    /// Grace period for draining connection tasks on `stop()`, in seconds.
    pub shutdown_grace_secs: u64,
    /// Per-connection outbound queue depth.
    pub send_queue_depth: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8765,
            max_message_size: 16 * 1024 * 1024, // 16 MB
            shutdown_grace_secs: 5,
            send_queue_depth: 256,
        }
    }
}

/// Design API client settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FigmaSettings {
    /// REST API base URL.
    pub api_base: String,
    /// Personal access token. Usually supplied via `FIGMA_ACCESS_TOKEN`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

impl Default for FigmaSettings {
    fn default() -> Self {
        Self {
            api_base: "https://api.figma.com/v1".to_string(),
            access_token: None,
        }
    }
}

/// Content-generation backend settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerationSettings {
    /// Model identifier passed to the generation backend.
    pub model: String,
    /// Upper bound on generated output tokens.
    pub max_output_tokens: u32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4".to_string(),
            max_output_tokens: 1000,
        }
    }
}

/// Logging settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Tracing filter directive (e.g. `info`, `atelier_server=debug`).
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_defaults() {
        let settings = ServerSettings::default();
        assert_eq!(settings.host, "127.0.0.1");
        assert_eq!(settings.port, 8765);
        assert_eq!(settings.max_message_size, 16 * 1024 * 1024);
        assert_eq!(settings.shutdown_grace_secs, 5);
        assert_eq!(settings.send_queue_depth, 256);
    }

    #[test]
    fn figma_defaults() {
        let settings = FigmaSettings::default();
        assert_eq!(settings.api_base, "https://api.figma.com/v1");
        assert!(settings.access_token.is_none());
    }

    #[test]
    fn generation_defaults() {
        let settings = GenerationSettings::default();
        assert_eq!(settings.model, "gpt-4");
        assert_eq!(settings.max_output_tokens, 1000);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let json = r#"{"server": {"port": 9000}}"#;
        let settings: AtelierSettings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.logging.level, "info");
    }

    #[test]
    fn camel_case_wire_keys() {
        let settings = AtelierSettings::default();
        let value = serde_json::to_value(&settings).unwrap();
        assert!(value["server"].get("maxMessageSize").is_some());
        assert!(value["server"].get("max_message_size").is_none());
        assert!(value["figma"].get("apiBase").is_some());
    }

    #[test]
    fn token_omitted_when_unset() {
        let settings = AtelierSettings::default();
        let value = serde_json::to_value(&settings).unwrap();
        assert!(value["figma"].get("accessToken").is_none());
    }

    #[test]
    fn serde_roundtrip() {
        let mut settings = AtelierSettings::default();
        settings.figma.access_token = Some("figd_token".into());
        let json = serde_json::to_string(&settings).unwrap();
        let back: AtelierSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back.figma.access_token.as_deref(), Some("figd_token"));
        assert_eq!(back.server.port, settings.server.port);
    }
}

//! # atelier-hubd
//!
//! Hub server binary — loads settings, wires the collaborators, registers
//! the default handlers, and runs the WebSocket hub until Ctrl-C.

#![deny(unsafe_code)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::Parser;
use serde_json::Value;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use atelier_core::collab::{ContentGenerator, DesignSource};
use atelier_core::errors::CollabError;
use atelier_figma::FigmaClient;
use atelier_server::handlers::register_defaults;
use atelier_server::{HandlerTable, HubServer};

/// Atelier WebSocket hub server.
#[derive(Parser, Debug)]
#[command(name = "atelier-hubd", about = "Atelier WebSocket hub server")]
struct Cli {
    /// Host to bind (overrides settings).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (overrides settings).
    #[arg(long)]
    port: Option<u16>,

    /// Path to a settings file (defaults to `~/.atelier/settings.json`).
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Design source used when no API token is configured: every request
/// fails with a clean, correlated error instead of a crash.
struct UnconfiguredDesignSource;

#[async_trait]
impl DesignSource for UnconfiguredDesignSource {
    async fn get_resource(&self, _id: &str) -> std::result::Result<Value, CollabError> {
        Err(CollabError::auth(
            "no design API token configured (set FIGMA_ACCESS_TOKEN)",
        ))
    }
}

/// Generation backend used until one is wired in.
struct UnconfiguredGenerator;

#[async_trait]
impl ContentGenerator for UnconfiguredGenerator {
    async fn run(
        &self,
        _request: &Value,
        _schema: Option<&Value>,
    ) -> std::result::Result<Value, CollabError> {
        Err(CollabError::auth("no content-generation backend configured"))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    let mut settings = match &args.config {
        Some(path) => atelier_settings::load_settings_from_path(path)
            .with_context(|| format!("failed to load settings from {}", path.display()))?,
        None => atelier_settings::load_settings().context("failed to load settings")?,
    };
    if let Some(host) = args.host {
        settings.server.host = host;
    }
    if let Some(port) = args.port {
        settings.server.port = port;
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&settings.logging.level).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Counters and histograms recorded by the hub need a global recorder;
    // the handle renders scrape output if a scrape surface is added later.
    let _metrics_handle = atelier_server::metrics::install_recorder();

    let design: Arc<dyn DesignSource> = match settings.figma.access_token.clone() {
        Some(token) => {
            info!("design API client configured");
            Arc::new(FigmaClient::with_base_url(
                token,
                settings.figma.api_base.clone(),
            ))
        }
        None => {
            warn!("FIGMA_ACCESS_TOKEN not set — design API requests will report errors");
            Arc::new(UnconfiguredDesignSource)
        }
    };
    let generator: Arc<dyn ContentGenerator> = Arc::new(UnconfiguredGenerator);
    warn!("no content-generation backend configured — generation requests will report errors");

    let mut table = HandlerTable::new();
    register_defaults(&mut table);

    let hub = HubServer::new(settings.server.clone(), table, design, generator);
    let addr = hub.start(None).await.context("failed to start hub")?;
    info!(%addr, "atelier hub running, press Ctrl-C to stop");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("shutdown signal received");
    hub.stop().await;
    Ok(())
}

//! Figma REST client.
//!
//! Endpoints mirror the upstream API:
//! `GET /files/{key}`, `GET /files/{key}/nodes?ids=…`,
//! `GET /images/{key}?ids=…`, authenticated with the `X-Figma-Token`
//! header.

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use atelier_core::collab::DesignSource;
use atelier_core::errors::CollabError;

/// Client for the Figma REST API.
pub struct FigmaClient {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl FigmaClient {
    /// Create a client against the production API.
    #[must_use]
    pub fn new(access_token: impl Into<String>) -> Self {
        Self::with_base_url(access_token, "https://api.figma.com/v1")
    }

    /// Create a client against a custom base URL (tests, proxies).
    #[must_use]
    pub fn with_base_url(access_token: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            access_token: access_token.into(),
        }
    }

    async fn get_json(&self, path: &str) -> Result<Value, CollabError> {
        let url = format!("{}{path}", self.base_url);
        debug!(%url, "figma GET");
        let response = self
            .http
            .get(&url)
            .header("X-Figma-Token", &self.access_token)
            .send()
            .await
            .map_err(|e| CollabError::network("request failed").with_source(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(
                CollabError::upstream(format!("figma returned {status}"))
                    .with_status(status.as_u16()),
            );
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| CollabError::upstream("invalid response body").with_source(e))
    }

    /// Fetch a whole design file.
    pub async fn get_file(&self, file_key: &str) -> Result<Value, CollabError> {
        self.get_json(&format!("/files/{file_key}")).await
    }

    /// Fetch specific nodes within a file.
    pub async fn get_file_nodes(
        &self,
        file_key: &str,
        node_ids: &[&str],
    ) -> Result<Value, CollabError> {
        let ids = node_ids.join(",");
        self.get_json(&format!("/files/{file_key}/nodes?ids={ids}"))
            .await
    }

    /// Fetch rendered images for nodes.
    pub async fn get_file_images(
        &self,
        file_key: &str,
        node_ids: &[&str],
    ) -> Result<Value, CollabError> {
        let ids = node_ids.join(",");
        self.get_json(&format!("/images/{file_key}?ids={ids}")).await
    }
}

#[async_trait]
impl DesignSource for FigmaClient {
    /// Resolve a resource id of the form `file_key` or `file_key:node_id`.
    async fn get_resource(&self, id: &str) -> Result<Value, CollabError> {
        match id.split_once(':') {
            Some((file_key, node_id)) if !node_id.is_empty() => {
                self.get_file_nodes(file_key, &[node_id]).await
            }
            _ => self.get_file(id).await,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

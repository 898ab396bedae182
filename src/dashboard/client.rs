/**
 * Dashboard Endpoint Client
 *
 * Fetches snapshots from the server's dashboard endpoint.
 *
 * The poller only knows the `SnapshotSource` trait, so tests and embedders can
 * feed it snapshots from anywhere. `HttpSnapshotClient` is the real source:
 *
 * GET {server_url}{endpoint_path}?token=...&role=...
 * X-Requested-With: XMLHttpRequest
 * Cache-Control: no-cache
 */

use crate::shared::{AppConfig, Snapshot, SyncError};
use async_trait::async_trait;
use reqwest::Client;

/// Longest response body excerpt kept in an error message
const ERROR_BODY_LIMIT: usize = 200;

/// Anything that can produce a dashboard snapshot
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn fetch(&self) -> Result<Snapshot, SyncError>;
}

/// HTTP client for the dashboard endpoint
#[derive(Debug, Clone)]
pub struct HttpSnapshotClient {
    client: Client,
    url: String,
    token: Option<String>,
    role: Option<String>,
}

impl HttpSnapshotClient {
    pub fn new(config: &AppConfig) -> Result<Self, SyncError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| SyncError::transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: format!(
                "{}{}",
                config.server_url.trim_end_matches('/'),
                config.endpoint_path
            ),
            token: config.token.clone().filter(|t| !t.is_empty()),
            role: config.role.clone().filter(|r| !r.is_empty()),
        })
    }

    /// Endpoint URL without the query string
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl SnapshotSource for HttpSnapshotClient {
    async fn fetch(&self) -> Result<Snapshot, SyncError> {
        let (Some(token), Some(role)) = (self.token.as_deref(), self.role.as_deref()) else {
            return Err(SyncError::MissingCredentials);
        };

        tracing::debug!("Fetching dashboard snapshot from {}", self.url);
        let response = self
            .client
            .get(&self.url)
            .query(&[("token", token), ("role", role)])
            .header("X-Requested-With", "XMLHttpRequest")
            .header("Cache-Control", "no-cache")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| status.to_string());
            let excerpt: String = error_text.chars().take(ERROR_BODY_LIMIT).collect();
            return Err(SyncError::http_status(status.as_u16(), excerpt));
        }

        let body = response.text().await?;
        Snapshot::from_json(&body)
    }
}

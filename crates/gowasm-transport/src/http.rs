//! HTTP asset retrieval.

use std::io::Read;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tracing::debug;

use crate::source::AssetSource;

/// Fetches assets relative to a base URL.
///
/// `ureq` is blocking, so each fetch runs on the blocking pool; concurrent
/// fetches still overlap.
#[derive(Clone)]
pub struct HttpAssetSource {
    base_url: String,
    http_client: ureq::Agent,
}

impl HttpAssetSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http_client: ureq::Agent::new(),
        }
    }

    /// Full URL for a relative asset path.
    pub fn url_for(&self, relative_path: &str) -> String {
        format!("{}/{}", self.base_url, relative_path.trim_start_matches('/'))
    }

    fn get_blocking(client: &ureq::Agent, url: &str) -> Result<Vec<u8>> {
        let response = client
            .get(url)
            .call()
            .map_err(|e| anyhow!("Failed to fetch {}: {}", url, e))?;

        let mut bytes = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut bytes)
            .map_err(|e| anyhow!("Failed to read response body from {}: {}", url, e))?;
        Ok(bytes)
    }
}

#[async_trait]
impl AssetSource for HttpAssetSource {
    async fn fetch(&self, relative_path: &str) -> Result<Vec<u8>> {
        let url = self.url_for(relative_path);
        let client = self.http_client.clone();
        debug!(%url, "fetching asset");

        let bytes = tokio::task::spawn_blocking(move || Self::get_blocking(&client, &url))
            .await
            .map_err(|e| anyhow!("asset fetch task failed: {}", e))??;
        debug!(path = relative_path, len = bytes.len(), "asset fetched");
        Ok(bytes)
    }

    fn describe(&self) -> String {
        self.base_url.clone()
    }
}

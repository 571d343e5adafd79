// ABOUTME: Asset storage clients - upload attachment bytes, get back a stable uri

use std::sync::Mutex;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::config::ServiceConfig;

/// Failure of one asset upload
#[derive(Debug, Error)]
pub enum AssetStoreError {
    #[error("Asset storage transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Asset storage error {status}: {body}")]
    Service { status: u16, body: String },
}

/// Seam between the media manager and the image/asset storage service
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Store raw bytes, returning the stable uri for the attachment
    async fn store(&self, bytes: Vec<u8>, filename: &str) -> Result<String, AssetStoreError>;
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    uri: String,
}

/// Production store uploading to the asset service over HTTPS
#[derive(Debug, Clone)]
pub struct HttpAssetStore {
    client: Client,
    base_url: String,
    api_token: Option<String>,
}

impl HttpAssetStore {
    pub fn new(services: &ServiceConfig, timeout: std::time::Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("listwise/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client for asset storage")?;

        Ok(Self {
            client,
            base_url: services.asset_url.clone(),
            api_token: services.api_token.clone(),
        })
    }
}

#[async_trait]
impl AssetStore for HttpAssetStore {
    async fn store(&self, bytes: Vec<u8>, filename: &str) -> Result<String, AssetStoreError> {
        debug!("Uploading asset {} ({} bytes)", filename, bytes.len());

        let mut builder = self
            .client
            .post(format!("{}/v1/assets", self.base_url))
            .header("Content-Type", "application/octet-stream")
            .header("X-Filename", filename)
            .body(bytes);
        if let Some(token) = &self.api_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AssetStoreError::Service { status, body });
        }

        let uploaded: UploadResponse = response.json().await?;
        debug!("Asset {} stored at {}", filename, uploaded.uri);
        Ok(uploaded.uri)
    }
}

/// In-memory store for tests and offline hosts; uris are `mem://` paths
#[derive(Debug, Default)]
pub struct MemoryAssetStore {
    stored: Mutex<Vec<String>>,
}

impl MemoryAssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filenames stored so far, in upload order
    pub fn stored_filenames(&self) -> Vec<String> {
        self.stored.lock().expect("asset store poisoned").clone()
    }
}

#[async_trait]
impl AssetStore for MemoryAssetStore {
    async fn store(&self, _bytes: Vec<u8>, filename: &str) -> Result<String, AssetStoreError> {
        let mut stored = self.stored.lock().expect("asset store poisoned");
        stored.push(filename.to_string());
        Ok(format!("mem://assets/{}/{}", stored.len(), filename))
    }
}

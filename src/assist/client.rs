// ABOUTME: HTTP client for the AI generation service

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use tracing::debug;

use super::types::{GenerationRequest, GenerationResponse};
use crate::config::ServiceConfig;

/// Failure of one remote generation call
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Generation service transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Generation service error {status}: {body}")]
    Service { status: u16, body: String },
}

/// Seam between the assist adapter and the remote generation service
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn generate(&self, request: GenerationRequest)
        -> Result<GenerationResponse, GenerationError>;
}

/// Production backend talking to the generation service over HTTPS
#[derive(Debug, Clone)]
pub struct HttpGenerationClient {
    client: Client,
    base_url: String,
    api_token: Option<String>,
}

impl HttpGenerationClient {
    /// Build a client from service config.
    ///
    /// The HTTP-level timeout is a backstop; the adapter enforces the
    /// user-facing generation timeout itself.
    pub fn new(services: &ServiceConfig, timeout: std::time::Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("listwise/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout * 2)
            .build()
            .context("Failed to create HTTP client for generation service")?;

        Ok(Self {
            client,
            base_url: services.generation_url.clone(),
            api_token: services.api_token.clone(),
        })
    }
}

#[async_trait]
impl GenerationBackend for HttpGenerationClient {
    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResponse, GenerationError> {
        debug!(
            "Requesting generation for field type {} ({} context fields)",
            request.field_type,
            request.context.fields.len()
        );

        let mut builder = self
            .client
            .post(format!("{}/v1/generate", self.base_url))
            .json(&request);
        if let Some(token) = &self.api_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Service { status, body });
        }

        let generated: GenerationResponse = response.json().await?;
        debug!(
            "Generation response: {} chars, confidence {:.2}",
            generated.text.len(),
            generated.confidence
        );
        Ok(generated)
    }
}

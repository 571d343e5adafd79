// ABOUTME: CRM/property backend client - posts the finished listing aggregate

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::ServiceConfig;
use crate::wizard::FormData;

/// One field-keyed complaint from the backend's validation
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FieldIssue {
    pub field: String,
    pub message: String,
}

/// Successful submission receipt
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitReceipt {
    /// Backend-assigned listing id
    pub id: String,
}

/// Failure of one submission POST
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("Backend rejected the listing ({} field issues)", .0.len())]
    Rejected(Vec<FieldIssue>),
    #[error("Backend error {status}: {body}")]
    Service { status: u16, body: String },
    #[error("Backend transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Seam between the wizard controller and the CRM backend
#[async_trait]
pub trait ListingBackend: Send + Sync {
    async fn submit_listing(&self, form_data: &FormData) -> Result<SubmitReceipt, SubmitError>;
}

#[derive(Debug, Deserialize)]
struct RejectionBody {
    #[serde(default)]
    issues: Vec<FieldIssue>,
}

/// Production backend posting to the property-creation endpoint
#[derive(Debug, Clone)]
pub struct HttpListingBackend {
    client: Client,
    base_url: String,
    api_token: Option<String>,
}

impl HttpListingBackend {
    pub fn new(services: &ServiceConfig, timeout: std::time::Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("listwise/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client for listing backend")?;

        Ok(Self {
            client,
            base_url: services.listing_url.clone(),
            api_token: services.api_token.clone(),
        })
    }
}

#[async_trait]
impl ListingBackend for HttpListingBackend {
    async fn submit_listing(&self, form_data: &FormData) -> Result<SubmitReceipt, SubmitError> {
        debug!("Submitting listing with {} fields", form_data.len());

        let mut builder = self
            .client
            .post(format!("{}/v1/properties", self.base_url))
            .json(form_data);
        if let Some(token) = &self.api_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::UNPROCESSABLE_ENTITY {
            let body: RejectionBody = response.json().await?;
            return Err(SubmitError::Rejected(body.issues));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SubmitError::Service {
                status: status.as_u16(),
                body,
            });
        }

        let receipt: SubmitReceipt = response.json().await?;
        info!("Listing accepted with id {}", receipt.id);
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_body_parses_issue_list() {
        let body: RejectionBody = serde_json::from_str(
            r#"{"issues": [{"field": "price", "message": "below minimum"}]}"#,
        )
        .unwrap();
        assert_eq!(
            body.issues,
            vec![FieldIssue {
                field: "price".to_string(),
                message: "below minimum".to_string()
            }]
        );
    }

    #[test]
    fn test_rejection_body_tolerates_missing_issues() {
        let body: RejectionBody = serde_json::from_str("{}").unwrap();
        assert!(body.issues.is_empty());
    }

    #[test]
    fn test_submit_error_display_counts_issues() {
        let err = SubmitError::Rejected(vec![
            FieldIssue {
                field: "price".to_string(),
                message: "bad".to_string(),
            },
            FieldIssue {
                field: "title".to_string(),
                message: "bad".to_string(),
            },
        ]);
        assert!(err.to_string().contains("2 field issues"));
    }
}

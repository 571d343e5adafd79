// ABOUTME: AI content assist adapter with per-field request tokens
// At most one authoritative request per field; stale responses are discarded

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{debug, info, warn};

use super::client::GenerationBackend;
use super::types::{AssistOutcome, GenerationContext, GenerationRequest};

/// Cancellable, at-most-one-in-flight generation per field.
///
/// Cheap to clone; clones share the token table, so a request issued
/// through one clone invalidates an older request issued through another.
#[derive(Clone)]
pub struct AssistAdapter {
    inner: Arc<Inner>,
}

struct Inner {
    backend: Arc<dyn GenerationBackend>,
    timeout: Duration,
    /// field key -> latest issued request token
    tokens: Mutex<HashMap<String, u64>>,
}

impl AssistAdapter {
    pub fn new(backend: Arc<dyn GenerationBackend>, timeout: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                backend,
                timeout,
                tokens: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Generate content for `field_key`.
    ///
    /// Issues a fresh request token, invalidating any outstanding request
    /// for the same field. Whatever the remote call does, the caller gets a
    /// defined outcome; no auto-retry happens on timeout or service error.
    pub async fn generate(&self, field_key: &str, context: GenerationContext) -> AssistOutcome {
        let token = self.issue_token(field_key);
        debug!("Generation request {} for field {}", token, field_key);

        let request = GenerationRequest {
            field_type: field_key.to_string(),
            context,
        };

        let result = tokio::time::timeout(
            self.inner.timeout,
            self.inner.backend.generate(request),
        )
        .await;

        // A newer request may have taken over while we were waiting
        if !self.is_current(field_key, token) {
            debug!("Generation request {} for {} superseded", token, field_key);
            return AssistOutcome::Superseded;
        }

        match result {
            Err(_) => {
                warn!(
                    "Generation for {} timed out after {:?}; falling back to manual entry",
                    field_key, self.inner.timeout
                );
                AssistOutcome::Timeout
            }
            Ok(Err(e)) => {
                warn!("Generation for {} failed: {}; falling back to manual entry", field_key, e);
                AssistOutcome::ServiceError(e.to_string())
            }
            Ok(Ok(response)) => {
                info!(
                    "Generated {} chars for {} (confidence {:.2})",
                    response.text.len(),
                    field_key,
                    response.confidence
                );
                AssistOutcome::Generated {
                    text: response.text,
                    confidence: response.confidence,
                    token,
                }
            }
        }
    }

    /// True when `token` is still the latest request for `field_key`
    pub fn is_current(&self, field_key: &str, token: u64) -> bool {
        self.inner
            .tokens
            .lock()
            .expect("token table poisoned")
            .get(field_key)
            .is_some_and(|latest| *latest == token)
    }

    fn issue_token(&self, field_key: &str) -> u64 {
        let mut tokens = self.inner.tokens.lock().expect("token table poisoned");
        let entry = tokens.entry(field_key.to_string()).or_insert(0);
        *entry += 1;
        *entry
    }
}

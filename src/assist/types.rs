// ABOUTME: Type definitions for the AI generation service integration

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Structured context sent alongside a generation request.
///
/// Carries the listing fields the service may draw on, never free-form
/// prompt text from the engine itself.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationContext {
    /// Relevant form-data entries, e.g. property type, rooms, location
    pub fields: serde_json::Map<String, Value>,
    /// Optional tone hint ("professional", "warm", ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tone: Option<String>,
}

impl GenerationContext {
    pub fn from_fields(fields: serde_json::Map<String, Value>) -> Self {
        Self { fields, tone: None }
    }

    #[must_use]
    pub fn with_tone(mut self, tone: &str) -> Self {
        self.tone = Some(tone.to_string());
        self
    }
}

/// Wire request for one generation call
#[derive(Debug, Clone, Serialize)]
pub struct GenerationRequest {
    /// Which kind of field to write copy for ("description", "headline", ...)
    #[serde(rename = "fieldType")]
    pub field_type: String,
    #[serde(rename = "structuredContext")]
    pub context: GenerationContext,
}

/// Wire response from the generation service
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationResponse {
    pub text: String,
    /// Service-reported confidence in [0, 1]
    #[serde(rename = "confidenceScore")]
    pub confidence: f64,
}

/// Terminal outcome of one `generate` call, as seen by the caller
#[derive(Debug, Clone, PartialEq)]
pub enum AssistOutcome {
    /// The service produced text and this request is still authoritative
    Generated {
        text: String,
        confidence: f64,
        token: u64,
    },
    /// The call outlived the configured timeout; fall back to manual entry
    Timeout,
    /// The service failed; fall back to manual entry
    ServiceError(String),
    /// A newer request for the same field took over; discard this result
    Superseded,
}

impl AssistOutcome {
    /// True when the caller should drop back to manual text entry
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Timeout | Self::ServiceError(_))
    }
}

// ABOUTME: AI content assist - cancellable per-field generation with fallback

mod adapter;
mod client;
mod types;

pub use adapter::AssistAdapter;
pub use client::{GenerationBackend, GenerationError, HttpGenerationClient};
pub use types::{AssistOutcome, GenerationContext, GenerationRequest, GenerationResponse};

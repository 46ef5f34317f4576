//! Generative model provider abstraction.
//!
//! The handlers only see [`GenerativeProvider`]; the Gemini REST client and
//! the scripted test provider both implement it.

pub mod gemini;
pub mod mock;

use crate::services::metrics;
use async_trait::async_trait;
use std::time::Instant;
use thiserror::Error;

/// Error type for provider operations.
#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Content filtered")]
    ContentFiltered,

    #[error("Empty response from model")]
    EmptyResponse,

    #[error("Network error: {0}")]
    NetworkError(String),
}

/// One piece of a multimodal prompt.
#[derive(Debug, Clone)]
pub enum PromptPart {
    Text(String),
    /// Raw image bytes plus their media type.
    Image { mime_type: String, data: Vec<u8> },
}

impl PromptPart {
    pub fn text(text: impl Into<String>) -> Self {
        PromptPart::Text(text.into())
    }
}

/// Result of a provider call.
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    pub text: String,
    pub input_tokens: i32,
    pub output_tokens: i32,
}

/// Generation parameters for a single call.
#[derive(Debug, Clone, Default)]
pub struct GenerationParams {
    /// Ask the model for `application/json` output.
    pub json_output: bool,
}

/// A hosted generative model: prompt parts in, text out.
#[async_trait]
pub trait GenerativeProvider: Send + Sync {
    /// Model identifier, recorded in response metadata.
    fn model(&self) -> &str;

    /// Run one generation. Never retried by callers.
    async fn generate(
        &self,
        parts: &[PromptPart],
        params: &GenerationParams,
    ) -> Result<ProviderResponse, ProviderError>;
}

/// Run one generation, recording latency and token usage per model.
pub async fn generate_recorded(
    provider: &dyn GenerativeProvider,
    parts: &[PromptPart],
    params: &GenerationParams,
) -> Result<ProviderResponse, ProviderError> {
    let started = Instant::now();
    let reply = provider.generate(parts, params).await;
    metrics::record_provider_latency(provider.model(), started.elapsed().as_secs_f64());

    if let Ok(reply) = &reply {
        metrics::record_tokens(provider.model(), reply.input_tokens, reply.output_tokens);
    }

    reply
}

#[cfg(test)]
mod tests {
    use super::*;
    use mock::MockProvider;

    #[tokio::test]
    async fn generate_recorded_passes_reply_through() {
        let provider = MockProvider::new("m").with_reply("first_aid");
        let reply = generate_recorded(&provider, &[PromptPart::text("q")], &GenerationParams::default())
            .await
            .unwrap();

        assert_eq!(reply.text, "first_aid");
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn generate_recorded_passes_errors_through() {
        let provider = MockProvider::new("m").with_error(ProviderError::RateLimited);
        let err = generate_recorded(&provider, &[PromptPart::text("q")], &GenerationParams::default())
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::RateLimited));
    }
}

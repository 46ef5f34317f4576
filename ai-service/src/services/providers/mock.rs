//! Scripted provider for tests.

use super::{GenerationParams, GenerativeProvider, PromptPart, ProviderError, ProviderResponse};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Provider that replays queued outcomes in order and counts calls.
///
/// Once the queue is drained every further call fails with
/// [`ProviderError::NotConfigured`].
pub struct MockProvider {
    model: String,
    replies: Mutex<VecDeque<Result<String, ProviderError>>>,
    prompts: Mutex<Vec<Vec<PromptPart>>>,
    calls: AtomicUsize,
}

impl MockProvider {
    pub fn new(model: &str) -> Self {
        Self {
            model: model.to_string(),
            replies: Mutex::new(VecDeque::new()),
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Queue a successful reply.
    pub fn with_reply(self, text: impl Into<String>) -> Self {
        self.push(Ok(text.into()));
        self
    }

    /// Queue a failure.
    pub fn with_error(self, error: ProviderError) -> Self {
        self.push(Err(error));
        self
    }

    fn push(&self, outcome: Result<String, ProviderError>) {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(outcome);
        }
    }

    /// Number of `generate` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompt parts received by each call, in order.
    pub fn prompts(&self) -> Vec<Vec<PromptPart>> {
        self.prompts
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl GenerativeProvider for MockProvider {
    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(
        &self,
        parts: &[PromptPart],
        _params: &GenerationParams,
    ) -> Result<ProviderResponse, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(parts.to_vec());
        }

        let next = self
            .replies
            .lock()
            .ok()
            .and_then(|mut replies| replies.pop_front());

        match next {
            Some(Ok(text)) => Ok(ProviderResponse {
                input_tokens: 0,
                output_tokens: text.len() as i32 / 4,
                text,
            }),
            Some(Err(e)) => Err(e),
            None => Err(ProviderError::NotConfigured(
                "Mock provider has no scripted reply".to_string(),
            )),
        }
    }
}

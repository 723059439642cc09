//! Offline providers for local runs and tests.

use async_trait::async_trait;

use verdant_core::{
    traits::{ChatMessage, GenerationBackend, GenerationOutput, GenerationRequest, LlmClient, LlmResponse, LlmUsage},
    Error, Result,
};

// =============================================================================
// Mock LLM Client
// =============================================================================

/// LLM client that echoes the last message behind a fixed prefix.
pub struct MockLlmClient {
    response: String,
    finish_reason: String,
    should_fail: bool,
}

impl MockLlmClient {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            finish_reason: "stop".to_string(),
            should_fail: false,
        }
    }

    /// Client whose every call fails.
    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::new("")
        }
    }

    pub fn with_finish_reason(mut self, reason: impl Into<String>) -> Self {
        self.finish_reason = reason.into();
        self
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, prompt: &str) -> Result<LlmResponse> {
        self.chat(&[ChatMessage::new("user", prompt)]).await
    }

    async fn chat(&self, messages: &[ChatMessage]) -> Result<LlmResponse> {
        if self.should_fail {
            return Err(Error::text_backend("Mock failure"));
        }

        let last_message = messages.last().map(|m| m.content.as_str()).unwrap_or("");
        let prompt_tokens = messages.iter().map(|m| m.content.len() as u64).sum::<u64>() / 4;
        let completion_tokens = self.response.len() as u64 / 4;

        Ok(LlmResponse {
            content: format!("{}: {}", self.response, last_message),
            finish_reason: self.finish_reason.clone(),
            usage: LlmUsage {
                prompt_tokens,
                completion_tokens,
                total_tokens: prompt_tokens + completion_tokens,
            },
        })
    }
}

// =============================================================================
// Unconfigured Generation Backend
// =============================================================================

/// Stand-in used when no generation endpoint is configured. Every call fails,
/// so requests degrade through the generation agent's fallback chain.
pub struct UnavailableGenerationBackend {
    id: String,
}

impl UnavailableGenerationBackend {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

#[async_trait]
impl GenerationBackend for UnavailableGenerationBackend {
    fn id(&self) -> &str {
        &self.id
    }

    async fn generate(&self, _request: GenerationRequest) -> Result<GenerationOutput> {
        Err(Error::generation_backend(format!(
            "no endpoint configured for '{}'",
            self.id
        )))
    }
}

//! OpenAI-compatible chat-completions client.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use verdant_core::{
    config::TextBackendConfig,
    traits::{ChatMessage, LlmClient, LlmResponse, LlmUsage},
    Error, Result,
};

/// Chat-completions client with a per-request timeout.
pub struct OpenAiChatClient {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<Secret<String>>,
}

impl OpenAiChatClient {
    pub fn new(config: &TextBackendConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(key) = &self.api_key {
            let value = format!("Bearer {}", key.expose_secret());
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&value)
                    .map_err(|e| Error::config(format!("Invalid API key header: {}", e)))?,
            );
        }
        Ok(headers)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
    #[serde(default)]
    total_tokens: u64,
}

/// Map a transport error, keeping timeouts distinguishable.
pub(crate) fn transport_error(e: reqwest::Error, wrap: impl FnOnce(String) -> Error) -> Error {
    if e.is_timeout() {
        Error::Timeout(e.to_string())
    } else {
        wrap(e.to_string())
    }
}

#[async_trait]
impl LlmClient for OpenAiChatClient {
    async fn complete(&self, prompt: &str) -> Result<LlmResponse> {
        self.chat(&[ChatMessage::new("user", prompt)]).await
    }

    async fn chat(&self, messages: &[ChatMessage]) -> Result<LlmResponse> {
        let body = ChatRequest {
            model: &self.model,
            messages,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(e, |msg| Error::text_backend(msg)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(Error::text_backend(format!("HTTP {}: {}", status, text)));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::text_backend(format!("Malformed chat response: {}", e)))?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::text_backend("Missing choices"))?;

        let usage = parsed
            .usage
            .map(|u| LlmUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            })
            .unwrap_or_default();

        tracing::debug!(
            model = %self.model,
            total_tokens = usage.total_tokens,
            "Chat completion finished"
        );

        Ok(LlmResponse {
            content: choice.message.content.unwrap_or_default(),
            finish_reason: choice.finish_reason.unwrap_or_else(|| "stop".to_string()),
            usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_base_url() {
        let config = TextBackendConfig {
            base_url: "https://llm.example.com/v1/".to_string(),
            ..TextBackendConfig::default()
        };
        let client = OpenAiChatClient::new(&config).unwrap();
        assert_eq!(client.endpoint, "https://llm.example.com/v1/chat/completions");
        assert_eq!(client.model(), config.model);
    }

    #[test]
    fn test_response_parsing_tolerates_missing_fields() {
        let parsed: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":"hi"}}]}"#).unwrap();
        assert!(parsed.usage.is_none());
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("hi"));
        assert!(parsed.choices[0].finish_reason.is_none());
    }
}

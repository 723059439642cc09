#![deny(unused)]
//! Outbound model backends for Verdant.
//!
//! This crate provides:
//! - An OpenAI-compatible chat client and its text backend adapter
//! - A JSON-over-HTTP image generation backend
//! - Offline stand-ins for local runs

pub mod chat_backend;
pub mod http_generation;
pub mod openai;
pub mod providers;

pub use chat_backend::ChatTextBackend;
pub use http_generation::HttpGenerationBackend;
pub use openai::OpenAiChatClient;
pub use providers::{MockLlmClient, UnavailableGenerationBackend};

use std::sync::Arc;

use verdant_core::{
    config::{GenerationConfig, TextBackendConfig},
    traits::{GenerationBackend, LlmClient, TextBackend},
    Result,
};

/// Text backend from configuration. Without an API key the offline mock
/// client is used.
pub fn create_text_backend(config: &TextBackendConfig) -> Result<Arc<dyn TextBackend>> {
    let client: Arc<dyn LlmClient> = if config.api_key.is_some() {
        tracing::info!(model = %config.model, base_url = %config.base_url, "Using chat-completions backend");
        Arc::new(OpenAiChatClient::new(config)?)
    } else {
        tracing::warn!("No text backend API key configured, using mock client");
        Arc::new(MockLlmClient::new("[offline]"))
    };
    Ok(Arc::new(ChatTextBackend::new(client)))
}

/// Generation backend from configuration. Without an endpoint every
/// generation request falls back to a conversational redirect.
pub fn create_generation_backend(config: &GenerationConfig) -> Result<Arc<dyn GenerationBackend>> {
    match HttpGenerationBackend::from_config(config)? {
        Some(backend) => {
            tracing::info!(backend = %config.backend_id, "Using HTTP generation backend");
            Ok(Arc::new(backend))
        }
        None => {
            tracing::warn!(backend = %config.backend_id, "No generation endpoint configured");
            Ok(Arc::new(UnavailableGenerationBackend::new(config.backend_id.clone())))
        }
    }
}

//! Outbound backend interfaces.
//!
//! Both backends are responsible for their own timeouts; a timeout surfaces
//! as an ordinary `Err`.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{Attachment, ConversationMessage};

// =============================================================================
// Text / Vision Backend
// =============================================================================

/// Input for a conversational completion.
#[derive(Debug, Clone, Default)]
pub struct TextRequest {
    /// Specialist persona, if any.
    pub system_prompt: Option<String>,
    /// Current user message.
    pub user_message: String,
    /// Prior messages, oldest first.
    pub history: Vec<ConversationMessage>,
    /// Attachments on the current turn.
    pub attachments: Vec<Attachment>,
}

/// Reply from the text backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextReply {
    pub text: String,
    /// Backend's own confidence hint, when it provides one.
    pub confidence: Option<f64>,
}

/// Text/vision model reachable through a single call.
#[async_trait]
pub trait TextBackend: Send + Sync {
    async fn respond(&self, request: TextRequest) -> Result<TextReply>;
}

// =============================================================================
// Generation Backend
// =============================================================================

/// Input for image generation.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    /// Reference images, already selected and capped.
    pub images: Vec<Bytes>,
    /// Language code the textual part should use.
    pub language: String,
    pub image_count: u32,
}

/// Output of image generation.
#[derive(Debug, Clone, Default)]
pub struct GenerationOutput {
    pub text: Option<String>,
    pub images: Vec<Bytes>,
    /// MIME type per image; may be shorter than `images`.
    pub mime_types: Vec<String>,
}

/// Image generation model reachable through a single call.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Identifier used as the plan's `targetAPI`.
    fn id(&self) -> &str;

    async fn generate(&self, request: GenerationRequest) -> Result<GenerationOutput>;
}

use bytes::Bytes;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

/// Number of trailing messages considered "recent".
pub const RECENT_MESSAGE_WINDOW: usize = 5;

// =============================================================================
// Attachments
// =============================================================================

/// Media attached to a message or produced by an agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    /// Stable identifier, also the deduplication key.
    pub id: String,
    /// File name.
    #[serde(default)]
    pub name: String,
    /// MIME type.
    pub mime_type: String,
    /// Raw content, base64 on the wire.
    #[serde(default, with = "base64_bytes")]
    pub data: Bytes,
}

impl Attachment {
    /// Create an attachment with a fresh identifier.
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Override the identifier.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Whether this attachment is an image.
    pub fn is_image(&self) -> bool {
        self.mime_type.trim().to_lowercase().starts_with("image/")
    }
}

mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine};
    use bytes::Bytes;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(data))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Bytes, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map(Bytes::from)
            .map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Conversation
// =============================================================================

/// Author of a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

impl MessageRole {
    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
        }
    }
}

/// One message of the conversation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationMessage {
    pub role: MessageRole,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    /// Unix timestamp (seconds).
    #[serde(default)]
    pub timestamp: i64,
}

impl ConversationMessage {
    /// Create a message stamped with the current time.
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            attachments: Vec::new(),
            timestamp: Utc::now().timestamp(),
        }
    }

    /// Shorthand for a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Shorthand for an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    /// Attach media to the message.
    pub fn with_attachments(mut self, attachments: Vec<Attachment>) -> Self {
        self.attachments = attachments;
        self
    }

    /// Image attachments, in attachment order.
    pub fn images(&self) -> impl Iterator<Item = &Attachment> {
        self.attachments.iter().filter(|a| a.is_image())
    }
}

// =============================================================================
// Request Context
// =============================================================================

/// Conversation snapshot at dispatch time. A new context is built per request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestContext {
    /// Current user message text.
    #[serde(default)]
    pub user_message: String,
    /// Prior messages, oldest first.
    #[serde(default)]
    pub history: Vec<ConversationMessage>,
    /// Attachments on the current turn.
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    /// Agent the conversation is currently bound to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_agent_id: Option<String>,
    /// Caller-defined metadata.
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
    /// Summaries of earlier image analyses.
    #[serde(default)]
    pub image_analyses: Vec<String>,
    /// Caller-supplied hint that recent messages carried images.
    #[serde(default)]
    pub has_recent_images: bool,
    /// Language the caller detected for the user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_language: Option<String>,
}

impl RequestContext {
    /// Create a context for a message with no history.
    pub fn new(user_message: impl Into<String>) -> Self {
        Self {
            user_message: user_message.into(),
            ..Default::default()
        }
    }

    pub fn with_history(mut self, history: Vec<ConversationMessage>) -> Self {
        self.history = history;
        self
    }

    pub fn with_attachments(mut self, attachments: Vec<Attachment>) -> Self {
        self.attachments = attachments;
        self
    }

    pub fn with_current_agent(mut self, agent_id: impl Into<String>) -> Self {
        self.current_agent_id = Some(agent_id.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn with_image_analyses(mut self, analyses: Vec<String>) -> Self {
        self.image_analyses = analyses;
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.user_language = Some(language.into());
        self
    }

    /// Whether the current turn carries any attachment.
    pub fn has_attachments(&self) -> bool {
        !self.attachments.is_empty()
    }

    /// Whether the current turn carries an image.
    pub fn has_images(&self) -> bool {
        self.attachments.iter().any(Attachment::is_image)
    }

    /// Image attachments on the current turn.
    pub fn images(&self) -> Vec<&Attachment> {
        self.attachments.iter().filter(|a| a.is_image()).collect()
    }

    /// Number of history messages authored by `role`.
    pub fn message_count(&self, role: MessageRole) -> usize {
        self.history.iter().filter(|m| m.role == role).count()
    }

    pub fn user_message_count(&self) -> usize {
        self.message_count(MessageRole::User)
    }

    pub fn assistant_message_count(&self) -> usize {
        self.message_count(MessageRole::Assistant)
    }

    /// Images from the last [`RECENT_MESSAGE_WINDOW`] messages, newest first.
    pub fn recent_images(&self) -> Vec<&Attachment> {
        self.recent_images_within(RECENT_MESSAGE_WINDOW)
    }

    /// Images from the last `window` messages, newest first.
    pub fn recent_images_within(&self, window: usize) -> Vec<&Attachment> {
        self.history
            .iter()
            .rev()
            .take(window)
            .flat_map(|message| message.images())
            .collect()
    }

    /// Whether recent history holds images, by flag or by inspection.
    pub fn any_recent_images(&self) -> bool {
        self.has_recent_images || !self.recent_images().is_empty()
    }

    /// Every image in the history, oldest first.
    pub fn history_images(&self) -> Vec<&Attachment> {
        self.history.iter().flat_map(|m| m.images()).collect()
    }
}

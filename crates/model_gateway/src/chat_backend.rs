//! Text backend built on a chat-completions client.

use async_trait::async_trait;
use std::sync::Arc;

use verdant_core::{
    traits::{ChatMessage, LlmClient, TextBackend, TextReply, TextRequest},
    types::Attachment,
    Result,
};

/// Confidence hint for a completion that finished normally.
pub const STOP_CONFIDENCE: f64 = 0.9;
/// Confidence hint for a truncated or filtered completion.
pub const DEGRADED_CONFIDENCE: f64 = 0.6;

/// Adapts an [`LlmClient`] to the [`TextBackend`] contract.
pub struct ChatTextBackend {
    client: Arc<dyn LlmClient>,
}

impl ChatTextBackend {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self { client }
    }
}

/// Flatten a text request into chat messages: persona, history, current turn.
pub fn build_messages(request: &TextRequest) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(request.history.len() + 2);

    if let Some(system) = request.system_prompt.as_deref().filter(|s| !s.trim().is_empty()) {
        messages.push(ChatMessage::new("system", system));
    }

    for message in &request.history {
        messages.push(ChatMessage::new(
            message.role.as_str(),
            with_attachment_notes(&message.content, &message.attachments),
        ));
    }

    messages.push(ChatMessage::new(
        "user",
        with_attachment_notes(&request.user_message, &request.attachments),
    ));
    messages
}

fn with_attachment_notes(content: &str, attachments: &[Attachment]) -> String {
    if attachments.is_empty() {
        return content.to_string();
    }
    let notes: Vec<String> = attachments
        .iter()
        .map(|a| format!("[Attached: {} ({}, {} bytes)]", a.name, a.mime_type, a.data.len()))
        .collect();
    format!("{}\n{}", content, notes.join("\n"))
}

#[async_trait]
impl TextBackend for ChatTextBackend {
    async fn respond(&self, request: TextRequest) -> Result<TextReply> {
        let response = self.client.chat(&build_messages(&request)).await?;
        let confidence = if response.finish_reason == "stop" {
            STOP_CONFIDENCE
        } else {
            DEGRADED_CONFIDENCE
        };
        Ok(TextReply {
            text: response.content,
            confidence: Some(confidence),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::MockLlmClient;
    use verdant_core::types::ConversationMessage;

    #[test]
    fn test_message_layout() {
        let request = TextRequest {
            system_prompt: Some("You are a gardener.".to_string()),
            user_message: "What is this?".to_string(),
            history: vec![
                ConversationMessage::user("Hello"),
                ConversationMessage::assistant("Hi! How can I help?"),
            ],
            attachments: vec![Attachment::new("leaf.jpg", "image/jpeg", vec![0u8; 3])],
        };

        let messages = build_messages(&request);
        let roles: Vec<_> = messages.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, ["system", "user", "assistant", "user"]);
        assert!(messages[3].content.contains("[Attached: leaf.jpg (image/jpeg, 3 bytes)]"));
    }

    #[tokio::test]
    async fn test_confidence_from_finish_reason() {
        let backend = ChatTextBackend::new(Arc::new(MockLlmClient::new("Mulch it")));
        let reply = backend
            .respond(TextRequest {
                user_message: "roses?".to_string(),
                ..TextRequest::default()
            })
            .await
            .unwrap();
        assert_eq!(reply.confidence, Some(STOP_CONFIDENCE));
        assert!(reply.text.starts_with("Mulch it"));

        let truncated = ChatTextBackend::new(Arc::new(MockLlmClient::new("x").with_finish_reason("length")));
        let reply = truncated.respond(TextRequest::default()).await.unwrap();
        assert_eq!(reply.confidence, Some(DEGRADED_CONFIDENCE));
    }

    #[tokio::test]
    async fn test_client_failure_propagates() {
        let backend = ChatTextBackend::new(Arc::new(MockLlmClient::failing()));
        let err = backend.respond(TextRequest::default()).await.unwrap_err();
        assert_eq!(err.category(), "text_backend");
    }
}

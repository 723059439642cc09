use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

use super::context::{Attachment, RequestContext};
use super::intent::Intent;
use crate::error::Error;

// =============================================================================
// Dispatched Work
// =============================================================================

/// Unit of work handed to an agent. One per attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentRequest {
    /// Unique per attempt.
    pub request_id: String,
    pub context: RequestContext,
    pub intent: Intent,
    pub timestamp: DateTime<Utc>,
}

impl AgentRequest {
    /// Create a request with a fresh identifier.
    pub fn new(intent: Intent, context: RequestContext) -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            context,
            intent,
            timestamp: Utc::now(),
        }
    }
}

// =============================================================================
// Agent Response
// =============================================================================

/// Outcome of one attempt. Never mutated after it is returned; a retry
/// produces a new response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentResponse {
    pub request_id: String,
    pub is_success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Agent that produced the response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    /// Generated media.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<Attachment>>,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl AgentResponse {
    /// Successful response.
    pub fn success(
        request_id: impl Into<String>,
        message: impl Into<String>,
        attachments: Option<Vec<Attachment>>,
        metadata: HashMap<String, Value>,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            is_success: true,
            message: Some(message.into()),
            agent_id: None,
            attachments,
            metadata,
            error: None,
            timestamp: Utc::now(),
        }
    }

    /// Failed response.
    pub fn error(request_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            is_success: false,
            message: None,
            agent_id: None,
            attachments: None,
            metadata: HashMap::new(),
            error: Some(error.into()),
            timestamp: Utc::now(),
        }
    }

    /// Failed response tagged with the fault category under `error_type`.
    pub fn from_error(request_id: impl Into<String>, err: &Error) -> Self {
        Self::error(request_id, err.to_string()).with_metadata("error_type", err.category())
    }

    /// Set the producing agent. Used while building the response.
    pub fn with_agent(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }

    /// Add a metadata entry. Used while building the response.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Read a boolean metadata flag.
    pub fn metadata_flag(&self, key: &str) -> bool {
        self.metadata.get(key).and_then(Value::as_bool).unwrap_or(false)
    }

    /// Read a string metadata value.
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }

    /// Number of generated attachments.
    pub fn attachment_count(&self) -> usize {
        self.attachments.as_ref().map(Vec::len).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::IntentType;

    #[test]
    fn test_requests_get_distinct_ids() {
        let intent = Intent::new(IntentType::Consultation, 0.9, "");
        let a = AgentRequest::new(intent.clone(), RequestContext::new("x"));
        let b = AgentRequest::new(intent, RequestContext::new("x"));
        assert_ne!(a.request_id, b.request_id);
    }

    #[test]
    fn test_error_response_carries_category() {
        let err = Error::plan_validation("no prompt");
        let response = AgentResponse::from_error("req-1", &err);
        assert!(!response.is_success);
        assert_eq!(response.metadata_str("error_type"), Some("plan_validation"));
        assert!(response.message.is_none());
    }

    #[test]
    fn test_success_response_shape() {
        let response = AgentResponse::success("req-2", "done", None, HashMap::new())
            .with_agent("gardener")
            .with_metadata("fallback_used", true);
        assert!(response.is_success);
        assert!(response.metadata_flag("fallback_used"));
        assert_eq!(response.attachment_count(), 0);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["isSuccess"], true);
        assert_eq!(json["agentId"], "gardener");
    }
}

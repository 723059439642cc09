//! Specialist adapter.
//!
//! Exposes a statically configured domain specialist through the [`Agent`]
//! contract, answering with the text/vision backend.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use verdant_core::{
    config::SpecialistProfile,
    traits::{Agent, TextBackend, TextRequest},
    types::{AgentRequest, AgentResponse, CapabilitySet, Intent, RequestContext},
    Error,
};

use crate::capability::{derive_capabilities, satisfies_intent};

/// Agent backed by a specialist profile and a text backend.
pub struct SpecialistAgent {
    profile: SpecialistProfile,
    backend: Arc<dyn TextBackend>,
    capabilities: OnceLock<CapabilitySet>,
}

impl SpecialistAgent {
    pub fn new(profile: SpecialistProfile, backend: Arc<dyn TextBackend>) -> Self {
        Self {
            profile,
            backend,
            capabilities: OnceLock::new(),
        }
    }

    pub fn profile(&self) -> &SpecialistProfile {
        &self.profile
    }

    pub fn description(&self) -> &str {
        &self.profile.description
    }

    /// Suggested opening questions for this specialist.
    pub fn quick_starts(&self) -> &[String] {
        &self.profile.quick_starts
    }

    fn text_request(&self, context: &RequestContext) -> TextRequest {
        TextRequest {
            system_prompt: Some(self.profile.system_prompt.clone()),
            user_message: context.user_message.clone(),
            history: context.history.clone(),
            attachments: context.attachments.clone(),
        }
    }
}

#[async_trait]
impl Agent for SpecialistAgent {
    fn id(&self) -> &str {
        &self.profile.id
    }

    fn name(&self) -> &str {
        &self.profile.name
    }

    fn capabilities(&self) -> &CapabilitySet {
        self.capabilities
            .get_or_init(|| derive_capabilities(&self.profile.name, &self.profile.expertise_areas))
    }

    fn can_handle(&self, intent: &Intent, _context: &RequestContext) -> bool {
        satisfies_intent(self.capabilities(), intent)
    }

    async fn execute(&self, request: AgentRequest) -> AgentResponse {
        tracing::debug!(
            agent_id = %self.profile.id,
            request_id = %request.request_id,
            history = request.context.history.len(),
            attachments = request.context.attachments.len(),
            "Consulting specialist"
        );

        let outcome = self
            .backend
            .respond(self.text_request(&request.context))
            .await
            .and_then(|reply| {
                if reply.text.trim().is_empty() {
                    Err(Error::text_backend("empty reply"))
                } else {
                    Ok(reply)
                }
            });

        let response = match outcome {
            Ok(reply) => {
                let confidence = reply.confidence.unwrap_or(request.intent.confidence);
                let mut metadata = HashMap::new();
                metadata.insert("confidence".to_string(), confidence.into());
                metadata.insert("specialist".to_string(), self.profile.name.clone().into());
                AgentResponse::success(&request.request_id, reply.text, None, metadata)
            }
            Err(e) => {
                tracing::warn!(
                    agent_id = %self.profile.id,
                    request_id = %request.request_id,
                    error = %e,
                    "Specialist execution failed"
                );
                AgentResponse::from_error(&request.request_id, &e)
            }
        };
        response.with_agent(self.profile.id.clone())
    }
}

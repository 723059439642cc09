use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;

use verdant_core::{
    config::OrchestratorConfig,
    traits::{Agent, GenerationBackend, GenerationOutput, GenerationRequest},
    types::{
        AgentRequest, AgentResponse, Attachment, Capability, CapabilitySet, ExecutionPlan, Intent,
        PlanAction, RequestContext,
    },
    Error, Result,
};

use super::language::{consultation_redirect, detect_language, generation_caption};
use super::plan::{acquire_plan, simplify_prompt, validate_plan};
use super::selection::{select_images, SelectionLimits};
use crate::capability::wants_image_generation;
use verdant_governance::ExecutionMetricsTracker;

/// Tracker component for the first backend call of a request.
pub const PRIMARY_ATTEMPT_COMPONENT: &str = "generation:primary";

/// Tracker component for the simplified retry.
pub const SIMPLIFIED_ATTEMPT_COMPONENT: &str = "generation:simplified";

/// Tunables for [`GenerationAgent`].
#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub limits: SelectionLimits,
    /// Maximum characters kept by the simplified retry prompt.
    pub simplified_prompt_len: usize,
    pub default_language: String,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            limits: SelectionLimits::default(),
            simplified_prompt_len: 100,
            default_language: "en".to_string(),
        }
    }
}

impl From<&OrchestratorConfig> for GenerationSettings {
    fn from(config: &OrchestratorConfig) -> Self {
        Self {
            limits: SelectionLimits::from(config),
            simplified_prompt_len: config.simplified_prompt_len,
            default_language: config.default_language.clone(),
        }
    }
}

/// Work prepared before any backend call.
struct PreparedGeneration {
    plan: ExecutionPlan,
    images: Vec<Bytes>,
    language: String,
}

/// Which attempt produced a successful output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    Primary,
    Simplified,
}

/// Agent that turns generation intents into images.
pub struct GenerationAgent {
    id: String,
    name: String,
    backend: Arc<dyn GenerationBackend>,
    settings: GenerationSettings,
    capabilities: CapabilitySet,
    metrics: Option<Arc<ExecutionMetricsTracker>>,
}

impl GenerationAgent {
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self {
            id: "image_generator".to_string(),
            name: "Design Visualizer".to_string(),
            backend,
            settings: GenerationSettings::default(),
            capabilities: [
                Capability::ImageGeneration,
                Capability::TextGeneration,
                Capability::LandscapeDesign,
            ]
            .into_iter()
            .collect(),
            metrics: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_settings(mut self, settings: GenerationSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Record every backend attempt, including the ones the fallback chain
    /// absorbs.
    pub fn with_metrics(mut self, metrics: Arc<ExecutionMetricsTracker>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    // =========================================================================
    // Plan stage
    // =========================================================================

    /// Acquire, validate and select. Every failure here is a plan-stage fault.
    fn prepare(&self, intent: &Intent, context: &RequestContext) -> Result<PreparedGeneration> {
        let language = detect_language(context, &self.settings.default_language);
        let backend_id = self.backend.id();

        let plan = validate_plan(
            acquire_plan(intent, context, backend_id),
            context,
            backend_id,
            &language,
        );

        if plan.action != PlanAction::GenerateImage {
            return Err(Error::plan_validation(format!(
                "plan action '{}' is not image generation",
                plan.action.as_str()
            )));
        }

        let selected = select_images(&plan.image_selection, context, self.settings.limits);
        if let Some(empty) = selected.iter().find(|image| image.data.is_empty()) {
            return Err(Error::image_selection(format!(
                "selected image '{}' has no data",
                empty.id
            )));
        }

        tracing::debug!(
            agent_id = %self.id,
            target_api = %plan.target_api,
            images = selected.len(),
            language = %language,
            "Prepared generation plan"
        );

        Ok(PreparedGeneration {
            images: selected.iter().map(|image| image.data.clone()).collect(),
            plan,
            language,
        })
    }

    // =========================================================================
    // Execution stage
    // =========================================================================

    async fn run(&self, request_id: &str, prepared: PreparedGeneration) -> AgentResponse {
        let primary = GenerationRequest {
            prompt: prepared.plan.enhanced_prompt.clone(),
            images: prepared.images.clone(),
            language: prepared.language.clone(),
            image_count: prepared.plan.expected_outputs.image_count,
        };

        let primary_error = match self.attempt(PRIMARY_ATTEMPT_COMPONENT, primary).await {
            Ok(output) => return self.success(request_id, &prepared, output, Attempt::Primary),
            Err(e) => e,
        };
        tracing::warn!(
            agent_id = %self.id,
            request_id = %request_id,
            error = %primary_error,
            "Primary generation failed, retrying with simplified prompt"
        );

        let retry = GenerationRequest {
            prompt: simplify_prompt(
                &prepared.plan.enhanced_prompt,
                self.settings.simplified_prompt_len,
                &prepared.language,
            ),
            images: prepared.images.iter().take(1).cloned().collect(),
            language: prepared.language.clone(),
            image_count: prepared.plan.expected_outputs.image_count,
        };

        let retry_error = match self.attempt(SIMPLIFIED_ATTEMPT_COMPONENT, retry).await {
            Ok(output) => {
                return self
                    .success(request_id, &prepared, output, Attempt::Simplified)
                    .with_metadata("primary_error", primary_error.to_string())
            }
            Err(e) => e,
        };
        tracing::warn!(
            agent_id = %self.id,
            request_id = %request_id,
            error = %retry_error,
            "Simplified generation failed, redirecting to consultation"
        );

        AgentResponse::success(
            request_id,
            consultation_redirect(&prepared.language),
            None,
            HashMap::new(),
        )
        .with_metadata("fallback_used", true)
        .with_metadata("fallback_type", "consultation")
        .with_metadata("primary_error", primary_error.to_string())
        .with_metadata("fallback_error", retry_error.to_string())
        .with_metadata("language", prepared.language.clone())
    }

    async fn attempt(&self, component: &str, request: GenerationRequest) -> Result<GenerationOutput> {
        let call = self.backend.generate(request);
        match &self.metrics {
            Some(metrics) => metrics.track(component, call).await,
            None => call.await,
        }
    }

    fn success(
        &self,
        request_id: &str,
        prepared: &PreparedGeneration,
        output: GenerationOutput,
        attempt: Attempt,
    ) -> AgentResponse {
        let timestamp = chrono::Utc::now().timestamp_millis();
        let attachments: Vec<Attachment> = output
            .images
            .iter()
            .enumerate()
            .map(|(index, data)| {
                let mime = output
                    .mime_types
                    .get(index)
                    .map(String::as_str)
                    .unwrap_or("image/png");
                Attachment::new(generated_name(timestamp, index, data, mime), mime, data.clone())
            })
            .collect();

        let message = output
            .text
            .filter(|text| !text.trim().is_empty())
            .unwrap_or_else(|| generation_caption(&prepared.language).to_string());

        let mut metadata: HashMap<String, Value> = HashMap::new();
        metadata.insert("target_api".into(), prepared.plan.target_api.clone().into());
        metadata.insert("images_selected".into(), prepared.images.len().into());
        metadata.insert("images_generated".into(), attachments.len().into());
        metadata.insert("language".into(), prepared.language.clone().into());
        metadata.insert("fallback_used".into(), (attempt == Attempt::Simplified).into());
        if attempt == Attempt::Simplified {
            metadata.insert("fallback_type".into(), "simplified_prompt".into());
        }

        tracing::info!(
            agent_id = %self.id,
            request_id = %request_id,
            images = attachments.len(),
            fallback = attempt == Attempt::Simplified,
            "Generation succeeded"
        );

        let attachments = if attachments.is_empty() {
            None
        } else {
            Some(attachments)
        };
        AgentResponse::success(request_id, message, attachments, metadata)
    }
}

#[async_trait]
impl Agent for GenerationAgent {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> &CapabilitySet {
        &self.capabilities
    }

    fn can_handle(&self, intent: &Intent, _context: &RequestContext) -> bool {
        wants_image_generation(intent)
    }

    async fn execute(&self, request: AgentRequest) -> AgentResponse {
        let response = match self.prepare(&request.intent, &request.context) {
            Ok(prepared) => self.run(&request.request_id, prepared).await,
            Err(e) => {
                tracing::warn!(
                    agent_id = %self.id,
                    request_id = %request.request_id,
                    error = %e,
                    "Generation plan stage failed"
                );
                AgentResponse::from_error(&request.request_id, &e)
            }
        };
        response.with_agent(self.id.clone())
    }

    async fn initialize(&self) -> Result<()> {
        tracing::info!(agent_id = %self.id, backend = %self.backend.id(), "Generation agent ready");
        Ok(())
    }
}

/// `generated_{unix_millis}_{index}_{digest}.{ext}`; the content digest keeps
/// names distinct across requests landing on the same millisecond.
fn generated_name(timestamp_ms: i64, index: usize, data: &[u8], mime: &str) -> String {
    let digest = Sha256::digest(data);
    let hex = format!("{:x}", digest);
    format!(
        "generated_{}_{}_{}.{}",
        timestamp_ms,
        index,
        &hex[..8],
        extension_for(mime)
    )
}

fn extension_for(mime: &str) -> &'static str {
    match mime {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/webp" => "webp",
        "image/gif" => "gif",
        _ => "png",
    }
}

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

// =============================================================================
// Intent Classification (upstream classifier output)
// =============================================================================

/// Base category of a classified user turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum IntentType {
    Consultation,
    Generation,
    Modification,
    Analysis,
    #[default]
    Unclear,
}

impl IntentType {
    /// Parse a wire name, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "consultation" => Some(Self::Consultation),
            "generation" => Some(Self::Generation),
            "modification" => Some(Self::Modification),
            "analysis" => Some(Self::Analysis),
            "unclear" => Some(Self::Unclear),
            _ => None,
        }
    }

    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Consultation => "consultation",
            Self::Generation => "generation",
            Self::Modification => "modification",
            Self::Analysis => "analysis",
            Self::Unclear => "unclear",
        }
    }
}

impl fmt::Display for IntentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Finer-grained category under an [`IntentType`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum IntentSubtype {
    PlantSelection,
    PlantCare,
    PestControl,
    ConstructionAdvice,
    MaterialSelection,
    DesignConcept,
    Zoning,
    EcologyAdvice,
    ImageAnalysis,
    ImageGeneration,
    PlanGeneration,
    /// Subtype the router has no dedicated rule for.
    Other(String),
}

impl IntentSubtype {
    /// Wire name (camelCase, as emitted by the classifier).
    pub fn as_str(&self) -> &str {
        match self {
            Self::PlantSelection => "plantSelection",
            Self::PlantCare => "plantCare",
            Self::PestControl => "pestControl",
            Self::ConstructionAdvice => "constructionAdvice",
            Self::MaterialSelection => "materialSelection",
            Self::DesignConcept => "designConcept",
            Self::Zoning => "zoning",
            Self::EcologyAdvice => "ecologyAdvice",
            Self::ImageAnalysis => "imageAnalysis",
            Self::ImageGeneration => "imageGeneration",
            Self::PlanGeneration => "planGeneration",
            Self::Other(name) => name.as_str(),
        }
    }
}

impl From<String> for IntentSubtype {
    fn from(value: String) -> Self {
        match value.as_str() {
            "plantSelection" => Self::PlantSelection,
            "plantCare" => Self::PlantCare,
            "pestControl" => Self::PestControl,
            "constructionAdvice" => Self::ConstructionAdvice,
            "materialSelection" => Self::MaterialSelection,
            "designConcept" => Self::DesignConcept,
            "zoning" => Self::Zoning,
            "ecologyAdvice" => Self::EcologyAdvice,
            "imageAnalysis" => Self::ImageAnalysis,
            "imageGeneration" => Self::ImageGeneration,
            "planGeneration" => Self::PlanGeneration,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for IntentSubtype {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<IntentSubtype> for String {
    fn from(value: IntentSubtype) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for IntentSubtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the user wants done with attached or earlier images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ImageIntent {
    AnalyzeNew,
    AnalyzeRecent,
    Compare,
    ReferenceSpecific,
    GenerateBased,
    None,
    Unclear,
}

impl ImageIntent {
    /// Parse a wire name.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "analyzeNew" => Some(Self::AnalyzeNew),
            "analyzeRecent" => Some(Self::AnalyzeRecent),
            "compare" => Some(Self::Compare),
            "referenceSpecific" => Some(Self::ReferenceSpecific),
            "generateBased" => Some(Self::GenerateBased),
            "none" => Some(Self::None),
            "unclear" => Some(Self::Unclear),
            _ => None,
        }
    }
}

/// Classified intent for one user turn.
///
/// Never mutated after construction; the `with_*` builders return a derived
/// copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Intent {
    /// Base category.
    #[serde(rename = "type")]
    pub intent_type: IntentType,
    /// Optional finer-grained category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<IntentSubtype>,
    /// Classifier confidence in `[0, 1]`.
    #[serde(default)]
    pub confidence: f64,
    /// Free-text classifier reasoning.
    #[serde(default)]
    pub reasoning: String,
    /// Requested treatment of images.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_intent: Option<ImageIntent>,
    /// Image positions the user referred to.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub referenced_image_indices: Vec<usize>,
    /// Number of images the classifier believes are needed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images_needed: Option<u32>,
    /// AI-produced work order for generation requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_plan: Option<ExecutionPlan>,
}

impl Intent {
    /// Create a new intent.
    pub fn new(intent_type: IntentType, confidence: f64, reasoning: impl Into<String>) -> Self {
        Self {
            intent_type,
            subtype: None,
            confidence: clamp_confidence(confidence),
            reasoning: reasoning.into(),
            image_intent: None,
            referenced_image_indices: Vec::new(),
            images_needed: None,
            execution_plan: None,
        }
    }

    /// Derive a copy with a subtype.
    pub fn with_subtype(mut self, subtype: impl Into<IntentSubtype>) -> Self {
        self.subtype = Some(subtype.into());
        self
    }

    /// Derive a copy with an image intent.
    pub fn with_image_intent(mut self, image_intent: ImageIntent) -> Self {
        self.image_intent = Some(image_intent);
        self
    }

    /// Derive a copy with referenced image indices.
    pub fn with_referenced_images(mut self, indices: Vec<usize>) -> Self {
        self.referenced_image_indices = indices;
        self
    }

    /// Derive a copy with an image count hint.
    pub fn with_images_needed(mut self, count: u32) -> Self {
        self.images_needed = Some(count);
        self
    }

    /// Derive a copy carrying an execution plan.
    pub fn with_execution_plan(mut self, plan: ExecutionPlan) -> Self {
        self.execution_plan = Some(plan);
        self
    }

    /// Whether the classifier attached a plan whose action is image generation.
    pub fn plans_image_generation(&self) -> bool {
        self.execution_plan
            .as_ref()
            .map(|plan| plan.action == PlanAction::GenerateImage)
            .unwrap_or(false)
    }

    /// Whether the intent matches the pre-plan image generation shape.
    pub fn is_legacy_image_generation(&self) -> bool {
        self.intent_type == IntentType::Generation
            && self.subtype == Some(IntentSubtype::ImageGeneration)
    }

    /// Parse classifier output without ever failing.
    ///
    /// Each field is read independently; missing or mistyped fields fall
    /// back to their defaults, an unknown `type` becomes `unclear`, and
    /// confidence is clamped into `[0, 1]`.
    pub fn from_value(value: &Value) -> Self {
        let intent_type = value
            .get("type")
            .and_then(Value::as_str)
            .and_then(IntentType::parse)
            .unwrap_or_default();

        let confidence = value
            .get("confidence")
            .and_then(Value::as_f64)
            .unwrap_or(0.0);

        let reasoning = value
            .get("reasoning")
            .and_then(Value::as_str)
            .unwrap_or_default();

        let mut intent = Self::new(intent_type, confidence, reasoning);

        intent.subtype = value
            .get("subtype")
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .map(IntentSubtype::from);

        intent.image_intent = value
            .get("imageIntent")
            .and_then(Value::as_str)
            .and_then(ImageIntent::parse);

        intent.referenced_image_indices = value
            .get("referencedImageIndices")
            .map(index_list)
            .unwrap_or_default();

        intent.images_needed = value
            .get("imagesNeeded")
            .and_then(Value::as_u64)
            .map(|n| n.min(u32::MAX as u64) as u32);

        intent.execution_plan = value
            .get("executionPlan")
            .filter(|v| v.is_object())
            .map(ExecutionPlan::from_value);

        intent
    }
}

fn clamp_confidence(confidence: f64) -> f64 {
    if confidence.is_nan() {
        0.0
    } else {
        confidence.clamp(0.0, 1.0)
    }
}

fn index_list(value: &Value) -> Vec<usize> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_u64)
                .map(|i| i as usize)
                .collect()
        })
        .unwrap_or_default()
}

// =============================================================================
// Execution Plan
// =============================================================================

/// Action an execution plan asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum PlanAction {
    #[default]
    GenerateImage,
    AnalyzeImage,
    ConsultText,
}

impl PlanAction {
    /// Parse a wire name. Case and `_`/`-`/space separators are ignored, so
    /// `generate_image` reads as `generateImage`.
    pub fn parse(value: &str) -> Option<Self> {
        let key: String = value
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .collect::<String>()
            .to_lowercase();
        match key.as_str() {
            "generateimage" => Some(Self::GenerateImage),
            "analyzeimage" => Some(Self::AnalyzeImage),
            "consulttext" => Some(Self::ConsultText),
            _ => None,
        }
    }

    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GenerateImage => "generateImage",
            Self::AnalyzeImage => "analyzeImage",
            Self::ConsultText => "consultText",
        }
    }
}

/// Where selected images may come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ImageSource {
    UserCurrent,
    HistoryRecent,
    HistorySpecific,
}

impl ImageSource {
    /// Parse a wire name.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "userCurrent" => Some(Self::UserCurrent),
            "historyRecent" => Some(Self::HistoryRecent),
            "historySpecific" => Some(Self::HistorySpecific),
            _ => None,
        }
    }
}

/// Declarative rule for choosing input media.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSelectionPlan {
    /// Sources to draw from, in priority order.
    #[serde(default)]
    pub sources: Vec<ImageSource>,
    /// Take every image attached to the current turn.
    #[serde(default)]
    pub all_from_user_message: bool,
    /// Explicit positions in the flattened conversation image list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indices: Option<Vec<usize>>,
    /// Human-readable rationale.
    #[serde(default)]
    pub explanation: String,
}

impl ImageSelectionPlan {
    /// Selection of every image on the current turn.
    pub fn current_message() -> Self {
        Self {
            sources: vec![ImageSource::UserCurrent],
            all_from_user_message: true,
            indices: None,
            explanation: "All images attached to the current message".to_string(),
        }
    }

    /// Selection of explicit flattened-history positions.
    pub fn by_indices(indices: Vec<usize>) -> Self {
        Self {
            sources: Vec::new(),
            all_from_user_message: false,
            indices: Some(indices),
            explanation: "Explicitly referenced images".to_string(),
        }
    }

    fn from_value(value: &Value) -> Self {
        Self {
            sources: value
                .get("sources")
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(Value::as_str)
                        .filter_map(ImageSource::parse)
                        .collect()
                })
                .unwrap_or_default(),
            all_from_user_message: value
                .get("allFromUserMessage")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            indices: value
                .get("indices")
                .filter(|v| v.is_array())
                .map(index_list),
            explanation: value
                .get("explanation")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        }
    }
}

/// What the backend is expected to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpectedOutputs {
    #[serde(default)]
    pub image_count: u32,
    #[serde(default)]
    pub include_text: bool,
}

impl Default for ExpectedOutputs {
    fn default() -> Self {
        Self {
            image_count: 1,
            include_text: true,
        }
    }
}

/// Work order for a generation request.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionPlan {
    #[serde(default)]
    pub action: PlanAction,
    /// Backend identifier; empty until validated.
    #[serde(default, rename = "targetAPI")]
    pub target_api: String,
    #[serde(default)]
    pub image_selection: ImageSelectionPlan,
    #[serde(default)]
    pub enhanced_prompt: String,
    #[serde(default)]
    pub expected_outputs: ExpectedOutputs,
}

impl ExecutionPlan {
    /// Parse a plan leniently. A missing or unrecognised action defaults to
    /// `generateImage`, like every other garbled plan field.
    pub fn from_value(value: &Value) -> Self {
        let action = value
            .get("action")
            .and_then(Value::as_str)
            .and_then(PlanAction::parse)
            .unwrap_or_default();

        let expected_outputs = value
            .get("expectedOutputs")
            .map(|outputs| ExpectedOutputs {
                image_count: outputs
                    .get("imageCount")
                    .and_then(Value::as_u64)
                    .map(|n| n.min(u32::MAX as u64) as u32)
                    .unwrap_or(0),
                include_text: outputs
                    .get("includeText")
                    .and_then(Value::as_bool)
                    .unwrap_or(true),
            })
            .unwrap_or_default();

        Self {
            action,
            target_api: value
                .get("targetAPI")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            image_selection: value
                .get("imageSelection")
                .map(ImageSelectionPlan::from_value)
                .unwrap_or_default(),
            enhanced_prompt: value
                .get("enhancedPrompt")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            expected_outputs,
        }
    }
}

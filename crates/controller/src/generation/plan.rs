//! Execution plan acquisition, validation and prompt simplification.

use verdant_core::types::{
    ExecutionPlan, ExpectedOutputs, ImageSelectionPlan, ImageSource, Intent, PlanAction,
    RequestContext,
};

use super::language::generic_prompt;
use crate::capability::wants_image_generation;

/// Plan used when the classifier did not attach one.
pub fn default_plan(context: &RequestContext, backend_id: &str) -> ExecutionPlan {
    ExecutionPlan {
        action: PlanAction::GenerateImage,
        target_api: backend_id.to_string(),
        image_selection: ImageSelectionPlan::current_message(),
        enhanced_prompt: context.user_message.clone(),
        expected_outputs: ExpectedOutputs::default(),
    }
}

/// Take the intent's plan, or synthesize the default one.
///
/// A plan that names `historySpecific` without explicit indices inherits the
/// intent's referenced image indices. When the intent asks for generation
/// through its type/subtype or image intent, a contradicting plan action is
/// repaired to `generateImage`.
pub fn acquire_plan(intent: &Intent, context: &RequestContext, backend_id: &str) -> ExecutionPlan {
    let Some(mut plan) = intent.execution_plan.clone() else {
        return default_plan(context, backend_id);
    };

    if plan.action != PlanAction::GenerateImage && wants_image_generation(intent) {
        tracing::debug!(
            action = plan.action.as_str(),
            "Repairing plan action contradicted by the intent"
        );
        plan.action = PlanAction::GenerateImage;
    }

    let selection = &mut plan.image_selection;
    if selection.indices.is_none()
        && selection.sources.contains(&ImageSource::HistorySpecific)
        && !intent.referenced_image_indices.is_empty()
    {
        selection.indices = Some(intent.referenced_image_indices.clone());
    }
    plan
}

/// Fill in smart defaults. Total: any input yields a plan with a non-empty
/// target, a non-empty prompt and at least one expected image.
pub fn validate_plan(
    mut plan: ExecutionPlan,
    context: &RequestContext,
    backend_id: &str,
    language: &str,
) -> ExecutionPlan {
    if plan.target_api.trim().is_empty() {
        plan.target_api = if backend_id.trim().is_empty() {
            DEFAULT_TARGET_API.to_string()
        } else {
            backend_id.to_string()
        };
    }

    if plan.enhanced_prompt.trim().is_empty() {
        plan.enhanced_prompt = if context.user_message.trim().is_empty() {
            generic_prompt(language).to_string()
        } else {
            context.user_message.clone()
        };
    }

    if plan.image_selection.all_from_user_message && !context.has_images() {
        plan.image_selection.all_from_user_message = false;
    }

    if plan.image_selection.indices.as_ref().is_some_and(Vec::is_empty) {
        plan.image_selection.indices = None;
    }

    if plan.expected_outputs.image_count == 0 {
        plan.expected_outputs.image_count = 1;
    }

    plan
}

/// Target used when neither the plan nor the backend names one.
pub const DEFAULT_TARGET_API: &str = "image-generation";

/// Reduce a prompt to plain words for the retry attempt.
///
/// Keeps letters, digits and whitespace, collapses whitespace, truncates to
/// `max_len` characters, and falls back to a generic prompt when nothing is
/// left.
pub fn simplify_prompt(prompt: &str, max_len: usize, language: &str) -> String {
    let cleaned: String = prompt
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    let truncated: String = collapsed.chars().take(max_len).collect();
    let truncated = truncated.trim_end();

    if truncated.is_empty() {
        generic_prompt(language).to_string()
    } else {
        truncated.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use verdant_core::types::{Attachment, IntentType};

    fn photo() -> Attachment {
        Attachment::new("yard.jpg", "image/jpeg", vec![1u8, 2, 3])
    }

    #[test]
    fn test_default_plan_shape() {
        let ctx = RequestContext::new("Draw a rose garden").with_attachments(vec![photo()]);
        let intent = Intent::new(IntentType::Generation, 0.9, "").with_subtype("imageGeneration");
        let plan = validate_plan(acquire_plan(&intent, &ctx, "imagen"), &ctx, "imagen", "en");

        assert_eq!(plan.action, PlanAction::GenerateImage);
        assert_eq!(plan.target_api, "imagen");
        assert_eq!(plan.enhanced_prompt, "Draw a rose garden");
        assert_eq!(plan.expected_outputs.image_count, 1);
        assert!(plan.expected_outputs.include_text);
        assert!(plan.image_selection.all_from_user_message);
    }

    #[test]
    fn test_contradicting_action_repaired_for_generation_intents() {
        let ctx = RequestContext::new("Add a pergola");
        let analyze = ExecutionPlan {
            action: PlanAction::AnalyzeImage,
            ..ExecutionPlan::default()
        };

        let legacy = Intent::new(IntentType::Generation, 0.9, "")
            .with_subtype("imageGeneration")
            .with_execution_plan(analyze.clone());
        assert_eq!(acquire_plan(&legacy, &ctx, "imagen").action, PlanAction::GenerateImage);

        let consult = Intent::new(IntentType::Consultation, 0.9, "").with_execution_plan(analyze);
        assert_eq!(acquire_plan(&consult, &ctx, "imagen").action, PlanAction::AnalyzeImage);
    }

    #[test]
    fn test_all_from_user_message_dropped_without_images() {
        let ctx = RequestContext::new("Draw a rose garden");
        let plan = validate_plan(default_plan(&ctx, "imagen"), &ctx, "imagen", "en");
        assert!(!plan.image_selection.all_from_user_message);
    }

    #[test]
    fn test_validation_is_total() {
        let empty = RequestContext::new("");
        let plan = validate_plan(ExecutionPlan::default(), &empty, "", "en");
        assert!(!plan.target_api.is_empty());
        assert!(!plan.enhanced_prompt.is_empty());
        assert!(plan.expected_outputs.image_count >= 1);

        let zero = ExecutionPlan {
            expected_outputs: ExpectedOutputs {
                image_count: 0,
                include_text: false,
            },
            ..ExecutionPlan::default()
        };
        let plan = validate_plan(zero, &RequestContext::new("pond"), "imagen", "en");
        assert_eq!(plan.expected_outputs.image_count, 1);
        assert_eq!(plan.enhanced_prompt, "pond");
    }

    #[test]
    fn test_history_specific_inherits_referenced_indices() {
        let plan = ExecutionPlan {
            image_selection: ImageSelectionPlan {
                sources: vec![ImageSource::HistorySpecific],
                ..ImageSelectionPlan::default()
            },
            ..ExecutionPlan::default()
        };
        let intent = Intent::new(IntentType::Generation, 0.9, "")
            .with_referenced_images(vec![1])
            .with_execution_plan(plan);
        let acquired = acquire_plan(&intent, &RequestContext::new("x"), "imagen");
        assert_eq!(acquired.image_selection.indices, Some(vec![1]));
    }

    #[test]
    fn test_simplify_prompt() {
        assert_eq!(
            simplify_prompt("  A *modern* garden -- with   ponds!!! ", 100, "en"),
            "A modern garden with ponds"
        );
        assert_eq!(simplify_prompt("!!!", 100, "en"), generic_prompt("en"));
        assert_eq!(simplify_prompt(&"a".repeat(300), 100, "en").chars().count(), 100);
        assert_eq!(simplify_prompt("Сад, пруд!", 100, "ru"), "Сад пруд");
    }
}

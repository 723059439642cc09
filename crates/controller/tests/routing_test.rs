//! Capability derivation and eligibility for configured specialists.

use std::sync::Arc;

use verdant_controller::SpecialistAgent;
use verdant_core::config::{SpecialistCatalog, SpecialistProfile};
use verdant_core::mocks::ScriptedTextBackend;
use verdant_core::traits::Agent;
use verdant_core::types::{Attachment, Capability, ImageIntent, Intent, IntentType, RequestContext};

fn specialist(name: &str, areas: &[&str]) -> SpecialistAgent {
    let profile = SpecialistProfile {
        id: name.to_lowercase().replace(' ', "_"),
        name: name.to_string(),
        description: String::new(),
        system_prompt: "You help with gardens.".to_string(),
        quick_starts: vec!["Where do I start?".to_string()],
        expertise_areas: areas.iter().map(|s| s.to_string()).collect(),
    };
    SpecialistAgent::new(profile, Arc::new(ScriptedTextBackend::replying("ok")))
}

#[test]
fn test_pest_control_expert_handles_plant_selection() {
    let agent = specialist("Plant Doctor", &["pest control"]);
    let intent = Intent::new(IntentType::Consultation, 0.9, "").with_subtype("plantSelection");
    assert!(agent.can_handle(&intent, &RequestContext::new("Which roses resist aphids?")));
}

#[test]
fn test_zoning_yields_design_and_planning() {
    let agent = specialist("Site Planner", &["zoning"]);
    assert!(agent.has_capability(&Capability::LandscapeDesign));
    assert!(agent.has_capability(&Capability::Planning));

    let intent = Intent::new(IntentType::Generation, 0.9, "").with_subtype("planGeneration");
    assert!(agent.can_handle(&intent, &RequestContext::new("plan my plot")));
}

#[test]
fn test_capability_sets_are_stable() {
    let a = specialist("Helper", &["paving", "ecology", "pest control"]);
    let b = specialist("Helper", &["pest control", "paving", "ecology"]);
    assert_eq!(a.capabilities(), b.capabilities());
    assert_eq!(a.capabilities(), a.capabilities());
}

#[test]
fn test_subtype_gate_rejects_missing_domain() {
    let agent = specialist("Garden Ecologist", &["biodiversity"]);
    let intent = Intent::new(IntentType::Consultation, 0.9, "").with_subtype("constructionAdvice");
    assert!(!agent.can_handle(&intent, &RequestContext::new("How thick should a slab be?")));
}

#[test]
fn test_images_never_gate_eligibility() {
    let agent = specialist("Master Gardener", &["plant care"]);
    let intent = Intent::new(IntentType::Analysis, 0.8, "")
        .with_subtype("plantCare")
        .with_image_intent(ImageIntent::AnalyzeNew);
    let photo = Attachment::new("leaf.jpg", "image/jpeg", vec![1u8, 2]);

    let with_image = RequestContext::new("what's wrong?").with_attachments(vec![photo]);
    let without = RequestContext::new("what's wrong?");
    assert!(agent.can_handle(&intent, &with_image));
    assert!(agent.can_handle(&intent, &without));
}

#[test]
fn test_unclear_is_always_accepted_without_subtype() {
    for profile in SpecialistCatalog::builtin().specialists {
        let agent = SpecialistAgent::new(profile, Arc::new(ScriptedTextBackend::replying("ok")));
        assert!(agent.can_handle(&Intent::new(IntentType::Unclear, 0.1, ""), &RequestContext::new("hm")));
    }
}

#[test]
fn test_quick_starts_are_exposed() {
    let agent = specialist("Master Gardener", &["plant care"]);
    assert_eq!(agent.quick_starts(), ["Where do I start?"]);
}

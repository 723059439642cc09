//! Capability resolution.
//!
//! Two directions live here:
//! - deriving an agent's capability set from its static profile
//!   (expertise areas, then display name as a legacy fallback);
//! - deriving which capabilities an intent requires.
//!
//! Both are pure functions of their inputs.

use verdant_core::types::{Capability, CapabilitySet, ImageIntent, Intent, IntentSubtype, IntentType};

// =============================================================================
// Profile -> Capabilities
// =============================================================================

/// Derive the full capability set for a specialist.
///
/// Union of the expertise-area table, the name heuristic (only when the table
/// yields no domain capability), and the baseline every agent carries.
pub fn derive_capabilities(name: &str, expertise_areas: &[String]) -> CapabilitySet {
    let mut capabilities: CapabilitySet = expertise_areas
        .iter()
        .flat_map(|area| expertise_capabilities(area))
        .collect();

    if capabilities.is_empty() {
        capabilities.extend(name_capabilities(name));
    }

    capabilities.extend(Capability::baseline());
    capabilities
}

/// Capabilities implied by one free-text expertise area.
///
/// Matching ignores case, surrounding whitespace, and `_`/`-` separators.
/// Unknown areas map to nothing.
pub fn expertise_capabilities(area: &str) -> Vec<Capability> {
    use Capability::*;

    match normalize(area).as_str() {
        "gardening" | "plant care" | "pest control" | "soil" | "soil health" | "plant selection"
        | "pruning" | "lawn care" | "vegetable garden" | "composting" | "fertilizing"
        | "seasonal planting" | "уход за растениями" | "защита растений" | "подбор растений" => {
            vec![Gardening]
        }
        "landscape design" | "garden design" | "design" | "style selection" | "composition"
        | "ландшафтный дизайн" | "дизайн" => vec![LandscapeDesign],
        "zoning" | "planting plans" | "layout" | "зонирование" => vec![LandscapeDesign, Planning],
        "site analysis" | "анализ участка" => vec![LandscapeDesign, Analysis],
        "planning" | "project planning" | "budgeting" | "планирование" => vec![Planning],
        "construction" | "paving" | "materials" | "drainage" | "hardscape" | "retaining walls"
        | "decking" | "irrigation" | "строительство" | "материалы" | "дренаж" => {
            vec![Construction]
        }
        "ecology" | "biodiversity" | "water conservation" | "sustainability" | "wildlife"
        | "native plants" | "экология" | "биоразнообразие" | "местные растения" => vec![Ecology],
        "photo analysis" | "image analysis" | "анализ фото" => vec![ImageAnalysis],
        "visualization" | "rendering" | "визуализация" => vec![ImageGeneration],
        _ => Vec::new(),
    }
}

// Legacy compatibility only: keyword matching on display names. New profiles
// should declare expertise areas instead of extending this list.
const NAME_KEYWORDS: &[(&[&str], &str)] = &[
    (&["garden", "plant", "сад", "растен"], "gardening"),
    (&["landscape", "design", "ландшафт", "дизайн"], "landscape_design"),
    (&["build", "construct", "строит"], "construction"),
    (&["eco", "nature", "эколог", "природ"], "ecology"),
    (&["planner", "планиров"], "planning"),
];

/// Capabilities guessed from a display name.
pub fn name_capabilities(name: &str) -> Vec<Capability> {
    let lower = name.to_lowercase();
    NAME_KEYWORDS
        .iter()
        .filter(|(keywords, _)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(_, tag)| Capability::from(*tag))
        .collect()
}

fn normalize(area: &str) -> String {
    area.trim()
        .to_lowercase()
        .replace(['_', '-'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

// =============================================================================
// Intent -> Capabilities
// =============================================================================

/// Capability required by an intent's base type. `None` means any agent
/// qualifies.
pub fn required_capability(intent_type: IntentType) -> Option<Capability> {
    match intent_type {
        IntentType::Consultation | IntentType::Modification => Some(Capability::Consultation),
        IntentType::Analysis => Some(Capability::Analysis),
        IntentType::Generation => Some(Capability::TextGeneration),
        IntentType::Unclear => None,
    }
}

/// Capability required by a subtype. `None` means no extra requirement.
pub fn subtype_capability(subtype: &IntentSubtype) -> Option<Capability> {
    match subtype {
        IntentSubtype::PlantSelection | IntentSubtype::PlantCare | IntentSubtype::PestControl => {
            Some(Capability::Gardening)
        }
        IntentSubtype::ConstructionAdvice | IntentSubtype::MaterialSelection => {
            Some(Capability::Construction)
        }
        IntentSubtype::DesignConcept | IntentSubtype::Zoning => Some(Capability::LandscapeDesign),
        IntentSubtype::EcologyAdvice => Some(Capability::Ecology),
        IntentSubtype::ImageAnalysis => Some(Capability::ImageAnalysis),
        IntentSubtype::ImageGeneration => Some(Capability::ImageGeneration),
        IntentSubtype::PlanGeneration => Some(Capability::Planning),
        IntentSubtype::Other(_) => None,
    }
}

/// Two-stage eligibility check shared by capability-driven agents.
///
/// Stage 1 checks the base type's requirement; stage 2 runs only when a
/// subtype is present. Attachments never gate eligibility.
pub fn satisfies_intent(capabilities: &CapabilitySet, intent: &Intent) -> bool {
    let base_ok = required_capability(intent.intent_type)
        .map(|cap| capabilities.contains(&cap))
        .unwrap_or(true);
    if !base_ok {
        return false;
    }

    intent
        .subtype
        .as_ref()
        .and_then(subtype_capability)
        .map(|cap| capabilities.contains(&cap))
        .unwrap_or(true)
}

/// Whether the intent asks for image generation by any of the accepted shapes.
pub fn wants_image_generation(intent: &Intent) -> bool {
    intent.plans_image_generation()
        || intent.is_legacy_image_generation()
        || intent.image_intent == Some(ImageIntent::GenerateBased)
}

/// The most specific capability an intent asks for, used for ranking.
pub fn preferred_capability(intent: &Intent) -> Option<Capability> {
    if wants_image_generation(intent) {
        return Some(Capability::ImageGeneration);
    }
    intent.subtype.as_ref().and_then(subtype_capability)
}

/// Capabilities used for the registry's any-of lookup. `None` means the
/// intent does not constrain routing.
pub fn routing_capabilities(intent: &Intent) -> Option<Vec<Capability>> {
    if intent.intent_type == IntentType::Unclear && !wants_image_generation(intent) {
        return None;
    }

    let mut capabilities: Vec<Capability> = required_capability(intent.intent_type)
        .into_iter()
        .chain(preferred_capability(intent))
        .collect();
    capabilities.dedup();
    Some(capabilities)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn areas(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_expertise_table_matches_loosely() {
        assert_eq!(expertise_capabilities("Pest Control"), vec![Capability::Gardening]);
        assert_eq!(expertise_capabilities("pest_control"), vec![Capability::Gardening]);
        assert_eq!(
            expertise_capabilities(" zoning "),
            vec![Capability::LandscapeDesign, Capability::Planning]
        );
        assert!(expertise_capabilities("astrology").is_empty());
    }

    #[test]
    fn test_baseline_always_present() {
        let caps = derive_capabilities("Nobody", &[]);
        for cap in Capability::baseline() {
            assert!(caps.contains(&cap));
        }
        assert_eq!(caps.len(), 3);
    }

    #[test]
    fn test_name_heuristic_only_when_table_is_silent() {
        let from_name = derive_capabilities("Садовод", &[]);
        assert!(from_name.contains(&Capability::Gardening));

        let from_table = derive_capabilities("Garden Builder", &areas(&["paving"]));
        assert!(from_table.contains(&Capability::Construction));
        assert!(!from_table.contains(&Capability::Gardening));
    }

    #[test]
    fn test_derivation_is_order_independent() {
        let a = derive_capabilities("x", &areas(&["zoning", "pest control", "paving"]));
        let b = derive_capabilities("x", &areas(&["paving", "zoning", "pest control"]));
        assert_eq!(a, b);
    }

    #[test]
    fn test_required_capability_by_type() {
        assert_eq!(required_capability(IntentType::Modification), Some(Capability::Consultation));
        assert_eq!(required_capability(IntentType::Generation), Some(Capability::TextGeneration));
        assert_eq!(required_capability(IntentType::Unclear), None);
    }

    #[test]
    fn test_two_stage_check() {
        let gardener = derive_capabilities("Gardener", &areas(&["pest control"]));
        let consult = Intent::new(IntentType::Consultation, 0.9, "").with_subtype("plantSelection");
        assert!(satisfies_intent(&gardener, &consult));

        let build = Intent::new(IntentType::Consultation, 0.9, "").with_subtype("constructionAdvice");
        assert!(!satisfies_intent(&gardener, &build));

        let unlisted = Intent::new(IntentType::Analysis, 0.9, "").with_subtype("weatherForecast");
        assert!(satisfies_intent(&gardener, &unlisted));
    }

    #[test]
    fn test_unclear_does_not_constrain_routing() {
        let unclear = Intent::new(IntentType::Unclear, 0.2, "");
        assert!(routing_capabilities(&unclear).is_none());

        let generate = Intent::new(IntentType::Generation, 0.9, "").with_subtype("imageGeneration");
        assert_eq!(
            routing_capabilities(&generate),
            Some(vec![Capability::TextGeneration, Capability::ImageGeneration])
        );
    }
}

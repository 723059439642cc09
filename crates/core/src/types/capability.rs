use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Capability Tags
// =============================================================================

/// Skill tag advertised by an agent and used for routing.
///
/// The closed variants cover every tag the router reasons about; `Custom`
/// carries tags registered later without a code change.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Capability {
    Gardening,
    LandscapeDesign,
    Construction,
    Ecology,
    TextGeneration,
    ImageAnalysis,
    ImageGeneration,
    Consultation,
    Planning,
    Analysis,
    /// Late-registered tag outside the closed set.
    Custom(String),
}

impl Capability {
    /// Wire name of the capability.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Gardening => "gardening",
            Self::LandscapeDesign => "landscape_design",
            Self::Construction => "construction",
            Self::Ecology => "ecology",
            Self::TextGeneration => "text_generation",
            Self::ImageAnalysis => "image_analysis",
            Self::ImageGeneration => "image_generation",
            Self::Consultation => "consultation",
            Self::Planning => "planning",
            Self::Analysis => "analysis",
            Self::Custom(tag) => tag.as_str(),
        }
    }

    /// Capabilities every conversational agent carries.
    pub fn baseline() -> [Capability; 3] {
        [Self::TextGeneration, Self::Consultation, Self::Analysis]
    }
}

impl From<String> for Capability {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "gardening" => Self::Gardening,
            "landscape_design" => Self::LandscapeDesign,
            "construction" => Self::Construction,
            "ecology" => Self::Ecology,
            "text_generation" => Self::TextGeneration,
            "image_analysis" => Self::ImageAnalysis,
            "image_generation" => Self::ImageGeneration,
            "consultation" => Self::Consultation,
            "planning" => Self::Planning,
            "analysis" => Self::Analysis,
            _ => Self::Custom(value),
        }
    }
}

impl From<&str> for Capability {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<Capability> for String {
    fn from(value: Capability) -> Self {
        value.as_str().to_string()
    }
}

impl FromStr for Capability {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deduplicated, order-independent set of capabilities.
pub type CapabilitySet = BTreeSet<Capability>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_tags_round_trip_through_strings() {
        let cap = Capability::from("landscape_design");
        assert_eq!(cap, Capability::LandscapeDesign);
        assert_eq!(cap.to_string(), "landscape_design");
    }

    #[test]
    fn test_unknown_tag_becomes_custom() {
        let cap: Capability = "irrigation".parse().unwrap();
        assert_eq!(cap, Capability::Custom("irrigation".to_string()));
        assert_eq!(cap.as_str(), "irrigation");
    }

    #[test]
    fn test_serde_uses_plain_strings() {
        let json = serde_json::to_string(&Capability::ImageGeneration).unwrap();
        assert_eq!(json, "\"image_generation\"");
        let back: Capability = serde_json::from_str("\"Planning\"").unwrap();
        assert_eq!(back, Capability::Planning);
    }
}

use config::{Config, Environment, File};
use secrecy::Secret;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub orchestrator: OrchestratorConfig,
    pub generation: GenerationConfig,
    pub text_backend: TextBackendConfig,
    pub logging: LoggingConfig,
    /// YAML catalog of specialist profiles. The built-in catalog is used
    /// when unset.
    pub specialists_path: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 3000,
            enable_cors: true,
        }
    }
}

/// Tunables of the orchestration core.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Rolling window size for execution metrics.
    pub metrics_window: usize,
    /// Upper bound on images sent to the generation backend.
    pub max_selected_images: usize,
    /// Trailing messages scanned for recent images.
    pub recent_message_window: usize,
    /// Upper bound on images taken from recent history.
    pub recent_image_cap: usize,
    /// Length limit of the simplified fallback prompt, in characters.
    pub simplified_prompt_len: usize,
    /// Language used when none is detected.
    pub default_language: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            metrics_window: 100,
            max_selected_images: 5,
            recent_message_window: 5,
            recent_image_cap: 3,
            simplified_prompt_len: 100,
            default_language: "en".into(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GenerationConfig {
    /// Identifier written into validated plans.
    pub backend_id: String,
    /// HTTP endpoint of the generation service. Generation is disabled when
    /// unset.
    pub endpoint: Option<String>,
    pub timeout_secs: u64,
    pub api_key: Option<Secret<String>>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            backend_id: "image-generation".into(),
            endpoint: None,
            timeout_secs: 60,
            api_key: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TextBackendConfig {
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
    pub api_key: Option<Secret<String>>,
}

impl Default for TextBackendConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".into(),
            model: "gpt-4o-mini".into(),
            timeout_secs: 30,
            api_key: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct LoggingConfig {
    pub json: bool,
}

impl AppConfig {
    /// Load layered configuration.
    ///
    /// Sources, later ones winning: `config/default`, `config/{VERDANT_ENV}`,
    /// `config/local`, then `VERDANT__SECTION__KEY` environment variables.
    pub fn load() -> Result<Self> {
        let env = std::env::var("VERDANT_ENV").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(File::with_name("config/local").required(false))
            // Map VERDANT__SERVER__PORT=3000 to server.port
            .add_source(Environment::with_prefix("VERDANT").separator("__"))
            .build()?;

        Ok(s.try_deserialize()?)
    }
}

// =============================================================================
// Specialist Catalog
// =============================================================================

/// Static configuration of a domain specialist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialistProfile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub system_prompt: String,
    #[serde(default)]
    pub quick_starts: Vec<String>,
    /// Free-text expertise tags, mapped to capabilities at construction.
    #[serde(default)]
    pub expertise_areas: Vec<String>,
}

/// Collection of specialist profiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialistCatalog {
    pub specialists: Vec<SpecialistProfile>,
}

impl SpecialistCatalog {
    /// Parse a catalog from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let catalog: Self = serde_yaml::from_str(yaml)
            .map_err(|e| Error::config(format!("Invalid specialist catalog: {}", e)))?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Read and parse a catalog file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&content)
    }

    fn validate(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for profile in &self.specialists {
            if profile.id.trim().is_empty() {
                return Err(Error::config("Specialist with empty id"));
            }
            if !seen.insert(profile.id.as_str()) {
                return Err(Error::config(format!("Duplicate specialist id '{}'", profile.id)));
            }
        }
        Ok(())
    }

    /// Catalog used when no file is configured.
    pub fn builtin() -> Self {
        let profile = |id: &str, name: &str, description: &str, prompt: &str, quick: &[&str], areas: &[&str]| {
            SpecialistProfile {
                id: id.into(),
                name: name.into(),
                description: description.into(),
                system_prompt: prompt.into(),
                quick_starts: quick.iter().map(|s| s.to_string()).collect(),
                expertise_areas: areas.iter().map(|s| s.to_string()).collect(),
            }
        };

        Self {
            specialists: vec![
                profile(
                    "gardener",
                    "Master Gardener",
                    "Plant selection, care schedules and pest control",
                    "You are an experienced gardener. Give practical, season-aware advice on plants, soil and plant health.",
                    &["Which plants suit a shady corner?", "How do I get rid of aphids?"],
                    &["plant care", "pest control", "soil", "plant selection"],
                ),
                profile(
                    "landscape_designer",
                    "Landscape Designer",
                    "Site zoning, design concepts and planting plans",
                    "You are a landscape designer. Help the user plan zones, paths and planting compositions for their site.",
                    &["Help me zone a 6-acre plot", "Suggest a style for a small backyard"],
                    &["landscape design", "zoning", "planting plans", "site analysis"],
                ),
                profile(
                    "builder",
                    "Garden Builder",
                    "Hardscape construction, paving and materials",
                    "You are a garden construction specialist. Advise on paving, retaining walls, decks and materials.",
                    &["What base does a gravel path need?", "Deck or patio for a slope?"],
                    &["construction", "paving", "materials", "drainage"],
                ),
                profile(
                    "ecologist",
                    "Garden Ecologist",
                    "Biodiversity, native planting and water-wise gardens",
                    "You are an ecologist. Recommend wildlife-friendly, low-impact practices for private gardens.",
                    &["How do I attract pollinators?", "Make my garden drought tolerant"],
                    &["ecology", "biodiversity", "native plants", "water conservation"],
                ),
            ],
        }
    }
}

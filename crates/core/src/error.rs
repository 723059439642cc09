//! Error types for Verdant.

use thiserror::Error;

/// Result type alias using Verdant's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for Verdant.
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Routing Errors
    // =========================================================================
    #[error("Invalid intent: {0}")]
    InvalidIntent(String),

    #[error("No eligible agent for intent: {0}")]
    NoEligibleAgent(String),

    #[error("Agent not found: {0}")]
    AgentNotFound(String),

    // =========================================================================
    // Generation Pipeline Errors
    // =========================================================================
    #[error("Plan validation failed: {0}")]
    PlanValidation(String),

    #[error("Image selection failed: {0}")]
    ImageSelection(String),

    // =========================================================================
    // Backend Errors
    // =========================================================================
    #[error("Text backend error: {0}")]
    TextBackend(String),

    #[error("Generation backend error: {0}")]
    GenerationBackend(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    // =========================================================================
    // Lifecycle & Configuration Errors
    // =========================================================================
    #[error("Agent lifecycle error: {0}")]
    Lifecycle(String),

    #[error("Configuration error: {0}")]
    Config(String),

    // =========================================================================
    // Generic Errors
    // =========================================================================
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Create an invalid intent error.
    pub fn invalid_intent(msg: impl Into<String>) -> Self {
        Self::InvalidIntent(msg.into())
    }

    /// Create a routing-miss error.
    pub fn no_eligible_agent(msg: impl Into<String>) -> Self {
        Self::NoEligibleAgent(msg.into())
    }

    /// Create a plan validation error.
    pub fn plan_validation(msg: impl Into<String>) -> Self {
        Self::PlanValidation(msg.into())
    }

    /// Create an image selection error.
    pub fn image_selection(msg: impl Into<String>) -> Self {
        Self::ImageSelection(msg.into())
    }

    /// Create a text backend error.
    pub fn text_backend(msg: impl Into<String>) -> Self {
        Self::TextBackend(msg.into())
    }

    /// Create a generation backend error.
    pub fn generation_backend(msg: impl Into<String>) -> Self {
        Self::GenerationBackend(msg.into())
    }

    /// Create a lifecycle error.
    pub fn lifecycle(msg: impl Into<String>) -> Self {
        Self::Lifecycle(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Stable category tag, reported as `error_type` in response metadata.
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidIntent(_) => "invalid_intent",
            Self::NoEligibleAgent(_) => "no_eligible_agent",
            Self::AgentNotFound(_) => "agent_not_found",
            Self::PlanValidation(_) => "plan_validation",
            Self::ImageSelection(_) => "image_selection",
            Self::TextBackend(_) => "text_backend",
            Self::GenerationBackend(_) => "generation_backend",
            Self::Timeout(_) => "timeout",
            Self::Lifecycle(_) => "lifecycle",
            Self::Config(_) => "config",
            Self::Serialization(_) => "serialization",
            Self::Internal(_) => "internal",
            Self::Other(_) => "other",
        }
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_tags() {
        assert_eq!(Error::plan_validation("x").category(), "plan_validation");
        assert_eq!(Error::Timeout("slow".into()).category(), "timeout");
        assert_eq!(
            Error::no_eligible_agent("consultation").category(),
            "no_eligible_agent"
        );
    }

    #[test]
    fn test_display_includes_message() {
        let err = Error::generation_backend("quota exhausted");
        assert_eq!(err.to_string(), "Generation backend error: quota exhausted");
    }
}

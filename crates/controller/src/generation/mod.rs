//! Image generation agent and its pure planning stages.
//!
//! A request moves through plan acquisition, validation, image selection and
//! execution, with a two-step fallback when the backend fails.

mod agent;
pub mod language;
pub mod plan;
pub mod selection;

pub use agent::{
    GenerationAgent, GenerationSettings, PRIMARY_ATTEMPT_COMPONENT, SIMPLIFIED_ATTEMPT_COMPONENT,
};
pub use language::detect_language;
pub use plan::{acquire_plan, default_plan, simplify_prompt, validate_plan};
pub use selection::{select_images, SelectionLimits};

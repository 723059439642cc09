#![deny(unused)]
//! Agent orchestration for Verdant.
//!
//! Registry of agents, capability resolution, the specialist and image
//! generation agents, and the orchestrator that routes intents to them.

pub mod capability;
pub mod generation;
pub mod orchestrator;
pub mod registry;
pub mod specialist;

pub use generation::{
    GenerationAgent, GenerationSettings, PRIMARY_ATTEMPT_COMPONENT, SIMPLIFIED_ATTEMPT_COMPONENT,
};
pub use orchestrator::{agent_component, Orchestrator, ORCHESTRATOR_COMPONENT};
pub use registry::{AgentRegistry, LifecycleFailure, LifecycleReport};
pub use specialist::SpecialistAgent;

//! Core traits for Verdant.
//!
//! Traits are organized by collaborator:
//! - `agent`: the capability contract every handler implements
//! - `backend`: narrow outbound interfaces to the text/vision and generation backends
//! - `llm`: chat-completion client used by concrete text backends

pub mod agent;
pub mod backend;
pub mod llm;

pub use agent::*;
pub use backend::*;
pub use llm::*;

//! Core type definitions for Verdant.
//!
//! This module contains the data model shared across the orchestration
//! layers: classified intents, execution plans, conversation context, and
//! the request/response pair exchanged with agents.

pub mod capability;
pub mod context;
pub mod intent;
pub mod request;

pub use capability::*;
pub use context::*;
pub use intent::*;
pub use request::*;

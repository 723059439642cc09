#![deny(unused)]
//! Core types, traits, and error definitions for Verdant.
//!
//! This crate provides the building blocks shared across the orchestration
//! layers: the intent/context data model, the agent capability contract,
//! outbound backend interfaces, and configuration.

pub mod config;
pub mod error;
pub mod mocks;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use traits::*;
pub use types::*;

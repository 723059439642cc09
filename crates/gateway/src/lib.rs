#![deny(unused)]
//! HTTP gateway for Verdant.
//!
//! Exposes intent dispatch, the agent listing and execution metrics over
//! axum.

pub mod server;

pub use server::{AppState, GatewayConfig, GatewayServer};

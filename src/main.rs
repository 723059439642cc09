#![deny(unused)]
//! Verdant - capability-based agent orchestration for garden and landscape
//! assistants.
//!
//! Wires configuration, backends, the agent registry and the orchestrator
//! behind the HTTP gateway.

use std::sync::Arc;

use verdant_controller::{AgentRegistry, GenerationAgent, GenerationSettings, Orchestrator, SpecialistAgent};
use verdant_core::config::{AppConfig, SpecialistCatalog};
use verdant_gateway::{GatewayConfig, GatewayServer};
use verdant_governance::ExecutionMetricsTracker;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;

    verdant_governance::configure_tracing(config.logging.json)?;
    tracing::info!("Starting Verdant v{}", env!("CARGO_PKG_VERSION"));

    let metrics_handle = verdant_governance::setup_metrics_recorder()?;

    // =========================================================================
    // Backends
    // =========================================================================
    let text_backend = verdant_model_gateway::create_text_backend(&config.text_backend)?;
    let generation_backend = verdant_model_gateway::create_generation_backend(&config.generation)?;

    // =========================================================================
    // Agents
    // =========================================================================
    let catalog = match &config.specialists_path {
        Some(path) => {
            tracing::info!(path = %path, "Loading specialist catalog");
            SpecialistCatalog::load(path)?
        }
        None => SpecialistCatalog::builtin(),
    };

    let tracker = Arc::new(ExecutionMetricsTracker::with_window_size(
        config.orchestrator.metrics_window,
    ));
    let registry = Arc::new(AgentRegistry::with_window_size(
        config.orchestrator.metrics_window,
    ));
    for profile in catalog.specialists {
        registry.register(Arc::new(SpecialistAgent::new(profile, text_backend.clone())));
    }
    registry.register(Arc::new(
        GenerationAgent::new(generation_backend)
            .with_settings(GenerationSettings::from(&config.orchestrator))
            .with_metrics(tracker.clone()),
    ));

    let report = registry.initialize_all().await;
    if !report.is_clean() {
        for failure in &report.failed {
            tracing::warn!(agent_id = %failure.agent_id, error = %failure.error, "Agent failed to initialize");
        }
    }
    tracing::info!(agents = registry.len(), ready = report.succeeded.len(), "Agent registry initialized");

    // =========================================================================
    // Orchestrator & Gateway
    // =========================================================================
    let orchestrator = Arc::new(Orchestrator::new(registry.clone(), tracker));

    let gateway_config = GatewayConfig::from(&config.server);
    tracing::info!(
        host = %gateway_config.host,
        port = gateway_config.port,
        "Gateway initialized"
    );

    let server = GatewayServer::new(gateway_config, orchestrator).with_metrics(metrics_handle);
    let served = server.run().await;

    let report = registry.dispose_all().await;
    for failure in &report.failed {
        tracing::warn!(agent_id = %failure.agent_id, error = %failure.error, "Agent failed to dispose");
    }

    served?;
    Ok(())
}

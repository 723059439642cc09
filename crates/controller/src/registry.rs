//! Agent registry.
//!
//! Single source of truth for which agents exist and how they have been
//! performing. Each agent's execution window lives inside its map entry, so
//! registration and metric updates for one id are serialized by that entry's
//! lock while other ids proceed independently.

use dashmap::DashMap;
use futures::future::join_all;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use verdant_core::{
    traits::{Agent, AgentDescriptor},
    types::Capability,
    Result,
};
use verdant_governance::{ExecutionStats, ExecutionWindow, DEFAULT_WINDOW_SIZE};

struct AgentEntry {
    agent: Arc<dyn Agent>,
    window: ExecutionWindow,
}

/// Registry of agents keyed by id.
pub struct AgentRegistry {
    agents: DashMap<String, AgentEntry>,
    window_size: usize,
}

impl AgentRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::with_window_size(DEFAULT_WINDOW_SIZE)
    }

    /// Create an empty registry keeping `window_size` samples per agent.
    pub fn with_window_size(window_size: usize) -> Self {
        Self {
            agents: DashMap::new(),
            window_size,
        }
    }

    /// Register an agent. An existing agent with the same id is replaced and
    /// its metrics are reset; the replaced agent is returned.
    pub fn register(&self, agent: Arc<dyn Agent>) -> Option<Arc<dyn Agent>> {
        let id = agent.id().to_string();
        tracing::info!(
            agent_id = %id,
            capabilities = ?agent.capabilities().iter().map(|c| c.as_str()).collect::<Vec<_>>(),
            "Registering agent"
        );

        let previous = self.agents.insert(
            id.clone(),
            AgentEntry {
                agent,
                window: ExecutionWindow::new(self.window_size),
            },
        );

        if previous.is_some() {
            tracing::debug!(agent_id = %id, "Replaced existing agent, metrics reset");
        }
        previous.map(|entry| entry.agent)
    }

    /// Remove an agent. Removing an unknown id is a no-op.
    pub fn unregister(&self, id: &str) -> Option<Arc<dyn Agent>> {
        let removed = self.agents.remove(id).map(|(_, entry)| entry.agent);
        if removed.is_some() {
            tracing::info!(agent_id = %id, "Unregistered agent");
        }
        removed
    }

    /// Look up an agent by id.
    pub fn get(&self, id: &str) -> Option<Arc<dyn Agent>> {
        self.agents.get(id).map(|entry| entry.agent.clone())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.agents.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Every agent, ordered by id.
    pub fn agents(&self) -> Vec<Arc<dyn Agent>> {
        self.select(|_| true)
    }

    /// Agents advertising `capability`, ordered by id.
    pub fn by_capability(&self, capability: &Capability) -> Vec<Arc<dyn Agent>> {
        self.select(|agent| agent.has_capability(capability))
    }

    /// Agents advertising every capability in `capabilities`.
    pub fn by_all_capabilities(&self, capabilities: &[Capability]) -> Vec<Arc<dyn Agent>> {
        self.select(|agent| capabilities.iter().all(|c| agent.has_capability(c)))
    }

    /// Agents advertising at least one capability in `capabilities`.
    pub fn by_any_capability(&self, capabilities: &[Capability]) -> Vec<Arc<dyn Agent>> {
        self.select(|agent| capabilities.iter().any(|c| agent.has_capability(c)))
    }

    /// Listing of registered agents, ordered by id.
    pub fn descriptors(&self) -> Vec<AgentDescriptor> {
        self.agents().iter().map(|agent| agent.descriptor()).collect()
    }

    /// Record one execution for an agent. Unknown ids are ignored.
    pub fn record_execution(&self, id: &str, duration: Duration, success: bool) {
        match self.agents.get_mut(id) {
            Some(mut entry) => entry.window.record(duration, success),
            None => {
                tracing::debug!(agent_id = %id, "Ignoring execution record for unknown agent");
            }
        }
    }

    /// Statistics for one agent. `None` if the id is not registered; all
    /// zeroes if it has not executed yet.
    pub fn metrics(&self, id: &str) -> Option<ExecutionStats> {
        self.agents.get(id).map(|entry| entry.window.stats(id))
    }

    /// Statistics for every registered agent.
    pub fn all_metrics(&self) -> BTreeMap<String, ExecutionStats> {
        self.agents
            .iter()
            .map(|entry| (entry.key().clone(), entry.window.stats(entry.key())))
            .collect()
    }

    /// Initialize every agent concurrently. A failing agent does not stop
    /// the others.
    pub async fn initialize_all(&self) -> LifecycleReport {
        let agents = self.agents();
        let results = join_all(agents.iter().map(|agent| agent.initialize())).await;
        let report = LifecycleReport::collect(&agents, results, "initialize");
        tracing::info!(
            initialized = report.succeeded.len(),
            failed = report.failed.len(),
            "Agent initialization finished"
        );
        report
    }

    /// Dispose every agent concurrently. A failing agent does not stop the
    /// others.
    pub async fn dispose_all(&self) -> LifecycleReport {
        let agents = self.agents();
        let results = join_all(agents.iter().map(|agent| agent.dispose())).await;
        LifecycleReport::collect(&agents, results, "dispose")
    }

    // Snapshot first so no map guard is held while callers await on agents.
    fn select(&self, predicate: impl Fn(&Arc<dyn Agent>) -> bool) -> Vec<Arc<dyn Agent>> {
        let mut agents: Vec<_> = self
            .agents
            .iter()
            .filter(|entry| predicate(&entry.agent))
            .map(|entry| entry.agent.clone())
            .collect();
        agents.sort_by(|a, b| a.id().cmp(b.id()));
        agents
    }
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of a lifecycle fan-out.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LifecycleReport {
    pub succeeded: Vec<String>,
    pub failed: Vec<LifecycleFailure>,
}

impl LifecycleReport {
    /// Whether every agent succeeded.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    fn collect(agents: &[Arc<dyn Agent>], results: Vec<Result<()>>, phase: &str) -> Self {
        let mut report = Self::default();
        for (agent, result) in agents.iter().zip(results) {
            match result {
                Ok(()) => report.succeeded.push(agent.id().to_string()),
                Err(e) => {
                    tracing::warn!(agent_id = %agent.id(), phase, error = %e, "Agent lifecycle hook failed");
                    report.failed.push(LifecycleFailure {
                        agent_id: agent.id().to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }
        report
    }
}

/// One agent's lifecycle failure.
#[derive(Debug, Clone, Serialize)]
pub struct LifecycleFailure {
    pub agent_id: String,
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use verdant_core::mocks::StaticAgent;

    fn agent(id: &str, caps: &[Capability]) -> Arc<dyn Agent> {
        Arc::new(StaticAgent::new(id, caps))
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = AgentRegistry::new();
        assert!(registry.register(agent("gardener", &[Capability::Gardening])).is_none());
        assert!(registry.contains("gardener"));
        assert_eq!(registry.get("gardener").unwrap().id(), "gardener");
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn test_unregister_is_idempotent() {
        let registry = AgentRegistry::new();
        registry.register(agent("a", &[]));
        assert!(registry.unregister("a").is_some());
        assert!(registry.unregister("a").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_reregister_resets_metrics() {
        let registry = AgentRegistry::new();
        registry.register(agent("a", &[]));
        registry.record_execution("a", Duration::from_millis(10), true);
        assert_eq!(registry.metrics("a").unwrap().total_executions, 1);

        assert!(registry.register(agent("a", &[])).is_some());
        assert_eq!(registry.metrics("a").unwrap().total_executions, 0);
    }

    #[test]
    fn test_record_for_unknown_agent_is_ignored() {
        let registry = AgentRegistry::new();
        registry.record_execution("ghost", Duration::from_millis(10), true);
        assert!(registry.metrics("ghost").is_none());
        assert!(registry.all_metrics().is_empty());
    }

    #[test]
    fn test_idle_agent_metrics_are_zeroed() {
        let registry = AgentRegistry::new();
        registry.register(agent("idle", &[]));
        let stats = registry.metrics("idle").unwrap();
        assert_eq!(stats.success_rate, 0.0);
        assert_eq!(stats.average_execution_ms, 0.0);
    }
}

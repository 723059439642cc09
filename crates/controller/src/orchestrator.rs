//! Intent dispatch.
//!
//! Resolves a classified intent to one registered agent, executes it, and
//! records the outcome in both the registry and the metrics tracker.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::Instrument;

use verdant_core::{
    traits::Agent,
    types::{AgentRequest, AgentResponse, Intent, RequestContext},
    Error, Result,
};
use verdant_governance::ExecutionMetricsTracker;

use crate::capability::{preferred_capability, routing_capabilities};
use crate::registry::AgentRegistry;

/// Tracker component recording every dispatch.
pub const ORCHESTRATOR_COMPONENT: &str = "orchestrator";

/// Tracker component for one agent.
pub fn agent_component(agent_id: &str) -> String {
    format!("agent:{}", agent_id)
}

/// Routes intents to agents.
pub struct Orchestrator {
    registry: Arc<AgentRegistry>,
    metrics: Arc<ExecutionMetricsTracker>,
}

impl Orchestrator {
    pub fn new(registry: Arc<AgentRegistry>, metrics: Arc<ExecutionMetricsTracker>) -> Self {
        Self { registry, metrics }
    }

    pub fn registry(&self) -> &Arc<AgentRegistry> {
        &self.registry
    }

    pub fn metrics(&self) -> &Arc<ExecutionMetricsTracker> {
        &self.metrics
    }

    /// Eligible agents for an intent, best first.
    ///
    /// Agents holding the intent's most specific capability rank first, then
    /// the context's current agent, then id order.
    pub fn candidates(&self, intent: &Intent, context: &RequestContext) -> Vec<Arc<dyn Agent>> {
        let pool = match routing_capabilities(intent) {
            Some(required) => self.registry.by_any_capability(&required),
            None => self.registry.agents(),
        };

        let mut eligible: Vec<_> = pool
            .into_iter()
            .filter(|agent| agent.can_handle(intent, context))
            .collect();

        let preferred = preferred_capability(intent);
        let current = context.current_agent_id.as_deref();
        // Pool is already in id order and the sort is stable.
        eligible.sort_by_key(|agent| {
            let specific = preferred
                .as_ref()
                .map(|cap| agent.has_capability(cap))
                .unwrap_or(false);
            let is_current = current == Some(agent.id());
            (!specific, !is_current)
        });
        eligible
    }

    /// Pick the best eligible agent and execute the intent.
    pub async fn handle(&self, intent: Intent, context: RequestContext) -> Result<AgentResponse> {
        let started = Instant::now();
        let Some(agent) = self.candidates(&intent, &context).into_iter().next() else {
            self.metrics
                .record(ORCHESTRATOR_COMPONENT, started.elapsed(), false);
            tracing::info!(
                intent_type = %intent.intent_type,
                subtype = ?intent.subtype.as_ref().map(|s| s.as_str()),
                "No eligible agent for intent"
            );
            return Err(Error::no_eligible_agent(format!(
                "no registered agent can handle intent '{}'",
                intent.intent_type
            )));
        };

        Ok(self.run(agent, intent, context, started).await)
    }

    /// Execute the intent on an explicitly chosen agent.
    pub async fn dispatch_to(
        &self,
        agent_id: &str,
        intent: Intent,
        context: RequestContext,
    ) -> Result<AgentResponse> {
        let started = Instant::now();
        let agent = self
            .registry
            .get(agent_id)
            .ok_or_else(|| Error::AgentNotFound(agent_id.to_string()))?;
        Ok(self.run(agent, intent, context, started).await)
    }

    async fn run(
        &self,
        agent: Arc<dyn Agent>,
        intent: Intent,
        context: RequestContext,
        started: Instant,
    ) -> AgentResponse {
        let request = AgentRequest::new(intent, context);
        let span = tracing::info_span!(
            "dispatch",
            request_id = %request.request_id,
            agent_id = %agent.id(),
            intent_type = %request.intent.intent_type,
        );

        async {
            let executed = Instant::now();
            let response = agent.execute(request).await;
            self.record(agent.id(), executed.elapsed(), started.elapsed(), response.is_success);

            tracing::info!(
                success = response.is_success,
                duration_ms = executed.elapsed().as_millis() as u64,
                fallback = response.metadata_flag("fallback_used"),
                "Dispatch finished"
            );
            response
        }
        .instrument(span)
        .await
    }

    fn record(&self, agent_id: &str, agent_time: Duration, total_time: Duration, success: bool) {
        self.registry.record_execution(agent_id, agent_time, success);
        self.metrics
            .record(&agent_component(agent_id), agent_time, success);
        self.metrics
            .record(ORCHESTRATOR_COMPONENT, total_time, success);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use verdant_core::mocks::StaticAgent;
    use verdant_core::types::{Capability, IntentType};

    fn orchestrator(agents: Vec<StaticAgent>) -> Orchestrator {
        let registry = Arc::new(AgentRegistry::new());
        for agent in agents {
            registry.register(Arc::new(agent));
        }
        Orchestrator::new(registry, Arc::new(ExecutionMetricsTracker::new()))
    }

    #[test]
    fn test_ranking_prefers_specific_then_current() {
        let orch = orchestrator(vec![
            StaticAgent::new("a_generalist", &[Capability::Consultation]),
            StaticAgent::new("b_builder", &[Capability::Consultation, Capability::Construction]),
            StaticAgent::new("c_current", &[Capability::Consultation]),
        ]);

        let intent = Intent::new(IntentType::Consultation, 0.9, "").with_subtype("constructionAdvice");
        let ctx = RequestContext::new("patio?").with_current_agent("c_current");
        let ranked: Vec<_> = orch
            .candidates(&intent, &ctx)
            .iter()
            .map(|a| a.id().to_string())
            .collect();

        assert_eq!(ranked, ["b_builder", "c_current", "a_generalist"]);
    }

    #[tokio::test]
    async fn test_routing_miss_is_an_error() {
        let orch = orchestrator(vec![StaticAgent::new("img", &[Capability::ImageGeneration])]);
        let intent = Intent::new(IntentType::Consultation, 0.9, "");

        let err = orch.handle(intent, RequestContext::new("hi")).await.unwrap_err();

        assert_eq!(err.category(), "no_eligible_agent");
        assert_eq!(orch.metrics().metrics(ORCHESTRATOR_COMPONENT).error_count, 1);
    }

    #[tokio::test]
    async fn test_dispatch_to_unknown_agent() {
        let orch = orchestrator(vec![]);
        let err = orch
            .dispatch_to("ghost", Intent::new(IntentType::Unclear, 0.0, ""), RequestContext::new("hi"))
            .await
            .unwrap_err();
        assert_eq!(err.category(), "agent_not_found");
    }
}

//! Agent capability contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{AgentRequest, AgentResponse, Capability, CapabilitySet, Intent, RequestContext};

/// Polymorphic handler for classified intents.
///
/// Implementations compute their capability set once and return the cached
/// set from [`Agent::capabilities`] for the lifetime of the instance.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Unique identifier.
    fn id(&self) -> &str;

    /// Display name.
    fn name(&self) -> &str;

    /// Advertised capabilities.
    fn capabilities(&self) -> &CapabilitySet;

    /// Whether this agent accepts the intent in the given context.
    fn can_handle(&self, intent: &Intent, context: &RequestContext) -> bool;

    /// Execute one attempt. Failures are reported inside the response, never
    /// as a fault.
    async fn execute(&self, request: AgentRequest) -> AgentResponse;

    /// Prepare resources before the first request.
    async fn initialize(&self) -> Result<()> {
        Ok(())
    }

    /// Release resources on shutdown.
    async fn dispose(&self) -> Result<()> {
        Ok(())
    }

    /// Whether the capability set contains `capability`.
    fn has_capability(&self, capability: &Capability) -> bool {
        self.capabilities().contains(capability)
    }

    /// Serializable summary for listings.
    fn descriptor(&self) -> AgentDescriptor {
        AgentDescriptor {
            id: self.id().to_string(),
            name: self.name().to_string(),
            capabilities: self.capabilities().iter().cloned().collect(),
        }
    }
}

/// Listing entry for a registered agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentDescriptor {
    pub id: String,
    pub name: String,
    pub capabilities: Vec<Capability>,
}

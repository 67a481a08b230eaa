//! Per-segment agent selection.

use std::sync::Arc;

use scribe_agents::agent::AgentHandler;
use scribe_agents::config::AgentConfigStore;
use scribe_agents::context::SegmentContext;
use scribe_agents::registry::AgentRegistry;
use scribe_core::types::AgentConfig;
use tracing::debug;

/// One agent selected for dispatch, with the config it activated under.
pub struct Activation {
    /// The agent to invoke.
    pub agent: Arc<dyn AgentHandler>,
    /// The config snapshot the activation decision used.
    pub config: AgentConfig,
}

/// Evaluates, per configured agent, whether it should fire for a segment.
pub struct DecisionEngine {
    registry: Arc<AgentRegistry>,
    configs: Arc<AgentConfigStore>,
}

impl DecisionEngine {
    /// Create a decision engine over a registry and its config store.
    #[must_use]
    pub fn new(registry: Arc<AgentRegistry>, configs: Arc<AgentConfigStore>) -> Self {
        Self { registry, configs }
    }

    /// Select the agents to dispatch for this context.
    ///
    /// The config store is snapshotted on every call, so config replacement
    /// takes effect on the next segment. A registered agent with no config
    /// entry never activates.
    #[must_use]
    pub fn select(&self, ctx: &SegmentContext) -> Vec<Activation> {
        let configs = self.configs.snapshot();
        let mut activations = Vec::new();

        for agent in self.registry.handlers() {
            let Some(config) = configs.get(agent.name()) else {
                continue;
            };
            if agent.should_activate(config, ctx) {
                debug!(agent = agent.name(), "agent activated");
                activations.push(Activation {
                    config: config.clone(),
                    agent,
                });
            }
        }
        activations
    }
}

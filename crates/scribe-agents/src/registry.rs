//! Explicit agent registry table.

use std::collections::HashMap;
use std::sync::Arc;

use crate::agent::AgentHandler;
use crate::builtin::{ActionItemAgent, FollowUpAgent, PrescriptionAgent, SummaryAgent};

/// Registry mapping agent names to handlers.
///
/// New agents register by adding an entry; registering under an existing
/// name replaces the previous handler.
#[derive(Default)]
pub struct AgentRegistry {
    agents: HashMap<String, Arc<dyn AgentHandler>>,
}

impl AgentRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the built-in agent set.
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(SummaryAgent));
        registry.register(Arc::new(PrescriptionAgent));
        registry.register(Arc::new(FollowUpAgent));
        registry.register(Arc::new(ActionItemAgent));
        registry
    }

    /// Register a handler under its own name.
    pub fn register(&mut self, agent: Arc<dyn AgentHandler>) {
        let _ = self.agents.insert(agent.name().to_owned(), agent);
    }

    /// Look up an agent by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn AgentHandler>> {
        self.agents.get(name).cloned()
    }

    /// All registered handlers, sorted by name for deterministic iteration.
    #[must_use]
    pub fn handlers(&self) -> Vec<Arc<dyn AgentHandler>> {
        let mut handlers: Vec<_> = self.agents.values().cloned().collect();
        handlers.sort_by(|a, b| a.name().cmp(b.name()));
        handlers
    }

    /// All registered agent names (sorted).
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.agents.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of registered agents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

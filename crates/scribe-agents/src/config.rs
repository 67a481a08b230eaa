//! Live agent activation configuration.

use std::collections::{HashMap, HashSet};

use parking_lot::RwLock;
use scribe_core::types::AgentConfig;

/// Shared agent-name → [`AgentConfig`] mapping.
///
/// The decision engine snapshots the store once per segment, so a
/// [`AgentConfigStore::replace`] takes effect on the next segment without a
/// restart. An agent with no entry is treated as disabled.
#[derive(Default)]
pub struct AgentConfigStore {
    configs: RwLock<HashMap<String, AgentConfig>>,
}

impl AgentConfigStore {
    /// Create an empty store (every agent disabled).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with the given mapping.
    #[must_use]
    pub fn with_configs(configs: HashMap<String, AgentConfig>) -> Self {
        Self {
            configs: RwLock::new(configs),
        }
    }

    /// Config for one agent, if present.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<AgentConfig> {
        self.configs.read().get(name).cloned()
    }

    /// Insert or update one agent's config.
    pub fn set(&self, name: impl Into<String>, config: AgentConfig) {
        let _ = self.configs.write().insert(name.into(), config);
    }

    /// Swap the entire mapping (hot reload).
    pub fn replace(&self, configs: HashMap<String, AgentConfig>) {
        *self.configs.write() = configs;
    }

    /// Point-in-time copy of the mapping.
    #[must_use]
    pub fn snapshot(&self) -> HashMap<String, AgentConfig> {
        self.configs.read().clone()
    }

    /// Number of configured agents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.configs.read().len()
    }

    /// Whether no agent is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.configs.read().is_empty()
    }
}

/// Default activation mapping for the built-in agent set.
#[must_use]
pub fn default_agent_configs() -> HashMap<String, AgentConfig> {
    fn set(items: &[&str]) -> HashSet<String> {
        items.iter().map(|s| (*s).to_owned()).collect()
    }

    let mut configs = HashMap::new();
    let _ = configs.insert(
        "summary".to_owned(),
        AgentConfig {
            enabled: true,
            confidence_threshold: 0.5,
            triggering_intents: set(&["Summary", "General"]),
            required_entities: HashSet::new(),
        },
    );
    let _ = configs.insert(
        "prescription".to_owned(),
        AgentConfig {
            enabled: true,
            confidence_threshold: 0.8,
            triggering_intents: set(&["Prescription"]),
            required_entities: set(&["MedicationName"]),
        },
    );
    let _ = configs.insert(
        "follow_up".to_owned(),
        AgentConfig {
            enabled: true,
            confidence_threshold: 0.7,
            triggering_intents: set(&["FollowUp"]),
            required_entities: set(&["Date", "Duration"]),
        },
    );
    let _ = configs.insert(
        "action_item".to_owned(),
        AgentConfig {
            enabled: true,
            confidence_threshold: 0.7,
            triggering_intents: set(&["ActionItem", "Task"]),
            required_entities: HashSet::new(),
        },
    );
    configs
}

//! Immutable flow registry: flow id -> step name -> handler

use super::handler::StepHandler;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

/// A named set of steps
pub struct Flow {
    id: String,
    steps: HashMap<String, Arc<dyn StepHandler>>,
}

impl Flow {
    /// Create an empty flow
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            steps: HashMap::new(),
        }
    }

    /// Register a step
    #[must_use]
    pub fn step(mut self, name: impl Into<String>, handler: impl StepHandler + 'static) -> Self {
        self.steps.insert(name.into(), Arc::new(handler));
        self
    }

    /// Flow id
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Handler for a step
    #[must_use]
    pub fn handler(&self, step: &str) -> Option<&Arc<dyn StepHandler>> {
        self.steps.get(step)
    }

    /// Registered step names, sorted
    #[must_use]
    pub fn step_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.steps.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl std::fmt::Debug for Flow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Flow")
            .field("id", &self.id)
            .field("steps", &self.step_names())
            .finish()
    }
}

/// Registry of all flows, built once and shared read-only
#[derive(Debug, Default)]
pub struct FlowRegistry {
    flows: HashMap<String, Flow>,
}

impl FlowRegistry {
    /// Start building a registry
    #[must_use]
    pub fn builder() -> FlowRegistryBuilder {
        FlowRegistryBuilder::default()
    }

    /// Look up a flow
    #[must_use]
    pub fn get(&self, flow_id: &str) -> Option<&Flow> {
        self.flows.get(flow_id)
    }

    /// Whether a flow is registered
    #[must_use]
    pub fn contains(&self, flow_id: &str) -> bool {
        self.flows.contains_key(flow_id)
    }

    /// Registered flow ids, sorted
    #[must_use]
    pub fn flow_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.flows.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Number of flows
    #[must_use]
    pub fn len(&self) -> usize {
        self.flows.len()
    }

    /// Whether no flow is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }
}

/// Builder for [`FlowRegistry`]
#[derive(Default)]
pub struct FlowRegistryBuilder {
    flows: HashMap<String, Flow>,
}

impl FlowRegistryBuilder {
    /// Add a flow; a later flow with the same id replaces the earlier one
    #[must_use]
    pub fn flow(mut self, flow: Flow) -> Self {
        if self.flows.contains_key(flow.id()) {
            warn!(flow_id = %flow.id(), "Flow registered twice, keeping the later one");
        }
        self.flows.insert(flow.id.clone(), flow);
        self
    }

    /// Freeze the registry
    #[must_use]
    pub fn build(self) -> FlowRegistry {
        FlowRegistry { flows: self.flows }
    }
}

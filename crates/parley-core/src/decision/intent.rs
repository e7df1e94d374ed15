//! Intent definitions loaded at startup

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// How an intent is answered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntentKind {
    /// Start a guided flow
    Flow,
    /// Retrieval answer
    Faq,
    /// Anything else; handled by a ticket
    #[serde(other)]
    Other,
}

fn default_enabled() -> bool {
    true
}

/// One configured intent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentDefinition {
    /// Intent id as reported by the classifier
    pub id: String,
    /// Routing kind
    #[serde(rename = "type")]
    pub kind: IntentKind,
    /// Disabled definitions are ignored
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Higher wins when ids repeat
    #[serde(default)]
    pub priority: i32,
    /// Flow started by a `flow` intent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_flow: Option<String>,
    /// Free-text note
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl IntentDefinition {
    /// Create an enabled definition
    #[must_use]
    pub fn new(id: impl Into<String>, kind: IntentKind) -> Self {
        Self {
            id: id.into(),
            kind,
            enabled: true,
            priority: 0,
            next_flow: None,
            description: None,
        }
    }

    /// Set the flow to start
    #[must_use]
    pub fn with_next_flow(mut self, flow_id: impl Into<String>) -> Self {
        self.next_flow = Some(flow_id.into());
        self
    }

    /// Set the priority
    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Enable or disable
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Enabled intent definitions indexed by id
#[derive(Debug, Clone, Default)]
pub struct IntentCatalog {
    by_id: HashMap<String, IntentDefinition>,
}

impl IntentCatalog {
    /// Index the enabled definitions, keeping the highest priority per id
    #[must_use]
    pub fn new(definitions: impl IntoIterator<Item = IntentDefinition>) -> Self {
        let mut by_id: HashMap<String, IntentDefinition> = HashMap::new();

        for def in definitions.into_iter().filter(|d| d.enabled) {
            match by_id.get(&def.id) {
                Some(existing) if existing.priority >= def.priority => {
                    debug!(intent = %def.id, "Shadowed intent definition ignored");
                }
                _ => {
                    by_id.insert(def.id.clone(), def);
                }
            }
        }

        Self { by_id }
    }

    /// Find an enabled definition
    #[must_use]
    pub fn lookup(&self, id: &str) -> Option<&IntentDefinition> {
        self.by_id.get(id)
    }

    /// Definitions ordered by priority, highest first
    #[must_use]
    pub fn definitions(&self) -> Vec<&IntentDefinition> {
        let mut defs: Vec<&IntentDefinition> = self.by_id.values().collect();
        defs.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.id.cmp(&b.id)));
        defs
    }

    /// Number of enabled intents
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Whether no intent is enabled
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

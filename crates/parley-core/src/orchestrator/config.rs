//! Orchestrator configuration

use crate::decision::DEFAULT_HISTORY_WINDOW;
use crate::flow::DEFAULT_SAVE_RETRIES;
use std::time::Duration;

/// Configuration for the orchestrator
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Deadline for every inference call
    pub collaborator_timeout: Duration,
    /// Optimistic save retry budget
    pub save_retries: i32,
    /// Messages of history sent to the inference service
    pub history_window: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            collaborator_timeout: Duration::from_secs(10),
            save_retries: DEFAULT_SAVE_RETRIES,
            history_window: DEFAULT_HISTORY_WINDOW,
        }
    }
}

impl OrchestratorConfig {
    /// Create a new configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the inference call deadline
    #[must_use]
    pub fn with_collaborator_timeout(mut self, timeout: Duration) -> Self {
        self.collaborator_timeout = timeout;
        self
    }

    /// Set the save retry budget
    #[must_use]
    pub fn with_save_retries(mut self, retries: i32) -> Self {
        self.save_retries = retries;
        self
    }

    /// Set the history window
    #[must_use]
    pub fn with_history_window(mut self, window: usize) -> Self {
        self.history_window = window;
        self
    }
}

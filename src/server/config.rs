//! Server configuration types

use parley_core::OrchestratorConfig;
use parley_inference::InferenceConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub redis: RedisConfig,
    #[serde(default)]
    pub inference: InferenceAppConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorAppConfig,
    #[serde(default)]
    pub intents: IntentsConfig,
}

/// HTTP listener
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// Session store backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Redis,
    Memory,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
}

/// Redis session store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    pub url: String,
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

fn default_key_prefix() -> String {
    parley_core::store::DEFAULT_KEY_PREFIX.to_string()
}

fn default_ttl_secs() -> u64 {
    parley_core::store::DEFAULT_TTL.as_secs()
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            key_prefix: default_key_prefix(),
            ttl_secs: default_ttl_secs(),
        }
    }
}

impl RedisConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// Inference service endpoint (exposed to TOML)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceAppConfig {
    pub base_url: String,
    #[serde(default = "default_inference_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_inference_timeout_ms() -> u64 {
    30_000
}

impl Default for InferenceAppConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            timeout_ms: default_inference_timeout_ms(),
        }
    }
}

impl InferenceAppConfig {
    pub fn to_client_config(&self) -> InferenceConfig {
        InferenceConfig::new()
            .with_base_url(self.base_url.clone())
            .with_timeout(Duration::from_millis(self.timeout_ms))
    }
}

/// Orchestrator tuning (exposed to TOML)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorAppConfig {
    /// Deadline for each inference call
    #[serde(default = "default_collaborator_timeout_ms")]
    pub collaborator_timeout_ms: u64,
    /// Optimistic-lock retries per save
    #[serde(default = "default_save_retries")]
    pub save_retries: i32,
    /// Messages of history sent to the classifier
    #[serde(default = "default_history_window")]
    pub history_window: usize,
}

fn default_collaborator_timeout_ms() -> u64 {
    10_000
}
fn default_save_retries() -> i32 {
    3
}
fn default_history_window() -> usize {
    10
}

impl Default for OrchestratorAppConfig {
    fn default() -> Self {
        Self {
            collaborator_timeout_ms: default_collaborator_timeout_ms(),
            save_retries: default_save_retries(),
            history_window: default_history_window(),
        }
    }
}

impl OrchestratorAppConfig {
    pub fn to_orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig::new()
            .with_collaborator_timeout(Duration::from_millis(self.collaborator_timeout_ms))
            .with_save_retries(self.save_retries)
            .with_history_window(self.history_window)
    }
}

/// Where intent definitions live
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentsConfig {
    pub path: String,
}

impl Default for IntentsConfig {
    fn default() -> Self {
        Self {
            path: "config/intents.yaml".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.store.backend, StoreBackend::Redis);
        assert_eq!(config.redis.key_prefix, "parley:session:");
        assert_eq!(config.redis.ttl(), Duration::from_secs(86_400));
    }

    #[test]
    fn test_orchestrator_conversion() {
        let app = OrchestratorAppConfig {
            collaborator_timeout_ms: 2_500,
            save_retries: 5,
            history_window: 4,
        };
        let config = app.to_orchestrator_config();
        assert_eq!(config.collaborator_timeout, Duration::from_millis(2_500));
        assert_eq!(config.save_retries, 5);
        assert_eq!(config.history_window, 4);
    }

    #[test]
    fn test_inference_conversion() {
        let app = InferenceAppConfig {
            base_url: "http://svc:9000".to_string(),
            timeout_ms: 1_200,
        };
        let config = app.to_client_config();
        assert_eq!(config.base_url, "http://svc:9000");
        assert_eq!(config.timeout, Duration::from_millis(1_200));
    }
}

//! Configuration loading
//!
//! Embedded defaults, then optional files, then environment.

use super::config::AppConfig;
use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use parley_core::{IntentCatalog, IntentDefinition};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, warn};

/// Embedded default configuration (compiled into binary)
pub const DEFAULT_CONFIG: &str = include_str!("../../config/default.toml");

/// Load configuration from files and environment
pub fn load_config() -> Result<AppConfig> {
    let config = Config::builder()
        .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
        .add_source(File::with_name("config/default").required(false))
        .add_source(
            File::with_name(&format!(
                "config/{}",
                std::env::var("PARLEY_ENV").unwrap_or_else(|_| "development".to_string())
            ))
            .required(false),
        )
        .add_source(File::with_name("config/local").required(false))
        // PARLEY_REDIS__URL: single "_" after the prefix, "__" between keys
        .add_source(
            Environment::with_prefix("PARLEY")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    config
        .try_deserialize()
        .context("Failed to deserialize configuration")
}

#[derive(Debug, Deserialize)]
struct IntentsFile {
    #[serde(default)]
    intents: Vec<IntentDefinition>,
}

/// Parse intent definitions from YAML text
pub fn parse_intents(yaml: &str) -> Result<IntentCatalog> {
    let file: IntentsFile = serde_yaml::from_str(yaml).context("Invalid intents YAML")?;
    Ok(IntentCatalog::new(file.intents))
}

/// Load intent definitions; a missing file yields an empty catalog
pub fn load_intents(path: impl AsRef<Path>) -> Result<IntentCatalog> {
    let path = path.as_ref();
    if !path.exists() {
        warn!(path = %path.display(), "Intents file not found, every intent will file a ticket");
        return Ok(IntentCatalog::default());
    }

    let yaml = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let catalog = parse_intents(&yaml)?;
    debug!(path = %path.display(), count = catalog.len(), "Intent definitions loaded");
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::config::StoreBackend;
    use parley_core::IntentKind;

    #[test]
    fn test_embedded_defaults_parse() {
        let config: AppConfig = Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.store.backend, StoreBackend::Redis);
        assert_eq!(config.redis.ttl_secs, 86_400);
        assert_eq!(config.orchestrator.save_retries, 3);
        assert_eq!(config.intents.path, "config/intents.yaml");
    }

    #[test]
    fn test_parse_intents() {
        let catalog = parse_intents(
            r#"
intents:
  - id: order_query
    type: flow
    next_flow: order_query
  - id: order_query
    type: flow
    priority: 5
    next_flow: order_query_v2
  - id: return_policy
    type: faq
  - id: legacy
    type: flow
    enabled: false
"#,
        )
        .unwrap();

        assert_eq!(catalog.len(), 2);
        let order = catalog.lookup("order_query").unwrap();
        assert_eq!(order.next_flow.as_deref(), Some("order_query_v2"));
        assert_eq!(catalog.lookup("return_policy").unwrap().kind, IntentKind::Faq);
        assert!(catalog.lookup("legacy").is_none());
    }

    #[test]
    fn test_shipped_intents_file_parses() {
        let catalog = parse_intents(include_str!("../../config/intents.yaml")).unwrap();
        assert!(catalog.lookup("order_query").is_some());
        assert!(catalog.lookup("return_goods").is_some());
    }

    #[test]
    fn test_invalid_yaml_rejected() {
        assert!(parse_intents("intents: [").is_err());
    }

    #[test]
    fn test_missing_intents_file_is_empty() {
        let catalog = load_intents("does/not/exist.yaml").unwrap();
        assert!(catalog.is_empty());
    }
}

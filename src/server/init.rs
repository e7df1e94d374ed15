//! Server initialization and main run loop

use super::config::{AppConfig, StoreBackend};
use super::loader::{load_config, load_intents};
use crate::api::{api_router, AppState};
use anyhow::{Context, Result};
use parley_core::{
    retry_with_backoff, Backoff, MemoryStore, Orchestrator, RedisStore, RetryConfig,
    SessionStore,
};
use parley_flows::{default_registry, StaticOrderBook};
use parley_inference::{HttpInferenceClient, InferenceClient};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Build the session store selected by configuration
pub fn build_store(config: &AppConfig) -> Result<Arc<dyn SessionStore>> {
    let store: Arc<dyn SessionStore> = match config.store.backend {
        StoreBackend::Redis => Arc::new(
            RedisStore::with_options(
                &config.redis.url,
                &config.redis.key_prefix,
                config.redis.ttl(),
            )
            .context("Failed to create Redis session store")?,
        ),
        StoreBackend::Memory => {
            warn!("Using in-memory session store, sessions are lost on restart");
            Arc::new(MemoryStore::new().with_ttl(config.redis.ttl()))
        }
    };
    Ok(store)
}

/// Wire store, inference client, flows and intents into an orchestrator
pub fn build_orchestrator(config: &AppConfig) -> Result<Arc<Orchestrator>> {
    let store = build_store(config)?;

    let inference: Arc<dyn InferenceClient> = Arc::new(
        HttpInferenceClient::new(config.inference.to_client_config())
            .context("Failed to create inference client")?,
    );

    let registry = Arc::new(default_registry(Arc::new(StaticOrderBook::fixtures())));
    info!(flows = ?registry.flow_ids(), "Flow registry ready");

    let intents = Arc::new(load_intents(&config.intents.path)?);
    info!(count = intents.len(), "Intent catalog ready");

    Ok(Arc::new(
        Orchestrator::new(
            store,
            inference,
            registry,
            config.orchestrator.to_orchestrator_config(),
        )
        .with_intents(intents),
    ))
}

/// Ping the store until it answers or the retry budget runs out
pub async fn probe_store(orchestrator: &Orchestrator) -> Result<()> {
    let retry = RetryConfig::new()
        .with_max_attempts(5)
        .with_initial_delay(Duration::from_millis(200))
        .with_max_delay(Duration::from_secs(3))
        .with_backoff(Backoff::Exponential { multiplier: 2.0 });

    retry_with_backoff(&retry, || orchestrator.ping(), |_| true)
        .await
        .context("Session store is unreachable")?;

    info!("Session store reachable");
    Ok(())
}

/// Run the server
pub async fn run() -> Result<()> {
    info!("Starting Parley v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config().context("Failed to load configuration")?;
    info!(
        backend = ?config.store.backend,
        inference = %config.inference.base_url,
        "Configuration loaded"
    );

    let orchestrator = build_orchestrator(&config)?;
    probe_store(&orchestrator).await?;

    let state = AppState::new(orchestrator.clone(), config.inference.base_url.clone());
    let app = api_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    info!("HTTP server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    if let Err(e) = orchestrator.store().close().await {
        warn!(error = %e, "Failed to close session store");
    }

    info!("Parley shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C signal"),
        _ = terminate => info!("Received SIGTERM signal"),
    }
}

//! `parley check`: configuration and connectivity diagnostics

use crate::server::{build_orchestrator, load_config, probe_store};
use anyhow::Context;

pub async fn run() -> anyhow::Result<()> {
    println!("Parley check\n");

    let config = load_config().context("Configuration is invalid")?;
    println!("Configuration ... ok");
    println!("  store backend: {:?}", config.store.backend);
    println!("  inference:     {}", config.inference.base_url);

    let orchestrator = build_orchestrator(&config)?;
    println!("Flows ........... {}", orchestrator.registry().flow_ids().join(", "));
    println!(
        "Intents ......... {} enabled ({})",
        orchestrator.intents().len(),
        config.intents.path
    );

    probe_store(&orchestrator).await?;
    println!("Session store ... reachable");

    println!("\nAll checks passed.");
    Ok(())
}

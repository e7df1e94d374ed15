//! CLI module for Parley
//!
//! - `serve`: start the HTTP server
//! - `check`: load configuration and intents, then ping the session store

use clap::{Parser, Subcommand};

pub mod check;

/// Parley conversation orchestrator
#[derive(Parser, Debug)]
#[command(name = "parley")]
#[command(about = "Conversation orchestration service")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the server
    Serve,
    /// Validate configuration and store connectivity
    Check,
}

/// Run the CLI command
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Some(Commands::Serve) => crate::server::run().await,
        Some(Commands::Check) => check::run().await,
        None => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            cmd.print_help()?;
            println!();
            Ok(())
        }
    }
}

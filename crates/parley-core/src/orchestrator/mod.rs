//! Orchestrator - turn entry point
//!
//! Ties the session store, decision router and flow engine together. One call
//! to [`Orchestrator::handle_turn`] is one request/response exchange.
//!
//! # Module Structure
//!
//! - `config`: `OrchestratorConfig`
//! - `core`: `Orchestrator` struct, builder methods and turn handling

mod config;
mod core;


pub use config::OrchestratorConfig;
pub use self::core::{Orchestrator, TICKET_REPLY};

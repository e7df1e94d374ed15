//! Server module for Parley
//!
//! # Module Structure
//!
//! - `config`: Configuration structures for all server components
//! - `loader`: Configuration and intent loading from files and environment
//! - `init`: Component wiring, startup probe and the run loop

pub mod config;
mod init;
mod loader;

pub use init::{build_orchestrator, probe_store, run};
pub use loader::load_config;

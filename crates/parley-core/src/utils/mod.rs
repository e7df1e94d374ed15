//! Utility modules for parley-core
//!
//! - retry: backoff configuration and a generic retry loop
//! - deadline: timeout + cancellation bound for collaborator calls

mod deadline;
mod retry;

pub use deadline::bounded;
pub use retry::{retry_with_backoff, Backoff, RetryConfig, RetryError};

//! Flow engine
//!
//! A flow is a named set of steps. The session records which flow runs and
//! which step it waits on; [`FlowEngine::dispatch`] runs that step for the
//! incoming message, appends the exchange, advances or completes the flow and
//! persists the session.

mod engine;
mod handler;
mod registry;

pub use engine::{FlowEngine, DEFAULT_SAVE_RETRIES, FLOW_ENDED_REPLY, UNKNOWN_FLOW_REPLY};
pub use handler::{sync_step, FlowContext, StepHandler, StepOutcome, SyncStep};
pub use registry::{Flow, FlowRegistry, FlowRegistryBuilder};

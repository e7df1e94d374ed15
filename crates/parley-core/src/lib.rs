//! Parley Core - conversation orchestration
//!
//! This crate provides the stateful half of the Parley agent:
//! - Session: the persisted conversation model
//! - Store: versioned session persistence with optimistic locking and merge
//! - Flow: registry-driven step state machine for guided conversations
//! - Decision: per-turn routing (continue flow, new flow, FAQ, ticket)
//! - Orchestrator: the turn entry point tying the above together
//! - Utils: retry backoff and collaborator deadlines
//!
//! Natural-language work is delegated to the inference service through
//! [`parley_inference::InferenceClient`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod decision;
pub mod error;
pub mod flow;
pub mod orchestrator;
pub mod session;
pub mod store;
pub mod turn;
pub mod utils;

#[cfg(test)]
mod test_support;

pub use decision::{
    DecisionKind, DecisionResult, DecisionRouter, IntentCatalog, IntentDefinition, IntentKind,
};
pub use error::{format_error_for_chat, Error, Result, UserFriendlyError};
pub use flow::{
    sync_step, Flow, FlowContext, FlowEngine, FlowRegistry, StepHandler, StepOutcome,
    FLOW_ENDED_REPLY, UNKNOWN_FLOW_REPLY,
};
pub use orchestrator::{Orchestrator, OrchestratorConfig, TICKET_REPLY};
pub use session::{FlowState, Message, MessageRole, Session, SessionState, MAX_MESSAGES};
pub use store::{DedupKey, MemoryStore, MergePolicy, RedisStore, SessionStore};
pub use turn::{IntentType, SessionHistory, TurnRequest, TurnResponse};
pub use utils::{bounded, retry_with_backoff, Backoff, RetryConfig, RetryError};

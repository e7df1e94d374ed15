//! Parley Inference - client for the external inference service
//!
//! The orchestrator delegates all natural-language work to a separate service:
//! - Intent recognition
//! - Chat completion (FAQ / retrieval answers)
//! - Ticket creation
//! - Flow interrupt detection
//!
//! This crate holds the wire types, the [`InferenceClient`] capability trait and
//! its reqwest implementation.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
pub mod error;
pub mod types;

pub use client::{HttpInferenceClient, InferenceClient, InferenceConfig};
pub use error::{Error, Result};
pub use types::{
    ChatRequest, ChatResponse, HistoryMessage, IntentRequest, IntentResponse,
    InterruptCheckRequest, InterruptCheckResponse, Ticket, TicketStatus,
};

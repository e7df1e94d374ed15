//! Turn input and output

use crate::session::{Message, SessionState};
use serde::{Deserialize, Serialize};

/// Kind of answer a turn produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntentType {
    /// Answered by a flow step
    Flow,
    /// Answered by retrieval chat
    Faq,
    /// Ticket filed or flow recovery
    Unknown,
}

/// One inbound user message
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TurnRequest {
    /// Existing session, or `None` to start one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// User text
    pub message: String,
    /// Caller's user id
    #[serde(default)]
    pub user_id: String,
}

impl TurnRequest {
    /// Create a request for a new session
    #[must_use]
    pub fn new(message: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            session_id: None,
            message: message.into(),
            user_id: user_id.into(),
        }
    }

    /// Continue an existing session
    #[must_use]
    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }
}

/// Reply to one turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnResponse {
    /// Assistant reply
    pub reply: String,
    /// How the reply was produced
    #[serde(rename = "type")]
    pub intent_type: IntentType,
    /// Session state after the turn
    #[serde(rename = "session")]
    pub session_state: SessionState,
    /// Session the turn belongs to
    pub session_id: String,
    /// Step the active flow now waits on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_step: Option<String>,
}

/// Stored conversation log of a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionHistory {
    /// Session id
    pub session_id: String,
    /// Messages, oldest first
    pub messages: Vec<Message>,
    /// Number of messages
    pub count: usize,
}

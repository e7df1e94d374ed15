//! Wire types exchanged with the inference service
//!
//! Field names follow the service's snake_case JSON contract.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One message of conversation history as the inference service sees it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryMessage {
    /// Role label (`user`, `assistant`, `system`)
    pub role: String,
    /// Message text
    pub content: String,
}

impl HistoryMessage {
    /// Create a history entry
    #[must_use]
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

/// `POST /intent/recognize` request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentRequest {
    /// User message to classify
    pub message: String,
    /// Session the message belongs to
    pub session_id: String,
    /// Recent history for context
    #[serde(default)]
    pub history: Vec<HistoryMessage>,
}

/// `POST /intent/recognize` response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntentResponse {
    /// Intent label (`faq`, `flow`, `unknown`, or a configured intent id)
    pub intent: String,
    /// Classifier confidence (0.0 - 1.0)
    pub confidence: f32,
    /// Suggested reply
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply: Option<String>,
    /// Flow to start, when the classifier knows it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_id: Option<String>,
    /// Follow-up suggestions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<String>>,
}

/// `POST /chat` request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Session id
    pub session_id: String,
    /// User message
    pub message: String,
    /// User id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Recent history
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<HistoryMessage>>,
    /// Intent the orchestrator resolved (`faq`, `flow`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
    /// Flow id hint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_id: Option<String>,
}

/// `POST /chat` response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Generated reply
    pub reply: String,
    /// Reply type as reported by the service
    #[serde(rename = "type")]
    pub kind: String,
    /// Session state the service suggests (informational)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_state: Option<String>,
}

/// Ticket status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    /// Newly filed
    Open,
    /// Picked up by an agent
    InProgress,
    /// Closed
    Closed,
}

/// Support ticket filed through `POST /ticket/create`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    /// Ticket id (assigned by the service; may be empty on create)
    #[serde(default)]
    pub id: String,
    /// Originating session
    pub session_id: String,
    /// Originating user
    pub user_id: String,
    /// Intent label that led to the ticket
    pub intent: String,
    /// Optional subject line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// Free-text description
    pub description: String,
    /// Status
    pub status: TicketStatus,
    /// RFC 3339 creation time
    pub created_at: String,
    /// RFC 3339 update time
    pub updated_at: String,
}

/// `POST /flow/interrupt-check` request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterruptCheckRequest {
    /// Session id
    pub session_id: String,
    /// Active flow
    pub flow_id: String,
    /// Step the flow is waiting on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_step: Option<String>,
    /// Incoming user message
    pub user_message: String,
    /// Flow scratch data collected so far
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_state: Option<Map<String, Value>>,
}

/// `POST /flow/interrupt-check` response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InterruptCheckResponse {
    /// Whether the message leaves the active flow
    pub should_interrupt: bool,
    /// Confidence of the verdict
    pub confidence: f32,
    /// Intent the user switched to, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_intent: Option<String>,
    /// Explanation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

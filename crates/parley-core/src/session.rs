//! Conversation session model
//!
//! A [`Session`] is the unit of persistence: the message log, the lifecycle
//! state and, while a guided flow is running, the active flow position and
//! the flow's scratch data.
//!
//! ## Lifecycle
//!
//! `New -> Active -> OnFlow -> Complete`, ordered in that sequence for merge
//! purposes. `Complete` is soft-terminal: the next turn resets it to `New`.
//!
//! ## Flow scratch data
//!
//! Step handlers never read freeform keys. Each flow defines a serde struct
//! and goes through [`Session::flow_data`] / [`Session::set_flow_data`], which
//! store it as a versioned [`FlowState`] bag.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use parley_inference::HistoryMessage;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Maximum number of messages retained per session
pub const MAX_MESSAGES: usize = 100;

/// Current [`FlowState`] schema version
pub const FLOW_STATE_SCHEMA: u32 = 1;

/// Step every flow begins with
pub const START_STEP: &str = "start";

/// Message author
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// End user
    User,
    /// The agent
    Assistant,
    /// System notice
    System,
}

impl MessageRole {
    /// Wire label
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::System => "system",
        }
    }
}

/// A single conversation message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Author
    pub role: MessageRole,
    /// Text
    pub content: String,
    /// When the message was recorded
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create a message stamped now
    #[must_use]
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create a user message
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Create an assistant message
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    /// Override the timestamp
    #[must_use]
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No conversation yet, or reset
    New,
    /// Free conversation
    Active,
    /// A guided flow is running
    OnFlow,
    /// A flow just finished
    Complete,
    /// Value written by something else; decodes but never wins a merge
    #[serde(other)]
    Unknown,
}

impl SessionState {
    /// Position in the `New < Active < OnFlow < Complete` order
    #[must_use]
    pub fn rank(&self) -> Option<u8> {
        match self {
            SessionState::New => Some(0),
            SessionState::Active => Some(1),
            SessionState::OnFlow => Some(2),
            SessionState::Complete => Some(3),
            SessionState::Unknown => None,
        }
    }

    /// Wire label
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::New => "new",
            SessionState::Active => "active",
            SessionState::OnFlow => "on_flow",
            SessionState::Complete => "complete",
            SessionState::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Versioned scratch bag owned by the active flow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowState {
    /// Layout version of `fields`
    pub schema: u32,
    /// The flow's serialized data struct
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl FlowState {
    /// Serialize a flow's data struct into a bag
    pub fn encode<T: Serialize>(data: &T) -> Result<Self> {
        match serde_json::to_value(data)? {
            Value::Object(fields) => Ok(Self {
                schema: FLOW_STATE_SCHEMA,
                fields,
            }),
            other => Err(Error::InvalidFlowState(format!(
                "flow data must serialize to an object, got {}",
                other
            ))),
        }
    }

    /// Decode the bag into a flow's data struct
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        if self.schema != FLOW_STATE_SCHEMA {
            return Err(Error::InvalidFlowState(format!(
                "unsupported flow state schema {}",
                self.schema
            )));
        }
        serde_json::from_value(Value::Object(self.fields.clone()))
            .map_err(|e| Error::InvalidFlowState(e.to_string()))
    }
}

fn empty_as_none<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}

/// Conversation session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Stable session key
    pub id: String,
    /// Owning user
    #[serde(default)]
    pub user_id: String,
    /// Lifecycle state
    pub state: SessionState,
    /// Message log, oldest first
    #[serde(default)]
    pub messages: Vec<Message>,
    /// Active flow
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub flow_id: Option<String>,
    /// Step the active flow waits on
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub current_step: Option<String>,
    /// Active flow's scratch data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_state: Option<FlowState>,
    /// Optimistic concurrency version (0 = never persisted)
    #[serde(default)]
    pub version: u64,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last update time
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Create an unsaved session in state `New`
    #[must_use]
    pub fn new(id: impl Into<String>, user_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            user_id: user_id.into(),
            state: SessionState::New,
            messages: Vec::new(),
            flow_id: None,
            current_step: None,
            flow_state: None,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Append a message, evicting the oldest beyond [`MAX_MESSAGES`]
    pub fn add_message(&mut self, message: Message) {
        self.messages.push(message);
        self.enforce_message_cap();
    }

    /// Append a user message
    pub fn add_user_message(&mut self, content: impl Into<String>) {
        self.add_message(Message::user(content));
    }

    /// Append an assistant message
    pub fn add_assistant_message(&mut self, content: impl Into<String>) {
        self.add_message(Message::assistant(content));
    }

    /// Drop the oldest messages beyond [`MAX_MESSAGES`]
    pub fn enforce_message_cap(&mut self) {
        if self.messages.len() > MAX_MESSAGES {
            let excess = self.messages.len() - MAX_MESSAGES;
            self.messages.drain(..excess);
        }
    }

    /// Last `n` messages in the inference service's shape
    #[must_use]
    pub fn recent_history(&self, n: usize) -> Vec<HistoryMessage> {
        let skip = self.messages.len().saturating_sub(n);
        self.messages[skip..]
            .iter()
            .map(|m| HistoryMessage::new(m.role.as_str(), m.content.clone()))
            .collect()
    }

    /// Whether a flow is running
    #[must_use]
    pub fn is_on_flow(&self) -> bool {
        self.state == SessionState::OnFlow
    }

    /// Step to dispatch, `start` when none is recorded
    #[must_use]
    pub fn step_or_start(&self) -> &str {
        self.current_step.as_deref().unwrap_or(START_STEP)
    }

    /// Enter a flow at its `start` step with fresh scratch data
    pub fn begin_flow(&mut self, flow_id: impl Into<String>) {
        self.state = SessionState::OnFlow;
        self.flow_id = Some(flow_id.into());
        self.current_step = Some(START_STEP.to_string());
        self.flow_state = None;
    }

    /// Back to `New` with no flow
    pub fn reset(&mut self) {
        self.state = SessionState::New;
        self.clear_flow();
    }

    /// Mark the flow finished
    pub fn complete(&mut self) {
        self.state = SessionState::Complete;
        self.clear_flow();
    }

    /// Drop flow position and scratch data
    pub fn clear_flow(&mut self) {
        self.flow_id = None;
        self.current_step = None;
        self.flow_state = None;
    }

    /// Refresh `updated_at`
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Read the active flow's data struct, `None` when nothing was stored yet
    pub fn flow_data<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        self.flow_state.as_ref().map(FlowState::decode).transpose()
    }

    /// Replace the active flow's data struct
    pub fn set_flow_data<T: Serialize>(&mut self, data: &T) -> Result<()> {
        self.flow_state = Some(FlowState::encode(data)?);
        Ok(())
    }
}

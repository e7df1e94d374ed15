//! Error types for parley-core
//!
//! This module provides the error taxonomy and user-facing error formatting.

use thiserror::Error;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// Bad caller input (empty id, negative retry budget, ...)
    #[error("invalid parameter: {0}")]
    InvalidParam(String),

    /// Session failed validation before a write
    #[error("invalid session: {0}")]
    InvalidSession(String),

    /// Stored session is newer than the caller's copy
    #[error("session conflict: {session_id} stored at version {current_version}, incoming at {incoming_version}")]
    SessionConflict {
        /// Session id
        session_id: String,
        /// Version found in the store
        current_version: u64,
        /// Version the caller based its update on
        incoming_version: u64,
    },

    /// The watched key changed between read and commit
    #[error("transaction aborted: {session_id} was modified concurrently")]
    TransactionAborted {
        /// Session id
        session_id: String,
    },

    /// Optimistic write gave up
    #[error("max retries exceeded for session {session_id} after {attempts} attempts: {source}")]
    MaxRetriesExceeded {
        /// Session id
        session_id: String,
        /// Attempts made
        attempts: u32,
        /// Last retryable failure
        #[source]
        source: Box<Error>,
    },

    /// Flow scratch data does not match the reader's schema
    #[error("invalid flow state: {0}")]
    InvalidFlowState(String),

    /// Business failure raised by a step handler
    #[error("flow error: {0}")]
    Flow(String),

    /// Inference service failure
    #[error("collaborator error: {0}")]
    Collaborator(#[from] parley_inference::Error),

    /// Turn was cancelled by its caller
    #[error("turn cancelled")]
    Cancelled,

    /// Session (de)serialization failure
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Backend failure (Redis, connection, ...)
    #[error("storage error: {0}")]
    Storage(String),

    /// Store was closed
    #[error("session store is closed")]
    StoreClosed,

    /// Configuration error (intent catalog, store options, ...)
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl Error {
    /// Whether an optimistic write should be attempted again
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::SessionConflict { .. } | Error::TransactionAborted { .. }
        )
    }

    /// Whether the error came from the inference service
    #[must_use]
    pub fn is_collaborator(&self) -> bool {
        matches!(self, Error::Collaborator(_))
    }
}

impl From<redis::RedisError> for Error {
    fn from(e: redis::RedisError) -> Self {
        Error::Storage(e.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Trait for user-friendly error messages
///
/// Chat replies must never carry internal detail, so the user message only
/// depends on the error category.
pub trait UserFriendlyError {
    /// Get a user-friendly error message
    fn user_message(&self) -> String;

    /// Get a suggestion for how to proceed
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for Error {
    fn user_message(&self) -> String {
        match self {
            Error::InvalidParam(_) | Error::InvalidSession(_) => {
                "抱歉，请求内容无效。".to_string()
            }
            Error::Collaborator(_) | Error::Cancelled => {
                "抱歉，服务暂时不可用，请稍后再试。".to_string()
            }
            _ => "抱歉，系统繁忙，请稍后再试。".to_string(),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            Error::SessionConflict { .. }
            | Error::TransactionAborted { .. }
            | Error::MaxRetriesExceeded { .. } => Some("请重新发送您的消息。".to_string()),
            Error::InvalidParam(_) | Error::InvalidSession(_) => {
                Some("请检查消息内容后重试。".to_string())
            }
            _ => None,
        }
    }
}

/// Format an error for display in a chat reply
pub fn format_error_for_chat(error: &Error) -> String {
    let mut output = error.user_message();

    if let Some(suggestion) = error.suggestion() {
        output.push('\n');
        output.push_str(&suggestion);
    }

    output
}

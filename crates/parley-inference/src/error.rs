//! Error types for parley-inference

use thiserror::Error;

/// Inference client error type
#[derive(Debug, Error)]
pub enum Error {
    /// Client not configured (missing base URL, bad TLS setup, ...)
    #[error("inference client not configured: {0}")]
    NotConfigured(String),

    /// Non-success HTTP status returned by the service
    #[error("api error: {0}")]
    Api(String),

    /// Response body could not be decoded
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Network error
    #[error("network error: {0}")]
    Network(String),

    /// Timeout
    #[error("timeout after {0}ms")]
    Timeout(u64),
}

impl Error {
    /// Whether the failure is transient (worth retrying at a higher layer)
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Network(_) | Error::Timeout(_))
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

//! HTTP client for the inference service
//!
//! The service exposes four JSON endpoints. Every call is a bounded
//! request/response exchange; there is no streaming.

use crate::error::{Error, Result};
use crate::types::{
    ChatRequest, ChatResponse, IntentRequest, IntentResponse, InterruptCheckRequest,
    InterruptCheckResponse, Ticket,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

/// Default inference service URL
const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

/// Default per-request timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Narrow capability the orchestrator needs from the inference service
#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Classify a user message
    async fn recognize_intent(&self, request: IntentRequest) -> Result<IntentResponse>;

    /// Generate a reply (FAQ / retrieval-augmented answers)
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse>;

    /// File a support ticket
    async fn create_ticket(&self, ticket: Ticket) -> Result<Ticket>;

    /// Ask whether a message leaves the active flow
    async fn check_flow_interrupt(
        &self,
        request: InterruptCheckRequest,
    ) -> Result<InterruptCheckResponse>;
}

/// Strip anything that looks like host internals from a service error
fn sanitize_api_error(error: &str) -> String {
    let lower = error.to_lowercase();

    if lower.contains("/home") || lower.contains("/root") || lower.contains("traceback") {
        return "The inference service reported an internal error.".to_string();
    }

    if error.len() < 200 {
        return error.to_string();
    }

    "The inference service returned an error.".to_string()
}

#[derive(Debug, Deserialize)]
struct ServiceError {
    detail: serde_json::Value,
}

/// Inference client configuration
#[derive(Debug, Clone)]
pub struct InferenceConfig {
    /// Base URL (default: http://127.0.0.1:8000)
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl InferenceConfig {
    /// Create a new configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create configuration from environment variables
    pub fn from_env() -> Self {
        let base_url = std::env::var("PARLEY_INFERENCE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let timeout = std::env::var("PARLEY_INFERENCE_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_TIMEOUT);

        Self { base_url, timeout }
    }

    /// Set the base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// reqwest-backed [`InferenceClient`]
#[derive(Debug)]
pub struct HttpInferenceClient {
    client: Client,
    config: InferenceConfig,
}

impl HttpInferenceClient {
    /// Create a new client
    pub fn new(config: InferenceConfig) -> Result<Self> {
        if config.base_url.trim().is_empty() {
            return Err(Error::NotConfigured("base_url is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::NotConfigured(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(InferenceConfig::from_env())
    }

    /// Configured base URL
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// POST a JSON body and decode the JSON answer
    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = self.endpoint(path);
        debug!(url = %url, "Calling inference service");

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout(self.config.timeout.as_millis() as u64)
                } else if e.is_connect() {
                    Error::Network(format!(
                        "Failed to connect to inference service at {}",
                        self.config.base_url
                    ))
                } else {
                    Error::Network(e.to_string())
                }
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout(self.config.timeout.as_millis() as u64)
            } else {
                Error::Network(e.to_string())
            }
        })?;

        if !status.is_success() {
            if let Ok(error) = serde_json::from_str::<ServiceError>(&text) {
                return Err(Error::Api(sanitize_api_error(&format!(
                    "HTTP {}: {}",
                    status, error.detail
                ))));
            }
            return Err(Error::Api(sanitize_api_error(&format!("HTTP {}", status))));
        }

        serde_json::from_str(&text).map_err(|e| Error::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl InferenceClient for HttpInferenceClient {
    #[instrument(skip(self, request), fields(session_id = %request.session_id))]
    async fn recognize_intent(&self, request: IntentRequest) -> Result<IntentResponse> {
        self.post_json("/intent/recognize", &request).await
    }

    #[instrument(skip(self, request), fields(session_id = %request.session_id))]
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        self.post_json("/chat", &request).await
    }

    #[instrument(skip(self, ticket), fields(session_id = %ticket.session_id))]
    async fn create_ticket(&self, ticket: Ticket) -> Result<Ticket> {
        self.post_json("/ticket/create", &ticket).await
    }

    #[instrument(skip(self, request), fields(session_id = %request.session_id, flow_id = %request.flow_id))]
    async fn check_flow_interrupt(
        &self,
        request: InterruptCheckRequest,
    ) -> Result<InterruptCheckResponse> {
        self.post_json("/flow/interrupt-check", &request).await
    }
}

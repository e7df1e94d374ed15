//! HTTP API
//!
//! - `POST /chat`: one conversation turn
//! - `GET /sessions/:id/history`, `DELETE /sessions/:id`
//! - `GET /health`, `GET /health/detailed`

pub mod chat;
pub mod health;
pub mod sessions;

#[cfg(test)]
mod test_support;

use axum::http::StatusCode;
use axum::Router;
use parley_core::{format_error_for_chat, Error, Orchestrator};
use serde::Serialize;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use chat::chat_routes;
pub use health::health_routes;
pub use sessions::sessions_routes;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub inference_url: String,
}

impl AppState {
    pub fn new(orchestrator: Arc<Orchestrator>, inference_url: impl Into<String>) -> Self {
        Self {
            orchestrator,
            inference_url: inference_url.into(),
        }
    }
}

/// API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }

    /// Status code plus the chat-safe rendering of `error`
    pub fn from_error(error: &Error) -> (StatusCode, Self) {
        (status_for(error), Self::error(format_error_for_chat(error)))
    }
}

pub(crate) fn status_for(error: &Error) -> StatusCode {
    match error {
        Error::InvalidParam(_) | Error::InvalidSession(_) => StatusCode::BAD_REQUEST,
        Error::Collaborator(_) | Error::Cancelled | Error::StoreClosed => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        Error::SessionConflict { .. }
        | Error::TransactionAborted { .. }
        | Error::MaxRetriesExceeded { .. } => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Create the API router with all endpoints
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .merge(chat_routes())
        .merge(sessions_routes())
        .merge(health_routes())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

//! Chat endpoint
//!
//! POST /chat - Handle one conversation turn

use super::{ApiResponse, AppState};
use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use parley_core::{TurnRequest, TurnResponse};
use serde::Deserialize;
use tracing::warn;

const ANONYMOUS_USER: &str = "anonymous";

/// Request body for a turn
#[derive(Debug, Deserialize)]
pub struct ChatBody {
    /// Omit (or send empty) to start a new session
    #[serde(default)]
    pub session_id: Option<String>,
    pub message: String,
    #[serde(default)]
    pub user_id: Option<String>,
}

impl From<ChatBody> for TurnRequest {
    fn from(body: ChatBody) -> Self {
        let user_id = body
            .user_id
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| ANONYMOUS_USER.to_string());

        let request = TurnRequest::new(body.message, user_id);
        match body.session_id {
            Some(id) if !id.trim().is_empty() => request.with_session(id),
            _ => request,
        }
    }
}

async fn chat(
    State(state): State<AppState>,
    Json(body): Json<ChatBody>,
) -> Result<Json<TurnResponse>, (StatusCode, Json<ApiResponse<()>>)> {
    match state.orchestrator.handle_turn(body.into()).await {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            warn!(error = %e, "Turn failed");
            let (status, body) = ApiResponse::from_error(&e);
            Err((status, Json(body)))
        }
    }
}

/// Create chat routes
pub fn chat_routes() -> Router<AppState> {
    Router::new().route("/chat", post(chat))
}

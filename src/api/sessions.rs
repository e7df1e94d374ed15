//! Sessions API endpoints
//!
//! GET    /sessions/:id/history - Stored conversation log
//! DELETE /sessions/:id         - Clear a session

use super::{ApiResponse, AppState};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use parley_core::SessionHistory;
use serde::Serialize;
use tracing::warn;

type ApiError = (StatusCode, Json<ApiResponse<()>>);

/// Result of a delete
#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub session_id: String,
    pub deleted: bool,
}

async fn get_history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<ApiResponse<SessionHistory>>, ApiError> {
    state
        .orchestrator
        .session_history(&session_id)
        .await
        .map(|history| Json(ApiResponse::success(history)))
        .map_err(|e| {
            warn!(session_id = %session_id, error = %e, "History lookup failed");
            let (status, body) = ApiResponse::from_error(&e);
            (status, Json(body))
        })
}

async fn clear_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<ApiResponse<ClearResponse>>, ApiError> {
    match state.orchestrator.clear_session(&session_id).await {
        Ok(deleted) => Ok(Json(ApiResponse::success(ClearResponse {
            session_id,
            deleted,
        }))),
        Err(e) => {
            warn!(session_id = %session_id, error = %e, "Clear session failed");
            let (status, body) = ApiResponse::from_error(&e);
            Err((status, Json(body)))
        }
    }
}

/// Create sessions routes
pub fn sessions_routes() -> Router<AppState> {
    Router::new()
        .route("/sessions/:id/history", get(get_history))
        .route("/sessions/:id", delete(clear_session))
}

//! Read-only views of live detection sessions.

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use swing_models::{SessionId, SessionSummary};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Serialize)]
pub struct SessionListResponse {
    pub count: usize,
    pub sessions: Vec<SessionSummary>,
}

/// `GET /api/sessions`
pub async fn list_sessions(State(state): State<AppState>) -> Json<SessionListResponse> {
    let sessions = state.sessions.list_sessions().await;
    Json(SessionListResponse {
        count: sessions.len(),
        sessions,
    })
}

/// `GET /api/sessions/:session_id`
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<Json<SessionSummary>> {
    let id = SessionId::from(session_id);
    let session = state
        .sessions
        .get_session(&id)
        .await
        .ok_or_else(|| ApiError::not_found(format!("session {}", id)))?;

    let summary = session.lock().await.summary();
    Ok(Json(summary))
}

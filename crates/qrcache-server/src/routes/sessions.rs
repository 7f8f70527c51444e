//! Session lifecycle routes.

use super::error_response;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use qrcache_types::SessionSummary;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

#[derive(Serialize)]
pub struct SessionListResponse {
    pub sessions: Vec<SessionSummary>,
}

pub async fn list(State(state): State<Arc<AppState>>) -> Json<SessionListResponse> {
    Json(SessionListResponse {
        sessions: state.sessions.list(),
    })
}

#[derive(Serialize)]
pub struct CreateSessionResponse {
    pub session_id: Uuid,
}

pub async fn create(State(state): State<Arc<AppState>>) -> (StatusCode, Json<CreateSessionResponse>) {
    let session = state.sessions.open();
    (
        StatusCode::CREATED,
        Json(CreateSessionResponse {
            session_id: session.id(),
        }),
    )
}

/// Close a session and drop the results it persisted.
pub async fn close(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    state
        .sessions
        .close(id)
        .ok_or((StatusCode::NOT_FOUND, "Session not found".to_string()))?;

    let deleted = state
        .results
        .delete_for_session(id)
        .map_err(error_response)?;
    info!(target: "qrcache::api", "Session {} closed, {} query results dropped", id, deleted);

    Ok(StatusCode::NO_CONTENT)
}

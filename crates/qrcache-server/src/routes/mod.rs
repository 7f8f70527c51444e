//! HTTP route handlers.

pub mod maintenance;
pub mod results;
pub mod sessions;

use crate::state::AppState;
use axum::{
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use qrcache_core::QueryCacheError;
use serde::Serialize;
use std::sync::Arc;
use tracing::error;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Routes served under `/api`.
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/sessions", get(sessions::list).post(sessions::create))
        .route("/sessions/{id}", axum::routing::delete(sessions::close))
        .route(
            "/sessions/{id}/results",
            axum::routing::delete(results::delete_all),
        )
        .route("/sessions/{id}/results/save", post(results::save))
        .route(
            "/sessions/{id}/results/{key}",
            get(results::load)
                .put(results::insert)
                .delete(results::delete),
        )
        .route("/maintenance/sweep", post(maintenance::sweep))
        .route("/health", get(health))
}

/// Map a cache error to a status code and message.
pub(crate) fn error_response(e: QueryCacheError) -> (StatusCode, String) {
    let status = match &e {
        QueryCacheError::SessionNotFound(_) => StatusCode::NOT_FOUND,
        e if e.is_client_error() => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        error!(target: "qrcache::api", "Request failed: {}", e);
    }
    (status, e.to_string())
}

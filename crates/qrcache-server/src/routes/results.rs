//! Previous-query-results routes.

use super::error_response;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use qrcache_types::{EntityId, LoadContext, QueryKey, SaveOutcome};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

type ApiResult<T> = Result<Json<T>, (StatusCode, String)>;

pub async fn save(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(context): Json<LoadContext>,
) -> ApiResult<SaveOutcome> {
    let session = state.sessions.require(id).map_err(error_response)?;
    let outcome = state
        .results
        .save(&session, &context)
        .map_err(error_response)?;
    Ok(Json(outcome))
}

#[derive(Deserialize)]
pub struct InsertRequest {
    pub ids: Vec<EntityId>,
}

#[derive(Serialize)]
pub struct InsertResponse {
    pub inserted: usize,
}

pub async fn insert(
    State(state): State<Arc<AppState>>,
    Path((id, key)): Path<(Uuid, QueryKey)>,
    Json(req): Json<InsertRequest>,
) -> ApiResult<InsertResponse> {
    let session = state.sessions.require(id).map_err(error_response)?;
    let inserted = state
        .results
        .insert(&session, key, &req.ids)
        .map_err(error_response)?;
    Ok(Json(InsertResponse { inserted }))
}

#[derive(Serialize)]
pub struct LoadResponse {
    pub query_key: QueryKey,
    pub count: usize,
    pub ids: Vec<EntityId>,
}

pub async fn load(
    State(state): State<Arc<AppState>>,
    Path((id, key)): Path<(Uuid, QueryKey)>,
) -> ApiResult<LoadResponse> {
    let session = state.sessions.require(id).map_err(error_response)?;
    let ids = state.results.load(&session, key).map_err(error_response)?;
    Ok(Json(LoadResponse {
        query_key: key,
        count: ids.len(),
        ids,
    }))
}

#[derive(Serialize)]
pub struct DeleteResponse {
    pub deleted: usize,
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path((id, key)): Path<(Uuid, QueryKey)>,
) -> ApiResult<DeleteResponse> {
    let session = state.sessions.require(id).map_err(error_response)?;
    let deleted = state
        .results
        .delete(&session, key)
        .map_err(error_response)?;
    Ok(Json(DeleteResponse { deleted }))
}

/// Delete every persisted result of the session.
pub async fn delete_all(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<DeleteResponse> {
    let session = state.sessions.require(id).map_err(error_response)?;
    let deleted = state
        .results
        .delete_for_session(session.id())
        .map_err(error_response)?;
    Ok(Json(DeleteResponse { deleted }))
}

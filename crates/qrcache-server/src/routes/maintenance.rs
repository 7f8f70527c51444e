//! Maintenance routes.

use super::error_response;
use crate::state::AppState;
use crate::sweeper::run_sweep;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use qrcache_types::SweepOutcome;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

#[derive(Deserialize, Default)]
pub struct SweepParams {
    /// Skip the started/coordinator/feature-flag guards.
    #[serde(default)]
    pub force: bool,
}

pub async fn sweep(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SweepParams>,
) -> Result<Json<SweepOutcome>, (StatusCode, String)> {
    let outcome = run_sweep(state.results.clone(), params.force)
        .await
        .map_err(error_response)?;
    info!(target: "qrcache::api", "Manual sweep (force: {}): {:?}", params.force, outcome);
    Ok(Json(outcome))
}

//! Text report endpoints
//!
//! Same lines the console prints, wrapped in JSON.

use axum::{
    Json,
    extract::{Path, State},
};

use crate::api::{
    error::{ApiError, ApiResult},
    state::ApiState,
    types::LinesResponse,
};

/// GET /api/v1/report
pub async fn get_report(State(state): State<ApiState>) -> ApiResult<Json<LinesResponse>> {
    let lines = state.historian.report().await?;
    Ok(Json(LinesResponse { lines }))
}

/// GET /api/v1/report/:target
///
/// Drill-down for one configured target
pub async fn get_target_report(
    State(state): State<ApiState>,
    Path(target): Path<String>,
) -> ApiResult<Json<LinesResponse>> {
    if !state.config.targets.contains(&target) {
        return Err(ApiError::NotFound(format!("unknown target '{target}'")));
    }

    let lines = state.historian.drill(target).await?;
    Ok(Json(LinesResponse { lines }))
}

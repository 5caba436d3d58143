//! Tally snapshot endpoint

use axum::{Json, extract::State};
use serde_json::{Value, json};

use crate::api::{error::ApiResult, state::ApiState};

/// GET /api/v1/history
///
/// Structured tally for every target that has completed a round
pub async fn get_history(State(state): State<ApiState>) -> ApiResult<Json<Value>> {
    let tallies = state.historian.snapshot().await?;

    Ok(Json(json!({
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "count": tallies.len(),
        "targets": tallies,
    })))
}

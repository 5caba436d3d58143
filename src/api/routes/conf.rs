//! Configuration endpoint

use axum::{Json, extract::State};

use crate::{api::state::ApiState, config::Config};

/// GET /api/v1/conf
///
/// Returns the configuration the monitor is running with
pub async fn get_conf(State(state): State<ApiState>) -> Json<Config> {
    Json(state.config.as_ref().clone())
}

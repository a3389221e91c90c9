//! Dashboard endpoint

use axum::{extract::State, routing::get, Json, Router};
use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use anpr_common::time::now_ist;

use crate::error::ApiResult;
use crate::workflow::dashboard::{self, DashboardRow};
use crate::AppState;

/// Dashboard response
#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub generated_at: DateTime<FixedOffset>,
    pub total_plates: usize,
    pub rows: Vec<DashboardRow>,
}

/// GET /api/dashboard
///
/// One row per plate seen at either gate, rebuilt from the event log
/// on every call.
pub async fn get_dashboard(State(state): State<AppState>) -> ApiResult<Json<DashboardResponse>> {
    let rows = dashboard::load_dashboard(&state.db).await?;

    Ok(Json(DashboardResponse {
        generated_at: now_ist(),
        total_plates: rows.len(),
        rows,
    }))
}

/// Build dashboard routes
pub fn dashboard_routes() -> Router<AppState> {
    Router::new().route("/api/dashboard", get(get_dashboard))
}

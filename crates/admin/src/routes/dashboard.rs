//! Dashboard overview.

use axum::{Json, extract::State, response::IntoResponse};
use serde_json::json;

use crate::db::StatsRepository;
use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// `GET /api/admin/dashboard/stats`
#[tracing::instrument(skip_all)]
pub async fn stats(
    State(state): State<AppState>,
    _admin: RequireAdmin,
) -> Result<impl IntoResponse> {
    let dashboard = StatsRepository::new(state.pool()).dashboard().await?;
    Ok(Json(json!({ "status": true, "dashboard": dashboard })))
}

//! Customer account management.

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use chrono::Utc;
use serde_json::json;

use amazon_clone_core::UserId;

use crate::db::UserRepository;
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, RequireSuperAdmin};
use crate::models::ListParams;
use crate::state::AppState;

fn not_found() -> AppError {
    AppError::NotFound("User not found".to_owned())
}

/// `GET /api/admin/users`
pub async fn index(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse> {
    let page = UserRepository::new(state.pool()).list(&params).await?;

    Ok(Json(json!({
        "status": true,
        "totalPages": page.total_pages(),
        "currentPage": page.page.number,
        "totalUsers": page.total,
        "users": page.items,
    })))
}

/// `GET /api/admin/users/{id}`
pub async fn show(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let id = id.parse::<UserId>().map_err(|_| not_found())?;
    let users = UserRepository::new(state.pool());
    let user = users.get(id).await?.ok_or_else(not_found)?;
    let order_count = users.order_count(id).await?;

    Ok(Json(json!({
        "status": true,
        "user": user,
        "orderCount": order_count,
    })))
}

/// `DELETE /api/admin/users/{id}`
///
/// The customer's cart, sessions and orders are removed with them.
pub async fn destroy(
    State(state): State<AppState>,
    RequireSuperAdmin(admin): RequireSuperAdmin,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let id = id.parse::<UserId>().map_err(|_| not_found())?;
    if !UserRepository::new(state.pool()).delete(id).await? {
        return Err(not_found());
    }
    tracing::warn!(admin_id = %admin.id, user_id = %id, "Customer deleted");

    Ok(Json(json!({
        "status": true,
        "message": "User deleted successfully",
    })))
}

/// `GET /api/admin/stats/users`
pub async fn stats(
    State(state): State<AppState>,
    _admin: RequireAdmin,
) -> Result<impl IntoResponse> {
    let stats = UserRepository::new(state.pool()).stats(Utc::now()).await?;
    Ok(Json(json!({ "status": true, "stats": stats })))
}

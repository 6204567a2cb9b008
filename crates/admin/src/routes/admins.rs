//! Admin account management (superadmin only).

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde_json::json;

use amazon_clone_core::AdminId;

use crate::db::AdminRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireSuperAdmin;
use crate::state::AppState;

fn not_found() -> AppError {
    AppError::NotFound("Admin not found".to_owned())
}

/// Parse the target id and refuse to act on the caller's own account.
fn target(raw: &str, caller: AdminId, refusal: &str) -> Result<AdminId> {
    let id = raw.parse::<AdminId>().map_err(|_| not_found())?;
    if id == caller {
        return Err(AppError::BadRequest(refusal.to_owned()));
    }
    Ok(id)
}

/// `GET /api/admin/admins`
pub async fn index(
    State(state): State<AppState>,
    _admin: RequireSuperAdmin,
) -> Result<impl IntoResponse> {
    let admins = AdminRepository::new(state.pool()).list().await?;
    Ok(Json(json!({ "status": true, "admins": admins })))
}

/// `PATCH /api/admin/admins/{id}/toggle-status`
///
/// Deactivating an admin revokes all of their tokens.
pub async fn toggle_status(
    State(state): State<AppState>,
    RequireSuperAdmin(caller): RequireSuperAdmin,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let id = target(&id, caller.id, "Cannot change your own status")?;
    let admin = AdminRepository::new(state.pool())
        .toggle_active(id)
        .await?
        .ok_or_else(not_found)?;
    tracing::info!(by = %caller.id, admin_id = %id, active = admin.is_active, "Admin status toggled");

    let message = if admin.is_active {
        "Admin activated"
    } else {
        "Admin deactivated"
    };
    Ok(Json(json!({
        "status": true,
        "message": message,
        "admin": admin,
    })))
}

/// `DELETE /api/admin/admins/{id}`
pub async fn destroy(
    State(state): State<AppState>,
    RequireSuperAdmin(caller): RequireSuperAdmin,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let id = target(&id, caller.id, "Cannot delete your own account")?;
    if !AdminRepository::new(state.pool()).delete(id).await? {
        return Err(not_found());
    }
    tracing::warn!(by = %caller.id, admin_id = %id, "Admin deleted");

    Ok(Json(json!({
        "status": true,
        "message": "Admin deleted successfully",
    })))
}

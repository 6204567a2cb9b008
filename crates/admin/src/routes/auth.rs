//! Admin login, logout and own-account routes.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use serde_json::json;

use super::json_body;
use crate::db::AdminRepository;
use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{RequireAdmin, RequireSuperAdmin};
use crate::models::AdminSummary;
use crate::services::auth::{
    ADMIN_COOKIE, ADMIN_TOKEN_TTL, AdminAuthService, AdminLoginInput, ChangePasswordInput,
    RegisterAdminInput, UpdateProfileInput,
};
use crate::state::AppState;

/// `POST /api/admin/auth/login`
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: std::result::Result<Json<AdminLoginInput>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let input = json_body(payload)?;
    let admins = AdminRepository::new(state.pool());

    let login = AdminAuthService::new(&admins, state.keys())
        .login(&input, Utc::now())
        .await?;

    let purged = admins.purge_expired_tokens().await?;
    if purged > 0 {
        tracing::debug!(purged, "Purged expired admin tokens");
    }

    set_sentry_user(&login.admin.id, Some(login.admin.email.as_str()));

    let cookie = Cookie::build((ADMIN_COOKIE, login.token.token.clone()))
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(state.config().cookie_secure)
        .path("/")
        .max_age(time::Duration::seconds(ADMIN_TOKEN_TTL.num_seconds()));

    Ok((
        jar.add(cookie),
        Json(json!({
            "status": true,
            "message": "Login successful",
            "admin": AdminSummary::from(&login.admin),
            "token": login.token.token,
        })),
    ))
}

/// `POST /api/admin/auth/register`
pub async fn register(
    State(state): State<AppState>,
    RequireSuperAdmin(actor): RequireSuperAdmin,
    payload: std::result::Result<Json<RegisterAdminInput>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let input = json_body(payload)?;
    let admins = AdminRepository::new(state.pool());

    let admin = AdminAuthService::new(&admins, state.keys())
        .register(&input)
        .await?;
    tracing::info!(created_by = %actor.id, admin_id = %admin.id, "Admin registered");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": true,
            "message": "Admin created successfully",
            "admin": AdminSummary::from(&admin),
        })),
    ))
}

/// `POST /api/admin/auth/logout`
pub async fn logout(
    State(state): State<AppState>,
    RequireAdmin { admin, jti }: RequireAdmin,
    jar: CookieJar,
) -> Result<impl IntoResponse> {
    let admins = AdminRepository::new(state.pool());
    AdminAuthService::new(&admins, state.keys())
        .logout(admin.id, jti)
        .await?;

    clear_sentry_user();

    Ok((
        jar.remove(Cookie::build(ADMIN_COOKIE).path("/")),
        Json(json!({
            "status": true,
            "message": "Logged out successfully",
        })),
    ))
}

/// `GET /api/admin/auth/profile`
pub async fn profile(RequireAdmin { admin, .. }: RequireAdmin) -> impl IntoResponse {
    Json(json!({ "status": true, "admin": admin }))
}

/// `PUT /api/admin/auth/profile`
pub async fn update_profile(
    State(state): State<AppState>,
    RequireAdmin { admin, .. }: RequireAdmin,
    payload: std::result::Result<Json<UpdateProfileInput>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let input = json_body(payload)?;
    let admins = AdminRepository::new(state.pool());

    let admin = AdminAuthService::new(&admins, state.keys())
        .update_profile(admin.id, &input)
        .await?;

    Ok(Json(json!({
        "status": true,
        "message": "Profile updated successfully",
        "admin": admin,
    })))
}

/// `POST /api/admin/auth/change-password`
///
/// Every other token of the admin is revoked; the presented one survives.
pub async fn change_password(
    State(state): State<AppState>,
    RequireAdmin { admin, jti }: RequireAdmin,
    payload: std::result::Result<Json<ChangePasswordInput>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let input = json_body(payload)?;
    let admins = AdminRepository::new(state.pool());

    AdminAuthService::new(&admins, state.keys())
        .change_password(admin.id, jti, &input)
        .await?;

    Ok(Json(json!({
        "status": true,
        "message": "Password changed successfully",
    })))
}

//! Registration, OTP confirmation, login and logout.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use super::json_body;
use crate::db::{LoginAttemptRepository, PendingRegistrationRepository, UserRepository};
use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{ClientIp, RequireUser};
use crate::services::auth::{
    LoginInput, LoginService, RegistrationInput, RegistrationService, SESSION_COOKIE, SESSION_TTL,
};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub otp: String,
}

/// `POST /api/register`
pub async fn register(
    State(state): State<AppState>,
    payload: std::result::Result<Json<RegistrationInput>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let input = json_body(payload)?;
    let users = UserRepository::new(state.pool());
    let pending = PendingRegistrationRepository::new(state.pool());

    let email = RegistrationService::new(&users, &pending, state.mailer())
        .register(input, Utc::now())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": true,
            "message": "Registration initiated. Please verify your email with the OTP sent.",
            "email": email,
        })),
    ))
}

/// `POST /api/verify-otp`
pub async fn verify_otp(
    State(state): State<AppState>,
    payload: std::result::Result<Json<VerifyOtpRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let request = json_body(payload)?;
    let users = UserRepository::new(state.pool());
    let pending = PendingRegistrationRepository::new(state.pool());

    let user = RegistrationService::new(&users, &pending, state.mailer())
        .verify_otp(&request.email, &request.otp, Utc::now())
        .await?;

    Ok(Json(json!({
        "status": true,
        "message": "Email verified successfully. You can now log in.",
        "user": user,
    })))
}

/// `POST /api/login`
///
/// Sets the session cookie and answers 201 on success.
pub async fn login(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    jar: CookieJar,
    payload: std::result::Result<Json<LoginInput>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let input = json_body(payload)?;
    let users = UserRepository::new(state.pool());
    let attempts = LoginAttemptRepository::new(state.pool());

    let outcome = LoginService::new(&users, &attempts, state.session_keys())
        .login(&ip, &input, Utc::now())
        .await?;

    let purged = users.purge_expired_tokens().await?;
    if purged > 0 {
        tracing::debug!(purged, "Purged expired session tokens");
    }

    set_sentry_user(&outcome.user.id, Some(outcome.user.email.as_str()));

    let cookie = Cookie::build((SESSION_COOKIE, outcome.session.token))
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(state.config().cookie_secure)
        .path("/")
        .max_age(time::Duration::seconds(SESSION_TTL.num_seconds()));

    Ok((
        StatusCode::CREATED,
        jar.add(cookie),
        Json(json!({
            "status": true,
            "message": "Login successful",
            "user": outcome.user,
        })),
    ))
}

/// `GET /api/logout`
///
/// Revokes only the presented token; other sessions of the user survive.
pub async fn logout(
    State(state): State<AppState>,
    RequireUser { user, jti }: RequireUser,
    jar: CookieJar,
) -> Result<impl IntoResponse> {
    let users = UserRepository::new(state.pool());
    let attempts = LoginAttemptRepository::new(state.pool());
    LoginService::new(&users, &attempts, state.session_keys())
        .logout(user.id, jti)
        .await?;

    clear_sentry_user();

    Ok((
        jar.remove(Cookie::build(SESSION_COOKIE).path("/")),
        Json(json!({
            "status": true,
            "message": "Logged out successfully",
        })),
    ))
}

//! Authentication extractors for admin.
//!
//! The token is read from the `AdminToken` cookie, or from an
//! `Authorization: Bearer` header for API clients. Every failure, including
//! a deactivated account, is the same 401.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use axum_extra::extract::cookie::CookieJar;
use uuid::Uuid;

use crate::db::AdminRepository;
use crate::error::{AppError, set_sentry_user};
use crate::models::AdminAccount;
use crate::services::auth::{ADMIN_COOKIE, AdminAuthError, AdminAuthService};
use crate::state::AppState;

const AUTH_FAILED: &str = "Authentication failed";
const SUPERADMIN_ONLY: &str = "This action requires superadmin privileges";

/// The presented token, cookie first.
fn presented_token(parts: &Parts) -> Option<String> {
    let jar = CookieJar::from_headers(&parts.headers);
    if let Some(cookie) = jar.get(ADMIN_COOKIE).filter(|c| !c.value().is_empty()) {
        return Some(cookie.value().to_owned());
    }

    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_owned)
}

/// Extractor that requires an authenticated, active admin.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireAdmin { admin, .. }: RequireAdmin) -> impl IntoResponse {
///     Json(admin)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RequireAdmin {
    pub admin: AdminAccount,
    /// Id of the presented token, needed to revoke exactly this session.
    pub jti: Uuid,
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = presented_token(parts).ok_or(AppError::Unauthorized(AUTH_FAILED))?;

        let admins = AdminRepository::new(state.pool());
        let service = AdminAuthService::new(&admins, state.keys());
        let (admin, jti) = service.authenticate(&token).await.map_err(|e| match e {
            AdminAuthError::Repository(err) => AppError::Database(err),
            _ => AppError::Unauthorized(AUTH_FAILED),
        })?;

        set_sentry_user(&admin.id, Some(admin.email.as_str()));
        Ok(Self { admin, jti })
    }
}

/// Extractor that additionally requires the superadmin role.
pub struct RequireSuperAdmin(pub AdminAccount);

impl FromRequestParts<AppState> for RequireSuperAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireAdmin { admin, .. } = RequireAdmin::from_request_parts(parts, state).await?;
        if !admin.role.is_super_admin() {
            return Err(AppError::Forbidden(SUPERADMIN_ONLY));
        }
        Ok(Self(admin))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::Request;

    use super::*;

    fn parts(req: Request<()>) -> Parts {
        req.into_parts().0
    }

    #[test]
    fn test_cookie_token_wins_over_header() {
        let req = Request::builder()
            .header("cookie", "AdminToken=from-cookie")
            .header(AUTHORIZATION, "Bearer from-header")
            .body(())
            .unwrap();
        assert_eq!(presented_token(&parts(req)).as_deref(), Some("from-cookie"));
    }

    #[test]
    fn test_bearer_header_fallback() {
        let req = Request::builder()
            .header(AUTHORIZATION, "Bearer abc.def.ghi")
            .body(())
            .unwrap();
        assert_eq!(presented_token(&parts(req)).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn test_no_token() {
        let req = Request::builder()
            .header(AUTHORIZATION, "Basic dXNlcjpwYXNz")
            .body(())
            .unwrap();
        assert!(presented_token(&parts(req)).is_none());

        let req = Request::builder()
            .header("cookie", "AdminToken=")
            .body(())
            .unwrap();
        assert!(presented_token(&parts(req)).is_none());
    }
}

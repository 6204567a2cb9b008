//! Session extractors for customer routes.
//!
//! `RequireUser` reads the `AmazonClone` cookie, verifies the JWT, and checks
//! that its `jti` is still recorded for the user. A token removed by logout
//! is rejected even while its signature and expiry are still valid.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::cookie::CookieJar;
use uuid::Uuid;

use amazon_clone_core::User;

use crate::db::UserRepository;
use crate::error::{AppError, set_sentry_user};
use crate::services::auth::SESSION_COOKIE;
use crate::state::AppState;
use crate::store::UserStore;

const NO_TOKEN: &str = "No token provided";
const INVALID_TOKEN: &str = "Token is invalid or logged out";

/// Extractor that requires a live customer session.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireUser { user, .. }: RequireUser) -> impl IntoResponse {
///     Json(user)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RequireUser {
    pub user: User,
    /// Id of the presented token, needed to revoke exactly this session.
    pub jti: Uuid,
}

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar
            .get(SESSION_COOKIE)
            .map(|c| c.value().to_owned())
            .filter(|t| !t.is_empty())
            .ok_or(AppError::Unauthorized(NO_TOKEN))?;

        let claims = state
            .session_keys()
            .verify(&token)
            .map_err(|_| AppError::Unauthorized(INVALID_TOKEN))?;
        let user_id = claims
            .user_id()
            .ok_or(AppError::Unauthorized(INVALID_TOKEN))?;

        let users = UserRepository::new(state.pool());
        if !users.has_token(user_id, claims.jti).await? {
            return Err(AppError::Unauthorized(INVALID_TOKEN));
        }
        let user = users
            .find_by_id(user_id)
            .await?
            .ok_or(AppError::Unauthorized(INVALID_TOKEN))?;

        set_sentry_user(&user.id, Some(user.email.as_str()));
        Ok(Self {
            user,
            jti: claims.jti,
        })
    }
}

/// Client address used to key the brute-force guard.
///
/// First entry of `X-Forwarded-For`, else the socket peer, else `"unknown"`.
/// The header is client-controlled and can be spoofed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub String);

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let forwarded = parts
            .headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned);

        let ip = forwarded
            .or_else(|| {
                parts
                    .extensions
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip().to_string())
            })
            .unwrap_or_else(|| "unknown".to_owned());

        Ok(Self(ip))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::Request;

    use super::*;

    async fn client_ip(req: Request<()>) -> String {
        let (mut parts, ()) = req.into_parts();
        ClientIp::from_request_parts(&mut parts, &()).await.unwrap().0
    }

    #[tokio::test]
    async fn test_client_ip_prefers_forwarded_header() {
        let req = Request::builder()
            .header("x-forwarded-for", " 203.0.113.9 , 10.0.0.1")
            .body(())
            .unwrap();
        assert_eq!(client_ip(req).await, "203.0.113.9");
    }

    #[tokio::test]
    async fn test_client_ip_falls_back_to_peer() {
        let mut req = Request::builder().body(()).unwrap();
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([198, 51, 100, 7], 443))));
        assert_eq!(client_ip(req).await, "198.51.100.7");
    }

    #[tokio::test]
    async fn test_client_ip_unknown_without_source() {
        let req = Request::builder().body(()).unwrap();
        assert_eq!(client_ip(req).await, "unknown");
    }
}

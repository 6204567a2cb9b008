//! Rate limiting for the login endpoint using governor and `tower_governor`.
//!
//! Allows a burst of 5 login requests per client IP, replenished over 15
//! minutes. This sits in front of the per-(IP, email) brute-force guard and
//! bounds credential stuffing across many emails from one address.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json,
    extract::ConnectInfo,
    http::{Request, StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use serde_json::json;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

/// Message returned once the login limiter trips.
pub const LOGIN_LIMIT_MESSAGE: &str = "Too many login attempts. Please try again after 15 minutes.";

/// Requests allowed before the limiter trips.
const LOGIN_BURST: u32 = 5;

/// One request is replenished per period, so a full burst refills in 15 minutes.
const LOGIN_REPLENISH: Duration = Duration::from_secs(3 * 60);

/// Keys requests by the first `X-Forwarded-For` entry, then the socket peer.
///
/// Requests with neither share the unspecified address as their key.
#[derive(Clone, Copy)]
pub struct ForwardedIpKeyExtractor;

impl tower_governor::key_extractor::KeyExtractor for ForwardedIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        if let Some(ip) = req
            .headers()
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .and_then(|s| s.trim().parse::<IpAddr>().ok())
        {
            return Ok(ip);
        }

        Ok(req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map_or(IpAddr::from([0, 0, 0, 0]), |ConnectInfo(addr)| addr.ip()))
    }
}

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<ForwardedIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Create the rate limiter for the login endpoint.
///
/// # Panics
///
/// This function will not panic. The period and burst size are non-zero
/// constants, which are always accepted by `GovernorConfigBuilder`.
#[must_use]
pub fn login_rate_limiter() -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ForwardedIpKeyExtractor)
        .period(LOGIN_REPLENISH)
        .burst_size(LOGIN_BURST)
        .finish()
        .expect("login rate limiter config with non-zero period and burst is valid");
    GovernorLayer::new(Arc::new(config))
}

/// Rewrite the limiter's plain-text 429 into the JSON error envelope.
///
/// JSON 429s produced by the handler itself pass through untouched.
pub async fn login_limit_response(response: Response) -> Response {
    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"));

    if response.status() == StatusCode::TOO_MANY_REQUESTS && !is_json {
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({ "status": false, "message": LOGIN_LIMIT_MESSAGE })),
        )
            .into_response();
    }
    response
}

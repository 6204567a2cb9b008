//! Amazon Clone Storefront library.
//!
//! The customer-facing JSON API: registration with email OTP confirmation,
//! password login with brute-force protection, catalog, cart, and checkout
//! through Razorpay or cash on delivery. Exposed as a library so the router
//! can be exercised by the integration tests.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;

use std::time::Duration;

use axum::{
    Router,
    http::{HeaderValue, Method, Request, Response, header},
    middleware::{from_fn, from_fn_with_state},
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::state::AppState;

/// Build the complete storefront router with its middleware stack.
pub fn app(state: AppState) -> Router {
    let hsts = state.config().cookie_secure;
    let cors = cors_layer(&state.config().cors_origin);

    Router::new()
        .merge(routes::routes())
        .layer(from_fn_with_state(
            hsts,
            middleware::security_headers_middleware,
        ))
        .layer(cors)
        .layer(from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &Response<_>, latency: Duration, span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .layer(middleware::propagate_request_id_layer())
        .layer(middleware::set_request_id_layer())
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// CORS for the configured browser origin, with credentials so the session
/// cookie is sent.
fn cors_layer(origin: &str) -> CorsLayer {
    let allow_origin = match HeaderValue::from_str(origin) {
        Ok(value) => AllowOrigin::exact(value),
        Err(_) => {
            tracing::warn!(origin, "Invalid CORS_ORIGIN, cross-origin requests disabled");
            AllowOrigin::list(Vec::<HeaderValue>::new())
        }
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
}

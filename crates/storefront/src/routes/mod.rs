//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                     - Liveness
//! GET    /health/ready               - Readiness (database ping)
//!
//! # Auth
//! POST   /api/register               - Park a signup and mail an OTP
//! POST   /api/verify-otp             - Confirm the OTP and create the account
//! POST   /api/login                  - Issue a session cookie (rate limited)
//! GET    /api/logout                 - Revoke the presented session
//!
//! # Catalog
//! GET    /api/products               - All products
//! GET    /api/product/{id}           - One product by catalog id
//!
//! # Account (session required)
//! GET    /api/getAuthUser            - Profile, cart and orders
//! GET    /api/orders                 - Order history
//! POST   /api/addtocart/{productId}  - Add one unit
//! DELETE /api/delete/{productId}     - Remove a line
//!
//! # Checkout (session required)
//! POST   /api/create-order           - Gateway order for the cart total
//! POST   /api/verify-payment         - Confirm an online payment
//! POST   /api/place-order-cod        - Cash-on-delivery order
//! ```

pub mod account;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod products;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    middleware::map_response,
    routing::{delete, get, post},
};

use crate::error::AppError;
use crate::middleware::{login_limit_response, login_rate_limiter};
use crate::state::AppState;

/// Unwrap a JSON body, turning malformed input into a 400.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

/// Login route with its per-IP limiter.
fn login_routes() -> Router<AppState> {
    Router::new().route(
        "/login",
        post(auth::login)
            .layer(login_rate_limiter())
            .layer(map_response(login_limit_response)),
    )
}

/// Create the `/api` routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/verify-otp", post(auth::verify_otp))
        .merge(login_routes())
        .route("/logout", get(auth::logout))
        .route("/products", get(products::index))
        .route("/product/{id}", get(products::show))
        .route("/getAuthUser", get(account::auth_user))
        .route("/orders", get(account::orders))
        .route("/addtocart/{product_id}", post(cart::add))
        .route("/delete/{product_id}", delete(cart::remove))
        .route("/create-order", post(checkout::create_order))
        .route("/verify-payment", post(checkout::verify_payment))
        .route("/place-order-cod", post(checkout::place_order_cod))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/api", api_routes())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                          - Liveness
//! GET    /health/ready                    - Readiness (database ping)
//!
//! # Auth (/api/admin/auth)
//! POST   /login                           - Issue an admin token and cookie
//! POST   /register                        - Create an admin (superadmin)
//! POST   /logout                          - Revoke the presented token
//! GET    /profile                         - Own account
//! PUT    /profile                         - Change own name/email
//! POST   /change-password                 - Change password, revoke other tokens
//!
//! # Catalog (/api/admin)
//! GET    /products                        - Paginated, searchable, sortable
//! POST   /products                        - Create
//! POST   /products/bulk-delete            - Delete many by id
//! GET    /products/{id}                   - One product
//! PUT    /products/{id}                   - Partial update
//! DELETE /products/{id}                   - Delete
//!
//! # Orders (/api/admin)
//! GET    /orders                          - Paginated, filterable
//! GET    /orders/user/{userId}            - One customer's orders
//! GET    /orders/{id}                     - One order
//! PUT    /orders/{id}/status              - Fulfillment transition
//! PUT    /orders/{id}/payment             - Payment status
//! POST   /orders/{id}/cancel              - Cancel with a reason
//! DELETE /orders/{id}                     - Delete (superadmin)
//!
//! # Customers (/api/admin)
//! GET    /users                           - Paginated, searchable
//! GET    /users/{id}                      - One customer with order count
//! DELETE /users/{id}                      - Delete (superadmin)
//!
//! # Admin accounts (/api/admin, superadmin)
//! GET    /admins                          - All admins
//! PATCH  /admins/{id}/toggle-status       - Activate/deactivate
//! DELETE /admins/{id}                     - Delete
//!
//! # Stats (/api/admin)
//! GET    /stats/products | /stats/orders | /stats/users
//! GET    /analytics/revenue?days=N        - Daily revenue
//! GET    /dashboard/stats                 - Overview
//! ```

pub mod admins;
pub mod auth;
pub mod dashboard;
pub mod orders;
pub mod products;
pub mod users;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    routing::{delete, get, patch, post, put},
};

use crate::error::AppError;
use crate::state::AppState;

/// Unwrap a JSON body, turning malformed input into a 400.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .route("/logout", post(auth::logout))
        .route("/profile", get(auth::profile).put(auth::update_profile))
        .route("/change-password", post(auth::change_password))
}

/// Create the `/api/admin` routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .route("/products", get(products::index).post(products::create))
        .route("/products/bulk-delete", post(products::bulk_delete))
        .route(
            "/products/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::destroy),
        )
        .route("/orders", get(orders::index))
        .route("/orders/user/{user_id}", get(orders::for_user))
        .route("/orders/{id}", get(orders::show).delete(orders::destroy))
        .route("/orders/{id}/status", put(orders::update_status))
        .route("/orders/{id}/payment", put(orders::update_payment))
        .route("/orders/{id}/cancel", post(orders::cancel))
        .route("/users", get(users::index))
        .route("/users/{id}", get(users::show).delete(users::destroy))
        .route("/admins", get(admins::index))
        .route("/admins/{id}/toggle-status", patch(admins::toggle_status))
        .route("/admins/{id}", delete(admins::destroy))
        .route("/stats/products", get(products::stats))
        .route("/stats/orders", get(orders::stats))
        .route("/stats/users", get(users::stats))
        .route("/analytics/revenue", get(orders::revenue))
        .route("/dashboard/stats", get(dashboard::stats))
}

/// Create all routes for admin.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/api/admin", api_routes())
}

/// Liveness health check endpoint.
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

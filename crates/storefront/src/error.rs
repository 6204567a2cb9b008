//! Unified error handling with Sentry integration.
//!
//! Every handler returns `Result<T, AppError>`. Errors render as the JSON
//! envelope `{"status": false, "message": ...}` where `message` is either a
//! string or, for field validation, a list of `{"msg": ...}` objects. Server
//! errors are captured to Sentry and answered with a generic message.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::checkout::CheckoutError;

const INTERNAL_MESSAGE: &str = "Internal server error";

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Registration, OTP or login failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Pricing, payment or order placement failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Resource not found.
    #[error("{0}")]
    NotFound(String),

    /// Missing, invalid or revoked session.
    #[error("{0}")]
    Unauthorized(&'static str),

    /// Bad request from client.
    #[error("{0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Auth(err) => match err {
                AuthError::Validation(_)
                | AuthError::Duplicate(_)
                | AuthError::InvalidOrExpiredOtp
                | AuthError::InvalidCredentials => StatusCode::BAD_REQUEST,
                AuthError::NotVerified => StatusCode::FORBIDDEN,
                AuthError::TooManyAttempts => StatusCode::TOO_MANY_REQUESTS,
                AuthError::Repository(_) | AuthError::PasswordHash | AuthError::Token(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Checkout(err) => match err {
                CheckoutError::EmptyCart
                | CheckoutError::PriceMismatch { .. }
                | CheckoutError::InvalidSignature
                | CheckoutError::UnknownPaymentOrder
                | CheckoutError::AlreadyProcessed => StatusCode::BAD_REQUEST,
                CheckoutError::Gateway(_) => StatusCode::BAD_GATEWAY,
                CheckoutError::Pricing(_) | CheckoutError::Repository(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// The client-facing `message` value.
    fn message(&self) -> Value {
        match self {
            Self::Auth(AuthError::Validation(errors)) => {
                Value::Array(errors.iter().map(|msg| json!({ "msg": msg })).collect())
            }
            Self::Auth(AuthError::Duplicate(msg)) => json!([{ "msg": msg }]),
            Self::Checkout(CheckoutError::PriceMismatch { .. }) => {
                json!("Amount does not match cart total")
            }
            Self::Checkout(CheckoutError::Gateway(_)) => json!("Payment service error"),
            Self::NotFound(msg) | Self::BadRequest(msg) => json!(msg),
            Self::Unauthorized(msg) => json!(msg),
            _ if self.status().is_server_error() => json!(INTERNAL_MESSAGE),
            Self::Auth(err) => json!(err.to_string()),
            Self::Checkout(err) => json!(err.to_string()),
            _ => json!(self.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let body = json!({ "status": false, "message": self.message() });
        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    async fn render(err: AppError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_validation_renders_message_list() {
        let (status, body) = render(
            AuthError::Validation(vec!["Name can't be empty".into(), "Bad".into()]).into(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], false);
        assert_eq!(body["message"][0]["msg"], "Name can't be empty");
        assert_eq!(body["message"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_auth_status_codes() {
        let (status, body) = render(AuthError::InvalidOrExpiredOtp.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid or expired OTP");

        let (status, body) = render(AuthError::InvalidCredentials.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid credentials");

        let (status, body) = render(AuthError::NotVerified.into()).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "Please verify your email before logging in");

        let (status, body) = render(AuthError::TooManyAttempts.into()).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            body["message"],
            "Too many failed login attempts. Please try again after 15 minutes."
        );

        let (status, body) = render(AuthError::Duplicate("Email already registered").into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"][0]["msg"], "Email already registered");
    }

    #[tokio::test]
    async fn test_checkout_status_codes() {
        let (status, body) = render(CheckoutError::EmptyCart.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Cart is empty");

        let (status, _) = render(
            CheckoutError::PriceMismatch {
                expected: Decimal::from(2500),
                submitted: Decimal::ONE,
            }
            .into(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = render(CheckoutError::AlreadyProcessed.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Payment has already been processed");

        let (status, body) = render(CheckoutError::UnknownPaymentOrder.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Payment order not found");
    }

    #[tokio::test]
    async fn test_server_errors_hide_details() {
        let (status, body) = render(AppError::Internal("pool exhausted".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], INTERNAL_MESSAGE);

        let (status, body) = render(AuthError::PasswordHash.into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], INTERNAL_MESSAGE);
    }

    #[tokio::test]
    async fn test_unauthorized_message() {
        let (status, body) = render(AppError::Unauthorized("No token provided")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "No token provided");
    }
}

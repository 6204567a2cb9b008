//! Unified error handling for admin.
//!
//! Errors render as `{"status": false, "message": ...}`. Field validation
//! failures carry a list of `{"msg": ...}` objects instead of a string.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use thiserror::Error;

use crate::db::{OrderUpdateError, RepositoryError};
use crate::services::AdminAuthError;

const INTERNAL_MESSAGE: &str = "Internal server error";

/// Application-level error type for the admin API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Login, registration or account change failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AdminAuthError),

    /// Order status could not be changed.
    #[error("{0}")]
    OrderUpdate(#[from] OrderUpdateError),

    /// Resource not found.
    #[error("{0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("{0}")]
    Unauthorized(&'static str),

    /// User lacks permission.
    #[error("{0}")]
    Forbidden(&'static str),

    /// Bad request from client.
    #[error("{0}")]
    BadRequest(String),

    /// One or more submitted fields failed validation.
    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Database(RepositoryError::Conflict(_)) => StatusCode::BAD_REQUEST,
            Self::Database(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Auth(err) => match err {
                AdminAuthError::Validation(_)
                | AdminAuthError::EmailTaken
                | AdminAuthError::WrongCurrentPassword => StatusCode::BAD_REQUEST,
                AdminAuthError::InvalidCredentials | AdminAuthError::Unauthenticated => {
                    StatusCode::UNAUTHORIZED
                }
                AdminAuthError::NotFound => StatusCode::NOT_FOUND,
                AdminAuthError::Repository(_)
                | AdminAuthError::PasswordHash
                | AdminAuthError::Token(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::OrderUpdate(err) => match err {
                OrderUpdateError::Transition(_) => StatusCode::BAD_REQUEST,
                OrderUpdateError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// The client-facing `message` value.
    fn message(&self) -> Value {
        match self {
            Self::Validation(errors) | Self::Auth(AdminAuthError::Validation(errors)) => {
                Value::Array(errors.iter().map(|msg| json!({ "msg": msg })).collect())
            }
            Self::Database(RepositoryError::Conflict(msg)) => json!(msg),
            Self::Database(RepositoryError::NotFound) => json!("Not found"),
            _ if self.status().is_server_error() => json!(INTERNAL_MESSAGE),
            Self::Auth(err) => json!(err.to_string()),
            _ => json!(self.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Admin request error"
            );
        }

        let body = json!({ "status": false, "message": self.message() });
        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from an admin ID.
pub fn set_sentry_user(admin_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(admin_id.to_string()),
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
    use amazon_clone_core::TransitionError;

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
        let (status, body) =
            render(AppError::Validation(vec!["Product name is required".into()])).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], false);
        assert_eq!(body["message"][0]["msg"], "Product name is required");
    }

    #[tokio::test]
    async fn test_auth_status_codes() {
        let (status, body) = render(AdminAuthError::InvalidCredentials.into()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Invalid credentials");

        let (status, body) = render(AdminAuthError::EmailTaken.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Admin with this email already exists");

        let (status, body) = render(AdminAuthError::WrongCurrentPassword.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Current password is incorrect");

        let (status, body) = render(AdminAuthError::Unauthenticated.into()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Authentication failed");
    }

    #[tokio::test]
    async fn test_transition_error_is_bad_request() {
        let err = OrderUpdateError::Transition(TransitionError::CancelDelivered);
        let (status, body) = render(err.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Cannot cancel a delivered order");
    }

    #[tokio::test]
    async fn test_conflict_is_bad_request() {
        let err = RepositoryError::Conflict("Product with this ID already exists".into());
        let (status, body) = render(err.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Product with this ID already exists");
    }

    #[tokio::test]
    async fn test_forbidden_message() {
        let (status, body) =
            render(AppError::Forbidden("This action requires superadmin privileges")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "This action requires superadmin privileges");
    }

    #[tokio::test]
    async fn test_server_errors_hide_details() {
        let (status, body) = render(AppError::Internal("pool exhausted".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], INTERNAL_MESSAGE);

        let (status, body) = render(AdminAuthError::PasswordHash.into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], INTERNAL_MESSAGE);
    }
}

//! Admin authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during admin authentication operations.
#[derive(Debug, Error)]
pub enum AdminAuthError {
    /// One or more submitted fields failed validation.
    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// Unknown or inactive admin, or wrong password.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Missing, forged, expired or revoked token, or a deactivated admin.
    #[error("Authentication failed")]
    Unauthenticated,

    /// Admin user already exists.
    #[error("Admin with this email already exists")]
    EmailTaken,

    /// Password change with the wrong current password.
    #[error("Current password is incorrect")]
    WrongCurrentPassword,

    /// Admin user not found.
    #[error("Admin not found")]
    NotFound,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,

    /// Token could not be signed.
    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during registration, OTP confirmation and login.
#[derive(Debug, Error)]
pub enum AuthError {
    /// One or more submitted fields failed validation.
    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// Email or number already belongs to a confirmed account.
    #[error("{0}")]
    Duplicate(&'static str),

    /// No pending registration matched, or its code has expired.
    #[error("Invalid or expired OTP")]
    InvalidOrExpiredOtp,

    /// Unknown email or wrong password.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Account exists but its email was never confirmed.
    #[error("Please verify your email before logging in")]
    NotVerified,

    /// The (IP, email) pair is locked out.
    #[error("Too many failed login attempts. Please try again after 15 minutes.")]
    TooManyAttempts,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,

    /// Session token could not be signed.
    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

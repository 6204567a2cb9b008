//! Customer authentication.
//!
//! Registration never creates an account directly: it parks the signup in
//! `storefront.pending_registration` and mails an OTP. Only a matching,
//! unexpired OTP promotes the signup into a confirmed user. Login runs the
//! brute-force guard before any credential lookup and issues a revocable JWT.

mod error;
pub mod guard;
pub mod login;
pub mod registration;
pub mod session;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

pub use error::AuthError;
pub use guard::BruteForceGuard;
pub use login::{LoginInput, LoginOutcome, LoginService};
pub use registration::{RegistrationInput, RegistrationService};
pub use session::{IssuedSession, SESSION_COOKIE, SESSION_TTL, SessionClaims, SessionKeys};

/// Hash a password using Argon2id.
pub(crate) fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
pub(crate) fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify() {
        let hash = hash_password("Secur3!pass").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("Secur3!pass", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }
}

//! Password login and logout.
//!
//! Each attempt passes validation, then the brute-force guard, then the
//! credential check, before a session is issued. Any failed gate ends the
//! attempt without a session.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use amazon_clone_core::{Email, User, UserId, check_password_policy};

use super::session::{IssuedSession, SessionKeys};
use super::{AuthError, BruteForceGuard, verify_password};
use crate::store::{LoginAttemptStore, UserStore};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginInput {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl LoginInput {
    fn validate(&self) -> Result<Email, AuthError> {
        let mut errors: Vec<String> = check_password_policy(&self.password)
            .iter()
            .map(ToString::to_string)
            .collect();
        match Email::parse(&self.email) {
            Ok(email) if errors.is_empty() => Ok(email),
            Ok(_) => Err(AuthError::Validation(errors)),
            Err(e) => {
                errors.insert(0, e.to_string());
                Err(AuthError::Validation(errors))
            }
        }
    }
}

#[derive(Debug)]
pub struct LoginOutcome {
    pub user: User,
    pub session: IssuedSession,
}

pub struct LoginService<'a, U, L> {
    users: &'a U,
    guard: BruteForceGuard<'a, L>,
    keys: &'a SessionKeys,
}

impl<'a, U, L> LoginService<'a, U, L>
where
    U: UserStore,
    L: LoginAttemptStore,
{
    #[must_use]
    pub const fn new(users: &'a U, attempts: &'a L, keys: &'a SessionKeys) -> Self {
        Self {
            users,
            guard: BruteForceGuard::new(attempts),
            keys,
        }
    }

    /// Authenticate and issue a new session token.
    ///
    /// Sessions accumulate: earlier tokens for the same user stay valid.
    ///
    /// # Errors
    ///
    /// - `AuthError::Validation` for a malformed email or password
    /// - `AuthError::TooManyAttempts` while the (IP, email) pair is locked
    /// - `AuthError::InvalidCredentials` for an unknown email or wrong password
    /// - `AuthError::NotVerified` if the account never confirmed its email
    #[tracing::instrument(skip(self, input), fields(email = %input.email.trim()))]
    pub async fn login(
        &self,
        ip: &str,
        input: &LoginInput,
        now: DateTime<Utc>,
    ) -> Result<LoginOutcome, AuthError> {
        let email = input.validate()?;
        let key = email.as_str();

        if self.guard.is_blocked(ip, key, now).await? {
            tracing::warn!(ip = %ip, "Login refused while locked out");
            return Err(AuthError::TooManyAttempts);
        }

        let Some(stored) = self.users.find_credentials(&email).await? else {
            self.guard.record_failure(ip, key, now).await?;
            return Err(AuthError::InvalidCredentials);
        };

        if verify_password(&input.password, &stored.password_hash).is_err() {
            self.guard.record_failure(ip, key, now).await?;
            return Err(AuthError::InvalidCredentials);
        }

        // Not a guessing signal, so the guard is left alone.
        if !stored.user.is_verified {
            return Err(AuthError::NotVerified);
        }

        self.guard.reset(ip, key).await?;

        let session = self.keys.issue(stored.user.id, now)?;
        self.users
            .add_token(stored.user.id, session.jti, session.expires_at)
            .await?;

        tracing::info!(user_id = %stored.user.id, "User logged in");
        Ok(LoginOutcome {
            user: stored.user,
            session,
        })
    }

    /// Revoke exactly the presented token; other sessions survive.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the token cannot be removed.
    pub async fn logout(&self, user_id: UserId, jti: Uuid) -> Result<(), AuthError> {
        self.users.remove_token(user_id, jti).await?;
        tracing::info!(user_id = %user_id, "User logged out");
        Ok(())
    }
}

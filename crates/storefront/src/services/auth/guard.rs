//! Brute-force protection for password login.
//!
//! Failures are counted per (client IP, email). Reaching
//! [`MAX_FAILED_ATTEMPTS`] locks the pair for [`LOCKOUT`]; a successful login
//! deletes the record outright. Records also expire after
//! [`ATTEMPT_RETENTION`] on a separate clock from the lockout.
//!
//! [`MAX_FAILED_ATTEMPTS`]: crate::models::login_attempt::MAX_FAILED_ATTEMPTS
//! [`LOCKOUT`]: crate::models::login_attempt::LOCKOUT
//! [`ATTEMPT_RETENTION`]: crate::models::login_attempt::ATTEMPT_RETENTION

use chrono::{DateTime, Utc};

use crate::db::RepositoryError;
use crate::models::login_attempt::LOCKOUT;
use crate::store::LoginAttemptStore;

pub struct BruteForceGuard<'a, L> {
    attempts: &'a L,
}

impl<'a, L: LoginAttemptStore> BruteForceGuard<'a, L> {
    #[must_use]
    pub const fn new(attempts: &'a L) -> Self {
        Self { attempts }
    }

    /// Whether login for the pair is currently locked out.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the counter cannot be read.
    pub async fn is_blocked(
        &self,
        ip: &str,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        Ok(self
            .attempts
            .get(ip, email)
            .await?
            .is_some_and(|record| record.is_blocked(now)))
    }

    /// Count a failed login, locking the pair once the threshold is reached.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the counter cannot be updated.
    pub async fn record_failure(
        &self,
        ip: &str,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let record = self.attempts.increment(ip, email, now).await?;
        if record.reached_threshold() {
            self.attempts.block_until(ip, email, now + LOCKOUT).await?;
            tracing::warn!(ip = %ip, email = %email, attempts = record.attempts, "Login locked out");
        }
        Ok(())
    }

    /// Forget every prior failure for the pair.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the record cannot be deleted.
    pub async fn reset(&self, ip: &str, email: &str) -> Result<(), RepositoryError> {
        self.attempts.delete(ip, email).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::services::testing::MemoryStore;

    const IP: &str = "203.0.113.9";
    const EMAIL: &str = "asha@example.com";

    #[tokio::test]
    async fn test_blocks_on_fifth_failure() {
        let store = MemoryStore::default();
        let guard = BruteForceGuard::new(&store);
        let now = Utc::now();

        for _ in 0..4 {
            guard.record_failure(IP, EMAIL, now).await.unwrap();
        }
        assert!(!guard.is_blocked(IP, EMAIL, now).await.unwrap());

        guard.record_failure(IP, EMAIL, now).await.unwrap();
        assert!(guard.is_blocked(IP, EMAIL, now).await.unwrap());
        assert!(
            guard
                .is_blocked(IP, EMAIL, now + Duration::minutes(14))
                .await
                .unwrap()
        );
        assert!(
            !guard
                .is_blocked(IP, EMAIL, now + Duration::minutes(16))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_pairs_are_independent() {
        let store = MemoryStore::default();
        let guard = BruteForceGuard::new(&store);
        let now = Utc::now();

        for _ in 0..5 {
            guard.record_failure(IP, EMAIL, now).await.unwrap();
        }
        assert!(!guard.is_blocked("198.51.100.1", EMAIL, now).await.unwrap());
        assert!(!guard.is_blocked(IP, "other@example.com", now).await.unwrap());
    }

    #[tokio::test]
    async fn test_reset_clears_record() {
        let store = MemoryStore::default();
        let guard = BruteForceGuard::new(&store);
        let now = Utc::now();

        for _ in 0..5 {
            guard.record_failure(IP, EMAIL, now).await.unwrap();
        }
        guard.reset(IP, EMAIL).await.unwrap();
        assert!(!guard.is_blocked(IP, EMAIL, now).await.unwrap());
        assert!(store.attempt(IP, EMAIL).is_none());
    }

    #[tokio::test]
    async fn test_stale_record_restarts_count() {
        let store = MemoryStore::default();
        let guard = BruteForceGuard::new(&store);
        let start = Utc::now();

        for _ in 0..4 {
            guard.record_failure(IP, EMAIL, start).await.unwrap();
        }
        let later = start + Duration::hours(25);
        guard.record_failure(IP, EMAIL, later).await.unwrap();

        assert_eq!(store.attempt(IP, EMAIL).unwrap().attempts, 1);
        assert!(!guard.is_blocked(IP, EMAIL, later).await.unwrap());
    }
}

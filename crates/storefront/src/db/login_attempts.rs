//! Failed-login counter persistence.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::RepositoryError;
use crate::models::LoginAttempt;
use crate::models::login_attempt::ATTEMPT_RETENTION;
use crate::store::LoginAttemptStore;

#[derive(Debug, sqlx::FromRow)]
struct LoginAttemptRow {
    ip: String,
    email: String,
    attempts: i32,
    last_attempt_at: DateTime<Utc>,
    blocked_until: Option<DateTime<Utc>>,
}

impl From<LoginAttemptRow> for LoginAttempt {
    fn from(row: LoginAttemptRow) -> Self {
        Self {
            ip: row.ip,
            email: row.email,
            attempts: row.attempts,
            last_attempt_at: row.last_attempt_at,
            blocked_until: row.blocked_until,
        }
    }
}

/// Repository for login attempt counters.
pub struct LoginAttemptRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> LoginAttemptRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }
}

impl LoginAttemptStore for LoginAttemptRepository<'_> {
    async fn get(&self, ip: &str, email: &str) -> Result<Option<LoginAttempt>, RepositoryError> {
        let cutoff = Utc::now() - ATTEMPT_RETENTION;

        sqlx::query("DELETE FROM storefront.login_attempt WHERE last_attempt_at < $1")
            .bind(cutoff)
            .execute(self.pool)
            .await?;

        let row = sqlx::query_as::<_, LoginAttemptRow>(
            r"
            SELECT ip, email, attempts, last_attempt_at, blocked_until
            FROM storefront.login_attempt
            WHERE ip = $1 AND email = $2
            ",
        )
        .bind(ip)
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(LoginAttempt::from))
    }

    async fn increment(
        &self,
        ip: &str,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<LoginAttempt, RepositoryError> {
        // A record past retention restarts at one instead of carrying its old count.
        let row = sqlx::query_as::<_, LoginAttemptRow>(
            r"
            INSERT INTO storefront.login_attempt (ip, email, attempts, last_attempt_at)
            VALUES ($1, $2, 1, $3)
            ON CONFLICT (ip, email) DO UPDATE SET
                attempts = CASE
                    WHEN storefront.login_attempt.last_attempt_at < $4 THEN 1
                    ELSE storefront.login_attempt.attempts + 1
                END,
                blocked_until = CASE
                    WHEN storefront.login_attempt.last_attempt_at < $4 THEN NULL
                    ELSE storefront.login_attempt.blocked_until
                END,
                last_attempt_at = EXCLUDED.last_attempt_at
            RETURNING ip, email, attempts, last_attempt_at, blocked_until
            ",
        )
        .bind(ip)
        .bind(email)
        .bind(now)
        .bind(now - ATTEMPT_RETENTION)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    async fn block_until(
        &self,
        ip: &str,
        email: &str,
        until: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE storefront.login_attempt SET blocked_until = $3 WHERE ip = $1 AND email = $2",
        )
        .bind(ip)
        .bind(email)
        .bind(until)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, ip: &str, email: &str) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM storefront.login_attempt WHERE ip = $1 AND email = $2")
            .bind(ip)
            .bind(email)
            .execute(self.pool)
            .await?;
        Ok(())
    }
}

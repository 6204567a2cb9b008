//! Pending registration persistence.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use amazon_clone_core::rows::{USER_COLUMNS, UserRow};
use amazon_clone_core::{Email, PhoneNumber, User, UserRole};

use super::{RepositoryError, conflict_or_database};
use crate::models::PendingRegistration;
use crate::models::registration::PENDING_RETENTION;
use crate::store::PendingRegistrationStore;

#[derive(Debug, sqlx::FromRow)]
struct PendingRow {
    email: String,
    name: String,
    number: String,
    password_hash: String,
    otp: String,
    otp_expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl TryFrom<PendingRow> for PendingRegistration {
    type Error = RepositoryError;

    fn try_from(row: PendingRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let number = PhoneNumber::parse(&row.number).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid number in database: {e}"))
        })?;

        Ok(Self {
            email,
            name: row.name,
            number,
            password_hash: row.password_hash,
            otp: row.otp,
            otp_expires_at: row.otp_expires_at,
            created_at: row.created_at,
        })
    }
}

/// Repository for unconfirmed signups.
pub struct PendingRegistrationRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PendingRegistrationRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    async fn purge_stale(&self) -> Result<(), RepositoryError> {
        let cutoff = Utc::now() - PENDING_RETENTION;
        let purged = sqlx::query("DELETE FROM storefront.pending_registration WHERE created_at < $1")
            .bind(cutoff)
            .execute(self.pool)
            .await?
            .rows_affected();
        if purged > 0 {
            tracing::debug!(purged, "Purged stale pending registrations");
        }
        Ok(())
    }
}

impl PendingRegistrationStore for PendingRegistrationRepository<'_> {
    async fn upsert(&self, pending: &PendingRegistration) -> Result<(), RepositoryError> {
        self.purge_stale().await?;

        sqlx::query(
            r"
            INSERT INTO storefront.pending_registration
                (email, name, number, password_hash, otp, otp_expires_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (email) DO UPDATE SET
                name = EXCLUDED.name,
                number = EXCLUDED.number,
                password_hash = EXCLUDED.password_hash,
                otp = EXCLUDED.otp,
                otp_expires_at = EXCLUDED.otp_expires_at,
                created_at = EXCLUDED.created_at
            ",
        )
        .bind(pending.email.as_str())
        .bind(&pending.name)
        .bind(pending.number.as_str())
        .bind(&pending.password_hash)
        .bind(&pending.otp)
        .bind(pending.otp_expires_at)
        .bind(pending.created_at)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, email: &Email) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM storefront.pending_registration WHERE email = $1")
            .bind(email.as_str())
            .execute(self.pool)
            .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self, otp))]
    async fn promote(
        &self,
        email: &Email,
        otp: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let claimed = sqlx::query_as::<_, PendingRow>(
            r"
            DELETE FROM storefront.pending_registration
            WHERE email = $1 AND otp = $2 AND otp_expires_at >= $3
            RETURNING email, name, number, password_hash, otp, otp_expires_at, created_at
            ",
        )
        .bind(email.as_str())
        .bind(otp)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = claimed else {
            return Ok(None);
        };
        let pending = PendingRegistration::try_from(row)?;

        let row = sqlx::query_as::<_, UserRow>(&format!(
            r"
            INSERT INTO storefront.user (name, email, number, password_hash, role, is_verified)
            VALUES ($1, $2, $3, $4, $5, TRUE)
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(&pending.name)
        .bind(pending.email.as_str())
        .bind(pending.number.as_str())
        .bind(&pending.password_hash)
        .bind(UserRole::User)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| conflict_or_database(e, "Email or number already registered"))?;

        tx.commit().await?;

        Ok(Some(User::try_from(row)?))
    }
}

//! Customer account and session-token persistence.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use amazon_clone_core::rows::{USER_COLUMNS, UserRow};
use amazon_clone_core::{Email, PhoneNumber, User, UserId};

use super::RepositoryError;
use crate::store::{StoredCredentials, UserStore};

/// User row joined with its password hash, for login only.
#[derive(Debug, sqlx::FromRow)]
struct CredentialRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Delete session tokens whose JWT has already expired.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn purge_expired_tokens(&self) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM storefront.user_token WHERE expires_at < NOW()")
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

impl UserStore for UserRepository<'_> {
    async fn find_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<StoredCredentials>, RepositoryError> {
        let row = sqlx::query_as::<_, CredentialRow>(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM storefront.user WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(|r| -> Result<StoredCredentials, RepositoryError> {
            Ok(StoredCredentials {
                user: User::try_from(r.user)?,
                password_hash: r.password_hash,
            })
        })
        .transpose()
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM storefront.user WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(User::try_from).transpose()?)
    }

    async fn email_exists(&self, email: &Email) -> Result<bool, RepositoryError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM storefront.user WHERE email = $1)")
                .bind(email.as_str())
                .fetch_one(self.pool)
                .await?;
        Ok(exists)
    }

    async fn number_exists(&self, number: &PhoneNumber) -> Result<bool, RepositoryError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM storefront.user WHERE number = $1)")
                .bind(number.as_str())
                .fetch_one(self.pool)
                .await?;
        Ok(exists)
    }

    async fn add_token(
        &self,
        user_id: UserId,
        jti: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO storefront.user_token (jti, user_id, expires_at) VALUES ($1, $2, $3)",
        )
        .bind(jti)
        .bind(user_id)
        .bind(expires_at)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    async fn has_token(&self, user_id: UserId, jti: Uuid) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar(
            r"
            SELECT EXISTS(
                SELECT 1 FROM storefront.user_token
                WHERE jti = $1 AND user_id = $2 AND expires_at > NOW()
            )
            ",
        )
        .bind(jti)
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;
        Ok(exists)
    }

    async fn remove_token(&self, user_id: UserId, jti: Uuid) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM storefront.user_token WHERE jti = $1 AND user_id = $2")
            .bind(jti)
            .bind(user_id)
            .execute(self.pool)
            .await?;
        Ok(())
    }
}

//! Admin account and session-token persistence.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use amazon_clone_core::{AdminId, Email};

use super::{RepositoryError, conflict_or_database};
use crate::models::{AdminAccount, AdminRole, NewAdmin, ProfileUpdate, StoredAdmin};
use crate::store::AdminStore;

const ADMIN_COLUMNS: &str =
    "id, name, email, role, is_active, last_login_at, created_at, updated_at";

const EMAIL_TAKEN: &str = "Admin with this email already exists";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct AdminRow {
    id: AdminId,
    name: String,
    email: String,
    role: AdminRole,
    is_active: bool,
    last_login_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AdminRow> for AdminAccount {
    type Error = RepositoryError;

    fn try_from(row: AdminRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            name: row.name,
            email,
            role: row.role,
            is_active: row.is_active,
            last_login_at: row.last_login_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CredentialRow {
    #[sqlx(flatten)]
    admin: AdminRow,
    password_hash: String,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for admin accounts.
pub struct AdminRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AdminRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All admins, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<AdminAccount>, RepositoryError> {
        let rows = sqlx::query_as::<_, AdminRow>(&format!(
            "SELECT {ADMIN_COLUMNS} FROM admin.admin_user ORDER BY created_at, id"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(AdminAccount::try_from).collect()
    }

    /// Flip `is_active`. Deactivation also revokes every token of the admin.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[tracing::instrument(skip(self))]
    pub async fn toggle_active(&self, id: AdminId) -> Result<Option<AdminAccount>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, AdminRow>(&format!(
            r"
            UPDATE admin.admin_user
            SET is_active = NOT is_active, updated_at = NOW()
            WHERE id = $1
            RETURNING {ADMIN_COLUMNS}
            "
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(ref row) = row
            && !row.is_active
        {
            sqlx::query("DELETE FROM admin.admin_token WHERE admin_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        row.map(AdminAccount::try_from).transpose()
    }

    /// Delete an admin and, by cascade, their tokens.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: AdminId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM admin.admin_user WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete session tokens whose JWT has already expired.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn purge_expired_tokens(&self) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM admin.admin_token WHERE expires_at < NOW()")
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

impl AdminStore for AdminRepository<'_> {
    async fn find_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<StoredAdmin>, RepositoryError> {
        let row = sqlx::query_as::<_, CredentialRow>(&format!(
            "SELECT {ADMIN_COLUMNS}, password_hash FROM admin.admin_user WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(|r| -> Result<StoredAdmin, RepositoryError> {
            Ok(StoredAdmin {
                admin: AdminAccount::try_from(r.admin)?,
                password_hash: r.password_hash,
            })
        })
        .transpose()
    }

    async fn find_by_id(&self, id: AdminId) -> Result<Option<AdminAccount>, RepositoryError> {
        let row = sqlx::query_as::<_, AdminRow>(&format!(
            "SELECT {ADMIN_COLUMNS} FROM admin.admin_user WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(AdminAccount::try_from).transpose()
    }

    async fn password_hash(&self, id: AdminId) -> Result<Option<String>, RepositoryError> {
        let hash = sqlx::query_scalar("SELECT password_hash FROM admin.admin_user WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(hash)
    }

    #[tracing::instrument(skip(self, admin), fields(email = %admin.email, role = %admin.role))]
    async fn create(&self, admin: &NewAdmin) -> Result<AdminAccount, RepositoryError> {
        let row = sqlx::query_as::<_, AdminRow>(&format!(
            r"
            INSERT INTO admin.admin_user (name, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING {ADMIN_COLUMNS}
            "
        ))
        .bind(&admin.name)
        .bind(admin.email.as_str())
        .bind(&admin.password_hash)
        .bind(admin.role)
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_or_database(e, EMAIL_TAKEN))?;

        AdminAccount::try_from(row)
    }

    async fn update_profile(
        &self,
        id: AdminId,
        update: &ProfileUpdate,
    ) -> Result<Option<AdminAccount>, RepositoryError> {
        let row = sqlx::query_as::<_, AdminRow>(&format!(
            r"
            UPDATE admin.admin_user
            SET name = COALESCE($2, name),
                email = COALESCE($3, email),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {ADMIN_COLUMNS}
            "
        ))
        .bind(id)
        .bind(update.name.as_deref())
        .bind(update.email.as_ref().map(Email::as_str))
        .fetch_optional(self.pool)
        .await
        .map_err(|e| conflict_or_database(e, EMAIL_TAKEN))?;

        row.map(AdminAccount::try_from).transpose()
    }

    async fn set_password_hash(&self, id: AdminId, hash: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE admin.admin_user SET password_hash = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(hash)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn record_login(&self, id: AdminId, at: DateTime<Utc>) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE admin.admin_user SET last_login_at = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    async fn add_token(
        &self,
        id: AdminId,
        jti: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query("INSERT INTO admin.admin_token (jti, admin_id, expires_at) VALUES ($1, $2, $3)")
            .bind(jti)
            .bind(id)
            .bind(expires_at)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    async fn has_token(&self, id: AdminId, jti: Uuid) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar(
            r"
            SELECT EXISTS(
                SELECT 1 FROM admin.admin_token
                WHERE jti = $1 AND admin_id = $2 AND expires_at > NOW()
            )
            ",
        )
        .bind(jti)
        .bind(id)
        .fetch_one(self.pool)
        .await?;
        Ok(exists)
    }

    async fn remove_token(&self, id: AdminId, jti: Uuid) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM admin.admin_token WHERE jti = $1 AND admin_id = $2")
            .bind(jti)
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    async fn remove_other_tokens(&self, id: AdminId, keep: Uuid) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM admin.admin_token WHERE admin_id = $1 AND jti <> $2")
            .bind(id)
            .bind(keep)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

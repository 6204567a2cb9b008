//! Persistence interface for admin accounts.
//!
//! [`crate::db::AdminRepository`] is the Postgres implementation; the auth
//! service is generic over this trait so it can run against memory.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use amazon_clone_core::{AdminId, Email};

use crate::db::RepositoryError;
use crate::models::{AdminAccount, NewAdmin, ProfileUpdate, StoredAdmin};

/// Admin accounts and their revocable session tokens.
#[trait_variant::make(AdminStore: Send)]
pub trait LocalAdminStore {
    async fn find_credentials(&self, email: &Email)
    -> Result<Option<StoredAdmin>, RepositoryError>;

    async fn find_by_id(&self, id: AdminId) -> Result<Option<AdminAccount>, RepositoryError>;

    async fn password_hash(&self, id: AdminId) -> Result<Option<String>, RepositoryError>;

    /// Insert a new admin. A taken email is `RepositoryError::Conflict`.
    async fn create(&self, admin: &NewAdmin) -> Result<AdminAccount, RepositoryError>;

    async fn update_profile(
        &self,
        id: AdminId,
        update: &ProfileUpdate,
    ) -> Result<Option<AdminAccount>, RepositoryError>;

    async fn set_password_hash(&self, id: AdminId, hash: &str) -> Result<(), RepositoryError>;

    async fn record_login(&self, id: AdminId, at: DateTime<Utc>) -> Result<(), RepositoryError>;

    async fn add_token(
        &self,
        id: AdminId,
        jti: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError>;

    async fn has_token(&self, id: AdminId, jti: Uuid) -> Result<bool, RepositoryError>;

    async fn remove_token(&self, id: AdminId, jti: Uuid) -> Result<(), RepositoryError>;

    /// Revoke every token of the admin except `keep`.
    async fn remove_other_tokens(&self, id: AdminId, keep: Uuid) -> Result<u64, RepositoryError>;
}

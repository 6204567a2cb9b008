//! Admin authentication service.
//!
//! Admins log in with email and password and receive a 24 hour JWT that is
//! recorded per admin. A token authenticates only while it verifies, is
//! still recorded, and its admin is active.

mod error;
pub mod token;

pub use error::AdminAuthError;
pub use token::{ADMIN_COOKIE, ADMIN_TOKEN_TTL, AdminClaims, AdminKeys, IssuedAdminToken};

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use amazon_clone_core::{AdminId, Email, check_password_policy};

use crate::db::RepositoryError;
use crate::models::{AdminAccount, AdminRole, NewAdmin, ProfileUpdate};
use crate::store::AdminStore;

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AdminAuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AdminAuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AdminAuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}

fn policy_errors(password: &str, prefix: &str) -> Vec<String> {
    check_password_policy(password)
        .iter()
        .map(|v| {
            let msg = v.to_string();
            if prefix.is_empty() {
                msg
            } else {
                msg.replacen("Password", prefix, 1)
            }
        })
        .collect()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminLoginInput {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterAdminInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role: Option<String>,
}

impl RegisterAdminInput {
    /// Check every field and hash the password.
    ///
    /// # Errors
    ///
    /// Returns `AdminAuthError::Validation` listing every failed rule.
    pub fn validate(&self) -> Result<NewAdmin, AdminAuthError> {
        let mut errors = Vec::new();

        let name = self.name.trim();
        if name.is_empty() {
            errors.push("Name is required".to_owned());
        }
        let email = Email::parse(&self.email).map_err(|_| "Valid email is required".to_owned());
        if let Err(ref msg) = email {
            errors.push(msg.clone());
        }
        errors.extend(policy_errors(&self.password, ""));
        let role = match self.role.as_deref().map(str::trim) {
            None | Some("") => Ok(AdminRole::Admin),
            Some(raw) => raw.parse::<AdminRole>(),
        };
        if role.is_err() {
            errors.push("Role must be admin or superadmin".to_owned());
        }

        match (email, role) {
            (Ok(email), Ok(role)) if errors.is_empty() => Ok(NewAdmin {
                name: name.to_owned(),
                email,
                password_hash: hash_password(&self.password)?,
                role,
            }),
            _ => Err(AdminAuthError::Validation(errors)),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordInput {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProfileInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl UpdateProfileInput {
    fn validate(&self) -> Result<ProfileUpdate, AdminAuthError> {
        let mut errors = Vec::new();

        let name = self.name.as_deref().map(str::trim).map(str::to_owned);
        if name.as_deref() == Some("") {
            errors.push("Name can't be empty".to_owned());
        }
        let email = match self.email.as_deref() {
            None => None,
            Some(raw) => match Email::parse(raw) {
                Ok(email) => Some(email),
                Err(_) => {
                    errors.push("Valid email is required".to_owned());
                    None
                }
            },
        };

        if !errors.is_empty() {
            return Err(AdminAuthError::Validation(errors));
        }
        Ok(ProfileUpdate { name, email })
    }
}

/// A successful login.
#[derive(Debug)]
pub struct AdminLogin {
    pub admin: AdminAccount,
    pub token: IssuedAdminToken,
}

/// Admin authentication service.
pub struct AdminAuthService<'a, S> {
    admins: &'a S,
    keys: &'a AdminKeys,
}

impl<'a, S> AdminAuthService<'a, S>
where
    S: AdminStore,
{
    /// Create a new admin authentication service.
    #[must_use]
    pub const fn new(admins: &'a S, keys: &'a AdminKeys) -> Self {
        Self { admins, keys }
    }

    /// Check credentials and issue a token.
    ///
    /// Inactive admins get the same answer as a wrong password.
    ///
    /// # Errors
    ///
    /// - `AdminAuthError::Validation` for a malformed email or empty password
    /// - `AdminAuthError::InvalidCredentials` otherwise
    #[tracing::instrument(skip(self, input), fields(email = %input.email.trim()))]
    pub async fn login(
        &self,
        input: &AdminLoginInput,
        now: DateTime<Utc>,
    ) -> Result<AdminLogin, AdminAuthError> {
        let mut errors = Vec::new();
        let email = Email::parse(&input.email);
        if email.is_err() {
            errors.push("Valid email is required".to_owned());
        }
        if input.password.is_empty() {
            errors.push("Password is required".to_owned());
        }
        let email = match email {
            Ok(email) if errors.is_empty() => email,
            _ => return Err(AdminAuthError::Validation(errors)),
        };

        let Some(stored) = self.admins.find_credentials(&email).await? else {
            return Err(AdminAuthError::InvalidCredentials);
        };
        if !stored.admin.is_active || !verify_password(&input.password, &stored.password_hash) {
            tracing::warn!(admin_id = %stored.admin.id, "Admin login refused");
            return Err(AdminAuthError::InvalidCredentials);
        }

        let token = self.keys.issue(stored.admin.id, now)?;
        self.admins
            .add_token(stored.admin.id, token.jti, token.expires_at)
            .await?;
        self.admins.record_login(stored.admin.id, now).await?;

        tracing::info!(admin_id = %stored.admin.id, "Admin logged in");
        Ok(AdminLogin {
            admin: AdminAccount {
                last_login_at: Some(now),
                ..stored.admin
            },
            token,
        })
    }

    /// Resolve a presented token to an active admin.
    ///
    /// # Errors
    ///
    /// Returns `AdminAuthError::Unauthenticated` unless the token verifies,
    /// is an admin token, is still recorded, and its admin is active.
    pub async fn authenticate(&self, token: &str) -> Result<(AdminAccount, Uuid), AdminAuthError> {
        let claims = self
            .keys
            .verify(token)
            .map_err(|_| AdminAuthError::Unauthenticated)?;
        let admin_id = claims.admin_id().ok_or(AdminAuthError::Unauthenticated)?;

        if !self.admins.has_token(admin_id, claims.jti).await? {
            return Err(AdminAuthError::Unauthenticated);
        }
        match self.admins.find_by_id(admin_id).await? {
            Some(admin) if admin.is_active => Ok((admin, claims.jti)),
            _ => Err(AdminAuthError::Unauthenticated),
        }
    }

    /// Create another admin account.
    ///
    /// # Errors
    ///
    /// - `AdminAuthError::Validation` for invalid fields
    /// - `AdminAuthError::EmailTaken` if the email is already registered
    #[tracing::instrument(skip(self, input), fields(email = %input.email.trim()))]
    pub async fn register(&self, input: &RegisterAdminInput) -> Result<AdminAccount, AdminAuthError> {
        let new_admin = input.validate()?;
        if self.admins.find_credentials(&new_admin.email).await?.is_some() {
            return Err(AdminAuthError::EmailTaken);
        }

        let admin = self.admins.create(&new_admin).await.map_err(|e| match e {
            RepositoryError::Conflict(_) => AdminAuthError::EmailTaken,
            other => AdminAuthError::Repository(other),
        })?;

        tracing::info!(admin_id = %admin.id, role = %admin.role, "Admin created");
        Ok(admin)
    }

    /// Update the admin's own name and/or email.
    ///
    /// # Errors
    ///
    /// - `AdminAuthError::Validation` for invalid fields
    /// - `AdminAuthError::EmailTaken` if the new email belongs to another admin
    pub async fn update_profile(
        &self,
        id: AdminId,
        input: &UpdateProfileInput,
    ) -> Result<AdminAccount, AdminAuthError> {
        let update = input.validate()?;
        self.admins
            .update_profile(id, &update)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AdminAuthError::EmailTaken,
                other => AdminAuthError::Repository(other),
            })?
            .ok_or(AdminAuthError::NotFound)
    }

    /// Replace the password and revoke every other token of the admin.
    ///
    /// The token used for this request stays valid.
    ///
    /// # Errors
    ///
    /// - `AdminAuthError::Validation` for a missing current or weak new password
    /// - `AdminAuthError::WrongCurrentPassword` if the current password is wrong
    #[tracing::instrument(skip(self, input))]
    pub async fn change_password(
        &self,
        id: AdminId,
        keep: Uuid,
        input: &ChangePasswordInput,
    ) -> Result<u64, AdminAuthError> {
        let mut errors = Vec::new();
        if input.current_password.is_empty() {
            errors.push("Current password is required".to_owned());
        }
        errors.extend(policy_errors(&input.new_password, "New password"));
        if !errors.is_empty() {
            return Err(AdminAuthError::Validation(errors));
        }

        let hash = self
            .admins
            .password_hash(id)
            .await?
            .ok_or(AdminAuthError::NotFound)?;
        if !verify_password(&input.current_password, &hash) {
            return Err(AdminAuthError::WrongCurrentPassword);
        }

        self.admins
            .set_password_hash(id, &hash_password(&input.new_password)?)
            .await?;
        let revoked = self.admins.remove_other_tokens(id, keep).await?;

        tracing::info!(admin_id = %id, revoked, "Admin password changed");
        Ok(revoked)
    }

    /// Revoke exactly the presented token.
    ///
    /// # Errors
    ///
    /// Returns `AdminAuthError::Repository` if the token cannot be removed.
    pub async fn logout(&self, id: AdminId, jti: Uuid) -> Result<(), AdminAuthError> {
        self.admins.remove_token(id, jti).await?;
        tracing::info!(admin_id = %id, "Admin logged out");
        Ok(())
    }
}

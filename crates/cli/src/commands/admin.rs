//! Admin user management commands.
//!
//! # Usage
//!
//! ```bash
//! # Create a superadmin, prompting for the password
//! ac-cli admin create -e ops@example.com -n "Store Ops" -r superadmin
//!
//! # Non-interactive, e.g. in a deploy script
//! BOOTSTRAP_PASSWORD='...' ac-cli admin create -e ops@example.com -n "Store Ops" \
//!     --password-env BOOTSTRAP_PASSWORD
//!
//! ac-cli admin list
//! ```
//!
//! # Environment Variables
//!
//! - `ADMIN_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)

use std::io::{BufRead, Write};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use amazon_clone_admin::db::{AdminRepository, RepositoryError, create_pool};
use amazon_clone_admin::models::NewAdmin;
use amazon_clone_admin::services::{AdminAuthError, hash_password};
use amazon_clone_admin::store::AdminStore;
use amazon_clone_core::{AdminRole, Email, check_password_policy};

use super::database_url;

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Query failed.
    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Invalid role.
    #[error("Invalid role: {0}. Valid roles: superadmin, admin")]
    InvalidRole(String),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// Password does not meet the policy.
    #[error("Weak password: {0}")]
    WeakPassword(String),

    /// Password could not be read or hashed.
    #[error("Password error: {0}")]
    Password(String),

    /// User already exists.
    #[error("Admin user already exists with email: {0}")]
    UserExists(String),
}

impl From<AdminAuthError> for AdminError {
    fn from(err: AdminAuthError) -> Self {
        Self::Password(err.to_string())
    }
}

fn read_password(password_env: Option<&str>) -> Result<SecretString, AdminError> {
    if let Some(var) = password_env {
        return std::env::var(var)
            .map(SecretString::from)
            .map_err(|_| AdminError::MissingEnvVar(var.to_owned()));
    }

    #[allow(clippy::print_stderr)]
    {
        eprint!("Password: ");
    }
    std::io::stderr()
        .flush()
        .map_err(|e| AdminError::Password(e.to_string()))?;

    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|e| AdminError::Password(e.to_string()))?;
    Ok(SecretString::from(
        line.trim_end_matches(['\r', '\n']).to_owned(),
    ))
}

fn check_policy(password: &SecretString) -> Result<(), AdminError> {
    let violations = check_password_policy(password.expose_secret());
    if violations.is_empty() {
        return Ok(());
    }
    let reasons: Vec<String> = violations.iter().map(ToString::to_string).collect();
    Err(AdminError::WeakPassword(reasons.join("; ")))
}

async fn connect() -> Result<sqlx::PgPool, AdminError> {
    dotenvy::dotenv().ok();
    let url = database_url("ADMIN_DATABASE_URL")
        .ok_or_else(|| AdminError::MissingEnvVar("ADMIN_DATABASE_URL".to_owned()))?;

    tracing::info!("Connecting to admin database...");
    Ok(create_pool(&SecretString::from(url)).await?)
}

/// Create a new admin user.
///
/// # Arguments
///
/// * `email` - Admin's email address
/// * `name` - Admin's display name
/// * `role` - `superadmin` or `admin`
/// * `password_env` - Environment variable holding the password; prompts when `None`
///
/// # Returns
///
/// The ID of the created admin user.
///
/// # Errors
///
/// Returns an error for invalid input, a taken email, or a database failure.
pub async fn create_user(
    email: &str,
    name: &str,
    role: &str,
    password_env: Option<&str>,
) -> Result<i32, AdminError> {
    let role: AdminRole = role
        .parse()
        .map_err(|_| AdminError::InvalidRole(role.to_owned()))?;
    let email = Email::parse(email).map_err(|_| AdminError::InvalidEmail(email.to_owned()))?;

    let password = read_password(password_env)?;
    check_policy(&password)?;

    let pool = connect().await?;
    let admins = AdminRepository::new(&pool);

    tracing::info!("Creating admin user: {} ({})", email, role);

    let new_admin = NewAdmin {
        name: name.trim().to_owned(),
        email: email.clone(),
        password_hash: hash_password(password.expose_secret())?,
        role,
    };
    let admin = admins.create(&new_admin).await.map_err(|e| match e {
        RepositoryError::Conflict(_) => AdminError::UserExists(email.to_string()),
        other => AdminError::Repository(other),
    })?;

    tracing::info!(
        "Admin user created successfully! ID: {}, Email: {}, Role: {}",
        admin.id,
        admin.email,
        admin.role
    );

    Ok(admin.id.as_i32())
}

/// Log every admin account.
///
/// # Errors
///
/// Returns an error if the database is unreachable.
pub async fn list_users() -> Result<(), AdminError> {
    let pool = connect().await?;
    let admins = AdminRepository::new(&pool).list().await?;

    if admins.is_empty() {
        tracing::info!("No admin users");
    }
    for admin in admins {
        tracing::info!(
            id = %admin.id,
            email = %admin.email,
            name = %admin.name,
            role = %admin.role,
            active = admin.is_active,
            last_login = ?admin.last_login_at,
            "admin"
        );
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_reports_every_violation() {
        let err = check_policy(&SecretString::from("short")).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("at least 8 characters"));
        assert!(msg.contains("uppercase"));
        assert!(check_policy(&SecretString::from("Adm1n!pass")).is_ok());
    }

    #[test]
    fn test_password_from_env_var() {
        let missing = read_password(Some("AC_CLI_TEST_UNSET_PASSWORD_VAR"));
        assert!(matches!(missing, Err(AdminError::MissingEnvVar(_))));
    }
}

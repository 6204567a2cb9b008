//! Database migration commands.
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string for storefront
//! - `ADMIN_DATABASE_URL` - `PostgreSQL` connection string for admin
//!
//! Both fall back to `DATABASE_URL`.
//!
//! # Migration Files
//!
//! Storefront migrations: `crates/storefront/migrations/` (schema `storefront`)
//! Admin migrations: `crates/admin/migrations/` (schema `admin`)
//!
//! When both schemas share one database they also share the
//! `_sqlx_migrations` table, so each set ignores versions applied by the other.

use sqlx::PgPool;
use thiserror::Error;

use super::database_url;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Missing environment variable: {0} (or DATABASE_URL)")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run storefront database migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn storefront() -> Result<(), MigrationError> {
    dotenvy::dotenv().ok();

    let url = database_url("STOREFRONT_DATABASE_URL")
        .ok_or(MigrationError::MissingEnvVar("STOREFRONT_DATABASE_URL"))?;

    tracing::info!("Connecting to storefront database...");
    let pool = PgPool::connect(&url).await?;

    tracing::info!("Running storefront migrations...");
    let mut migrator = sqlx::migrate!("../storefront/migrations");
    migrator.set_ignore_missing(true);
    migrator.run(&pool).await?;

    tracing::info!("Storefront migrations complete");
    Ok(())
}

/// Run admin database migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn admin() -> Result<(), MigrationError> {
    dotenvy::dotenv().ok();

    let url = database_url("ADMIN_DATABASE_URL")
        .ok_or(MigrationError::MissingEnvVar("ADMIN_DATABASE_URL"))?;

    tracing::info!("Connecting to admin database...");
    let pool = PgPool::connect(&url).await?;

    tracing::info!("Running admin migrations...");
    let mut migrator = sqlx::migrate!("../admin/migrations");
    migrator.set_ignore_missing(true);
    migrator.run(&pool).await?;

    tracing::info!("Admin migrations complete");
    Ok(())
}

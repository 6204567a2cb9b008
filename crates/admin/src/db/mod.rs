//! Database operations for admin `PostgreSQL`.
//!
//! ## Tables (schema `admin`)
//!
//! - `admin_user` - Back-office accounts (separate from storefront customers)
//! - `admin_token` - Session token ids issued at login (revocable per token)
//!
//! The admin API also reads and writes the storefront catalog, orders and
//! customers in schema `storefront`, using the shared row types from
//! `amazon_clone_core::rows`.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/admin/migrations/` and run via:
//! ```bash
//! cargo run -p amazon-clone-cli -- migrate admin
//! ```

pub mod admins;
pub mod orders;
pub mod products;
pub mod stats;
pub mod users;

use std::time::Duration;

use amazon_clone_core::rows::RowError;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use admins::AdminRepository;
pub use orders::{
    DailyRevenue, NoteUpdate, OrderFilter, OrderRepository, OrderStats, OrderUpdateError,
    StatusChange,
};
pub use products::{ProductRepository, ProductStats};
pub use stats::{DashboardStats, StatsRepository};
pub use users::{UserRepository, UserStats};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl From<RowError> for RepositoryError {
    fn from(err: RowError) -> Self {
        Self::DataCorruption(err.to_string())
    }
}

/// Map a unique-constraint violation to `Conflict`, anything else to `Database`.
pub(crate) fn conflict_or_database(err: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(what.to_owned());
    }
    RepositoryError::Database(err)
}

/// `%term%` for `ILIKE`, with the pattern metacharacters escaped.
pub(crate) fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

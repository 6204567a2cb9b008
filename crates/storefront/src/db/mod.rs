//! Database operations for storefront `PostgreSQL`.
//!
//! ## Tables (schema `storefront`)
//!
//! - `user` - Confirmed customer accounts
//! - `user_token` - Session token ids issued at login (revocable per token)
//! - `pending_registration` - Signups awaiting OTP confirmation, one per email
//! - `login_attempt` - Failed-login counters per (IP, email)
//! - `product` - Catalog
//! - `cart_item` - Persisted carts with product snapshots
//! - `order` / `order_line` - Placed orders
//! - `payment_intent` - Gateway orders awaiting payment
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p amazon-clone-cli -- migrate storefront
//! ```

pub mod cart;
pub mod login_attempts;
pub mod orders;
pub mod pending;
pub mod products;
pub mod users;

use std::time::Duration;

use amazon_clone_core::rows::RowError;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use cart::CartRepository;
pub use login_attempts::LoginAttemptRepository;
pub use orders::OrderRepository;
pub use pending::PendingRegistrationRepository;
pub use products::ProductRepository;
pub use users::UserRepository;

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

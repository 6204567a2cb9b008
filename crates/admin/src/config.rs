//! Admin configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ADMIN_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `ADMIN_SECRET_KEY` - JWT signing secret (falls back to `SECRET_KEY`; min 32 chars, high entropy)
//!
//! ## Optional
//! - `ADMIN_HOST` - Bind address (default: 127.0.0.1)
//! - `ADMIN_PORT` - Listen port (default: 3001)
//! - `ADMIN_CORS_ORIGIN` - Allowed browser origin for the admin UI (default: `http://localhost:3000`)
//! - `COOKIE_SECURE` - Mark the `AdminToken` cookie `Secure` (default: true)
//! - `SENTRY_DSN`, `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`

use std::net::{IpAddr, SocketAddr};

use amazon_clone_core::secret::{WeakSecret, check_signing_secret};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, WeakSecret),
}

/// Admin application configuration.
#[derive(Clone)]
pub struct AdminConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// JWT signing secret for admin sessions
    pub jwt_secret: SecretString,
    /// Origin of the admin UI
    pub cors_origin: String,
    /// Whether the `AdminToken` cookie carries the `Secure` attribute
    pub cookie_secure: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

impl std::fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminConfig")
            .field("database_url", &"[REDACTED]")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("jwt_secret", &"[REDACTED]")
            .field("cors_origin", &self.cors_origin)
            .field("cookie_secure", &self.cookie_secure)
            .field("sentry_environment", &self.sentry_environment)
            .finish_non_exhaustive()
    }
}

impl AdminConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the signing secret fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Ok(Self {
            database_url: get_database_url("ADMIN_DATABASE_URL")?,
            host: parse_env("ADMIN_HOST", "127.0.0.1")?,
            port: parse_env("ADMIN_PORT", "3001")?,
            jwt_secret: get_signing_secret("ADMIN_SECRET_KEY", "SECRET_KEY")?,
            cors_origin: get_env_or_default("ADMIN_CORS_ORIGIN", "http://localhost:3000"),
            cookie_secure: parse_env("COOKIE_SECURE", "true")?,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: get_optional_env("SENTRY_SAMPLE_RATE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(1.0),
            sentry_traces_sample_rate: get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(0.1),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get database URL with fallback to generic `DATABASE_URL` (used by Fly.io postgres attach).
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    std::env::var(primary_key)
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| ConfigError::MissingEnvVar(primary_key.to_string()))
}

fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Read the signing secret from `primary_key`, else `fallback_key`, and
/// validate it.
fn get_signing_secret(primary_key: &str, fallback_key: &str) -> Result<SecretString, ConfigError> {
    let (key, value) = match std::env::var(primary_key) {
        Ok(value) => (primary_key, value),
        Err(_) => (
            fallback_key,
            std::env::var(fallback_key)
                .map_err(|_| ConfigError::MissingEnvVar(primary_key.to_string()))?,
        ),
    };
    let value = SecretString::from(value);
    check_signing_secret(value.expose_secret())
        .map_err(|e| ConfigError::InsecureSecret(key.to_string(), e))?;
    Ok(value)
}

/// Configuration with fixed, valid values for unit tests.
#[cfg(test)]
#[must_use]
pub(crate) fn test_config() -> AdminConfig {
    AdminConfig {
        database_url: SecretString::from("postgres://localhost/test"),
        host: IpAddr::from([127, 0, 0, 1]),
        port: 3001,
        jwt_secret: SecretString::from("Zz9#Qq8@Ww7!Ee6$Rr5%Tt4^Yy3&Uu2*"),
        cors_origin: "http://localhost:3000".to_string(),
        cookie_secure: false,
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.1,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_addr() {
        let addr = test_config().socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3001);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let debug_output = format!("{:?}", test_config());
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("postgres://localhost/test"));
        assert!(!debug_output.contains("Zz9#Qq8"));
    }

    #[test]
    fn test_parse_env_default() {
        let port: u16 = parse_env("AMAZON_CLONE_ADMIN_TEST_UNSET_PORT", "3001").unwrap();
        assert_eq!(port, 3001);
    }

    #[test]
    fn test_signing_secret_missing_names_primary_key() {
        let err = get_signing_secret(
            "AMAZON_CLONE_ADMIN_TEST_UNSET_SECRET",
            "AMAZON_CLONE_ADMIN_TEST_UNSET_FALLBACK",
        )
        .unwrap_err();
        assert!(
            matches!(err, ConfigError::MissingEnvVar(ref key) if key == "AMAZON_CLONE_ADMIN_TEST_UNSET_SECRET")
        );
    }
}

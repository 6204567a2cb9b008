//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `SECRET_KEY` - JWT signing secret (min 32 chars, high entropy)
//! - `SMTP_HOST`, `SMTP_USERNAME`, `SMTP_PASSWORD`, `SMTP_FROM` - OTP mail relay
//! - `RAZORPAY_KEY_ID`, `RAZORPAY_KEY_SECRET` - Payment gateway credentials
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `CORS_ORIGIN` - Allowed browser origin (default: `http://localhost:3000`)
//! - `COOKIE_SECURE` - Mark session cookies `Secure` (default: true)
//! - `SMTP_PORT` - Mail relay port (default: 587)
//! - `RAZORPAY_API_BASE` - Gateway API base URL (default: `https://api.razorpay.com`)
//! - `SENTRY_DSN`, `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`

use std::net::{IpAddr, SocketAddr};

use amazon_clone_core::secret::{WeakSecret, check_secret_strength, check_signing_secret};
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

/// Storefront application configuration.
#[derive(Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// JWT signing secret for customer sessions
    pub jwt_secret: SecretString,
    /// Origin allowed to make credentialed cross-origin requests
    pub cors_origin: String,
    /// Whether session cookies carry the `Secure` attribute
    pub cookie_secure: bool,
    pub email: EmailConfig,
    pub razorpay: RazorpayConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
    pub sentry_sample_rate: f32,
    pub sentry_traces_sample_rate: f32,
}

impl std::fmt::Debug for StorefrontConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorefrontConfig")
            .field("database_url", &"[REDACTED]")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("jwt_secret", &"[REDACTED]")
            .field("cors_origin", &self.cors_origin)
            .field("cookie_secure", &self.cookie_secure)
            .field("email", &self.email)
            .field("razorpay", &self.razorpay)
            .field("sentry_environment", &self.sentry_environment)
            .finish_non_exhaustive()
    }
}

/// SMTP relay used to deliver OTP codes.
#[derive(Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: SecretString,
    /// Sender address (From header)
    pub from_address: String,
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_username", &self.smtp_username)
            .field("smtp_password", &"[REDACTED]")
            .field("from_address", &self.from_address)
            .finish()
    }
}

/// Razorpay API credentials.
#[derive(Clone)]
pub struct RazorpayConfig {
    pub key_id: String,
    pub key_secret: SecretString,
    pub api_base: String,
}

impl std::fmt::Debug for RazorpayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RazorpayConfig")
            .field("key_id", &self.key_id)
            .field("key_secret", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("STOREFRONT_DATABASE_URL")?;
        let host = parse_env("STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_env("STOREFRONT_PORT", "3000")?;
        let jwt_secret = get_signing_secret("SECRET_KEY")?;
        let cors_origin = get_env_or_default("CORS_ORIGIN", "http://localhost:3000");
        let cookie_secure = parse_env("COOKIE_SECURE", "true")?;

        Ok(Self {
            database_url,
            host,
            port,
            jwt_secret,
            cors_origin,
            cookie_secure,
            email: EmailConfig::from_env()?,
            razorpay: RazorpayConfig::from_env()?,
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

impl EmailConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            smtp_host: get_required_env("SMTP_HOST")?,
            smtp_port: parse_env("SMTP_PORT", "587")?,
            smtp_username: get_required_env("SMTP_USERNAME")?,
            smtp_password: SecretString::from(get_required_env("SMTP_PASSWORD")?),
            from_address: get_required_env("SMTP_FROM")?,
        })
    }
}

impl RazorpayConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            key_id: get_required_env("RAZORPAY_KEY_ID")?,
            key_secret: get_validated_secret("RAZORPAY_KEY_SECRET")?,
            api_base: get_env_or_default("RAZORPAY_API_BASE", "https://api.razorpay.com"),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

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

fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    check_secret_strength(&value).map_err(|e| ConfigError::InsecureSecret(key.to_string(), e))?;
    Ok(SecretString::from(value))
}

fn get_signing_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = SecretString::from(get_required_env(key)?);
    check_signing_secret(value.expose_secret())
        .map_err(|e| ConfigError::InsecureSecret(key.to_string(), e))?;
    Ok(value)
}

/// Configuration with fixed, valid values for unit tests.
#[cfg(test)]
#[must_use]
pub(crate) fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        database_url: SecretString::from("postgres://localhost/test"),
        host: IpAddr::from([127, 0, 0, 1]),
        port: 3000,
        jwt_secret: SecretString::from("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6%"),
        cors_origin: "http://localhost:3000".to_string(),
        cookie_secure: false,
        email: EmailConfig {
            smtp_host: "smtp.test".to_string(),
            smtp_port: 587,
            smtp_username: "mailer".to_string(),
            smtp_password: SecretString::from("smtp-pass-value"),
            from_address: "no-reply@amazon-clone.test".to_string(),
        },
        razorpay: RazorpayConfig {
            key_id: "rzp_test_key".to_string(),
            key_secret: SecretString::from("rzp_test_secret_value"),
            api_base: "https://api.razorpay.com".to_string(),
        },
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
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let debug_output = format!("{:?}", test_config());
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("postgres://localhost/test"));
        assert!(!debug_output.contains("smtp-pass-value"));
        assert!(!debug_output.contains("rzp_test_secret_value"));
        assert!(debug_output.contains("rzp_test_key"));
    }

    #[test]
    fn test_parse_env_default() {
        let port: u16 = parse_env("AMAZON_CLONE_TEST_UNSET_PORT", "4000").unwrap();
        assert_eq!(port, 4000);
        let bad: Result<u16, _> = parse_env("AMAZON_CLONE_TEST_UNSET_PORT", "not-a-port");
        assert!(matches!(bad, Err(ConfigError::InvalidEnvVar(_, _))));
    }
}

//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::services::auth::SessionKeys;
use crate::services::email::EmailService;
use crate::services::razorpay::{PaymentError, RazorpayClient};

/// Error building the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("smtp transport: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
    #[error("payment client: {0}")]
    Payment(#[from] PaymentError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    mailer: EmailService,
    razorpay: RazorpayClient,
    session_keys: SessionKeys,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the SMTP transport or payment client cannot be built.
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Result<Self, StateError> {
        let mailer = EmailService::new(&config.email)?;
        let razorpay = RazorpayClient::new(&config.razorpay)?;
        let session_keys = SessionKeys::new(&config.jwt_secret);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                mailer,
                razorpay,
                session_keys,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    #[must_use]
    pub fn mailer(&self) -> &EmailService {
        &self.inner.mailer
    }

    #[must_use]
    pub fn razorpay(&self) -> &RazorpayClient {
        &self.inner.razorpay
    }

    /// Keys for signing and verifying customer session tokens.
    #[must_use]
    pub fn session_keys(&self) -> &SessionKeys {
        &self.inner.session_keys
    }
}

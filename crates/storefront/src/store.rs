//! Persistence interfaces used by the storefront services.
//!
//! Postgres implementations live in [`crate::db`]; services are generic over
//! these traits so their rules can be exercised against in-memory stores.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use amazon_clone_core::{
    CartLine, Email, NewOrder, Order, PhoneNumber, Product, ProductId, User, UserId,
};

use crate::db::RepositoryError;
use crate::models::{LoginAttempt, PaymentIntent, PendingRegistration};

/// A confirmed user together with their password hash.
#[derive(Debug, Clone)]
pub struct StoredCredentials {
    pub user: User,
    pub password_hash: String,
}

/// Confirmed accounts and their revocable session tokens.
#[trait_variant::make(UserStore: Send)]
pub trait LocalUserStore {
    async fn find_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<StoredCredentials>, RepositoryError>;

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    async fn email_exists(&self, email: &Email) -> Result<bool, RepositoryError>;

    async fn number_exists(&self, number: &PhoneNumber) -> Result<bool, RepositoryError>;

    /// Record a newly minted session token.
    async fn add_token(
        &self,
        user_id: UserId,
        jti: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError>;

    async fn has_token(&self, user_id: UserId, jti: Uuid) -> Result<bool, RepositoryError>;

    /// Revoke exactly one session token.
    async fn remove_token(&self, user_id: UserId, jti: Uuid) -> Result<(), RepositoryError>;
}

/// Unconfirmed signups, at most one per email.
#[trait_variant::make(PendingRegistrationStore: Send)]
pub trait LocalPendingRegistrationStore {
    /// Insert or replace the pending record for this email.
    async fn upsert(&self, pending: &PendingRegistration) -> Result<(), RepositoryError>;

    async fn delete(&self, email: &Email) -> Result<(), RepositoryError>;

    /// Consume the pending record for `email` if `otp` matches and is
    /// unexpired at `now`, and create the user from that same record as one
    /// unit.
    ///
    /// `None` means nothing matched and nothing was changed.
    async fn promote(
        &self,
        email: &Email,
        otp: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, RepositoryError>;
}

/// Failed-login counters keyed by (client IP, email).
#[trait_variant::make(LoginAttemptStore: Send)]
pub trait LocalLoginAttemptStore {
    /// The live record for the pair. Records past retention read as absent.
    async fn get(&self, ip: &str, email: &str) -> Result<Option<LoginAttempt>, RepositoryError>;

    /// Count one more failure, starting a fresh record if none is live.
    async fn increment(
        &self,
        ip: &str,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<LoginAttempt, RepositoryError>;

    async fn block_until(
        &self,
        ip: &str,
        email: &str,
        until: DateTime<Utc>,
    ) -> Result<(), RepositoryError>;

    async fn delete(&self, ip: &str, email: &str) -> Result<(), RepositoryError>;
}

/// A customer's persisted cart.
#[trait_variant::make(CartStore: Send)]
pub trait LocalCartStore {
    async fn lines(&self, user_id: UserId) -> Result<Vec<CartLine>, RepositoryError>;

    /// Add one unit, incrementing the owner's existing line for the product.
    async fn add(&self, user_id: UserId, product: &Product) -> Result<(), RepositoryError>;

    async fn remove(&self, user_id: UserId, product_id: ProductId)
    -> Result<bool, RepositoryError>;
}

/// Placed orders.
#[trait_variant::make(OrderStore: Send)]
pub trait LocalOrderStore {
    /// Insert the order with its lines and empty the owner's cart as one unit.
    ///
    /// A second order for the same order number or gateway payment is a
    /// `Conflict`.
    async fn place(&self, order: &NewOrder) -> Result<Order, RepositoryError>;

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError>;

    /// Remember a gateway order created for the owner's cart.
    async fn record_payment_intent(&self, intent: &PaymentIntent) -> Result<(), RepositoryError>;

    /// The intent for `gateway_order_id`, only if it belongs to `user_id`.
    async fn find_payment_intent(
        &self,
        user_id: UserId,
        gateway_order_id: &str,
    ) -> Result<Option<PaymentIntent>, RepositoryError>;
}

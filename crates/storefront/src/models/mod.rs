//! Storefront-only domain models.
//!
//! Shared catalog, cart and order types live in `amazon_clone_core`; the
//! records here only exist inside the storefront's authentication and
//! checkout flows.

pub mod login_attempt;
pub mod payment;
pub mod registration;

pub use login_attempt::LoginAttempt;
pub use payment::PaymentIntent;
pub use registration::PendingRegistration;

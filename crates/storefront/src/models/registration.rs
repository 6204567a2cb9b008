//! Signups awaiting email confirmation.

use chrono::{DateTime, Duration, Utc};

use amazon_clone_core::{Email, PhoneNumber};

/// How long an issued OTP stays valid.
pub const OTP_TTL: Duration = Duration::minutes(5);

/// How long an unconfirmed signup is kept before it is purged.
pub const PENDING_RETENTION: Duration = Duration::minutes(10);

/// A candidate account. Never visible as a user until its OTP is confirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRegistration {
    pub email: Email,
    pub name: String,
    pub number: PhoneNumber,
    pub password_hash: String,
    pub otp: String,
    pub otp_expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

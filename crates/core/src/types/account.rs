//! Customer accounts.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::email::Email;
use super::id::UserId;
use super::order::CustomerSnapshot;
use super::phone::PhoneNumber;
use super::status::UserRole;

/// A confirmed customer account. Accounts only exist after OTP verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub number: PhoneNumber,
    pub role: UserRole,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// The details copied onto an order placed by this user.
    #[must_use]
    pub fn snapshot(&self) -> CustomerSnapshot {
        CustomerSnapshot {
            name: self.name.clone(),
            email: self.email.as_str().to_owned(),
            number: self.number.as_str().to_owned(),
        }
    }
}

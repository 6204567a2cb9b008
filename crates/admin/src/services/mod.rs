//! Business logic services for admin.
//!
//! - `auth` - email/password login with revocable JWT sessions

pub mod auth;

#[cfg(test)]
pub(crate) mod testing;

pub use auth::{AdminAuthError, AdminAuthService, AdminKeys, hash_password};

//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Registration with OTP confirmation, login, session tokens
//! - `checkout` - Server-side pricing, payment orders, order placement
//! - `email` - OTP delivery over SMTP
//! - `razorpay` - Payment gateway client and signature verification
//!
//! Services borrow the stores they need (see [`crate::store`]) and take the
//! current time as an argument.

pub mod auth;
pub mod checkout;
pub mod email;
pub mod razorpay;

#[cfg(test)]
pub(crate) mod testing;

//! Amazon Clone Core - Shared domain types and rules.
//!
//! This crate provides the types used by every Amazon Clone component:
//! - `storefront` - Customer-facing JSON API (registration, cart, checkout)
//! - `admin` - Back-office JSON API (catalog, orders, users, admins)
//! - `cli` - Command-line tools for migrations and admin bootstrap
//!
//! # Architecture
//!
//! The core crate contains only types and pure rules - no I/O, no database
//! access, no HTTP clients. Pricing, order status transitions, and input
//! validation live here so both binaries apply them identically.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, validated inputs, prices, statuses, order numbers
//! - [`secret`] - Strength checks for secrets loaded from the environment
//! - `rows` - `sqlx` row types for the shared storefront tables (`postgres` feature)

#![cfg_attr(not(test), forbid(unsafe_code))]

#[cfg(feature = "postgres")]
pub mod rows;
pub mod secret;
pub mod types;

pub use types::*;

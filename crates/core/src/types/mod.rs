//! Core types for the Amazon Clone backend.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod account;
pub mod catalog;
pub mod email;
pub mod id;
pub mod order;
pub mod order_number;
pub mod password;
pub mod phone;
pub mod price;
pub mod status;

pub use account::User;
pub use catalog::{CartLine, Product, ProductSnapshot};
pub use email::{Email, EmailError};
pub use id::*;
pub use order::{
    CustomerSnapshot, GatewayPayment, NewOrder, Order, OrderLine, OrderedProduct, ShippingAddress,
};
pub use order_number::OrderNumber;
pub use password::{PasswordViolation, check_password_policy};
pub use phone::{PhoneNumber, PhoneNumberError};
pub use price::{PriceError, PricedLine, ServerTotal, parse_display_price};
pub use status::*;

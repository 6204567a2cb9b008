//! Server-side price computation using decimal arithmetic.
//!
//! Catalog rows carry both a display string (`"₹1,499"`) and an optional
//! numeric `acc_value`. Totals are always recomputed here from persisted cart
//! lines; amounts submitted by a client are only ever compared against the
//! result, never charged.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;

/// Errors produced while pricing a cart.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    #[error("price '{0}' is not a number")]
    Unparseable(String),
    #[error("product has neither a numeric value nor a display price")]
    Missing,
    #[error("quantity must be at least 1 (got {0})")]
    InvalidQuantity(i32),
    #[error("amount does not fit in minor units")]
    Overflow,
    #[error("submitted amount {submitted} does not match server total {server}")]
    Mismatch { server: Decimal, submitted: Decimal },
}

/// Parse a display-formatted price such as `"₹1,299.00"` into a decimal.
///
/// Thousands separators, the rupee sign and whitespace are stripped. This is
/// the only place display strings are converted to numbers.
///
/// # Errors
///
/// Returns [`PriceError::Unparseable`] if what remains is not a decimal.
pub fn parse_display_price(display: &str) -> Result<Decimal, PriceError> {
    let cleaned: String = display
        .chars()
        .filter(|c| !matches!(c, ',' | '₹') && !c.is_whitespace())
        .collect();
    let cleaned = cleaned.strip_prefix("Rs.").unwrap_or(&cleaned);
    cleaned
        .parse::<Decimal>()
        .map_err(|_| PriceError::Unparseable(display.to_owned()))
}

/// One cart line as seen by the pricing engine.
#[derive(Debug, Clone, Copy)]
pub struct PricedLine<'a> {
    pub quantity: i32,
    /// Precomputed numeric value from the product snapshot.
    pub acc_value: Option<Decimal>,
    /// Display price from the product snapshot, used when `acc_value` is absent.
    pub display_price: Option<&'a str>,
}

impl PricedLine<'_> {
    /// Resolve the unit price, preferring `acc_value`.
    ///
    /// # Errors
    ///
    /// Returns an error if neither source yields a number.
    pub fn unit_price(&self) -> Result<Decimal, PriceError> {
        match (self.acc_value, self.display_price) {
            (Some(value), _) => Ok(value),
            (None, Some(display)) => parse_display_price(display),
            (None, None) => Err(PriceError::Missing),
        }
    }

    /// Quantity times unit price.
    ///
    /// # Errors
    ///
    /// Returns an error for a non-positive quantity or an unpriceable line.
    pub fn subtotal(&self) -> Result<Decimal, PriceError> {
        if self.quantity < 1 {
            return Err(PriceError::InvalidQuantity(self.quantity));
        }
        let unit = self.unit_price()?;
        unit.checked_mul(Decimal::from(self.quantity))
            .ok_or(PriceError::Overflow)
    }
}

/// A total computed on the server from persisted cart contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ServerTotal(Decimal);

impl ServerTotal {
    /// Sum every line's subtotal, rounded to two decimal places.
    ///
    /// # Errors
    ///
    /// Returns the first line error encountered.
    pub fn from_lines<'a, I>(lines: I) -> Result<Self, PriceError>
    where
        I: IntoIterator<Item = PricedLine<'a>>,
    {
        let mut total = Decimal::ZERO;
        for line in lines {
            total = total
                .checked_add(line.subtotal()?)
                .ok_or(PriceError::Overflow)?;
        }
        Ok(Self(total.round_dp(2)))
    }

    /// Total in major currency units (rupees).
    #[must_use]
    pub const fn major(&self) -> Decimal {
        self.0
    }

    /// Total in minor currency units (paise), as sent to the payment gateway.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Overflow`] if the amount exceeds `i64`.
    pub fn minor_units(&self) -> Result<i64, PriceError> {
        self.0
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|paise| paise.to_i64())
            .ok_or(PriceError::Overflow)
    }

    /// Compare a client-submitted amount (major units) against this total.
    ///
    /// `None` means the client did not ask for a comparison.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Mismatch`] when the amounts differ.
    pub fn check_submitted(&self, submitted: Option<Decimal>) -> Result<(), PriceError> {
        match submitted {
            Some(amount) if amount.round_dp(2) != self.0 => Err(PriceError::Mismatch {
                server: self.0,
                submitted: amount,
            }),
            _ => Ok(()),
        }
    }
}

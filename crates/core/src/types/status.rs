//! Status and role enums shared by the storefront and admin services.
//!
//! With the `postgres` feature these map onto the enum types created by the
//! storefront and admin migrations.

use serde::{Deserialize, Serialize};

/// Generates `Display`/`FromStr` for a snake_case enum.
macro_rules! string_enum {
    ($name:ident, $label:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// All variants, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The wire and database spelling of this value.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(format!(concat!("invalid ", $label, ": {}"), s)),
                }
            }
        }
    };
}

/// Role of a customer account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "storefront.user_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    #[default]
    User,
    Admin,
}

string_enum!(UserRole, "user role", { User => "user", Admin => "admin" });

/// Admin role with different permission levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "admin.admin_role", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum AdminRole {
    /// Store management: products, orders, users.
    #[default]
    Admin,
    /// Everything an admin can do plus destructive and account operations.
    SuperAdmin,
}

string_enum!(AdminRole, "admin role", { Admin => "admin", SuperAdmin => "superadmin" });

impl AdminRole {
    #[must_use]
    pub const fn is_super_admin(&self) -> bool {
        matches!(self, Self::SuperAdmin)
    }
}

/// Payment state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "storefront.payment_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Completed,
    Failed,
    Refunded,
}

string_enum!(PaymentStatus, "payment status", {
    Pending => "pending",
    Completed => "completed",
    Failed => "failed",
    Refunded => "refunded",
});

/// How an order was paid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "storefront.payment_method", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Razorpay,
    Cod,
    Card,
    Upi,
}

string_enum!(PaymentMethod, "payment method", {
    Razorpay => "razorpay",
    Cod => "cod",
    Card => "card",
    Upi => "upi",
});

/// Fulfillment state of an order.
///
/// `Delivered` is terminal. `Cancelled` is reachable from every other state,
/// and `Refunded` only once payment has completed. Transitions not covered by
/// those two rules are allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "storefront.order_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Refunded,
}

string_enum!(OrderStatus, "order status", {
    Pending => "pending",
    Processing => "processing",
    Shipped => "shipped",
    Delivered => "delivered",
    Cancelled => "cancelled",
    Refunded => "refunded",
});

/// Why an order status change was refused.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Cannot cancel a delivered order")]
    CancelDelivered,
    #[error("Order has already been delivered")]
    AlreadyDelivered,
    #[error("Only orders with a completed payment can be refunded")]
    RefundWithoutPayment,
}

/// Side effects the caller must persist alongside a permitted transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionEffects {
    /// Set the delivery date to now.
    pub stamp_delivery_date: bool,
}

impl OrderStatus {
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered)
    }

    /// Validate moving from `self` to `next` given the order's payment state.
    ///
    /// # Errors
    ///
    /// Returns a [`TransitionError`] when the move is forbidden.
    pub fn transition(
        self,
        next: Self,
        payment: PaymentStatus,
    ) -> Result<TransitionEffects, TransitionError> {
        match (self, next) {
            (Self::Delivered, Self::Cancelled) => return Err(TransitionError::CancelDelivered),
            (Self::Delivered, Self::Delivered) => {}
            (Self::Delivered, _) => return Err(TransitionError::AlreadyDelivered),
            (_, Self::Refunded) if payment != PaymentStatus::Completed => {
                return Err(TransitionError::RefundWithoutPayment);
            }
            _ => {}
        }

        Ok(TransitionEffects {
            stamp_delivery_date: next == Self::Delivered && self != Self::Delivered,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_before_delivery_succeeds() {
        for from in [
            OrderStatus::Pending,
            OrderStatus::Processing,
            OrderStatus::Shipped,
        ] {
            let effects = from
                .transition(OrderStatus::Cancelled, PaymentStatus::Pending)
                .unwrap();
            assert!(!effects.stamp_delivery_date);
        }
    }

    #[test]
    fn test_cancel_delivered_is_rejected() {
        assert_eq!(
            OrderStatus::Delivered.transition(OrderStatus::Cancelled, PaymentStatus::Completed),
            Err(TransitionError::CancelDelivered)
        );
    }

    #[test]
    fn test_delivered_is_terminal() {
        assert!(OrderStatus::Delivered.is_terminal());
        assert_eq!(
            OrderStatus::Delivered.transition(OrderStatus::Shipped, PaymentStatus::Completed),
            Err(TransitionError::AlreadyDelivered)
        );
        assert_eq!(
            OrderStatus::Delivered.transition(OrderStatus::Refunded, PaymentStatus::Completed),
            Err(TransitionError::AlreadyDelivered)
        );
    }

    #[test]
    fn test_delivery_stamps_date() {
        let effects = OrderStatus::Shipped
            .transition(OrderStatus::Delivered, PaymentStatus::Completed)
            .unwrap();
        assert!(effects.stamp_delivery_date);
    }

    #[test]
    fn test_refund_requires_completed_payment() {
        assert_eq!(
            OrderStatus::Shipped.transition(OrderStatus::Refunded, PaymentStatus::Pending),
            Err(TransitionError::RefundWithoutPayment)
        );
        assert!(
            OrderStatus::Cancelled
                .transition(OrderStatus::Refunded, PaymentStatus::Completed)
                .is_ok()
        );
    }

    #[test]
    fn test_loose_transitions_are_allowed() {
        assert!(
            OrderStatus::Shipped
                .transition(OrderStatus::Pending, PaymentStatus::Pending)
                .is_ok()
        );
        assert!(
            OrderStatus::Cancelled
                .transition(OrderStatus::Processing, PaymentStatus::Pending)
                .is_ok()
        );
    }

    #[test]
    fn test_round_trip_strings() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), *status);
        }
        assert_eq!("superadmin".parse::<AdminRole>().unwrap(), AdminRole::SuperAdmin);
        assert!("root".parse::<AdminRole>().is_err());
    }
}

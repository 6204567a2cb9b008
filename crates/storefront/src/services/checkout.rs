//! Server-side cart pricing and order placement.
//!
//! Every charge is computed from the customer's persisted cart. A client may
//! submit the amount it expects to pay; that figure is only compared against
//! the server total and is never forwarded to the gateway.
//!
//! Each gateway order is recorded as a [`PaymentIntent`]. A verified payment
//! settles only its own intent, once, and only while the cart still prices to
//! the amount the gateway collected.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use amazon_clone_core::{
    CartLine, GatewayPayment, NewOrder, Order, OrderLine, OrderNumber, PaymentMethod,
    PaymentStatus, PriceError, ServerTotal, ShippingAddress, User,
};

use super::razorpay::{GatewayOrder, PaymentError, PaymentGateway};
use crate::db::RepositoryError;
use crate::models::PaymentIntent;
use crate::store::{CartStore, OrderStore};

/// Currency for every gateway order.
pub const CURRENCY: &str = "INR";

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Cart is empty")]
    EmptyCart,

    /// The client-submitted amount differs from the server total.
    #[error("Amount mismatch: expected {expected}, got {submitted}")]
    PriceMismatch { expected: Decimal, submitted: Decimal },

    /// A cart line could not be priced.
    #[error("pricing error: {0}")]
    Pricing(PriceError),

    #[error("Payment verification failed")]
    InvalidSignature,

    /// No gateway order was created for this customer under that id.
    #[error("Payment order not found")]
    UnknownPaymentOrder,

    /// The gateway payment has already settled an order.
    #[error("Payment has already been processed")]
    AlreadyProcessed,

    #[error("payment gateway error: {0}")]
    Gateway(#[from] PaymentError),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<PriceError> for CheckoutError {
    fn from(err: PriceError) -> Self {
        match err {
            PriceError::Mismatch { server, submitted } => Self::PriceMismatch {
                expected: server,
                submitted,
            },
            other => Self::Pricing(other),
        }
    }
}

/// Gateway order plus the figures it was created from.
#[derive(Debug, Clone)]
pub struct PaymentOrder {
    pub order: GatewayOrder,
    pub order_number: OrderNumber,
    pub total: ServerTotal,
}

pub struct CheckoutService<'a, C, O, G> {
    carts: &'a C,
    orders: &'a O,
    gateway: &'a G,
}

impl<'a, C, O, G> CheckoutService<'a, C, O, G>
where
    C: CartStore,
    O: OrderStore,
    G: PaymentGateway,
{
    #[must_use]
    pub const fn new(carts: &'a C, orders: &'a O, gateway: &'a G) -> Self {
        Self {
            carts,
            orders,
            gateway,
        }
    }

    /// Total of the user's persisted cart.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Pricing` if a line cannot be priced.
    pub async fn compute_server_amount(&self, user: &User) -> Result<ServerTotal, CheckoutError> {
        let lines = self.carts.lines(user.id).await?;
        Ok(price_cart(&lines)?)
    }

    /// Create a gateway order for the server-computed cart total.
    ///
    /// # Errors
    ///
    /// - `CheckoutError::EmptyCart` if there is nothing to pay for
    /// - `CheckoutError::PriceMismatch` if `submitted` differs from the server total
    /// - `CheckoutError::Gateway` if the gateway refuses the order
    #[tracing::instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn create_payment_order(
        &self,
        user: &User,
        submitted: Option<Decimal>,
        now: DateTime<Utc>,
    ) -> Result<PaymentOrder, CheckoutError> {
        let lines = self.carts.lines(user.id).await?;
        if lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let total = price_cart(&lines)?;
        total.check_submitted(submitted)?;

        let order_number = OrderNumber::generate(now);
        let amount_minor = total.minor_units()?;
        let order = self
            .gateway
            .create_order(amount_minor, CURRENCY, order_number.as_str())
            .await?;

        self.orders
            .record_payment_intent(&PaymentIntent {
                gateway_order_id: order.id.clone(),
                user_id: user.id,
                order_number: order_number.clone(),
                amount_minor,
                created_at: now,
            })
            .await?;

        Ok(PaymentOrder {
            order,
            order_number,
            total,
        })
    }

    /// Record a completed online payment as an order and empty the cart.
    ///
    /// # Errors
    ///
    /// - `CheckoutError::InvalidSignature` if the gateway signature is wrong
    /// - `CheckoutError::UnknownPaymentOrder` if the gateway order is not this user's
    /// - `CheckoutError::PriceMismatch` if the cart no longer prices to the paid amount
    /// - `CheckoutError::AlreadyProcessed` if the payment already settled an order
    /// - `CheckoutError::EmptyCart` if the cart has been emptied meanwhile
    #[tracing::instrument(skip(self, user, payment, shipping_address), fields(user_id = %user.id))]
    pub async fn confirm_payment(
        &self,
        user: &User,
        payment: GatewayPayment,
        shipping_address: Option<ShippingAddress>,
        now: DateTime<Utc>,
    ) -> Result<Order, CheckoutError> {
        if !self.gateway.verify_signature(
            &payment.order_id,
            &payment.payment_id,
            &payment.signature,
        ) {
            tracing::warn!(gateway_order_id = %payment.order_id, "Payment signature mismatch");
            return Err(CheckoutError::InvalidSignature);
        }

        let intent = self
            .orders
            .find_payment_intent(user.id, &payment.order_id)
            .await?
            .ok_or(CheckoutError::UnknownPaymentOrder)?;

        self.place(user, Some(Settlement { payment, intent }), shipping_address, now)
            .await
    }

    /// Place a cash-on-delivery order from the current cart and empty it.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` if there is nothing to order.
    #[tracing::instrument(skip(self, user, shipping_address), fields(user_id = %user.id))]
    pub async fn place_cod(
        &self,
        user: &User,
        shipping_address: Option<ShippingAddress>,
        now: DateTime<Utc>,
    ) -> Result<Order, CheckoutError> {
        self.place(user, None, shipping_address, now).await
    }

    async fn place(
        &self,
        user: &User,
        settlement: Option<Settlement>,
        shipping_address: Option<ShippingAddress>,
        now: DateTime<Utc>,
    ) -> Result<Order, CheckoutError> {
        let cart = self.carts.lines(user.id).await?;
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let total = price_cart(&cart)?;
        let (order_number, payment_status, payment_method, gateway) = match settlement {
            Some(Settlement { payment, intent }) => {
                let cart_minor = total.minor_units()?;
                if cart_minor != intent.amount_minor {
                    tracing::warn!(
                        gateway_order_id = %intent.gateway_order_id,
                        paid = intent.amount_minor,
                        cart = cart_minor,
                        "Cart changed after the payment order was created"
                    );
                    return Err(CheckoutError::PriceMismatch {
                        expected: total.major(),
                        submitted: Decimal::new(intent.amount_minor, 2),
                    });
                }
                (
                    intent.order_number,
                    PaymentStatus::Completed,
                    PaymentMethod::Razorpay,
                    Some(payment),
                )
            }
            None => (
                OrderNumber::generate(now),
                PaymentStatus::Pending,
                PaymentMethod::Cod,
                None,
            ),
        };

        let lines = cart
            .iter()
            .map(OrderLine::from_cart_line)
            .collect::<Result<Vec<_>, _>>()?;

        let settled = gateway.is_some();
        let order = self
            .orders
            .place(&NewOrder {
                order_number,
                user_id: user.id,
                user_details: user.snapshot(),
                lines,
                total_amount: total.major(),
                payment_status,
                payment_method,
                gateway,
                shipping_address,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) if settled => CheckoutError::AlreadyProcessed,
                other => CheckoutError::Repository(other),
            })?;

        tracing::info!(
            order_number = %order.order_number,
            total = %order.total_amount,
            method = %payment_method,
            "Checkout complete"
        );
        Ok(order)
    }
}

/// A verified gateway payment and the intent it was made against.
struct Settlement {
    payment: GatewayPayment,
    intent: PaymentIntent,
}

fn price_cart(lines: &[CartLine]) -> Result<ServerTotal, PriceError> {
    ServerTotal::from_lines(lines.iter().map(CartLine::priced))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use amazon_clone_core::{Product, ProductId};

    use crate::services::razorpay::sign_payment;
    use crate::services::testing::{FakeGateway, GATEWAY_SECRET, MemoryStore};

    const PASSWORD: &str = "Secur3!pass";

    fn setup() -> (MemoryStore, User) {
        let store = MemoryStore::default();
        let id = store.insert_user("asha@example.com", "9876543210", PASSWORD, true);
        let user = store.user(id).unwrap();
        (store, user)
    }

    fn fill_reference_cart(store: &MemoryStore, user: &User) {
        store.put_cart_line(user.id, 1, 2, Some(Decimal::from(500)), "₹500");
        store.put_cart_line(user.id, 2, 1, Some(Decimal::from(1500)), "₹1,500");
    }

    #[tokio::test]
    async fn test_server_amount_from_cart() {
        let (store, user) = setup();
        fill_reference_cart(&store, &user);
        let gateway = FakeGateway::default();
        let service = CheckoutService::new(&store, &store, &gateway);

        let total = service.compute_server_amount(&user).await.unwrap();
        assert_eq!(total.major(), Decimal::from(2500));
        assert_eq!(total.minor_units().unwrap(), 250_000);
    }

    #[tokio::test]
    async fn test_display_price_fallback() {
        let (store, user) = setup();
        store.put_cart_line(user.id, 3, 3, None, "₹1,299");
        let gateway = FakeGateway::default();
        let service = CheckoutService::new(&store, &store, &gateway);

        let total = service.compute_server_amount(&user).await.unwrap();
        assert_eq!(total.major(), Decimal::from(3897));
    }

    #[tokio::test]
    async fn test_cart_increment_is_scoped_to_owner() {
        let (store, user) = setup();
        let other_id = store.insert_user("ravi@example.com", "9123456780", PASSWORD, true);
        let other = store.user(other_id).unwrap();
        let product = Product {
            product_id: ProductId::new(7),
            name: "Echo Dot".to_owned(),
            url: "https://img.example.com/7.jpg".to_owned(),
            res_url: None,
            price: "₹3,499".to_owned(),
            value: Some(Decimal::from(3499)),
            acc_value: Some(Decimal::from(3499)),
            discount: None,
            mrp: None,
            points: Vec::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        store.add(other.id, &product).await.unwrap();
        store.add(user.id, &product).await.unwrap();
        store.add(user.id, &product).await.unwrap();

        assert_eq!(store.cart(user.id)[0].quantity, 2);
        assert_eq!(store.cart(other.id)[0].quantity, 1);

        let gateway = FakeGateway::default();
        let service = CheckoutService::new(&store, &store, &gateway);
        let mine = service.compute_server_amount(&user).await.unwrap();
        let theirs = service.compute_server_amount(&other).await.unwrap();
        assert_eq!(mine.major(), Decimal::from(6998));
        assert_eq!(theirs.major(), Decimal::from(3499));
    }

    #[tokio::test]
    async fn test_gateway_always_receives_server_amount() {
        let (store, user) = setup();
        fill_reference_cart(&store, &user);
        let gateway = FakeGateway::default();
        let service = CheckoutService::new(&store, &store, &gateway);

        let created = service
            .create_payment_order(&user, None, Utc::now())
            .await
            .unwrap();
        assert_eq!(created.order.amount, 250_000);

        let matching = service
            .create_payment_order(&user, Some(Decimal::from(2500)), Utc::now())
            .await
            .unwrap();
        assert_eq!(matching.order.amount, 250_000);

        assert_eq!(gateway.amounts(), vec![250_000, 250_000]);
        assert!(gateway.currencies().iter().all(|c| c == "INR"));
    }

    #[tokio::test]
    async fn test_tampered_amount_is_rejected_and_never_charged() {
        let (store, user) = setup();
        fill_reference_cart(&store, &user);
        let gateway = FakeGateway::default();
        let service = CheckoutService::new(&store, &store, &gateway);

        let result = service
            .create_payment_order(&user, Some(Decimal::ONE), Utc::now())
            .await;

        assert!(matches!(
            result,
            Err(CheckoutError::PriceMismatch { expected, submitted })
                if expected == Decimal::from(2500) && submitted == Decimal::ONE
        ));
        assert!(gateway.amounts().is_empty());
    }

    #[tokio::test]
    async fn test_empty_cart_cannot_create_payment() {
        let (store, user) = setup();
        let gateway = FakeGateway::default();
        let service = CheckoutService::new(&store, &store, &gateway);

        let result = service.create_payment_order(&user, None, Utc::now()).await;
        assert!(matches!(result, Err(CheckoutError::EmptyCart)));
        assert!(gateway.amounts().is_empty());
    }

    #[tokio::test]
    async fn test_cod_creates_order_and_empties_cart() {
        let (store, user) = setup();
        fill_reference_cart(&store, &user);
        let gateway = FakeGateway::default();
        let service = CheckoutService::new(&store, &store, &gateway);

        let order = service.place_cod(&user, None, Utc::now()).await.unwrap();

        assert_eq!(order.total_amount, Decimal::from(2500));
        assert_eq!(order.payment_method, PaymentMethod::Cod);
        assert_eq!(order.payment_status, PaymentStatus::Pending);
        assert_eq!(order.lines.len(), 2);
        assert_eq!(order.lines[0].price_at_purchase, Decimal::from(500));
        assert_eq!(order.user_details.email, "asha@example.com");
        assert!(order.order_number.as_str().starts_with("ORD-"));
        assert!(store.cart(user.id).is_empty());
    }

    #[tokio::test]
    async fn test_cod_with_empty_cart_creates_nothing() {
        let (store, user) = setup();
        let gateway = FakeGateway::default();
        let service = CheckoutService::new(&store, &store, &gateway);

        let result = service.place_cod(&user, None, Utc::now()).await;
        assert!(matches!(result, Err(CheckoutError::EmptyCart)));
        assert_eq!(store.order_count(), 0);
    }

    fn signed(gateway_order_id: &str, payment_id: &str) -> GatewayPayment {
        GatewayPayment {
            order_id: gateway_order_id.to_owned(),
            payment_id: payment_id.to_owned(),
            signature: sign_payment(GATEWAY_SECRET, gateway_order_id, payment_id),
        }
    }

    #[tokio::test]
    async fn test_confirm_payment_checks_signature() {
        let (store, user) = setup();
        fill_reference_cart(&store, &user);
        let gateway = FakeGateway::default();
        let service = CheckoutService::new(&store, &store, &gateway);

        let created = service
            .create_payment_order(&user, None, Utc::now())
            .await
            .unwrap();
        let gateway_order_id = created.order.id.clone();

        let forged = GatewayPayment {
            order_id: gateway_order_id.clone(),
            payment_id: "pay_1".to_owned(),
            signature: "00".repeat(32),
        };
        let result = service.confirm_payment(&user, forged, None, Utc::now()).await;
        assert!(matches!(result, Err(CheckoutError::InvalidSignature)));
        assert_eq!(store.order_count(), 0);

        let order = service
            .confirm_payment(&user, signed(&gateway_order_id, "pay_1"), None, Utc::now())
            .await
            .unwrap();
        assert_eq!(order.order_number, created.order_number);
        assert_eq!(order.total_amount, Decimal::from(2500));
        assert_eq!(order.payment_status, PaymentStatus::Completed);
        assert_eq!(order.payment_method, PaymentMethod::Razorpay);
        assert_eq!(order.gateway.unwrap().payment_id, "pay_1");
        assert!(store.cart(user.id).is_empty());
    }

    #[tokio::test]
    async fn test_cart_changed_after_payment_order_is_rejected() {
        let (store, user) = setup();
        fill_reference_cart(&store, &user);
        let gateway = FakeGateway::default();
        let service = CheckoutService::new(&store, &store, &gateway);

        let created = service
            .create_payment_order(&user, None, Utc::now())
            .await
            .unwrap();
        store.put_cart_line(user.id, 3, 4, Some(Decimal::from(2000)), "₹2,000");

        let result = service
            .confirm_payment(&user, signed(&created.order.id, "pay_1"), None, Utc::now())
            .await;

        assert!(matches!(
            result,
            Err(CheckoutError::PriceMismatch { expected, submitted })
                if expected == Decimal::from(10_500) && submitted == Decimal::from(2500)
        ));
        assert_eq!(store.order_count(), 0);
        assert_eq!(store.cart(user.id).len(), 3);
    }

    #[tokio::test]
    async fn test_settled_payment_cannot_place_a_second_order() {
        let (store, user) = setup();
        fill_reference_cart(&store, &user);
        let gateway = FakeGateway::default();
        let service = CheckoutService::new(&store, &store, &gateway);

        let created = service
            .create_payment_order(&user, None, Utc::now())
            .await
            .unwrap();
        let payment = signed(&created.order.id, "pay_1");
        service
            .confirm_payment(&user, payment.clone(), None, Utc::now())
            .await
            .unwrap();

        fill_reference_cart(&store, &user);
        let replayed = service
            .confirm_payment(&user, payment, None, Utc::now())
            .await;
        assert!(matches!(replayed, Err(CheckoutError::AlreadyProcessed)));

        let fresh_payment_id = service
            .confirm_payment(&user, signed(&created.order.id, "pay_2"), None, Utc::now())
            .await;
        assert!(matches!(fresh_payment_id, Err(CheckoutError::AlreadyProcessed)));

        assert_eq!(store.order_count(), 1);
        assert_eq!(store.cart(user.id).len(), 2);
    }

    #[tokio::test]
    async fn test_payment_order_of_another_customer_is_unknown() {
        let (store, user) = setup();
        let other_id = store.insert_user("ravi@example.com", "9123456780", PASSWORD, true);
        let other = store.user(other_id).unwrap();
        fill_reference_cart(&store, &user);
        fill_reference_cart(&store, &other);
        let gateway = FakeGateway::default();
        let service = CheckoutService::new(&store, &store, &gateway);

        let created = service
            .create_payment_order(&other, None, Utc::now())
            .await
            .unwrap();

        let result = service
            .confirm_payment(&user, signed(&created.order.id, "pay_1"), None, Utc::now())
            .await;
        assert!(matches!(result, Err(CheckoutError::UnknownPaymentOrder)));

        let never_created = service
            .confirm_payment(&user, signed("order_missing", "pay_2"), None, Utc::now())
            .await;
        assert!(matches!(never_created, Err(CheckoutError::UnknownPaymentOrder)));
        assert_eq!(store.order_count(), 0);
    }
}

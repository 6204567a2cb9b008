//! In-memory stores for service tests.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use amazon_clone_core::{
    CartLine, Email, NewOrder, Order, OrderId, OrderStatus, PhoneNumber, Product, ProductId,
    ProductSnapshot, User, UserId, UserRole,
};

use super::auth::hash_password;
use super::email::{EmailError, OtpMailer};
use super::razorpay::{GatewayOrder, PaymentError, PaymentGateway, verify_payment_signature};
use crate::db::RepositoryError;
use crate::models::login_attempt::ATTEMPT_RETENTION;
use crate::models::registration::PENDING_RETENTION;
use crate::models::{LoginAttempt, PaymentIntent, PendingRegistration};
use crate::store::{
    CartStore, LoginAttemptStore, OrderStore, PendingRegistrationStore, StoredCredentials,
    UserStore,
};

pub const GATEWAY_SECRET: &str = "rzp_test_secret_value";

#[derive(Default)]
struct State {
    users: Vec<(User, String)>,
    tokens: Vec<(UserId, Uuid)>,
    pending: HashMap<String, PendingRegistration>,
    attempts: HashMap<(String, String), LoginAttempt>,
    carts: HashMap<UserId, Vec<CartLine>>,
    orders: Vec<Order>,
    intents: Vec<PaymentIntent>,
}

/// Every storefront store backed by one mutex-guarded state.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    fn with<T>(&self, f: impl FnOnce(&mut State) -> T) -> T {
        f(&mut self.state.lock().unwrap())
    }

    pub fn insert_user(&self, email: &str, number: &str, password: &str, verified: bool) -> UserId {
        let hash = hash_password(password).unwrap();
        self.with(|s| {
            let id = UserId::new(i32::try_from(s.users.len()).unwrap() + 1);
            let now = Utc::now();
            s.users.push((
                User {
                    id,
                    name: "Asha Rao".to_owned(),
                    email: Email::parse(email).unwrap(),
                    number: PhoneNumber::parse(number).unwrap(),
                    role: UserRole::User,
                    is_verified: verified,
                    created_at: now,
                    updated_at: now,
                },
                hash,
            ));
            id
        })
    }

    pub fn user(&self, id: UserId) -> Option<User> {
        self.with(|s| s.users.iter().find(|(u, _)| u.id == id).map(|(u, _)| u.clone()))
    }

    pub fn user_count(&self) -> usize {
        self.with(|s| s.users.len())
    }

    pub fn token_ids(&self, id: UserId) -> Vec<Uuid> {
        self.with(|s| {
            s.tokens
                .iter()
                .filter(|(owner, _)| *owner == id)
                .map(|(_, jti)| *jti)
                .collect()
        })
    }

    pub fn pending(&self, email: &str) -> Option<PendingRegistration> {
        self.with(|s| s.pending.get(email).cloned())
    }

    pub fn pending_count(&self) -> usize {
        self.with(|s| s.pending.len())
    }

    pub fn set_pending_otp(&self, email: &str, otp: &str) {
        self.with(|s| {
            if let Some(p) = s.pending.get_mut(email) {
                otp.clone_into(&mut p.otp);
            }
        });
    }

    pub fn attempt(&self, ip: &str, email: &str) -> Option<LoginAttempt> {
        self.with(|s| s.attempts.get(&(ip.to_owned(), email.to_owned())).cloned())
    }

    pub fn put_cart_line(
        &self,
        user_id: UserId,
        product_id: i32,
        quantity: i32,
        acc_value: Option<Decimal>,
        price: &str,
    ) {
        let id = ProductId::new(product_id);
        let line = CartLine {
            product_id: id,
            quantity,
            product: ProductSnapshot {
                id,
                name: format!("Product {product_id}"),
                url: format!("https://img.example.com/{product_id}.jpg"),
                res_url: None,
                price: price.to_owned(),
                value: acc_value,
                acc_value,
                discount: None,
                mrp: None,
                points: Vec::new(),
            },
        };
        self.with(|s| s.carts.entry(user_id).or_default().push(line));
    }

    pub fn cart(&self, user_id: UserId) -> Vec<CartLine> {
        self.with(|s| s.carts.get(&user_id).cloned().unwrap_or_default())
    }

    pub fn order_count(&self) -> usize {
        self.with(|s| s.orders.len())
    }
}

impl UserStore for MemoryStore {
    async fn find_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<StoredCredentials>, RepositoryError> {
        Ok(self.with(|s| {
            s.users
                .iter()
                .find(|(u, _)| u.email == *email)
                .map(|(user, hash)| StoredCredentials {
                    user: user.clone(),
                    password_hash: hash.clone(),
                })
        }))
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.user(id))
    }

    async fn email_exists(&self, email: &Email) -> Result<bool, RepositoryError> {
        Ok(self.with(|s| s.users.iter().any(|(u, _)| u.email == *email)))
    }

    async fn number_exists(&self, number: &PhoneNumber) -> Result<bool, RepositoryError> {
        Ok(self.with(|s| s.users.iter().any(|(u, _)| u.number == *number)))
    }

    async fn add_token(
        &self,
        user_id: UserId,
        jti: Uuid,
        _expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        self.with(|s| s.tokens.push((user_id, jti)));
        Ok(())
    }

    async fn has_token(&self, user_id: UserId, jti: Uuid) -> Result<bool, RepositoryError> {
        Ok(self.with(|s| s.tokens.contains(&(user_id, jti))))
    }

    async fn remove_token(&self, user_id: UserId, jti: Uuid) -> Result<(), RepositoryError> {
        self.with(|s| s.tokens.retain(|t| *t != (user_id, jti)));
        Ok(())
    }
}

impl PendingRegistrationStore for MemoryStore {
    async fn upsert(&self, pending: &PendingRegistration) -> Result<(), RepositoryError> {
        let cutoff = Utc::now() - PENDING_RETENTION;
        self.with(|s| {
            s.pending.retain(|_, p| p.created_at >= cutoff);
            s.pending
                .insert(pending.email.as_str().to_owned(), pending.clone());
        });
        Ok(())
    }

    async fn delete(&self, email: &Email) -> Result<(), RepositoryError> {
        self.with(|s| s.pending.remove(email.as_str()));
        Ok(())
    }

    async fn promote(
        &self,
        email: &Email,
        otp: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, RepositoryError> {
        self.with(|s| {
            let Some(pending) = s
                .pending
                .get(email.as_str())
                .filter(|p| p.otp == otp && p.otp_expires_at >= now)
                .cloned()
            else {
                return Ok(None);
            };
            if s.users.iter().any(|(u, _)| u.email == pending.email) {
                return Err(RepositoryError::Conflict("email".to_owned()));
            }
            let user = User {
                id: UserId::new(i32::try_from(s.users.len()).unwrap() + 1),
                name: pending.name.clone(),
                email: pending.email.clone(),
                number: pending.number.clone(),
                role: UserRole::User,
                is_verified: true,
                created_at: now,
                updated_at: now,
            };
            s.users.push((user.clone(), pending.password_hash));
            s.pending.remove(email.as_str());
            Ok(Some(user))
        })
    }
}

impl LoginAttemptStore for MemoryStore {
    async fn get(&self, ip: &str, email: &str) -> Result<Option<LoginAttempt>, RepositoryError> {
        let now = Utc::now();
        Ok(self.with(|s| {
            s.attempts
                .retain(|_, a| now - a.last_attempt_at <= ATTEMPT_RETENTION);
            s.attempts.get(&(ip.to_owned(), email.to_owned())).cloned()
        }))
    }

    async fn increment(
        &self,
        ip: &str,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<LoginAttempt, RepositoryError> {
        Ok(self.with(|s| {
            let record = s
                .attempts
                .entry((ip.to_owned(), email.to_owned()))
                .or_insert_with(|| LoginAttempt {
                    ip: ip.to_owned(),
                    email: email.to_owned(),
                    attempts: 0,
                    last_attempt_at: now,
                    blocked_until: None,
                });
            if now - record.last_attempt_at > ATTEMPT_RETENTION {
                record.attempts = 0;
                record.blocked_until = None;
            }
            record.attempts += 1;
            record.last_attempt_at = now;
            record.clone()
        }))
    }

    async fn block_until(
        &self,
        ip: &str,
        email: &str,
        until: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        self.with(|s| {
            if let Some(a) = s.attempts.get_mut(&(ip.to_owned(), email.to_owned())) {
                a.blocked_until = Some(until);
            }
        });
        Ok(())
    }

    async fn delete(&self, ip: &str, email: &str) -> Result<(), RepositoryError> {
        self.with(|s| s.attempts.remove(&(ip.to_owned(), email.to_owned())));
        Ok(())
    }
}

impl CartStore for MemoryStore {
    async fn lines(&self, user_id: UserId) -> Result<Vec<CartLine>, RepositoryError> {
        Ok(self.cart(user_id))
    }

    async fn add(&self, user_id: UserId, product: &Product) -> Result<(), RepositoryError> {
        self.with(|s| {
            let cart = s.carts.entry(user_id).or_default();
            match cart.iter_mut().find(|l| l.product_id == product.product_id) {
                Some(line) => line.quantity += 1,
                None => cart.push(CartLine {
                    product_id: product.product_id,
                    quantity: 1,
                    product: ProductSnapshot::from(product),
                }),
            }
        });
        Ok(())
    }

    async fn remove(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        Ok(self.with(|s| {
            let cart = s.carts.entry(user_id).or_default();
            let before = cart.len();
            cart.retain(|l| l.product_id != product_id);
            cart.len() != before
        }))
    }
}

impl OrderStore for MemoryStore {
    async fn place(&self, order: &NewOrder) -> Result<Order, RepositoryError> {
        self.with(|s| {
            let duplicate = s.orders.iter().any(|o| {
                o.order_number == order.order_number
                    || o.gateway.as_ref().zip(order.gateway.as_ref()).is_some_and(|(a, b)| {
                        a.order_id == b.order_id || a.payment_id == b.payment_id
                    })
            });
            if duplicate {
                return Err(RepositoryError::Conflict(
                    "Order already exists for this payment".to_owned(),
                ));
            }
            let now = Utc::now();
            let placed = Order {
                id: OrderId::new(i32::try_from(s.orders.len()).unwrap() + 1),
                order_number: order.order_number.clone(),
                user_id: order.user_id,
                user_details: order.user_details.clone(),
                lines: order.lines.clone(),
                total_amount: order.total_amount,
                order_status: OrderStatus::Pending,
                payment_status: order.payment_status,
                payment_method: order.payment_method,
                gateway: order.gateway.clone(),
                shipping_address: order.shipping_address.clone(),
                tracking_number: None,
                delivery_date: None,
                notes: String::new(),
                created_at: now,
                updated_at: now,
            };
            s.orders.push(placed.clone());
            s.carts.remove(&order.user_id);
            Ok(placed)
        })
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        Ok(self.with(|s| {
            s.orders
                .iter()
                .rev()
                .filter(|o| o.user_id == user_id)
                .cloned()
                .collect()
        }))
    }

    async fn record_payment_intent(&self, intent: &PaymentIntent) -> Result<(), RepositoryError> {
        self.with(|s| {
            if s
                .intents
                .iter()
                .any(|i| i.gateway_order_id == intent.gateway_order_id)
            {
                return Err(RepositoryError::Conflict(
                    "Payment order already recorded".to_owned(),
                ));
            }
            s.intents.push(intent.clone());
            Ok(())
        })
    }

    async fn find_payment_intent(
        &self,
        user_id: UserId,
        gateway_order_id: &str,
    ) -> Result<Option<PaymentIntent>, RepositoryError> {
        Ok(self.with(|s| {
            s.intents
                .iter()
                .find(|i| i.user_id == user_id && i.gateway_order_id == gateway_order_id)
                .cloned()
        }))
    }
}

/// Mailer that records what it was asked to send.
#[derive(Default)]
pub struct RecordingMailer {
    fail: bool,
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingMailer {
    pub fn failing() -> Self {
        Self {
            fail: true,
            sent: Mutex::default(),
        }
    }

    /// (recipient, otp) pairs in send order.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

impl OtpMailer for RecordingMailer {
    async fn send_otp(&self, to: &str, _name: &str, otp: &str) -> Result<(), EmailError> {
        if self.fail {
            return Err(EmailError::InvalidAddress(to.to_owned()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((to.to_owned(), otp.to_owned()));
        Ok(())
    }
}

/// Gateway that records requested amounts and checks signatures with [`GATEWAY_SECRET`].
#[derive(Default)]
pub struct FakeGateway {
    requests: Mutex<Vec<(i64, String)>>,
}

impl FakeGateway {
    pub fn amounts(&self) -> Vec<i64> {
        self.requests.lock().unwrap().iter().map(|r| r.0).collect()
    }

    pub fn currencies(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.1.clone())
            .collect()
    }
}

impl PaymentGateway for FakeGateway {
    async fn create_order(
        &self,
        amount: i64,
        currency: &str,
        receipt: &str,
    ) -> Result<GatewayOrder, PaymentError> {
        let mut requests = self.requests.lock().unwrap();
        requests.push((amount, currency.to_owned()));
        Ok(GatewayOrder {
            id: format!("order_test_{}", requests.len()),
            entity: "order".to_owned(),
            amount,
            amount_paid: 0,
            amount_due: amount,
            currency: currency.to_owned(),
            receipt: Some(receipt.to_owned()),
            status: "created".to_owned(),
            created_at: Utc::now().timestamp(),
        })
    }

    fn verify_signature(&self, order_id: &str, payment_id: &str, signature: &str) -> bool {
        verify_payment_signature(GATEWAY_SECRET, order_id, payment_id, signature)
    }
}

//! Razorpay API client for online payments.
//!
//! Orders are created server-side with the amount computed from the
//! customer's persisted cart. Completed payments are confirmed by checking
//! the HMAC signature Razorpay's checkout returns to the browser.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

use crate::config::RazorpayConfig;

type HmacSha256 = Hmac<Sha256>;

/// Errors that can occur when interacting with the Razorpay API.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Body sent to create a gateway order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateOrderRequest<'a> {
    /// Amount in minor units (paise).
    pub amount: i64,
    pub currency: &'a str,
    pub receipt: &'a str,
}

/// An order as returned by the gateway. Passed through to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
    #[serde(default)]
    pub entity: String,
    pub amount: i64,
    #[serde(default)]
    pub amount_paid: i64,
    #[serde(default)]
    pub amount_due: i64,
    pub currency: String,
    #[serde(default)]
    pub receipt: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub created_at: i64,
}

/// External payment processor.
#[trait_variant::make(PaymentGateway: Send)]
pub trait LocalPaymentGateway {
    /// Create an order for `amount` minor units.
    async fn create_order(
        &self,
        amount: i64,
        currency: &str,
        receipt: &str,
    ) -> Result<GatewayOrder, PaymentError>;

    /// Whether `signature` authenticates the (order, payment) pair.
    fn verify_signature(&self, order_id: &str, payment_id: &str, signature: &str) -> bool;
}

/// Razorpay REST client.
#[derive(Clone)]
pub struct RazorpayClient {
    client: reqwest::Client,
    key_id: String,
    key_secret: SecretString,
    api_base: String,
}

impl RazorpayClient {
    /// Create a new Razorpay client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &RazorpayConfig) -> Result<Self, PaymentError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()?;

        Ok(Self {
            client,
            key_id: config.key_id.clone(),
            key_secret: config.key_secret.clone(),
            api_base: config.api_base.trim_end_matches('/').to_owned(),
        })
    }
}

impl PaymentGateway for RazorpayClient {
    #[tracing::instrument(skip(self))]
    async fn create_order(
        &self,
        amount: i64,
        currency: &str,
        receipt: &str,
    ) -> Result<GatewayOrder, PaymentError> {
        let url = format!("{}/v1/orders", self.api_base);
        let body = CreateOrderRequest {
            amount,
            currency,
            receipt,
        };

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.key_id, Some(self.key_secret.expose_secret()))
            .json(&body)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PaymentError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let order: GatewayOrder = response
            .json()
            .await
            .map_err(|e| PaymentError::Parse(e.to_string()))?;

        tracing::info!(gateway_order_id = %order.id, amount, "Gateway order created");
        Ok(order)
    }

    fn verify_signature(&self, order_id: &str, payment_id: &str, signature: &str) -> bool {
        verify_payment_signature(
            self.key_secret.expose_secret(),
            order_id,
            payment_id,
            signature,
        )
    }
}

/// Check a checkout signature: hex HMAC-SHA256 of `"{order_id}|{payment_id}"`.
///
/// The comparison runs in constant time.
#[must_use]
pub fn verify_payment_signature(
    secret: &str,
    order_id: &str,
    payment_id: &str,
    signature: &str,
) -> bool {
    let Ok(provided) = hex::decode(signature.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(format!("{order_id}|{payment_id}").as_bytes());
    mac.verify_slice(&provided).is_ok()
}

/// Compute the signature the gateway would return for a payment.
#[cfg(test)]
pub(crate) fn sign_payment(secret: &str, order_id: &str, payment_id: &str) -> String {
    #[allow(clippy::expect_used)]
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("valid key length");
    mac.update(format!("{order_id}|{payment_id}").as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SECRET: &str = "rzp_test_secret_value";

    #[test]
    fn test_valid_signature_is_accepted() {
        let signature = sign_payment(SECRET, "order_9A33XWu170gUtm", "pay_29QQoUBi66xm2f");
        assert!(verify_payment_signature(
            SECRET,
            "order_9A33XWu170gUtm",
            "pay_29QQoUBi66xm2f",
            &signature
        ));
    }

    #[test]
    fn test_tampered_signature_is_rejected() {
        let signature = sign_payment(SECRET, "order_1", "pay_1");
        assert!(!verify_payment_signature(SECRET, "order_1", "pay_2", &signature));
        assert!(!verify_payment_signature("other-secret", "order_1", "pay_1", &signature));
        assert!(!verify_payment_signature(SECRET, "order_1", "pay_1", "not-hex"));
        assert!(!verify_payment_signature(SECRET, "order_1", "pay_1", ""));
    }

    #[test]
    fn test_create_order_body_shape() {
        let body = CreateOrderRequest {
            amount: 250_000,
            currency: "INR",
            receipt: "ORD-ABC-12345",
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["amount"], 250_000);
        assert_eq!(json["currency"], "INR");
    }

    #[test]
    fn test_gateway_order_parses_minimal_response() {
        let order: GatewayOrder = serde_json::from_str(
            r#"{"id":"order_1","amount":250000,"currency":"INR","receipt":"ORD-1","status":"created"}"#,
        )
        .unwrap();
        assert_eq!(order.amount, 250_000);
        assert_eq!(order.amount_paid, 0);
    }
}

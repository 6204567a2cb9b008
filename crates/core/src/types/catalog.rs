//! Catalog products and the cart lines that reference them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::PricedLine;

/// A catalog entry.
///
/// `product_id` is the number merchandisers assign and customers see in URLs;
/// the storage row id never leaves the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "id")]
    pub product_id: ProductId,
    pub name: String,
    /// Primary image URL.
    pub url: String,
    /// Responsive/alternate image URL.
    pub res_url: Option<String>,
    /// Display price, e.g. `"₹1,299"`.
    pub price: String,
    pub value: Option<Decimal>,
    /// Numeric price used by server-side totals.
    pub acc_value: Option<Decimal>,
    pub discount: Option<String>,
    pub mrp: Option<String>,
    /// Feature bullet points.
    pub points: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Product fields copied into a cart line when it is added.
///
/// Later catalog edits do not change what an existing cart line costs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSnapshot {
    pub id: ProductId,
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub res_url: Option<String>,
    pub price: String,
    #[serde(default)]
    pub value: Option<Decimal>,
    #[serde(default)]
    pub acc_value: Option<Decimal>,
    #[serde(default)]
    pub discount: Option<String>,
    #[serde(default)]
    pub mrp: Option<String>,
    #[serde(default)]
    pub points: Vec<String>,
}

impl From<&Product> for ProductSnapshot {
    fn from(product: &Product) -> Self {
        Self {
            id: product.product_id,
            name: product.name.clone(),
            url: product.url.clone(),
            res_url: product.res_url.clone(),
            price: product.price.clone(),
            value: product.value,
            acc_value: product.acc_value,
            discount: product.discount.clone(),
            mrp: product.mrp.clone(),
            points: product.points.clone(),
        }
    }
}

/// One line of a customer's persisted cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: i32,
    pub product: ProductSnapshot,
}

impl CartLine {
    /// View this line through the pricing engine.
    #[must_use]
    pub fn priced(&self) -> PricedLine<'_> {
        PricedLine {
            quantity: self.quantity,
            acc_value: self.product.acc_value,
            display_price: Some(&self.product.price),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_json_uses_catalog_id() {
        let now = Utc::now();
        let product = Product {
            product_id: ProductId::new(3),
            name: "Kettle".to_owned(),
            url: "https://img/kettle.jpg".to_owned(),
            res_url: None,
            price: "₹1,499".to_owned(),
            value: None,
            acc_value: Some(Decimal::from(1499)),
            discount: Some("25% off".to_owned()),
            mrp: Some("₹1,999".to_owned()),
            points: vec!["1.5L".to_owned()],
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(&product).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["resUrl"], serde_json::Value::Null);

        let snapshot = ProductSnapshot::from(&product);
        assert_eq!(snapshot.id, ProductId::new(3));
        assert_eq!(snapshot.acc_value, Some(Decimal::from(1499)));
    }

    #[test]
    fn test_snapshot_tolerates_missing_optional_fields() {
        let snapshot: ProductSnapshot =
            serde_json::from_str(r#"{"id":1,"name":"Pen","url":"u","price":"₹20"}"#).unwrap();
        let line = CartLine {
            product_id: snapshot.id,
            quantity: 4,
            product: snapshot,
        };
        assert_eq!(line.priced().subtotal().unwrap(), Decimal::from(80));
    }
}

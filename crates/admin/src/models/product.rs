//! Catalog write inputs.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use amazon_clone_core::ProductId;

/// Body of `POST /products` and `PUT /products/{id}`.
///
/// Every field is optional at the wire level; [`ProductInput::into_new`]
/// and [`ProductInput::into_patch`] decide which ones are required.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    /// Catalog id, as a JSON number or numeric string.
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub res_url: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default, deserialize_with = "optional_decimal")]
    pub value: Option<Decimal>,
    #[serde(default, deserialize_with = "optional_decimal")]
    pub acc_value: Option<Decimal>,
    #[serde(default)]
    pub discount: Option<String>,
    #[serde(default)]
    pub mrp: Option<String>,
    #[serde(default)]
    pub points: Option<Vec<String>>,
}

/// A validated product to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub product_id: ProductId,
    pub name: String,
    pub url: String,
    pub res_url: Option<String>,
    pub price: String,
    pub value: Option<Decimal>,
    pub acc_value: Option<Decimal>,
    pub discount: Option<String>,
    pub mrp: Option<String>,
    pub points: Vec<String>,
}

/// A partial update; `None` leaves the column unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub url: Option<String>,
    pub res_url: Option<String>,
    pub price: Option<String>,
    pub value: Option<Decimal>,
    pub acc_value: Option<Decimal>,
    pub discount: Option<String>,
    pub mrp: Option<String>,
    pub points: Option<Vec<String>>,
}

fn required(field: Option<String>, message: &str, errors: &mut Vec<String>) -> String {
    match field.map(|s| s.trim().to_owned()) {
        Some(s) if !s.is_empty() => s,
        _ => {
            errors.push(message.to_owned());
            String::new()
        }
    }
}

fn parse_product_id(value: Option<&Value>) -> Option<ProductId> {
    match value? {
        Value::Number(n) => n.as_i64().and_then(|n| i32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .map(ProductId::new)
}

impl ProductInput {
    /// Validate a create request.
    ///
    /// # Errors
    ///
    /// Returns every failed field message.
    pub fn into_new(self) -> Result<NewProduct, Vec<String>> {
        let mut errors = Vec::new();

        let product_id = parse_product_id(self.id.as_ref());
        if product_id.is_none() {
            errors.push("Product ID must be numeric".to_owned());
        }
        let name = required(self.name, "Product name is required", &mut errors);
        let price = required(self.price, "Price is required", &mut errors);
        let url = required(self.url, "Image URL is required", &mut errors);

        match product_id {
            Some(product_id) if errors.is_empty() => Ok(NewProduct {
                product_id,
                name,
                url,
                res_url: self.res_url,
                price,
                value: self.value,
                acc_value: self.acc_value,
                discount: self.discount,
                mrp: self.mrp,
                points: self.points.unwrap_or_default(),
            }),
            _ => Err(errors),
        }
    }

    /// Validate an update request. The catalog id cannot be changed.
    ///
    /// # Errors
    ///
    /// Returns a message for each required field that was sent blank.
    pub fn into_patch(self) -> Result<ProductPatch, Vec<String>> {
        let mut errors = Vec::new();
        let mut non_blank = |field: Option<String>, message: &str| {
            field.map(|s| required(Some(s), message, &mut errors))
        };

        let name = non_blank(self.name, "Product name is required");
        let price = non_blank(self.price, "Price is required");
        let url = non_blank(self.url, "Image URL is required");

        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(ProductPatch {
            name,
            url,
            res_url: self.res_url,
            price,
            value: self.value,
            acc_value: self.acc_value,
            discount: self.discount,
            mrp: self.mrp,
            points: self.points,
        })
    }
}

/// Accept a decimal as a JSON number or a numeric string.
fn optional_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(None),
        Some(Value::String(s)) => s,
        Some(other) => {
            return Err(serde::de::Error::custom(format!(
                "expected a number, got {other}"
            )));
        }
    };
    Decimal::from_str(raw.trim())
        .or_else(|_| Decimal::from_scientific(raw.trim()))
        .map(Some)
        .map_err(serde::de::Error::custom)
}

//! Cart line items and the persisted order record.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::address::Address;
use super::email::Email;
use super::id::{CustomerId, ProductId};
use super::price::MinorUnitPrice;
use super::status::OrderStatus;

/// A cart line as exposed by the cart provider.
///
/// Read-only to checkout; the cart owns mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// A line item as persisted on order documents and submitted to the
/// price-intent endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: ProductId,
    pub quantity: u32,
    /// Variant attributes (size, color). Carried empty until variants land.
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl From<CartItem> for OrderItem {
    fn from(item: CartItem) -> Self {
        Self {
            id: item.product_id,
            quantity: item.quantity,
            attributes: Map::new(),
        }
    }
}

/// The order document created exactly once per successful checkout.
///
/// Written under a fresh client-generated [`super::OrderId`] and never
/// mutated by checkout afterwards. `shipping` is present only when the
/// shipping address differs from billing; the customer fields are present
/// only for authenticated checkouts - a guest order omits them entirely,
/// no placeholder identity is synthesized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub price: MinorUnitPrice,
    pub status: OrderStatus,
    pub payment_intent_id: String,
    pub billing: Address,
    pub order_items: Vec<OrderItem>,
    /// Creation time, Unix milliseconds.
    pub created_on: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<CustomerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<Email>,
}

/// Current time in Unix milliseconds, the document timestamp format.
#[must_use]
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

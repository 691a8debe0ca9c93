//! Typed customer profile document.

use serde::{Deserialize, Serialize};

use spruce_core::{AddressDraft, ProductId, now_millis};

/// The per-customer profile document, keyed by the auth identity's uid.
///
/// Every field is optional: a profile freshly created by sign-up carries
/// only `createdOn`, and billing/shipping defaults appear once the customer
/// opts into "save info" during checkout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing: Option<AddressDraft>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping: Option<AddressDraft>,
    /// Whether the shipping address differs from billing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_differs: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub save_info: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wish_list: Option<Vec<ProductId>>,
    /// Creation time, Unix milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_on: Option<i64>,
}

impl Customer {
    /// A fresh profile as written on first sign-up.
    #[must_use]
    pub fn created_now() -> Self {
        Self {
            created_on: Some(now_millis()),
            ..Self::default()
        }
    }
}

/// The fields merged into the profile when the customer checks "save info".
///
/// A partial update: fields not listed here (wish list, creation time) are
/// left untouched by the merge.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerProfileUpdate {
    pub billing: AddressDraft,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping: Option<AddressDraft>,
    pub shipping_differs: bool,
    pub save_info: bool,
}

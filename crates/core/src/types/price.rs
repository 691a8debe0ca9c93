//! Order price types and minor-unit conversion.
//!
//! Display amounts are decimal values in the storefront currency. The
//! payment gateway requires integer minor units (cents), so every price
//! field is converted with [`OrderPrice::to_minor_units`] before an order
//! document is persisted.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Conversion factor between display units and gateway minor units.
const MINOR_UNITS_PER_UNIT: i64 = 100;

/// Order price in display currency.
///
/// `sub_total` currently mirrors `total`: the cart exposes a single
/// computed total and the price object projects it into both fields.
/// Discounts and shipping charges would split them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPrice {
    /// Total charged to the customer.
    pub total: Decimal,
    /// Total before shipping and adjustments.
    pub sub_total: Decimal,
}

impl OrderPrice {
    /// Build a price object from the cart's single computed total.
    #[must_use]
    pub const fn from_total(total: Decimal) -> Self {
        Self {
            total,
            sub_total: total,
        }
    }

    /// Convert every field to the gateway's integer minor-unit format.
    ///
    /// Amounts are rounded half-away-from-zero at two decimal places, so
    /// `19.99` becomes `1999` and `10.005` becomes `1001`.
    #[must_use]
    pub fn to_minor_units(&self) -> MinorUnitPrice {
        MinorUnitPrice {
            total: to_minor_units(self.total),
            sub_total: to_minor_units(self.sub_total),
        }
    }
}

/// Order price in gateway minor units (e.g., cents).
///
/// This is the form persisted on order documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MinorUnitPrice {
    /// Total in minor units.
    pub total: i64,
    /// Sub-total in minor units.
    pub sub_total: i64,
}

impl MinorUnitPrice {
    /// Convert back to display units (for receipts and verification).
    #[must_use]
    pub fn to_display(&self) -> OrderPrice {
        OrderPrice {
            total: Decimal::new(self.total, 2),
            sub_total: Decimal::new(self.sub_total, 2),
        }
    }
}

fn to_minor_units(amount: Decimal) -> i64 {
    (amount * Decimal::from(MINOR_UNITS_PER_UNIT))
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .unwrap_or(i64::MAX)
}

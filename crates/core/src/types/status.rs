//! Order status enum.

use serde::{Deserialize, Serialize};

/// Lifecycle status stamped on an order document.
///
/// Checkout only ever writes [`OrderStatus::Ordered`]; the later
/// transitions belong to external order management and are listed here so
/// documents written by it still deserialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub enum OrderStatus {
    /// Payment confirmed, order recorded.
    #[default]
    Ordered,
    /// Handed to the carrier.
    Shipped,
    /// Received by the customer.
    Delivered,
    /// Canceled after placement.
    Canceled,
}

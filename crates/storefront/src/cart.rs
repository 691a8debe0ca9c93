//! Cart snapshot seam and the local in-memory cart.
//!
//! Checkout only reads the cart: the line items it snapshots on entry and
//! the computed total it samples at confirmation time. Mutation stays with
//! the cart owner.

use std::sync::Mutex;

use rust_decimal::Decimal;
use tokio::sync::watch;

use spruce_core::{CartItem, ProductId};

/// Read-only live view of the cart.
pub trait CartProvider: Send + Sync {
    /// Current line items.
    fn items(&self) -> watch::Receiver<Vec<CartItem>>;

    /// Current computed total in display currency.
    fn total_price(&self) -> watch::Receiver<Decimal>;
}

struct CartLine {
    item: CartItem,
    unit_price: Decimal,
}

/// Client-side cart held in memory.
pub struct LocalCart {
    lines: Mutex<Vec<CartLine>>,
    items: watch::Sender<Vec<CartItem>>,
    total: watch::Sender<Decimal>,
}

impl Default for LocalCart {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalCart {
    #[must_use]
    pub fn new() -> Self {
        let (items, _) = watch::channel(Vec::new());
        let (total, _) = watch::channel(Decimal::ZERO);
        Self {
            lines: Mutex::new(Vec::new()),
            items,
            total,
        }
    }

    /// Add a product, merging quantities when the product is already carted.
    pub fn add(&self, product_id: ProductId, quantity: u32, unit_price: Decimal) {
        let mut lines = self.lines.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(line) = lines.iter_mut().find(|l| l.item.product_id == product_id) {
            line.item.quantity += quantity;
            line.unit_price = unit_price;
        } else {
            lines.push(CartLine {
                item: CartItem {
                    product_id,
                    quantity,
                },
                unit_price,
            });
        }
        Self::publish(&lines, &self.items, &self.total);
    }

    /// Set a line's quantity; zero removes it.
    pub fn set_quantity(&self, product_id: &ProductId, quantity: u32) {
        let mut lines = self.lines.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if quantity == 0 {
            lines.retain(|l| l.item.product_id != *product_id);
        } else if let Some(line) = lines.iter_mut().find(|l| l.item.product_id == *product_id) {
            line.item.quantity = quantity;
        }
        Self::publish(&lines, &self.items, &self.total);
    }

    /// Remove a line.
    pub fn remove(&self, product_id: &ProductId) {
        self.set_quantity(product_id, 0);
    }

    /// Empty the cart.
    pub fn clear(&self) {
        let mut lines = self.lines.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        lines.clear();
        Self::publish(&lines, &self.items, &self.total);
    }

    fn publish(
        lines: &[CartLine],
        items: &watch::Sender<Vec<CartItem>>,
        total: &watch::Sender<Decimal>,
    ) {
        let snapshot: Vec<CartItem> = lines.iter().map(|l| l.item.clone()).collect();
        let sum: Decimal = lines
            .iter()
            .map(|l| l.unit_price * Decimal::from(l.item.quantity))
            .sum();
        items.send_replace(snapshot);
        total.send_replace(sum);
    }
}

impl CartProvider for LocalCart {
    fn items(&self) -> watch::Receiver<Vec<CartItem>> {
        self.items.subscribe()
    }

    fn total_price(&self) -> watch::Receiver<Decimal> {
        self.total.subscribe()
    }
}

//! Checkout order-placement workflow.
//!
//! The one place in the storefront where three independently-failing
//! hosted services must present a single all-or-nothing outcome: payment
//! confirmation, order persistence, and the optional profile upsert are
//! sequenced here, and the user sees exactly one terminal screen.

pub mod form;
pub mod workflow;

pub use form::{CheckoutForm, FormError, ValidatedCheckout, submission_ready};
pub use workflow::{CheckoutError, CheckoutWorkflow};

use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::sync::watch;

use crate::auth::Identity;
use crate::documents::DocumentStore;
use crate::payments::{ClientSecretSource, PaymentGateway};

/// Terminal screens the workflow can route to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    CheckoutSuccess,
    CheckoutError,
}

/// Navigation seam. The host UI owns the router; the workflow only names
/// the destination.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

/// External collaborators the workflow orchestrates.
pub struct CheckoutDeps {
    pub store: Arc<dyn DocumentStore>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub secrets: Arc<dyn ClientSecretSource>,
    pub navigator: Arc<dyn Navigator>,
    /// Current identity, live (from the auth provider).
    pub identity: watch::Receiver<Option<Identity>>,
    /// Computed cart total, live (from the cart provider).
    pub total_price: watch::Receiver<Decimal>,
    /// Storefront language, forwarded to the price-intent endpoint.
    pub language: String,
}

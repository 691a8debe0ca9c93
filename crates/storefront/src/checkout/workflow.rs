//! The order-placement workflow.
//!
//! Invariant: an order document is never written unless the gateway has
//! already confirmed the payment. Persistence is sequenced strictly after
//! confirmation - never concurrently, never on decline.
//!
//! One workflow instance covers one checkout entry: the client secret is
//! fetched fresh on entry and consumed by the single submission. Re-enter
//! the checkout to retry; a stale secret is never implicitly reused.

use std::sync::Mutex;

use thiserror::Error;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use spruce_core::{CartItem, Order, OrderId, OrderItem, OrderPrice, OrderStatus, now_millis};

use crate::auth::Identity;
use crate::documents::{Collection, CustomerProfileUpdate, DocumentError, DocumentStoreExt};
use crate::payments::{CardHandle, ClientSecret, GatewayError, IntentError};

use super::{CheckoutDeps, Route, ValidatedCheckout};

/// Errors terminating a checkout submission.
///
/// Everything here is caught at the workflow boundary and converted into a
/// navigation outcome; nothing propagates as a fault. The variants exist
/// because the failure classes differ even where the user-facing screen
/// does not.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The gateway refused or failed the confirmation. Nothing was
    /// persisted.
    #[error("payment confirmation failed: {0}")]
    Gateway(#[from] GatewayError),

    /// The payment was captured but the order document could not be
    /// written. The intent id is carried so the order can be reconciled
    /// against the gateway's own record out-of-band.
    #[error("order persistence failed after captured payment {payment_intent_id}: {source}")]
    Persistence {
        payment_intent_id: String,
        source: DocumentError,
    },

    /// This entry's client secret was already consumed by a submission.
    #[error("checkout already submitted; re-enter to retry")]
    AlreadySubmitted,

    /// The workflow was torn down mid-flight; no navigation occurred.
    #[error("checkout destroyed")]
    Destroyed,
}

/// One entry into the checkout page.
pub struct CheckoutWorkflow {
    deps: CheckoutDeps,
    card: CardHandle,
    order_items: Vec<OrderItem>,
    secret: Mutex<Option<ClientSecret>>,
    loading: watch::Sender<bool>,
    destroyed: CancellationToken,
}

impl CheckoutWorkflow {
    /// Enter checkout: snapshot the cart lines and fetch a fresh client
    /// secret for them.
    ///
    /// # Errors
    ///
    /// Returns an error when the price-intent endpoint cannot issue a
    /// secret; without one there is nothing to confirm and the checkout
    /// page should not render the payment step.
    #[tracing::instrument(skip_all, fields(items = cart_items.len()))]
    pub async fn enter(
        deps: CheckoutDeps,
        cart_items: Vec<CartItem>,
        card: CardHandle,
    ) -> Result<Self, IntentError> {
        let order_items: Vec<OrderItem> = cart_items.into_iter().map(OrderItem::from).collect();
        let secret = deps.secrets.fetch(&order_items, &deps.language).await?;
        let (loading, _) = watch::channel(false);

        Ok(Self {
            deps,
            card,
            order_items,
            secret: Mutex::new(Some(secret)),
            loading,
            destroyed: CancellationToken::new(),
        })
    }

    /// The single loading flag shown while a submission is in flight.
    #[must_use]
    pub fn loading(&self) -> watch::Receiver<bool> {
        self.loading.subscribe()
    }

    /// The items this entry snapshotted from the cart.
    #[must_use]
    pub fn order_items(&self) -> &[OrderItem] {
        &self.order_items
    }

    /// Tear the workflow down. In-flight work is abandoned: no late
    /// navigation, no late loading flip.
    pub fn destroy(&self) {
        self.destroyed.cancel();
    }

    /// Place the order.
    ///
    /// Sequencing: optional profile upsert (fire-and-forget), loading on,
    /// confirmation, minor-unit conversion, order write, loading off,
    /// navigation. The order write happens only after a confirmed payment.
    ///
    /// # Errors
    ///
    /// All failures are also converted into the error route before being
    /// returned; callers use the `Result` for logging and tests, not for
    /// user feedback.
    #[tracing::instrument(skip_all, fields(save_info = form.save_info))]
    pub async fn submit(&self, form: ValidatedCheckout) -> Result<OrderId, CheckoutError> {
        let secret = self
            .secret
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take()
            .ok_or(CheckoutError::AlreadySubmitted)?;

        let identity = self.deps.identity.borrow().clone();

        if form.save_info {
            if let Some(user) = &identity {
                self.save_profile_defaults(user, &form);
            }
        }

        self.set_loading(true);

        let result = tokio::select! {
            () = self.destroyed.cancelled() => return Err(CheckoutError::Destroyed),
            result = self.place_order(&secret, &form, identity.as_ref()) => result,
        };

        self.set_loading(false);

        match &result {
            Ok(order_id) => {
                tracing::info!(%order_id, "order placed");
                self.navigate(Route::CheckoutSuccess);
            }
            Err(CheckoutError::Persistence {
                payment_intent_id, ..
            }) => {
                // Captured payment with no order record: reconcile against
                // the gateway's record using this intent id.
                tracing::error!(
                    %payment_intent_id,
                    "order write failed after captured payment"
                );
                self.navigate(Route::CheckoutError);
            }
            Err(error) => {
                tracing::warn!(%error, "checkout failed");
                self.navigate(Route::CheckoutError);
            }
        }

        result
    }

    /// Confirm the payment, then persist the order. Strictly in that order.
    async fn place_order(
        &self,
        secret: &ClientSecret,
        form: &ValidatedCheckout,
        identity: Option<&Identity>,
    ) -> Result<OrderId, CheckoutError> {
        let confirmation = self
            .deps
            .gateway
            .confirm(secret, &self.card, &form.billing.full_name())
            .await?;

        // Latest computed price at confirmation time, every field converted
        // to gateway minor units.
        let price = OrderPrice::from_total(*self.deps.total_price.borrow()).to_minor_units();

        let order = Order {
            price,
            status: OrderStatus::Ordered,
            payment_intent_id: confirmation.payment_intent_id.clone(),
            billing: form.billing.clone(),
            order_items: self.order_items.clone(),
            created_on: now_millis(),
            shipping: form.shipping.clone(),
            customer_id: identity.map(|user| user.uid.clone()),
            customer_name: identity.and_then(|user| user.display_name.clone()),
            email: identity.and_then(|user| user.email.clone()),
        };

        let order_id = OrderId::generate();
        self.deps
            .store
            .set_json(Collection::Orders, order_id.as_str(), &order)
            .await
            .map_err(|source| CheckoutError::Persistence {
                payment_intent_id: confirmation.payment_intent_id,
                source,
            })?;

        Ok(order_id)
    }

    /// Merge the submitted addresses into the customer profile.
    /// Fire-and-forget: failure is not reported and does not block the
    /// order.
    fn save_profile_defaults(&self, user: &Identity, form: &ValidatedCheckout) {
        let store = std::sync::Arc::clone(&self.deps.store);
        let uid = user.uid.clone();
        let update = CustomerProfileUpdate {
            billing: form.billing.clone().into(),
            shipping: form.shipping.clone().map(Into::into),
            shipping_differs: form.shipping.is_some(),
            save_info: true,
        };
        tokio::spawn(async move {
            if let Err(error) = store
                .update_json(Collection::Customers, uid.as_str(), &update)
                .await
            {
                tracing::debug!(%error, customer = %uid, "profile defaults not saved");
            }
        });
    }

    fn set_loading(&self, on: bool) {
        if self.destroyed.is_cancelled() {
            return;
        }
        self.loading.send_replace(on);
    }

    fn navigate(&self, route: Route) {
        if self.destroyed.is_cancelled() {
            return;
        }
        self.deps.navigator.navigate(route);
    }
}

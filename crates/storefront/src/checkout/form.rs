//! Billing form state and validation.
//!
//! Shipping is a tagged optional, not a dynamically attached sub-form: the
//! "ships to a different address" toggle maps to `Some`/`None` and the UI
//! adapts to the tagged value. Submission stays disabled until the card
//! widget reports complete and the form validates.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use spruce_core::{Address, AddressDraft, AddressError};

use crate::documents::Customer;
use crate::payments::CardStatus;

/// Errors produced when validating the checkout form.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormError {
    /// The terms checkbox is not ticked.
    #[error("terms must be accepted")]
    TermsNotAccepted,

    /// The billing address is invalid.
    #[error("billing address: {0}")]
    Billing(AddressError),

    /// The shipping address is present but invalid.
    #[error("shipping address: {0}")]
    Shipping(AddressError),
}

/// Checkout form state as the UI edits it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CheckoutForm {
    pub billing: AddressDraft,
    /// `Some` only while the customer says shipping differs from billing.
    pub shipping: Option<AddressDraft>,
    /// Persist billing/shipping defaults to the customer profile.
    pub save_info: bool,
    pub terms_accepted: bool,
}

impl CheckoutForm {
    /// Prefill the form from a customer profile document.
    #[must_use]
    pub fn from_customer(customer: &Customer) -> Self {
        let shipping = if customer.shipping_differs.unwrap_or(false) {
            Some(customer.shipping.clone().unwrap_or_default())
        } else {
            None
        };
        Self {
            billing: customer.billing.clone().unwrap_or_default(),
            shipping,
            save_info: customer.save_info.unwrap_or(true),
            terms_accepted: false,
        }
    }

    /// Whether the shipping address differs from billing.
    #[must_use]
    pub const fn differs_from_billing(&self) -> bool {
        self.shipping.is_some()
    }

    /// Validate into the shape the workflow consumes.
    ///
    /// # Errors
    ///
    /// Returns the first failing check: terms, then billing, then shipping.
    pub fn validate(&self) -> Result<ValidatedCheckout, FormError> {
        if !self.terms_accepted {
            return Err(FormError::TermsNotAccepted);
        }
        let billing = self.billing.validate().map_err(FormError::Billing)?;
        let shipping = self
            .shipping
            .as_ref()
            .map(|draft| draft.validate().map_err(FormError::Shipping))
            .transpose()?;

        Ok(ValidatedCheckout {
            billing,
            shipping,
            save_info: self.save_info,
        })
    }
}

/// A validated submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedCheckout {
    pub billing: Address,
    pub shipping: Option<Address>,
    pub save_info: bool,
}

/// Whether the submit button may be enabled: the card widget reports a
/// complete entry and the form validates.
#[must_use]
pub fn submission_ready(card: &CardStatus, form: &CheckoutForm) -> bool {
    card.complete && form.validate().is_ok()
}

//! Payment gateway seam, card-input signal, and the Stripe REST client.

pub mod intent;

pub use intent::{ClientSecret, ClientSecretSource, IntentError, PriceIntentClient};

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::watch;
use url::Url;

use crate::config::StripeConfig;

/// A confirmed payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentConfirmation {
    /// The gateway's payment intent id, persisted on the order for
    /// out-of-band reconciliation.
    pub payment_intent_id: String,
}

/// Errors reported by the payment gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The payment was declined (bad card, insufficient funds, failed
    /// authentication). Terminal for this checkout attempt; no order may
    /// be persisted.
    #[error("payment declined: {message}")]
    Declined { message: String },

    /// The client secret does not have the expected shape.
    #[error("malformed client secret")]
    InvalidClientSecret,

    /// HTTP transport failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The gateway returned an unrecognized error response.
    #[error("gateway error: {status} - {message}")]
    Api { status: u16, message: String },
}

/// Opaque reference to the card captured by the gateway's embedded widget.
///
/// The host UI mounts the widget and hands the resulting payment-method
/// token to checkout; this crate never sees raw card numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardHandle(String);

impl CardHandle {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Live state of the embedded card widget.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardStatus {
    /// The widget reports a complete card entry.
    pub complete: bool,
    /// Detected card brand, once known.
    pub brand: Option<String>,
}

/// Handle the host UI drives as the widget emits change events.
#[derive(Debug)]
pub struct CardInput {
    status: watch::Sender<CardStatus>,
}

impl CardInput {
    #[must_use]
    pub fn new() -> Self {
        let (status, _) = watch::channel(CardStatus::default());
        Self { status }
    }

    /// Report a widget change event.
    pub fn report(&self, status: CardStatus) {
        self.status.send_replace(status);
    }

    /// Live view of the widget state.
    #[must_use]
    pub fn status(&self) -> watch::Receiver<CardStatus> {
        self.status.subscribe()
    }
}

impl Default for CardInput {
    fn default() -> Self {
        Self::new()
    }
}

/// Payment confirmation against the gateway.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Confirm the payment a client secret authorizes, using the captured
    /// card and the billing name.
    async fn confirm(
        &self,
        client_secret: &ClientSecret,
        card: &CardHandle,
        billing_name: &str,
    ) -> Result<PaymentConfirmation, GatewayError>;
}

/// Stripe REST client for payment-intent confirmation.
///
/// Uses the publishable key, mirroring what the embedded widget does in the
/// browser: the intent id is recovered from the client secret and confirmed
/// with the widget's payment-method token attached.
#[derive(Clone)]
pub struct StripeGateway {
    client: reqwest::Client,
    api_base: Url,
    publishable_key: String,
}

impl StripeGateway {
    /// Create a new gateway client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &StripeConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            client,
            api_base: config.api_base.clone(),
            publishable_key: config.publishable_key.clone(),
        })
    }

    async fn map_error(response: reqwest::Response) -> GatewayError {
        let status = response.status().as_u16();
        let body: Value = match response.json().await {
            Ok(body) => body,
            Err(e) => return GatewayError::Http(e),
        };

        let kind = body.pointer("/error/type").and_then(Value::as_str);
        let message = body
            .pointer("/error/message")
            .and_then(Value::as_str)
            .unwrap_or("payment failed")
            .to_owned();

        if kind == Some("card_error") {
            GatewayError::Declined { message }
        } else {
            GatewayError::Api { status, message }
        }
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn confirm(
        &self,
        client_secret: &ClientSecret,
        card: &CardHandle,
        billing_name: &str,
    ) -> Result<PaymentConfirmation, GatewayError> {
        let intent_id = client_secret
            .intent_id()
            .ok_or(GatewayError::InvalidClientSecret)?;
        let url = self
            .api_base
            .join(&format!("v1/payment_intents/{intent_id}/confirm"))
            .map_err(|_| GatewayError::InvalidClientSecret)?;

        let params = [
            ("key", self.publishable_key.as_str()),
            ("client_secret", client_secret.expose()),
            ("payment_method", card.as_str()),
            ("payment_method_data[billing_details][name]", billing_name),
        ];
        let response = self.client.post(url).form(&params).send().await?;

        if !response.status().is_success() {
            return Err(Self::map_error(response).await);
        }

        let body: Value = response.json().await?;
        let status = body.get("status").and_then(Value::as_str).unwrap_or("");
        match status {
            "succeeded" | "processing" | "requires_capture" => {
                let id = body
                    .get("id")
                    .and_then(Value::as_str)
                    .unwrap_or(intent_id)
                    .to_owned();
                Ok(PaymentConfirmation {
                    payment_intent_id: id,
                })
            }
            other => {
                let message = body
                    .pointer("/last_payment_error/message")
                    .and_then(Value::as_str)
                    .unwrap_or(other)
                    .to_owned();
                Err(GatewayError::Declined { message })
            }
        }
    }
}

impl ClientSecret {
    /// Recover the payment intent id from the secret's
    /// `pi_..._secret_...` shape.
    #[must_use]
    pub fn intent_id(&self) -> Option<&str> {
        let raw = self.expose();
        let (id, _) = raw.split_once("_secret")?;
        if id.starts_with("pi_") { Some(id) } else { None }
    }

    pub(crate) fn expose(&self) -> &str {
        self.secret().expose_secret()
    }
}

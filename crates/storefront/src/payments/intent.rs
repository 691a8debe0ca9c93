//! Price-intent endpoint client.
//!
//! Before the billing form is usable the storefront submits the cart's
//! line items to its own REST endpoint, which prices them server-side and
//! opens a payment intent with the gateway. The returned client secret
//! authorizes exactly one confirmation attempt, so a secret is fetched
//! fresh on every checkout entry and never reused.

use async_trait::async_trait;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use spruce_core::OrderItem;

use crate::config::StorefrontConfig;

/// Opaque token authorizing one payment confirmation attempt.
pub struct ClientSecret(SecretString);

impl ClientSecret {
    pub(crate) const fn secret(&self) -> &SecretString {
        &self.0
    }
}

impl From<String> for ClientSecret {
    fn from(raw: String) -> Self {
        Self(SecretString::from(raw))
    }
}

impl std::fmt::Debug for ClientSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ClientSecret([REDACTED])")
    }
}

/// Errors fetching a client secret.
#[derive(Debug, Error)]
pub enum IntentError {
    /// HTTP transport failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint returned an error response.
    #[error("intent endpoint error: {status} - {message}")]
    Api { status: u16, message: String },
}

/// Source of fresh client secrets, one per checkout entry.
#[async_trait]
pub trait ClientSecretSource: Send + Sync {
    async fn fetch(
        &self,
        order_items: &[OrderItem],
        lang: &str,
    ) -> Result<ClientSecret, IntentError>;
}

/// REST client for the storefront's price-intent endpoint.
#[derive(Clone)]
pub struct PriceIntentClient {
    client: reqwest::Client,
    endpoint: Url,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IntentRequest<'a> {
    order_items: &'a [OrderItem],
    lang: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IntentResponse {
    client_secret: String,
}

impl PriceIntentClient {
    /// Create a new client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint URL cannot be formed or the HTTP
    /// client fails to build.
    pub fn new(config: &StorefrontConfig) -> Result<Self, IntentError> {
        let endpoint = config
            .rest_api_base
            .join("stripe/checkout")
            .map_err(|e| IntentError::Api {
                status: 0,
                message: e.to_string(),
            })?;
        let client = reqwest::Client::builder().build()?;
        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl ClientSecretSource for PriceIntentClient {
    async fn fetch(
        &self,
        order_items: &[OrderItem],
        lang: &str,
    ) -> Result<ClientSecret, IntentError> {
        let body = IntentRequest { order_items, lang };
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(IntentError::Api { status, message });
        }

        let payload: IntentResponse = response.json().await?;
        Ok(ClientSecret::from(payload.client_secret))
    }
}

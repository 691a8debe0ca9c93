//! Shared storefront state.

use std::sync::Arc;

use crate::auth::FirebaseAuthClient;
use crate::config::StorefrontConfig;
use crate::documents::FirestoreClient;
use crate::error::StorefrontError;
use crate::payments::{PriceIntentClient, StripeGateway};

/// The hosted-service clients, built once from configuration.
///
/// Cheaply cloneable via `Arc`; a UI host builds one of these at startup
/// and hands the pieces to the workflows that need them.
#[derive(Clone)]
pub struct Storefront {
    inner: Arc<StorefrontInner>,
}

struct StorefrontInner {
    config: StorefrontConfig,
    documents: Arc<FirestoreClient>,
    auth: Arc<FirebaseAuthClient>,
    gateway: Arc<StripeGateway>,
    intents: Arc<PriceIntentClient>,
}

impl Storefront {
    /// Build every hosted-service client from the configuration.
    ///
    /// The auth provider shares the document store's web API key.
    ///
    /// # Errors
    ///
    /// Returns an error if any client fails to build.
    pub fn new(config: StorefrontConfig) -> Result<Self, StorefrontError> {
        let documents = Arc::new(FirestoreClient::new(&config.documents)?);
        let auth = Arc::new(FirebaseAuthClient::new(
            &config.auth,
            config.documents.api_key.clone(),
        )?);
        let gateway = Arc::new(StripeGateway::new(&config.stripe)?);
        let intents = Arc::new(PriceIntentClient::new(&config)?);

        Ok(Self {
            inner: Arc::new(StorefrontInner {
                config,
                documents,
                auth,
                gateway,
                intents,
            }),
        })
    }

    /// The storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// The hosted document store client.
    #[must_use]
    pub fn documents(&self) -> Arc<FirestoreClient> {
        Arc::clone(&self.inner.documents)
    }

    /// The hosted auth provider client.
    #[must_use]
    pub fn auth(&self) -> Arc<FirebaseAuthClient> {
        Arc::clone(&self.inner.auth)
    }

    /// The payment gateway client.
    #[must_use]
    pub fn gateway(&self) -> Arc<StripeGateway> {
        Arc::clone(&self.inner.gateway)
    }

    /// The price-intent endpoint client.
    #[must_use]
    pub fn intents(&self) -> Arc<PriceIntentClient> {
        Arc::clone(&self.inner.intents)
    }
}

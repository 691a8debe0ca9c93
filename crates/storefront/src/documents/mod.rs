//! Hosted document store seam.
//!
//! The store is an opaque per-document service: every operation is keyed by
//! a collection path plus a document id, and documents are schema-less JSON.
//! Consistency is the service's problem; this module only provides typed
//! access and a live subscription handle.

mod customer;
mod firestore;

pub use customer::{Customer, CustomerProfileUpdate};
pub use firestore::FirestoreClient;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Errors that can occur when talking to the document store.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// HTTP transport failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The store returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// A document payload could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// A value could not be encoded as a document payload.
    #[error("encode error: {0}")]
    Encode(String),
}

/// Collections the storefront reads and writes.
///
/// Products are sharded into one collection per storefront language.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Collection {
    Customers,
    Orders,
    Products { lang: String },
}

impl Collection {
    /// Collection path segment in the hosted store.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Customers => "customers".to_string(),
            Self::Orders => "orders".to_string(),
            Self::Products { lang } => format!("products-{lang}"),
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path())
    }
}

/// A live subscription to one document.
///
/// The receiver yields the latest snapshot (`None` while the document is
/// absent). Dropping the watch, or calling [`DocumentWatch::stop`],
/// releases the subscription; no further snapshots are delivered.
#[derive(Debug)]
pub struct DocumentWatch {
    receiver: watch::Receiver<Option<Value>>,
    stop: CancellationToken,
}

impl DocumentWatch {
    /// Create a watch from its parts. Implementations of
    /// [`DocumentStore::subscribe`] call this.
    #[must_use]
    pub const fn new(receiver: watch::Receiver<Option<Value>>, stop: CancellationToken) -> Self {
        Self { receiver, stop }
    }

    /// The snapshot receiver.
    #[must_use]
    pub fn receiver(&self) -> watch::Receiver<Option<Value>> {
        self.receiver.clone()
    }

    /// Stop the subscription explicitly.
    pub fn stop(&self) {
        self.stop.cancel();
    }
}

impl Drop for DocumentWatch {
    fn drop(&mut self) {
        self.stop.cancel();
    }
}

/// Per-document operations against the hosted store.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read a document once. `Ok(None)` when the document is absent.
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Value>, DocumentError>;

    /// Replace a document, creating it if absent.
    async fn set(&self, collection: Collection, id: &str, value: Value)
    -> Result<(), DocumentError>;

    /// Merge the given fields into a document, leaving others untouched.
    async fn update(
        &self,
        collection: Collection,
        id: &str,
        value: Value,
    ) -> Result<(), DocumentError>;

    /// Subscribe to a document's snapshots. Restartable: every call
    /// produces an independent subscription.
    async fn subscribe(&self, collection: Collection, id: &str)
    -> Result<DocumentWatch, DocumentError>;
}

/// Typed convenience methods over any [`DocumentStore`].
#[async_trait]
pub trait DocumentStoreExt: DocumentStore {
    /// Read a document and deserialize it.
    async fn get_as<T>(&self, collection: Collection, id: &str) -> Result<Option<T>, DocumentError>
    where
        T: DeserializeOwned + Send,
    {
        match self.get(collection, id).await? {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| DocumentError::Decode(e.to_string())),
            None => Ok(None),
        }
    }

    /// Serialize a value and replace the document with it.
    async fn set_json<T>(&self, collection: Collection, id: &str, value: &T)
    -> Result<(), DocumentError>
    where
        T: Serialize + Sync,
    {
        let value =
            serde_json::to_value(value).map_err(|e| DocumentError::Encode(e.to_string()))?;
        self.set(collection, id, value).await
    }

    /// Serialize a value and merge its fields into the document.
    async fn update_json<T>(
        &self,
        collection: Collection,
        id: &str,
        value: &T,
    ) -> Result<(), DocumentError>
    where
        T: Serialize + Sync,
    {
        let value =
            serde_json::to_value(value).map_err(|e| DocumentError::Encode(e.to_string()))?;
        self.update(collection, id, value).await
    }
}

impl<S: DocumentStore + ?Sized> DocumentStoreExt for S {}

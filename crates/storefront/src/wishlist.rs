//! Wish-list lookup against the per-language products collection.

use std::sync::Arc;

use futures::future::try_join_all;
use serde_json::Value;

use spruce_core::ProductId;

use crate::documents::{Collection, DocumentError, DocumentStore};
use crate::session::Session;

/// A wish-listed product paired with its document, when it still exists.
#[derive(Debug, Clone, PartialEq)]
pub struct WishListProduct {
    pub id: ProductId,
    /// The product document's fields; `None` when the product was removed
    /// from the catalog after being wish-listed.
    pub data: Option<Value>,
}

/// Fetch the session's wish-listed products concurrently.
///
/// Empty when there is no profile or the profile carries no wish list.
///
/// # Errors
///
/// Returns the first store error; individual missing documents are not
/// errors, they surface as `data: None`.
pub async fn wish_list(
    store: &Arc<dyn DocumentStore>,
    session: &Session,
    lang: &str,
) -> Result<Vec<WishListProduct>, DocumentError> {
    let ids = session
        .profile
        .as_ref()
        .and_then(|profile| profile.wish_list.clone())
        .unwrap_or_default();

    let lookups = ids.into_iter().map(|id| {
        let store = Arc::clone(store);
        let collection = Collection::Products {
            lang: lang.to_owned(),
        };
        async move {
            let data = store.get(collection, id.as_str()).await?;
            Ok::<_, DocumentError>(WishListProduct { id, data })
        }
    });

    try_join_all(lookups).await
}

//! REST client for the hosted document store.
//!
//! Documents travel in the store's typed-value wire format (every scalar
//! wrapped in a `stringValue`/`integerValue`/... envelope); this module
//! converts between that format and plain JSON so the rest of the crate
//! never sees it. Subscriptions are poll-based: the listen protocol needs a
//! streaming session the storefront does not hold, and the poll interval is
//! configurable per deployment.

use std::collections::BTreeMap;

use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value, json};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::config::DocumentStoreConfig;

use super::{Collection, DocumentError, DocumentStore, DocumentWatch};

/// Document store REST client.
#[derive(Clone)]
pub struct FirestoreClient {
    client: reqwest::Client,
    base_url: Url,
    project_id: String,
    api_key: SecretString,
    poll_interval: std::time::Duration,
}

impl FirestoreClient {
    /// Create a new client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &DocumentStoreConfig) -> Result<Self, DocumentError> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            project_id: config.project_id.clone(),
            api_key: config.api_key.clone(),
            poll_interval: config.poll_interval,
        })
    }

    fn document_url(&self, collection: &Collection, id: &str) -> Result<Url, DocumentError> {
        let path = format!(
            "projects/{}/databases/(default)/documents/{}/{}",
            self.project_id,
            collection.path(),
            id
        );
        let mut url = self
            .base_url
            .join(&path)
            .map_err(|e| DocumentError::Encode(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("key", self.api_key.expose_secret());
        Ok(url)
    }

    async fn read_error(response: reqwest::Response) -> DocumentError {
        let status = response.status().as_u16();
        let message = response.text().await.unwrap_or_default();
        DocumentError::Api { status, message }
    }

    async fn fetch(&self, collection: &Collection, id: &str) -> Result<Option<Value>, DocumentError> {
        let url = self.document_url(collection, id)?;
        let response = self.client.get(url).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::read_error(response).await);
        }

        let document: Value = response.json().await?;
        let fields = document
            .get("fields")
            .cloned()
            .unwrap_or_else(|| json!({}));
        decode_fields(&fields).map(Some)
    }
}

#[async_trait::async_trait]
impl DocumentStore for FirestoreClient {
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Value>, DocumentError> {
        self.fetch(&collection, id).await
    }

    async fn set(
        &self,
        collection: Collection,
        id: &str,
        value: Value,
    ) -> Result<(), DocumentError> {
        let url = self.document_url(&collection, id)?;
        let body = json!({ "fields": encode_fields(&value)? });
        let response = self.client.patch(url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(Self::read_error(response).await);
        }
        Ok(())
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        value: Value,
    ) -> Result<(), DocumentError> {
        let mut url = self.document_url(&collection, id)?;
        {
            let mut pairs = url.query_pairs_mut();
            // Merge semantics: mask to the provided top-level fields and
            // require the document to exist, matching the seam's contract.
            if let Value::Object(map) = &value {
                for key in map.keys() {
                    pairs.append_pair("updateMask.fieldPaths", key);
                }
            }
            pairs.append_pair("currentDocument.exists", "true");
        }
        let body = json!({ "fields": encode_fields(&value)? });
        let response = self.client.patch(url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(Self::read_error(response).await);
        }
        Ok(())
    }

    async fn subscribe(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<DocumentWatch, DocumentError> {
        let initial = self.fetch(&collection, id).await?;
        let (tx, rx) = watch::channel(initial);
        let stop = CancellationToken::new();

        let client = self.clone();
        let token = stop.clone();
        let id = id.to_owned();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    () = token.cancelled() => return,
                    () = tokio::time::sleep(client.poll_interval) => {}
                }
                match client.fetch(&collection, &id).await {
                    Ok(snapshot) => {
                        tx.send_if_modified(|current| {
                            if *current == snapshot {
                                false
                            } else {
                                *current = snapshot;
                                true
                            }
                        });
                    }
                    Err(error) => {
                        tracing::warn!(%error, collection = %collection, "document poll failed");
                    }
                }
                if tx.is_closed() {
                    return;
                }
            }
        });

        Ok(DocumentWatch::new(rx, stop))
    }
}

// =============================================================================
// Wire format conversion
// =============================================================================

fn encode_fields(value: &Value) -> Result<Value, DocumentError> {
    let Value::Object(map) = value else {
        return Err(DocumentError::Encode(
            "document root must be a JSON object".to_string(),
        ));
    };
    let fields: BTreeMap<&String, Value> =
        map.iter().map(|(k, v)| (k, encode_value(v))).collect();
    serde_json::to_value(fields).map_err(|e| DocumentError::Encode(e.to_string()))
}

fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => n.as_i64().map_or_else(
            || json!({ "doubleValue": n }),
            |i| json!({ "integerValue": i.to_string() }),
        ),
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            let values: Vec<Value> = items.iter().map(encode_value).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(map) => {
            let fields: Map<String, Value> = map
                .iter()
                .map(|(k, v)| (k.clone(), encode_value(v)))
                .collect();
            json!({ "mapValue": { "fields": fields } })
        }
    }
}

fn decode_fields(fields: &Value) -> Result<Value, DocumentError> {
    let Value::Object(map) = fields else {
        return Err(DocumentError::Decode(
            "document fields must be an object".to_string(),
        ));
    };
    let mut out = Map::new();
    for (key, value) in map {
        out.insert(key.clone(), decode_value(value)?);
    }
    Ok(Value::Object(out))
}

fn decode_value(value: &Value) -> Result<Value, DocumentError> {
    let Value::Object(map) = value else {
        return Err(DocumentError::Decode(format!(
            "expected typed value envelope, got: {value}"
        )));
    };
    let (kind, inner) = map
        .iter()
        .next()
        .ok_or_else(|| DocumentError::Decode("empty value envelope".to_string()))?;

    match kind.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" | "doubleValue" => Ok(inner.clone()),
        "stringValue" | "timestampValue" | "referenceValue" => Ok(inner.clone()),
        "integerValue" => {
            let raw = inner
                .as_str()
                .ok_or_else(|| DocumentError::Decode("integerValue must be a string".into()))?;
            let parsed: i64 = raw
                .parse()
                .map_err(|_| DocumentError::Decode(format!("bad integerValue: {raw}")))?;
            Ok(json!(parsed))
        }
        "arrayValue" => {
            let items = inner
                .get("values")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            let decoded: Result<Vec<Value>, DocumentError> =
                items.iter().map(decode_value).collect();
            Ok(Value::Array(decoded?))
        }
        "mapValue" => {
            let fields = inner.get("fields").cloned().unwrap_or_else(|| json!({}));
            decode_fields(&fields)
        }
        other => Err(DocumentError::Decode(format!(
            "unsupported value kind: {other}"
        ))),
    }
}

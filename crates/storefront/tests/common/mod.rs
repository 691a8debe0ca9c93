//! Shared test doubles for the storefront integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use spruce_core::{CartItem, ProductId};
use spruce_storefront::auth::Identity;
use spruce_storefront::checkout::{CheckoutDeps, Navigator, Route};
use spruce_storefront::documents::{Collection, DocumentError, DocumentStore, DocumentWatch};
use spruce_storefront::payments::{
    CardHandle, ClientSecret, ClientSecretSource, GatewayError, IntentError, PaymentConfirmation,
    PaymentGateway,
};

/// Ordered log of the externally visible calls a scenario makes, shared
/// between the store and the gateway so tests can assert sequencing.
pub type EventLog = Arc<Mutex<Vec<String>>>;

/// Install a test-writer subscriber once; `RUST_LOG` controls verbosity.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn log_event(events: &EventLog, event: impl Into<String>) {
    events
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .push(event.into());
}

pub fn events(events: &EventLog) -> Vec<String> {
    events
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .clone()
}

type DocKey = (String, String);

/// In-memory document store recording every write into the event log.
#[derive(Default)]
pub struct MemoryStore {
    docs: Mutex<HashMap<DocKey, Value>>,
    watchers: Mutex<HashMap<DocKey, watch::Sender<Option<Value>>>>,
    events: EventLog,
    /// Collections whose writes fail, for persistence-failure scenarios.
    failing: Mutex<Vec<String>>,
}

impl MemoryStore {
    pub fn new(events: EventLog) -> Arc<Self> {
        init_tracing();
        Arc::new(Self {
            events,
            ..Self::default()
        })
    }

    pub fn fail_writes_to(&self, collection: &Collection) {
        self.failing
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(collection.path());
    }

    pub fn insert(&self, collection: &Collection, id: &str, value: Value) {
        let key = (collection.path(), id.to_owned());
        self.docs
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(key, value);
    }

    /// All documents written to a collection, in insertion-independent order.
    pub fn documents_in(&self, collection: &Collection) -> Vec<Value> {
        self.docs
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .iter()
            .filter(|((coll, _), _)| *coll == collection.path())
            .map(|(_, value)| value.clone())
            .collect()
    }

    fn notify(&self, key: &DocKey, value: Option<Value>) {
        let watchers = self
            .watchers
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(sender) = watchers.get(key) {
            sender.send_replace(value);
        }
    }

    fn write_allowed(&self, collection: &Collection) -> Result<(), DocumentError> {
        let failing = self
            .failing
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if failing.contains(&collection.path()) {
            return Err(DocumentError::Api {
                status: 503,
                message: "write unavailable".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Value>, DocumentError> {
        let key = (collection.path(), id.to_owned());
        Ok(self
            .docs
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(&key)
            .cloned())
    }

    async fn set(
        &self,
        collection: Collection,
        id: &str,
        value: Value,
    ) -> Result<(), DocumentError> {
        self.write_allowed(&collection)?;
        log_event(&self.events, format!("set:{collection}/{id}"));
        let key = (collection.path(), id.to_owned());
        self.docs
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(key.clone(), value.clone());
        self.notify(&key, Some(value));
        Ok(())
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        value: Value,
    ) -> Result<(), DocumentError> {
        self.write_allowed(&collection)?;
        log_event(&self.events, format!("update:{collection}/{id}"));
        let key = (collection.path(), id.to_owned());
        let merged = {
            let mut docs = self
                .docs
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            let entry = docs.entry(key.clone()).or_insert_with(|| Value::Object(Default::default()));
            if let (Value::Object(doc), Value::Object(fields)) = (&mut *entry, value) {
                for (k, v) in fields {
                    doc.insert(k, v);
                }
            }
            entry.clone()
        };
        self.notify(&key, Some(merged));
        Ok(())
    }

    async fn subscribe(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<DocumentWatch, DocumentError> {
        let key = (collection.path(), id.to_owned());
        let current = self.get(collection, id).await?;
        let mut watchers = self
            .watchers
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let sender = watchers
            .entry(key)
            .or_insert_with(|| watch::channel(None).0);
        sender.send_replace(current);
        Ok(DocumentWatch::new(sender.subscribe(), CancellationToken::new()))
    }
}

/// What the scripted gateway does when asked to confirm.
pub enum GatewayScript {
    Succeed { payment_intent_id: String },
    Decline { message: String },
    /// Never resolves; for teardown-mid-flight scenarios.
    Hang,
}

pub struct ScriptedGateway {
    script: GatewayScript,
    events: EventLog,
}

impl ScriptedGateway {
    pub fn new(script: GatewayScript, events: EventLog) -> Arc<Self> {
        Arc::new(Self { script, events })
    }
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
    async fn confirm(
        &self,
        _client_secret: &ClientSecret,
        _card: &CardHandle,
        billing_name: &str,
    ) -> Result<PaymentConfirmation, GatewayError> {
        log_event(&self.events, format!("confirm:{billing_name}"));
        match &self.script {
            GatewayScript::Succeed { payment_intent_id } => Ok(PaymentConfirmation {
                payment_intent_id: payment_intent_id.clone(),
            }),
            GatewayScript::Decline { message } => Err(GatewayError::Declined {
                message: message.clone(),
            }),
            GatewayScript::Hang => {
                futures::future::pending::<()>().await;
                unreachable!()
            }
        }
    }
}

/// Fixed client-secret source; counts fetches.
pub struct StaticSecrets {
    secret: String,
    events: EventLog,
}

impl StaticSecrets {
    pub fn new(secret: impl Into<String>, events: EventLog) -> Arc<Self> {
        Arc::new(Self {
            secret: secret.into(),
            events,
        })
    }
}

#[async_trait]
impl ClientSecretSource for StaticSecrets {
    async fn fetch(
        &self,
        order_items: &[spruce_core::OrderItem],
        _lang: &str,
    ) -> Result<ClientSecret, IntentError> {
        log_event(&self.events, format!("intent:{}", order_items.len()));
        Ok(ClientSecret::from(self.secret.clone()))
    }
}

#[derive(Default)]
pub struct RecordingNavigator {
    routes: Mutex<Vec<Route>>,
}

impl RecordingNavigator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn routes(&self) -> Vec<Route> {
        self.routes
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: Route) {
        self.routes
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(route);
    }
}

/// Everything a checkout scenario needs, wired to recording doubles.
pub struct Scenario {
    pub events: EventLog,
    pub store: Arc<MemoryStore>,
    pub navigator: Arc<RecordingNavigator>,
    pub identity: watch::Sender<Option<Identity>>,
    pub total: watch::Sender<Decimal>,
    gateway: Arc<ScriptedGateway>,
    secrets: Arc<StaticSecrets>,
}

impl Scenario {
    pub fn new(script: GatewayScript) -> Self {
        let events: EventLog = Arc::default();
        let store = MemoryStore::new(Arc::clone(&events));
        let gateway = ScriptedGateway::new(script, Arc::clone(&events));
        let secrets = StaticSecrets::new("pi_1_secret_x", Arc::clone(&events));
        let navigator = RecordingNavigator::new();
        let (identity, _) = watch::channel(None);
        let (total, _) = watch::channel(Decimal::ZERO);

        Self {
            events,
            store,
            navigator,
            identity,
            total,
            gateway,
            secrets,
        }
    }

    pub fn deps(&self) -> CheckoutDeps {
        CheckoutDeps {
            store: self.store.clone() as Arc<dyn DocumentStore>,
            gateway: self.gateway.clone(),
            secrets: self.secrets.clone(),
            navigator: self.navigator.clone() as Arc<dyn Navigator>,
            identity: self.identity.subscribe(),
            total_price: self.total.subscribe(),
            language: "en".to_string(),
        }
    }
}

/// Auth provider double: signs in whoever the script names.
pub struct ScriptedAuth {
    uid: String,
    identity: watch::Sender<Option<Identity>>,
    events: EventLog,
}

impl ScriptedAuth {
    pub fn new(uid: impl Into<String>, events: EventLog) -> Arc<Self> {
        let (identity, _) = watch::channel(None);
        Arc::new(Self {
            uid: uid.into(),
            identity,
            events,
        })
    }

    pub fn current(&self) -> Option<Identity> {
        self.identity.borrow().clone()
    }

    fn signed_in(&self) -> Identity {
        let identity = Identity {
            uid: spruce_core::CustomerId::new(self.uid.clone()),
            display_name: None,
            email: None,
        };
        self.identity.send_replace(Some(identity.clone()));
        identity
    }
}

#[async_trait]
impl spruce_storefront::auth::AuthProvider for ScriptedAuth {
    fn identity(&self) -> watch::Receiver<Option<Identity>> {
        self.identity.subscribe()
    }

    async fn sign_in_with_popup(
        &self,
        _provider: spruce_storefront::auth::OAuthProvider,
    ) -> Result<Identity, spruce_storefront::auth::AuthError> {
        log_event(&self.events, "auth:popup");
        Ok(self.signed_in())
    }

    async fn sign_in_with_email(
        &self,
        _email: &spruce_core::Email,
        _password: &str,
    ) -> Result<Identity, spruce_storefront::auth::AuthError> {
        log_event(&self.events, "auth:sign_in");
        Ok(self.signed_in())
    }

    async fn create_user_with_email(
        &self,
        _email: &spruce_core::Email,
        _password: &str,
    ) -> Result<Identity, spruce_storefront::auth::AuthError> {
        log_event(&self.events, "auth:create_user");
        Ok(self.signed_in())
    }

    async fn send_password_reset(
        &self,
        _email: &spruce_core::Email,
    ) -> Result<(), spruce_storefront::auth::AuthError> {
        log_event(&self.events, "auth:password_reset");
        Ok(())
    }

    async fn sign_out(&self) -> Result<(), spruce_storefront::auth::AuthError> {
        log_event(&self.events, "auth:sign_out");
        self.identity.send_replace(None);
        Ok(())
    }
}

pub fn cart_item(id: &str, quantity: u32) -> CartItem {
    CartItem {
        product_id: ProductId::new(id),
        quantity,
    }
}

//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SPRUCE_FIRESTORE_PROJECT_ID` - hosted document store project id
//! - `SPRUCE_FIRESTORE_API_KEY` - document store web API key
//! - `SPRUCE_STRIPE_PUBLISHABLE_KEY` - payment gateway publishable key
//! - `SPRUCE_REST_API_BASE` - base URL of the price-intent endpoint
//!
//! ## Optional
//! - `SPRUCE_FIRESTORE_BASE_URL` - document store REST base override
//! - `SPRUCE_FIRESTORE_POLL_INTERVAL_MS` - subscription poll interval (default: 2000)
//! - `SPRUCE_STRIPE_API_BASE` - gateway REST base override
//! - `SPRUCE_AUTH_BASE_URL` - auth provider REST base override
//! - `SPRUCE_LANG` - storefront language (default: en)

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

/// Blocklist of common placeholder patterns (case-insensitive).
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "fixme",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Hosted document store configuration
    pub documents: DocumentStoreConfig,
    /// Payment gateway configuration
    pub stripe: StripeConfig,
    /// Auth provider configuration
    pub auth: AuthConfig,
    /// Base URL of the storefront's own REST endpoint (price intents)
    pub rest_api_base: Url,
    /// Storefront language, used for per-language product collections
    pub language: String,
}

/// Hosted document store configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct DocumentStoreConfig {
    /// Project id of the hosted store
    pub project_id: String,
    /// Web API key authorizing client access
    pub api_key: SecretString,
    /// REST base URL (overridable for tests)
    pub base_url: Url,
    /// Poll interval for document subscriptions
    pub poll_interval: Duration,
}

impl std::fmt::Debug for DocumentStoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentStoreConfig")
            .field("project_id", &self.project_id)
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url.as_str())
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

/// Payment gateway configuration.
#[derive(Debug, Clone)]
pub struct StripeConfig {
    /// Publishable key (safe to expose in the browser)
    pub publishable_key: String,
    /// Gateway REST base URL (overridable for tests)
    pub api_base: Url,
}

/// Auth provider configuration.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Provider REST base URL (overridable for tests)
    pub base_url: Url,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the API key fails placeholder validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let documents = DocumentStoreConfig::from_env()?;
        let stripe = StripeConfig::from_env()?;
        let auth = AuthConfig::from_env()?;
        let rest_api_base = get_url("SPRUCE_REST_API_BASE", None)?;
        let language = get_env_or_default("SPRUCE_LANG", "en");

        Ok(Self {
            documents,
            stripe,
            auth,
            rest_api_base,
            language,
        })
    }
}

impl DocumentStoreConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let api_key = get_validated_secret("SPRUCE_FIRESTORE_API_KEY")?;
        let poll_interval = get_env_or_default("SPRUCE_FIRESTORE_POLL_INTERVAL_MS", "2000")
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|e| {
                ConfigError::InvalidEnvVar(
                    "SPRUCE_FIRESTORE_POLL_INTERVAL_MS".to_string(),
                    e.to_string(),
                )
            })?;

        Ok(Self {
            project_id: get_required_env("SPRUCE_FIRESTORE_PROJECT_ID")?,
            api_key,
            base_url: get_url(
                "SPRUCE_FIRESTORE_BASE_URL",
                Some("https://firestore.googleapis.com/v1/"),
            )?,
            poll_interval,
        })
    }
}

impl StripeConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            publishable_key: get_required_env("SPRUCE_STRIPE_PUBLISHABLE_KEY")?,
            api_base: get_url("SPRUCE_STRIPE_API_BASE", Some("https://api.stripe.com/"))?,
        })
    }
}

impl AuthConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: get_url(
                "SPRUCE_AUTH_BASE_URL",
                Some("https://identitytoolkit.googleapis.com/v1/"),
            )?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get a URL-valued environment variable, falling back to a default when one
/// is given.
fn get_url(key: &str, default: Option<&str>) -> Result<Url, ConfigError> {
    let raw = match (std::env::var(key), default) {
        (Ok(value), _) => value,
        (Err(_), Some(default)) => default.to_string(),
        (Err(_), None) => return Err(ConfigError::MissingEnvVar(key.to_string())),
    };
    Url::parse(&raw).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Get a required secret, rejecting obvious placeholder values.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    let lowered = value.to_lowercase();
    for pattern in PLACEHOLDER_PATTERNS {
        if lowered.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                key.to_string(),
                format!("looks like a placeholder (contains \"{pattern}\")"),
            ));
        }
    }
    let secret = SecretString::from(value);
    if secret.expose_secret().is_empty() {
        return Err(ConfigError::InsecureSecret(
            key.to_string(),
            "empty value".to_string(),
        ));
    }
    Ok(secret)
}

//! Hosted auth provider seam.
//!
//! The provider owns accounts and credentials; the storefront only observes
//! the current identity and triggers sign-in flows. Whether a signed-in
//! account is actually allowed to proceed is a separate question answered
//! by [`crate::session::SessionPolicy`].

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tokio::sync::watch;
use url::Url;

use spruce_core::{CustomerId, Email};

use crate::config::AuthConfig;

/// The currently authenticated identity as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub uid: CustomerId,
    pub display_name: Option<String>,
    pub email: Option<Email>,
}

/// OAuth providers offered in the login dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OAuthProvider {
    Google,
    Facebook,
    Twitter,
}

impl OAuthProvider {
    /// Provider id as the auth service names it.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Google => "google.com",
            Self::Facebook => "facebook.com",
            Self::Twitter => "twitter.com",
        }
    }
}

/// Errors reported by the auth provider.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The email address is malformed.
    #[error("invalid email address")]
    InvalidEmail,

    /// An account with this email already exists.
    #[error("email already in use")]
    EmailAlreadyInUse,

    /// Email/password did not match an account.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The password does not meet the provider's policy.
    #[error("weak password: {0}")]
    WeakPassword(String),

    /// Popup flows need a host UI; this transport cannot run one.
    #[error("popup sign-in is not available on this transport")]
    PopupUnavailable,

    /// HTTP transport failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider returned an unrecognized error response.
    #[error("provider error: {status} - {message}")]
    Provider { status: u16, message: String },
}

/// Operations the storefront needs from the auth provider.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Live view of the current identity (`None` when signed out).
    fn identity(&self) -> watch::Receiver<Option<Identity>>;

    /// Sign in via an OAuth popup for the named provider.
    async fn sign_in_with_popup(&self, provider: OAuthProvider) -> Result<Identity, AuthError>;

    /// Sign in with email and password.
    async fn sign_in_with_email(
        &self,
        email: &Email,
        password: &str,
    ) -> Result<Identity, AuthError>;

    /// Create an account with email and password.
    async fn create_user_with_email(
        &self,
        email: &Email,
        password: &str,
    ) -> Result<Identity, AuthError>;

    /// Send a password-reset email.
    async fn send_password_reset(&self, email: &Email) -> Result<(), AuthError>;

    /// Sign out the current identity.
    async fn sign_out(&self) -> Result<(), AuthError>;
}

/// REST client for the hosted auth provider.
///
/// Implements the email/password flows; OAuth popups are driven by the host
/// UI's embedded provider SDK and surface here only as the resulting
/// identity, so [`AuthProvider::sign_in_with_popup`] on this transport
/// returns [`AuthError::PopupUnavailable`].
pub struct FirebaseAuthClient {
    client: reqwest::Client,
    base_url: Url,
    api_key: SecretString,
    identity: watch::Sender<Option<Identity>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

impl FirebaseAuthClient {
    /// Create a new client.
    ///
    /// The auth provider and the document store share the project's web API
    /// key; pass the same key configured for the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &AuthConfig, api_key: SecretString) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder().build()?;
        let (identity, _) = watch::channel(None);
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key,
            identity,
        })
    }

    fn endpoint(&self, action: &str) -> Result<Url, AuthError> {
        let mut url = self.base_url.clone();
        // `accounts:signUp` would parse as a URL scheme under join(), so
        // extend the path segments instead.
        url.path_segments_mut()
            .map_err(|()| AuthError::Provider {
                status: 0,
                message: "auth base URL cannot be a base".to_string(),
            })?
            .pop_if_empty()
            .push(&format!("accounts:{action}"));
        url.query_pairs_mut()
            .append_pair("key", self.api_key.expose_secret());
        Ok(url)
    }

    async fn post_credentials(
        &self,
        action: &str,
        email: &Email,
        password: &str,
    ) -> Result<Identity, AuthError> {
        let url = self.endpoint(action)?;
        let body = json!({
            "email": email.as_str(),
            "password": password,
            "returnSecureToken": true,
        });
        let response = self.client.post(url).json(&body).send().await?;

        if !response.status().is_success() {
            return Err(Self::map_error(response).await);
        }

        let payload: SignInResponse = response.json().await?;
        let identity = Identity {
            uid: CustomerId::new(payload.local_id),
            display_name: payload.display_name,
            email: payload.email.as_deref().and_then(|e| Email::parse(e).ok()),
        };
        self.identity.send_replace(Some(identity.clone()));
        Ok(identity)
    }

    /// Map the provider's error codes onto the crate taxonomy.
    async fn map_error(response: reqwest::Response) -> AuthError {
        let status = response.status().as_u16();
        let body: serde_json::Value = match response.json().await {
            Ok(body) => body,
            Err(e) => return AuthError::Http(e),
        };
        let message = body
            .pointer("/error/message")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default()
            .to_owned();

        match message.split(':').next().unwrap_or_default().trim() {
            "INVALID_EMAIL" => AuthError::InvalidEmail,
            "EMAIL_EXISTS" => AuthError::EmailAlreadyInUse,
            "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => {
                AuthError::InvalidCredentials
            }
            "WEAK_PASSWORD" => AuthError::WeakPassword(message),
            _ => AuthError::Provider { status, message },
        }
    }
}

#[async_trait]
impl AuthProvider for FirebaseAuthClient {
    fn identity(&self) -> watch::Receiver<Option<Identity>> {
        self.identity.subscribe()
    }

    async fn sign_in_with_popup(&self, _provider: OAuthProvider) -> Result<Identity, AuthError> {
        Err(AuthError::PopupUnavailable)
    }

    async fn sign_in_with_email(
        &self,
        email: &Email,
        password: &str,
    ) -> Result<Identity, AuthError> {
        self.post_credentials("signInWithPassword", email, password)
            .await
    }

    async fn create_user_with_email(
        &self,
        email: &Email,
        password: &str,
    ) -> Result<Identity, AuthError> {
        self.post_credentials("signUp", email, password).await
    }

    async fn send_password_reset(&self, email: &Email) -> Result<(), AuthError> {
        let url = self.endpoint("sendOobCode")?;
        let body = json!({
            "requestType": "PASSWORD_RESET",
            "email": email.as_str(),
        });
        let response = self.client.post(url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(Self::map_error(response).await);
        }
        Ok(())
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.identity.send_replace(None);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client(server: &MockServer) -> FirebaseAuthClient {
        let config = AuthConfig {
            base_url: Url::parse(&format!("{}/", server.uri())).unwrap(),
        };
        FirebaseAuthClient::new(&config, SecretString::from("k".to_string())).unwrap()
    }

    #[tokio::test]
    async fn test_sign_in_updates_identity() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/accounts:signInWithPassword"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "localId": "u1",
                "displayName": "A B",
                "email": "a@b.com",
            })))
            .mount(&server)
            .await;

        let auth = client(&server).await;
        let email = Email::parse("a@b.com").unwrap();
        let identity = auth.sign_in_with_email(&email, "pw").await.unwrap();

        assert_eq!(identity.uid, CustomerId::new("u1"));
        assert_eq!(identity.display_name.as_deref(), Some("A B"));
        assert_eq!(auth.identity().borrow().as_ref(), Some(&identity));
    }

    #[tokio::test]
    async fn test_credential_mismatch_maps_to_invalid_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/accounts:signInWithPassword"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": { "message": "INVALID_LOGIN_CREDENTIALS" }
            })))
            .mount(&server)
            .await;

        let auth = client(&server).await;
        let email = Email::parse("a@b.com").unwrap();
        let err = auth.sign_in_with_email(&email, "wrong").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
        assert!(auth.identity().borrow().is_none());
    }

    #[tokio::test]
    async fn test_sign_up_conflict_maps_to_email_in_use() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/accounts:signUp"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": { "message": "EMAIL_EXISTS" }
            })))
            .mount(&server)
            .await;

        let auth = client(&server).await;
        let email = Email::parse("a@b.com").unwrap();
        let err = auth.create_user_with_email(&email, "pw").await.unwrap_err();
        assert!(matches!(err, AuthError::EmailAlreadyInUse));
    }

    #[tokio::test]
    async fn test_sign_out_clears_identity() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/accounts:signInWithPassword"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "localId": "u1" })))
            .mount(&server)
            .await;

        let auth = client(&server).await;
        let email = Email::parse("a@b.com").unwrap();
        auth.sign_in_with_email(&email, "pw").await.unwrap();
        auth.sign_out().await.unwrap();
        assert!(auth.identity().borrow().is_none());
    }
}

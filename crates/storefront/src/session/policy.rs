//! Login policy.
//!
//! Being authenticated with the provider is necessary but not sufficient:
//! an account is only valid for this storefront when a customer profile
//! document exists for it (or the flow is allowed to create one). The
//! policy owns the login-validity flag the projection consumes and runs
//! the sign-in pipeline as one explicit sequence.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;

use spruce_core::Email;

use crate::auth::{AuthError, AuthProvider, Identity, OAuthProvider};
use crate::documents::{Collection, Customer, DocumentError, DocumentStore, DocumentStoreExt};

/// Which dialog the user is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginFlow {
    /// The account must already exist.
    Login,
    /// The account may be created.
    SignUp,
}

/// How the user authenticates.
#[derive(Debug, Clone)]
pub enum SignInMethod {
    Popup(OAuthProvider),
    Email { email: Email, password: String },
}

/// The policy's verdict on a successful authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignInOutcome {
    /// Signed in; a fresh profile document was created.
    Granted,
    /// Signed in against an existing profile.
    GrantedExisting,
    /// Authentication succeeded but no profile exists and the flow may not
    /// create one. The provider session was discarded; direct the user to
    /// sign-up.
    NeedsSignup,
}

/// Errors from the sign-in pipeline.
#[derive(Debug, Error)]
pub enum SignInError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The profile lookup or creation failed; validity is left unchanged.
    #[error("profile access failed: {0}")]
    Profile(#[from] DocumentError),
}

/// Owns the login-validity flag and the sign-in pipeline.
pub struct SessionPolicy {
    auth: Arc<dyn AuthProvider>,
    store: Arc<dyn DocumentStore>,
    validity: watch::Sender<bool>,
}

impl SessionPolicy {
    /// Create the policy and the validity receiver the session projection
    /// consumes. A restored provider session is taken at face value, so
    /// validity starts true.
    #[must_use]
    pub fn new(
        auth: Arc<dyn AuthProvider>,
        store: Arc<dyn DocumentStore>,
    ) -> (Self, watch::Receiver<bool>) {
        let (validity, receiver) = watch::channel(true);
        (
            Self {
                auth,
                store,
                validity,
            },
            receiver,
        )
    }

    /// A login or sign-up dialog opened: suspend the session until the
    /// pipeline decides.
    pub fn begin_flow(&self) {
        self.validity.send_replace(false);
    }

    /// Run the sign-in pipeline: authenticate, look up the profile, apply
    /// the flow's rule.
    ///
    /// # Errors
    ///
    /// Authentication errors pass through from the provider; a failed
    /// profile lookup surfaces as [`SignInError::Profile`] and leaves the
    /// validity flag untouched.
    #[tracing::instrument(skip_all, fields(flow = ?flow))]
    pub async fn sign_in(
        &self,
        flow: LoginFlow,
        method: SignInMethod,
    ) -> Result<SignInOutcome, SignInError> {
        let identity = self.authenticate(flow, method).await?;

        let profile: Option<Customer> = self
            .store
            .get_as(Collection::Customers, identity.uid.as_str())
            .await?;

        let outcome = match (flow, profile) {
            (_, Some(_)) => {
                self.validity.send_replace(true);
                SignInOutcome::GrantedExisting
            }
            (LoginFlow::Login, None) => {
                tracing::info!(customer = %identity.uid, "no profile for login, signing out");
                self.auth.sign_out().await?;
                SignInOutcome::NeedsSignup
            }
            (LoginFlow::SignUp, None) => {
                self.create_profile(&identity).await;
                self.validity.send_replace(true);
                SignInOutcome::Granted
            }
        };

        Ok(outcome)
    }

    /// Passthrough to the provider's password-reset email.
    ///
    /// # Errors
    ///
    /// Provider errors pass through unchanged.
    pub async fn send_password_reset(&self, email: &Email) -> Result<(), SignInError> {
        self.auth.send_password_reset(email).await?;
        Ok(())
    }

    async fn authenticate(
        &self,
        flow: LoginFlow,
        method: SignInMethod,
    ) -> Result<Identity, AuthError> {
        match method {
            SignInMethod::Popup(provider) => self.auth.sign_in_with_popup(provider).await,
            SignInMethod::Email { email, password } => match flow {
                LoginFlow::Login => self.auth.sign_in_with_email(&email, &password).await,
                LoginFlow::SignUp => self.auth.create_user_with_email(&email, &password).await,
            },
        }
    }

    /// Write the fresh `{createdOn}` profile document. The account is
    /// granted either way; a failed write only loses the profile defaults.
    async fn create_profile(&self, identity: &Identity) {
        let result = self
            .store
            .set_json(
                Collection::Customers,
                identity.uid.as_str(),
                &Customer::created_now(),
            )
            .await;
        if let Err(error) = result {
            tracing::warn!(%error, customer = %identity.uid, "profile creation failed");
        }
    }
}

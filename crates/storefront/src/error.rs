//! Crate-wide error type.
//!
//! Each service module carries its own error enum; this umbrella exists
//! for hosts that want a single error type at the embedding boundary.

use thiserror::Error;

use crate::auth::AuthError;
use crate::checkout::CheckoutError;
use crate::config::ConfigError;
use crate::documents::DocumentError;
use crate::payments::{GatewayError, IntentError};
use crate::session::SignInError;

/// Any storefront error.
#[derive(Debug, Error)]
pub enum StorefrontError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Intent(#[from] IntentError),

    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    #[error(transparent)]
    SignIn(#[from] SignInError),
}

/// Convenience alias for fallible storefront operations.
pub type Result<T> = std::result::Result<T, StorefrontError>;

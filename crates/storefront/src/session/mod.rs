//! Current-session projection and login policy.
//!
//! Two concerns the auth provider does not cover on its own:
//!
//! - [`SessionProjection`] joins the provider's identity stream with a live
//!   subscription to the matching customer profile document, emitting one
//!   deduplicated session value.
//! - [`SessionPolicy`] decides whether a freshly signed-in account may
//!   proceed, based on whether a profile document exists for it.

mod policy;
mod projection;

pub use policy::{LoginFlow, SessionPolicy, SignInError, SignInMethod, SignInOutcome};
pub use projection::SessionProjection;

use crate::auth::Identity;
use crate::documents::Customer;

/// The signed-in session as the rest of the storefront consumes it.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub identity: Identity,
    /// The customer's profile document, when one exists.
    pub profile: Option<Customer>,
}

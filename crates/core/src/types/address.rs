//! Billing and shipping address types.
//!
//! Addresses come in two shapes: [`AddressDraft`] is the loosely-typed form
//! state the UI edits (every field a plain string, possibly empty), and
//! [`Address`] is the validated record persisted on orders and customer
//! profiles. `line2` is the only optional field; everything else is
//! required and must be non-empty.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::email::{Email, EmailError};

/// Errors produced when validating an address draft.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// A required field is empty.
    #[error("required field is empty: {0}")]
    MissingField(&'static str),

    /// The email field does not parse.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),
}

/// A validated billing or shipping address.
///
/// Serialized camelCase to match the document shape the hosted store
/// already holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub phone: String,
    pub city: String,
    pub zip: String,
    pub country: String,
    pub line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
}

impl Address {
    /// Full name as attached to the payment gateway's billing details.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Unvalidated address form state.
///
/// All fields are plain strings so the UI can bind to them directly;
/// [`AddressDraft::validate`] produces an [`Address`] or names the first
/// field that fails.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AddressDraft {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub city: String,
    pub zip: String,
    pub country: String,
    pub line1: String,
    pub line2: String,
}

impl AddressDraft {
    /// Validate the draft into an [`Address`].
    ///
    /// # Errors
    ///
    /// Returns `AddressError::MissingField` naming the first empty required
    /// field, or `AddressError::InvalidEmail` if the email does not parse.
    pub fn validate(&self) -> Result<Address, AddressError> {
        let required = [
            ("firstName", &self.first_name),
            ("lastName", &self.last_name),
            ("phone", &self.phone),
            ("city", &self.city),
            ("zip", &self.zip),
            ("country", &self.country),
            ("line1", &self.line1),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(AddressError::MissingField(name));
            }
        }

        let email = Email::parse(self.email.trim())?;

        Ok(Address {
            first_name: self.first_name.trim().to_owned(),
            last_name: self.last_name.trim().to_owned(),
            email,
            phone: self.phone.trim().to_owned(),
            city: self.city.trim().to_owned(),
            zip: self.zip.trim().to_owned(),
            country: self.country.trim().to_owned(),
            line1: self.line1.trim().to_owned(),
            line2: match self.line2.trim() {
                "" => None,
                line2 => Some(line2.to_owned()),
            },
        })
    }
}

impl From<Address> for AddressDraft {
    fn from(address: Address) -> Self {
        Self {
            first_name: address.first_name,
            last_name: address.last_name,
            email: address.email.into_string(),
            phone: address.phone,
            city: address.city,
            zip: address.zip,
            country: address.country,
            line1: address.line1,
            line2: address.line2.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> AddressDraft {
        AddressDraft {
            first_name: "A".into(),
            last_name: "B".into(),
            email: "a@b.com".into(),
            phone: "555-0100".into(),
            city: "Zagreb".into(),
            zip: "10000".into(),
            country: "HR".into(),
            line1: "Main St 1".into(),
            line2: String::new(),
        }
    }

    #[test]
    fn test_valid_draft_produces_address() {
        let address = draft().validate().unwrap();
        assert_eq!(address.full_name(), "A B");
        assert_eq!(address.line2, None);
    }

    #[test]
    fn test_missing_required_field_names_it() {
        let mut d = draft();
        d.city = "  ".into();
        assert_eq!(
            d.validate().unwrap_err(),
            AddressError::MissingField("city")
        );
    }

    #[test]
    fn test_invalid_email_rejected() {
        let mut d = draft();
        d.email = "not-an-email".into();
        assert!(matches!(
            d.validate().unwrap_err(),
            AddressError::InvalidEmail(_)
        ));
    }

    #[test]
    fn test_line2_is_optional_but_kept_when_present() {
        let mut d = draft();
        d.line2 = "Apt 4".into();
        let address = d.validate().unwrap();
        assert_eq!(address.line2.as_deref(), Some("Apt 4"));
    }

    #[test]
    fn test_address_serializes_camel_case_without_empty_line2() {
        let address = draft().validate().unwrap();
        let json = serde_json::to_value(&address).unwrap();
        assert_eq!(json["firstName"], "A");
        assert!(json.get("line2").is_none());
    }
}

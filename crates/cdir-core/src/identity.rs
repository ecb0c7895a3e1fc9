//! # Identifier Newtypes
//!
//! Validated identifiers used across the directory crates. A
//! [`PhoneNumber`] is always E.164; an [`IdentifierType`] is always a plain
//! token that can appear on the left of a `type:identifier` query.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Implements `Deserialize` for string newtypes by routing the raw string
/// through the type's validating `new()` constructor.
macro_rules! impl_validating_deserialize {
    ($ty:ident) => {
        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let raw = String::deserialize(deserializer)?;
                Self::new(raw).map_err(serde::de::Error::custom)
            }
        }
    };
}

/// Maximum number of digits in an E.164 number.
const E164_MAX_DIGITS: usize = 15;

/// Minimum number of digits accepted (country code plus one digit).
const E164_MIN_DIGITS: usize = 2;

/// An E.164 phone number.
///
/// The leading `+` is optional. The number keeps the spelling it was
/// constructed with (so resolution records echo the caller's identifier);
/// [`PhoneNumber::digits`] gives the normalized key used for caching and
/// profile naming.
///
/// # Validation
///
/// - Optional leading `+`
/// - 2 to 15 ASCII digits
/// - First digit is 1-9
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PhoneNumber(String);

impl_validating_deserialize!(PhoneNumber);

impl PhoneNumber {
    /// Create a phone number, validating E.164 format.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidPhoneNumber`] if the value is not
    /// E.164.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        if !Self::is_e164(&s) {
            return Err(ValidationError::InvalidPhoneNumber(s));
        }
        Ok(Self(s))
    }

    /// Check E.164 format without constructing.
    pub fn is_e164(value: &str) -> bool {
        let digits = value.strip_prefix('+').unwrap_or(value);
        (E164_MIN_DIGITS..=E164_MAX_DIGITS).contains(&digits.len())
            && digits.bytes().all(|b| b.is_ascii_digit())
            && !digits.starts_with('0')
    }

    /// The number as given by the caller.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The number with everything except digits removed.
    pub fn digits(&self) -> &str {
        self.0.strip_prefix('+').unwrap_or(&self.0)
    }
}

impl std::fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The category key of an identifier (`"tel"`, `"eur"`).
///
/// Must be non-empty and must not contain whitespace or `:`, since it is
/// parsed out of `type:identifier` queries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct IdentifierType(String);

impl_validating_deserialize!(IdentifierType);

impl IdentifierType {
    /// Create an identifier type, validating that it is a plain token.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyIdentifierType`] for an empty value,
    /// [`ValidationError::InvalidIdentifierType`] when it contains `:` or
    /// whitespace.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        if s.is_empty() {
            return Err(ValidationError::EmptyIdentifierType);
        }
        if s.chars().any(|c| c == ':' || c.is_whitespace()) {
            return Err(ValidationError::InvalidIdentifierType(s));
        }
        Ok(Self(s))
    }

    /// Access the type key.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for IdentifierType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::borrow::Borrow<str> for IdentifierType {
    fn borrow(&self) -> &str {
        &self.0
    }
}

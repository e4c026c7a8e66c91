use crate::error::{ValidationError, ValidationErrors};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt::Display;

/// Length of every system-generated short code.
pub const GENERATED_LENGTH: usize = 6;
pub const MIN_CUSTOM_LENGTH: usize = 3;
pub const MAX_CUSTOM_LENGTH: usize = 20;

/// A validated short code identifier for a shortened URL.
///
/// Short codes contain only ASCII letters and digits. Custom codes are
/// 3-20 characters long; generated codes are always 6, which falls inside
/// the same range, so one set of rules covers both.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ShortCode(String);

impl ShortCode {
    /// Creates a new `ShortCode` after validating the input.
    ///
    /// Format and length are checked independently, so a code that is both
    /// too short and contains a symbol reports both problems.
    pub fn new(code: impl Into<String>) -> Result<Self, ValidationErrors> {
        let code = code.into();
        match ValidationErrors::from_vec(Self::check(&code)) {
            Some(errors) => Err(errors),
            None => Ok(Self(code)),
        }
    }

    /// Creates a `ShortCode` without validation.
    ///
    /// Use this only for codes produced by trusted internal sources
    /// (e.g. generators that are guaranteed to produce valid output).
    pub fn new_unchecked(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Returns every rule `code` breaks, empty if it is a valid short code.
    pub fn check(code: &str) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if code.is_empty() || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            errors.push(ValidationError::InvalidCodeFormat(code.to_string()));
        }

        let len = code.chars().count();
        if !(MIN_CUSTOM_LENGTH..=MAX_CUSTOM_LENGTH).contains(&len) {
            errors.push(ValidationError::InvalidCodeLength(len));
        }

        errors
    }

    /// Generates the full shortened URL based on the provided base URL.
    pub fn to_url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self)
    }

    /// Returns the short code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ShortCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ShortCode {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ShortCode {
    type Error = ValidationErrors;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ShortCode> for String {
    fn from(value: ShortCode) -> Self {
        value.0
    }
}

//! Validation Rules - pure field checks shared by every intake endpoint.
//!
//! Each rule takes the raw (optional) request value and returns either the
//! normalized value to store or a [`ValidationError`] naming the field.

use lazy_static::lazy_static;
use regex::Regex;

/// Only these mailbox providers are accepted. Matched as a literal suffix
/// of the lowercased address.
pub const ALLOWED_EMAIL_DOMAINS: &[&str] = &["@gmail.com", "@yahoo.com"];

lazy_static! {
    static ref NON_DIGIT: Regex = Regex::new(r"[^0-9]").unwrap();
    static ref TEN_DIGITS: Regex = Regex::new(r"^[0-9]{10}$").unwrap();
}

/// A client-caused input problem. The message is safe to show in a form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ValidationError(String);

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

/// Required text field: present and non-empty after trimming. Returns the
/// trimmed value.
pub fn required(value: Option<&str>, label: &str) -> Result<String, ValidationError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(ValidationError::new(format!("{} is required", label))),
    }
}

/// Optional text field, trimmed; absent becomes an empty string.
pub fn optional(value: Option<&str>) -> String {
    value.map(str::trim).unwrap_or_default().to_string()
}

/// Required email on the provider allow-list, lowercased.
pub fn email(value: Option<&str>) -> Result<String, ValidationError> {
    let email = required(value, "Email")?.to_lowercase();

    if ALLOWED_EMAIL_DOMAINS
        .iter()
        .any(|domain| email.ends_with(domain))
    {
        Ok(email)
    } else {
        Err(ValidationError::new(
            "Email must end with @gmail.com or @yahoo.com",
        ))
    }
}

/// Optional phone. Only an absent or empty value skips the check; anything
/// else, whitespace included, must contain exactly ten digits. The submitted
/// formatting is kept (trimmed).
pub fn phone(value: Option<&str>) -> Result<String, ValidationError> {
    let raw = match value {
        None | Some("") => return Ok(String::new()),
        Some(raw) => raw,
    };

    let digits = NON_DIGIT.replace_all(raw, "");
    if TEN_DIGITS.is_match(&digits) {
        Ok(raw.trim().to_string())
    } else {
        Err(ValidationError::new("Phone number must be 10 digits"))
    }
}

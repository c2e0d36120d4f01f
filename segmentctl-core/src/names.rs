//! Validated segment names and user fields
//!
//! Segment names look like `AVITO_VOICE_MESSAGES` or `promo-2023.q3`:
//! ASCII alphanumeric start, then alphanumerics, `_`, `-` or `.`.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ValidationError;

/// Maximum length for segment names
pub const MAX_SEGMENT_NAME_LEN: usize = 128;

/// Maximum length for usernames (matches the `VARCHAR(128)` column)
pub const MAX_USERNAME_LEN: usize = 128;

static SEGMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.-]*$").expect("invalid segment regex"));

/// Validated segment name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SegmentName(String);

impl SegmentName {
    /// Create a segment name, rejecting blank or malformed input.
    ///
    /// # Example
    /// ```
    /// use segmentctl_core::SegmentName;
    ///
    /// assert!(SegmentName::new("AVITO_VOICE_MESSAGES").is_ok());
    /// assert!(SegmentName::new("  ").is_err());
    /// assert!(SegmentName::new("_leading").is_err());
    /// ```
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        if s.trim().is_empty() {
            return Err(ValidationError::Empty {
                field: "segment name",
            });
        }

        if s.len() > MAX_SEGMENT_NAME_LEN {
            return Err(ValidationError::TooLong {
                field: "segment name",
                max: MAX_SEGMENT_NAME_LEN,
            });
        }

        if !SEGMENT_RE.is_match(s) {
            return Err(ValidationError::InvalidFormat {
                field: "segment name",
                reason: "must start with a letter or digit and contain only letters, digits, '_', '-' or '.'",
            });
        }

        Ok(Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for SegmentName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SegmentName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validated display fields for creating or updating a user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserFields {
    pub firstname: String,
    pub lastname: String,
    pub username: String,
}

impl UserFields {
    /// Trim and validate all three fields.
    pub fn new(firstname: &str, lastname: &str, username: &str) -> Result<Self, ValidationError> {
        let firstname = required("firstname", firstname)?;
        let lastname = required("lastname", lastname)?;
        let username = required("username", username)?;

        if username.chars().count() > MAX_USERNAME_LEN {
            return Err(ValidationError::TooLong {
                field: "username",
                max: MAX_USERNAME_LEN,
            });
        }

        Ok(Self {
            firstname,
            lastname,
            username,
        })
    }
}

fn required(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty { field });
    }
    Ok(trimmed.to_owned())
}

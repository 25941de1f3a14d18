//! Content rows and content keys.
//!
//! Every piece of editable site copy lives in one generic key-value table.
//! A row is addressed by its [`ContentKey`]; auxiliary per-section data is
//! stored under derived keys (`<key>_extra`, `<key>_style`) that belong to
//! the same section as their base key.

use core::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Suffixes of keys that inherit edit permission from their base key.
pub const DERIVED_KEY_SUFFIXES: &[&str] = &["_extra", "_style"];

/// Key of the row holding the admin access policy document.
pub const POLICY_KEY: &str = "admin_policy";

/// Prefix of rows holding contact-form inquiries.
pub const INQUIRY_KEY_PREFIX: &str = "inquiry_";

/// Key edited when a request does not name one.
pub const DEFAULT_CONTENT_KEY: &str = "home";

/// Returns the base key of a derived key, or `None` if `key` has no
/// recognized derived suffix.
///
/// ```
/// use mrtc_core::base_key;
///
/// assert_eq!(base_key("company_extra"), Some("company"));
/// assert_eq!(base_key("home_style"), Some("home"));
/// assert_eq!(base_key("company"), None);
/// ```
#[must_use]
pub fn base_key(key: &str) -> Option<&str> {
    DERIVED_KEY_SUFFIXES
        .iter()
        .find_map(|suffix| key.strip_suffix(suffix))
}

/// Errors that can occur when parsing a [`ContentKey`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ContentKeyError {
    /// The input string is empty.
    #[error("content key cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("content key must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains a character outside `[A-Za-z0-9_-]`.
    #[error("content key contains invalid character {0:?}")]
    InvalidCharacter(char),
}

/// A validated content key.
///
/// ## Constraints
///
/// - Length: 1-128 characters
/// - Characters: ASCII letters, digits, `_` and `-`
///
/// ```
/// use mrtc_core::ContentKey;
///
/// assert!(ContentKey::parse("air-cleaning").is_ok());
/// assert!(ContentKey::parse("company_extra").is_ok());
/// assert!(ContentKey::parse("").is_err());
/// assert!(ContentKey::parse("../etc").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "String", into = "String")]
pub struct ContentKey(String);

impl ContentKey {
    /// Maximum length of a content key.
    pub const MAX_LENGTH: usize = 128;

    /// Parse a `ContentKey` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, longer than 128 characters, or
    /// contains a character outside `[A-Za-z0-9_-]`.
    pub fn parse(s: &str) -> Result<Self, ContentKeyError> {
        if s.is_empty() {
            return Err(ContentKeyError::Empty);
        }

        if s.len() > Self::MAX_LENGTH {
            return Err(ContentKeyError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        if let Some(c) = s
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
        {
            return Err(ContentKeyError::InvalidCharacter(c));
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the key and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Whether the key is reserved for system rows that must not be written
    /// through the generic content API.
    #[must_use]
    pub fn is_reserved(&self) -> bool {
        self.0 == POLICY_KEY || self.0.starts_with(INQUIRY_KEY_PREFIX)
    }
}

impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for ContentKey {
    type Err = ContentKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ContentKey {
    type Error = ContentKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ContentKey> for String {
    fn from(key: ContentKey) -> Self {
        key.0
    }
}

impl AsRef<str> for ContentKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One row of the content table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct ContentEntry {
    pub key: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub hero_image_url: String,
    /// Set by the store on write; ignored on input.
    #[serde(default, skip_deserializing)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ContentEntry {
    /// An empty row for `key`, returned when nothing is stored yet.
    #[must_use]
    pub fn empty(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            title: String::new(),
            subtitle: String::new(),
            body: String::new(),
            hero_image_url: String::new(),
            updated_at: None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_base_key_strips_known_suffixes() {
        assert_eq!(base_key("support_extra"), Some("support"));
        assert_eq!(base_key("air-cleaning_style"), Some("air-cleaning"));
        assert_eq!(base_key("_extra"), Some(""));
    }

    #[test]
    fn test_base_key_ignores_other_keys() {
        assert_eq!(base_key("company"), None);
        assert_eq!(base_key("company_extras"), None);
        assert_eq!(base_key("extra"), None);
    }

    #[test]
    fn test_parse_valid_keys() {
        assert!(ContentKey::parse("home").is_ok());
        assert!(ContentKey::parse("special-sale").is_ok());
        assert!(ContentKey::parse("inquiry_1760000000000").is_ok());
    }

    #[test]
    fn test_parse_invalid_keys() {
        assert_eq!(ContentKey::parse(""), Err(ContentKeyError::Empty));
        assert_eq!(
            ContentKey::parse("a b"),
            Err(ContentKeyError::InvalidCharacter(' '))
        );
        assert!(matches!(
            ContentKey::parse(&"k".repeat(129)),
            Err(ContentKeyError::TooLong { max: 128 })
        ));
    }

    #[test]
    fn test_reserved_keys() {
        assert!(ContentKey::parse(POLICY_KEY).unwrap().is_reserved());
        assert!(ContentKey::parse("inquiry_42").unwrap().is_reserved());
        assert!(!ContentKey::parse("home").unwrap().is_reserved());
    }

    #[test]
    fn test_entry_deserialize_defaults() {
        let entry: ContentEntry = serde_json::from_str(r#"{"key":"home","title":"t"}"#).unwrap();
        assert_eq!(entry.key, "home");
        assert_eq!(entry.title, "t");
        assert!(entry.body.is_empty());
        assert!(entry.updated_at.is_none());
    }
}

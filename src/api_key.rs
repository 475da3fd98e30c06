//! Riot developer API key.
//!
//! Keys look like `RGAPI-xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx` with hex
//! groups. Only the format is checked; whether the key is live is up to the
//! remote service.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Length of a well-formed key.
pub const API_KEY_LEN: usize = 42;

static API_KEY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^RGAPI-[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$",
    )
    .expect("API key pattern is valid")
});

// ============================================================================
// ApiKey
// ============================================================================

/// A format-checked API key.
///
/// `Debug` output hides everything after the prefix.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ApiKey(String);

impl ApiKey {
    /// Validates and wraps a key.
    ///
    /// Surrounding whitespace is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidApiKey`] if the format does not match.
    pub fn parse(key: &str) -> Result<Self> {
        let key = key.trim();
        if key.len() == API_KEY_LEN && API_KEY_PATTERN.is_match(key) {
            Ok(Self(key.to_string()))
        } else {
            Err(Error::InvalidApiKey)
        }
    }

    /// Returns `true` if `key` is well formed.
    #[inline]
    #[must_use]
    pub fn is_valid(key: &str) -> bool {
        Self::parse(key).is_ok()
    }

    /// Returns the key text.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ApiKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ApiKey").field(&"RGAPI-****").finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = "RGAPI-0123abcd-ABCD-ef01-2345-6789abcdef01";

    #[test]
    fn test_accepts_well_formed_key() {
        let key = ApiKey::parse(VALID).unwrap();
        assert_eq!(key.as_str(), VALID);
        assert_eq!(VALID.len(), API_KEY_LEN);
    }

    #[test]
    fn test_trims_whitespace() {
        let key: ApiKey = format!("  {VALID}\n").parse().unwrap();
        assert_eq!(key.as_str(), VALID);
    }

    #[test]
    fn test_rejects_malformed_keys() {
        for bad in [
            "",
            "RGAPI-",
            "rgapi-0123abcd-ABCD-ef01-2345-6789abcdef01",
            "RGAPI-0123abcg-ABCD-ef01-2345-6789abcdef01",
            "RGAPI-0123abcd-ABCD-ef01-2345-6789abcdef0",
            "RGAPI-0123abcd-ABCD-ef01-2345-6789abcdef012",
            "RGAPI-0123abcdABCD-ef01-2345-6789abcdef01",
        ] {
            assert!(matches!(ApiKey::parse(bad), Err(Error::InvalidApiKey)), "{bad}");
            assert!(!ApiKey::is_valid(bad));
        }
    }

    #[test]
    fn test_debug_redacts() {
        let key = ApiKey::parse(VALID).unwrap();
        let rendered = format!("{key:?}");
        assert!(!rendered.contains("0123abcd"));
        assert!(rendered.contains("RGAPI-****"));
    }
}

//! # Reference Codes
//!
//! Validated newtypes for the two code systems the engine keys on:
//!
//! - [`ClassificationCode`]: hierarchical commodity nomenclature code
//!   (2 to 10 digits). Shorter prefixes denote broader categories; parents
//!   are derived by truncation and never stored as a graph.
//! - [`CountryCode`]: ISO 3166 country code, stored upper-cased.
//!
//! ## Prefix Fallback
//!
//! [`prefix_chain`] yields the candidate codes for tariff resolution: the
//! trimmed input, then the input with the trailing two characters dropped,
//! and so on while at least [`MIN_RESOLVABLE_LEN`] characters remain. It
//! operates on raw request text, so it counts characters rather than bytes
//! and never panics on non-ASCII input.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Shortest code the resolver will look up. Two-digit chapters and
/// remaining odd fragments are never matched.
pub const MIN_RESOLVABLE_LEN: usize = 4;

/// Characters dropped per fallback step.
const FALLBACK_STEP: usize = 2;

/// Deserialize through the validating constructor so reference files cannot
/// smuggle in malformed codes.
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

// ---------------------------------------------------------------------------
// Classification codes
// ---------------------------------------------------------------------------

/// A commodity classification code (e.g. `8703231199`).
///
/// # Validation
///
/// - Surrounding whitespace is trimmed.
/// - 2 to 10 characters, all ASCII digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ClassificationCode(String);

impl_validating_deserialize!(ClassificationCode);

impl ClassificationCode {
    /// Create a classification code, validating format.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidClassificationCode`] if the trimmed
    /// value is not 2-10 ASCII digits.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let raw = value.into();
        let trimmed = raw.trim();
        let valid =
            (2..=10).contains(&trimmed.len()) && trimmed.bytes().all(|b| b.is_ascii_digit());
        if !valid {
            return Err(ValidationError::InvalidClassificationCode(raw));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Access the code string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of digits in the code.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; a valid code has at least two digits.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether this code falls under `prefix` (inclusive of equality).
    pub fn starts_with(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix)
    }

    /// The next broader code in the fallback chain, if it is still
    /// resolvable.
    pub fn parent(&self) -> Option<ClassificationCode> {
        let mut chain = prefix_chain(&self.0);
        chain.next();
        chain.next().map(|p| Self(p.to_string()))
    }
}

impl std::fmt::Display for ClassificationCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ClassificationCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Iterator over the prefix-fallback candidates of a raw code.
#[derive(Debug, Clone)]
pub struct PrefixChain<'a> {
    current: Option<&'a str>,
}

/// Candidate codes for prefix-fallback resolution, narrowest first.
///
/// ```
/// use duty_core::prefix_chain;
/// let chain: Vec<&str> = prefix_chain(" 8703231199 ").collect();
/// assert_eq!(chain, ["8703231199", "87032311", "870323", "8703"]);
/// ```
pub fn prefix_chain(raw: &str) -> PrefixChain<'_> {
    PrefixChain {
        current: Some(raw.trim()),
    }
}

impl<'a> Iterator for PrefixChain<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let current = self.current?;
        if current.chars().count() < MIN_RESOLVABLE_LEN {
            self.current = None;
            return None;
        }
        self.current = Some(drop_trailing_chars(current, FALLBACK_STEP));
        Some(current)
    }
}

fn drop_trailing_chars(s: &str, n: usize) -> &str {
    let mut end = s.len();
    for (idx, _) in s.char_indices().rev().take(n) {
        end = idx;
    }
    &s[..end]
}

// ---------------------------------------------------------------------------
// Country codes
// ---------------------------------------------------------------------------

/// ISO 3166 country code, upper-cased at construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CountryCode(String);

impl_validating_deserialize!(CountryCode);

impl CountryCode {
    /// Create a country code, normalizing case.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidCountryCode`] unless the trimmed
    /// value is 2 or 3 ASCII letters.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let raw = value.into();
        let trimmed = raw.trim();
        let valid =
            (2..=3).contains(&trimmed.len()) && trimmed.bytes().all(|b| b.is_ascii_alphabetic());
        if !valid {
            return Err(ValidationError::InvalidCountryCode(raw));
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    /// Access the upper-cased code.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CountryCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_code_trims_and_accepts_digits() {
        let code = ClassificationCode::new(" 870323 ").unwrap();
        assert_eq!(code.as_str(), "870323");
        assert_eq!(code.len(), 6);
    }

    #[test]
    fn classification_code_rejects_letters_and_bad_lengths() {
        assert!(ClassificationCode::new("87A3").is_err());
        assert!(ClassificationCode::new("8").is_err());
        assert!(ClassificationCode::new("87032311990").is_err());
        assert!(ClassificationCode::new("").is_err());
    }

    #[test]
    fn classification_code_deserialize_validates() {
        let ok: ClassificationCode = serde_json::from_str("\"4011\"").unwrap();
        assert_eq!(ok.as_str(), "4011");
        let bad: Result<ClassificationCode, _> = serde_json::from_str("\"tires\"");
        assert!(bad.is_err());
    }

    #[test]
    fn parent_walks_two_digits() {
        let code = ClassificationCode::new("8703231199").unwrap();
        assert_eq!(code.parent().unwrap().as_str(), "87032311");
        let heading = ClassificationCode::new("8703").unwrap();
        assert!(heading.parent().is_none());
    }

    #[test]
    fn prefix_chain_stops_below_four() {
        let chain: Vec<&str> = prefix_chain("870323").collect();
        assert_eq!(chain, ["870323", "8703"]);
    }

    #[test]
    fn prefix_chain_odd_length() {
        let chain: Vec<&str> = prefix_chain("87032").collect();
        assert_eq!(chain, ["87032"]);
    }

    #[test]
    fn prefix_chain_short_input_is_empty() {
        assert_eq!(prefix_chain("870").count(), 0);
        assert_eq!(prefix_chain("   ").count(), 0);
    }

    #[test]
    fn prefix_chain_handles_multibyte_input() {
        let chain: Vec<&str> = prefix_chain("кодек12").collect();
        assert_eq!(chain, ["кодек12", "кодек"]);
    }

    #[test]
    fn country_code_uppercases() {
        let c = CountryCode::new("kz").unwrap();
        assert_eq!(c.as_str(), "KZ");
        assert!(CountryCode::new("K1").is_err());
        assert!(CountryCode::new("KAZAK").is_err());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn chain_is_strictly_narrowing(code in "[0-9]{4,10}") {
                let chain: Vec<&str> = prefix_chain(&code).collect();
                prop_assert_eq!(chain[0], code.as_str());
                for pair in chain.windows(2) {
                    prop_assert!(pair[0].starts_with(pair[1]));
                    prop_assert_eq!(pair[0].len(), pair[1].len() + 2);
                }
                prop_assert!(chain.iter().all(|c| c.len() >= MIN_RESOLVABLE_LEN));
            }

            #[test]
            fn chain_never_panics(raw in "\\PC{0,16}") {
                let _ = prefix_chain(&raw).count();
            }
        }
    }
}

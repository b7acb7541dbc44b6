//! # Validation Errors
//!
//! Errors raised when reference data enters the system through a validated
//! newtype or rate check. Loading errors (I/O, parse, consistency) live with
//! the loaders in `duty-engine`.
//!
//! The calculation path itself never fails outward: missing reference data
//! degrades to a structured result.

use thiserror::Error;

/// Validation errors for domain primitive newtypes.
///
/// Each carries the rejected input so operators can see which reference
/// row was malformed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Classification code is not 2 to 10 ASCII digits.
    #[error("invalid classification code: \"{0}\" (expected 2-10 digits)")]
    InvalidClassificationCode(String),

    /// Country code is not a 2 or 3 letter ISO code.
    #[error("invalid country code: \"{0}\" (expected ISO 3166 alpha-2 or alpha-3)")]
    InvalidCountryCode(String),

    /// A rate percentage or amount is negative or not finite.
    #[error("invalid rate value for {field}: {value}")]
    InvalidRateValue {
        /// The offending field.
        field: &'static str,
        /// The rejected value.
        value: f64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_error_carries_input() {
        let err = ValidationError::InvalidClassificationCode("87x".into());
        assert!(err.to_string().contains("87x"));
        assert_eq!(err.clone(), err);
    }

    #[test]
    fn rate_value_error_names_field() {
        let err = ValidationError::InvalidRateValue {
            field: "percent",
            value: -1.0,
        };
        assert_eq!(err.to_string(), "invalid rate value for percent: -1");
    }
}

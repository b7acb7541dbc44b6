//! # Rate-String Decoder
//!
//! Tariff tables publish rates as free text in Russian or Uzbek:
//!
//! | Cell | Decoded |
//! |------|---------|
//! | `15` | 15% ad valorem |
//! | `10 + 0.5 долл. США за 1 кг` | 10% plus $0.5/kg |
//! | `20, но не менее 3 долл. США за 1 шт` | greater of 20% or $3/pcs |
//! | `30 лекин 1 ақш доллари 1 кг учун кам бўлмаган` | greater of 30% or $1/kg |
//!
//! ## Algorithm
//!
//! 1. Strip `*`, trim, lower-case, and read `,` as a decimal point.
//! 2. The leading number is the percentage (0 if none).
//! 3. A purely numeric cell, with or without a trailing `%`, is
//!    percentage-only.
//! 4. `+` marks a sum; a "no less than" marker (`менее`, `лекин`, `кам`)
//!    marks greater-of; anything else is percentage-only.
//! 5. The per-unit amount is the number directly before a currency marker
//!    (`дол`, `usd`, `ақш`); 0 when absent.
//! 6. The per-unit unit is the whole cell run through
//!    [`normalize_unit`](duty_core::normalize_unit).
//!
//! Decoding never fails. Cells that cannot be fully understood degrade to a
//! zero or percentage-only rate. [`decode_rate_string_checked`] reports what
//! was lost so ingestion can audit it.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use thiserror::Error;

use duty_core::{normalize_unit, resolve_unit, Currency, RateKind, RateSpec};

/// Markers for "no less than" in Russian and Uzbek.
const GREATER_OF_MARKERS: &[&str] = &["менее", "лекин", "кам"];

static LEADING_NUMBER: OnceLock<Option<Regex>> = OnceLock::new();
static PER_UNIT_AMOUNT: OnceLock<Option<Regex>> = OnceLock::new();

fn leading_number() -> Option<&'static Regex> {
    LEADING_NUMBER
        .get_or_init(|| Regex::new(r"^([0-9]+(?:\.[0-9]+)?)").ok())
        .as_ref()
}

fn per_unit_amount() -> Option<&'static Regex> {
    PER_UNIT_AMOUNT
        .get_or_init(|| {
            Regex::new(r"([0-9]+(?:\.[0-9]+)?)\s*(?:дол|usd|ақш)").ok()
        })
        .as_ref()
}

/// What a degraded decode lost.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "issue", content = "text", rename_all = "snake_case")]
pub enum DecodeIssue {
    /// The cell was empty.
    #[error("empty rate cell")]
    Empty,
    /// No leading number; the percentage was taken as 0.
    #[error("no leading percentage in \"{0}\"")]
    NoLeadingNumber(String),
    /// Text after the percentage matched no combination marker and was ignored.
    #[error("ignored trailing text in \"{0}\"")]
    IgnoredResidue(String),
    /// A sum or greater-of cell without a currency-marked amount.
    #[error("no per-unit amount in \"{0}\"")]
    MissingPerUnitAmount(String),
    /// The per-unit unit is not one the evaluator can measure.
    #[error("unrecognized unit \"{unit}\" in \"{text}\"")]
    UnrecognizedUnit {
        /// The cleaned cell text.
        text: String,
        /// The normalized unit code.
        unit: String,
    },
}

/// A decoded rate and the first issue found, if any.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedRate {
    pub spec: RateSpec,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue: Option<DecodeIssue>,
}

/// Decode a tariff cell into a [`RateSpec`].
pub fn decode_rate_string(text: &str) -> RateSpec {
    decode_rate_string_checked(text).spec
}

/// Decode a tariff cell, reporting degradation.
pub fn decode_rate_string_checked(text: &str) -> DecodedRate {
    let clean = text.replace('*', "").trim().to_lowercase().replace(',', ".");
    if clean.is_empty() {
        return DecodedRate {
            spec: RateSpec::zero(),
            issue: Some(DecodeIssue::Empty),
        };
    }

    let percent = leading_number()
        .and_then(|re| re.captures(&clean))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok());

    let bare = clean.trim_end_matches('%').trim_end();
    if let Some(pct) = percent.filter(|_| bare.chars().all(|c| c.is_ascii_digit() || c == '.')) {
        return DecodedRate {
            spec: RateSpec::percentage(pct),
            issue: None,
        };
    }

    let percent_or_zero = percent.unwrap_or(0.0);
    let kind = if clean.contains('+') {
        RateKind::Sum
    } else if GREATER_OF_MARKERS.iter().any(|m| clean.contains(m)) {
        RateKind::GreaterOf
    } else {
        let issue = if percent.is_some() {
            DecodeIssue::IgnoredResidue(clean)
        } else {
            DecodeIssue::NoLeadingNumber(clean)
        };
        tracing::debug!(%issue, "rate cell decoded as percentage only");
        return DecodedRate {
            spec: RateSpec::percentage(percent_or_zero),
            issue: Some(issue),
        };
    };

    let amount = per_unit_amount()
        .and_then(|re| re.captures(&clean))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok());
    let unit = normalize_unit(&clean);

    let issue = if percent.is_none() {
        Some(DecodeIssue::NoLeadingNumber(clean.clone()))
    } else if amount.is_none() {
        Some(DecodeIssue::MissingPerUnitAmount(clean.clone()))
    } else if resolve_unit(&unit).is_none() {
        Some(DecodeIssue::UnrecognizedUnit {
            text: clean.clone(),
            unit: unit.clone(),
        })
    } else {
        None
    };
    if let Some(issue) = &issue {
        tracing::debug!(%issue, kind = %kind, "rate cell partially decoded");
    }

    let spec = match kind {
        RateKind::Sum => RateSpec::sum(percent_or_zero, amount.unwrap_or(0.0), unit),
        _ => RateSpec::greater_of(percent_or_zero, amount.unwrap_or(0.0), unit),
    }
    .with_currency(Currency::Usd);

    DecodedRate { spec, issue }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pure_number_is_percentage() {
        let spec = decode_rate_string("15");
        assert_eq!(spec, RateSpec::percentage(15.0));
        assert!(spec.per_unit_unit.is_none());
    }

    #[test]
    fn decimal_comma_and_asterisk() {
        assert_eq!(decode_rate_string(" 7,5* "), RateSpec::percentage(7.5));
    }

    #[test]
    fn percent_sign_is_clean() {
        let decoded = decode_rate_string_checked("15 %");
        assert_eq!(decoded.spec, RateSpec::percentage(15.0));
        assert!(decoded.issue.is_none());
    }

    #[test]
    fn plus_means_sum() {
        let spec = decode_rate_string("10 + 0,5 долл. США за 1 кг");
        assert_eq!(spec.kind, RateKind::Sum);
        assert_eq!(spec.percent, 10.0);
        assert_eq!(spec.per_unit_amount, Some(0.5));
        assert_eq!(spec.per_unit_unit.as_deref(), Some("kg"));
        assert_eq!(spec.per_unit_currency, Currency::Usd);
    }

    #[test]
    fn russian_no_less_than_is_greater_of() {
        let spec = decode_rate_string("20, но не менее 3 долл. США за 1 шт");
        assert_eq!(spec.kind, RateKind::GreaterOf);
        assert_eq!(spec.percent, 20.0);
        assert_eq!(spec.per_unit_amount, Some(3.0));
        assert_eq!(spec.per_unit_unit.as_deref(), Some("pcs"));
    }

    #[test]
    fn uzbek_markers() {
        let spec = decode_rate_string("30 лекин 1 ақш доллари 1 кг учун кам бўлмаган");
        assert_eq!(spec.kind, RateKind::GreaterOf);
        assert_eq!(spec.per_unit_amount, Some(1.0));
        assert_eq!(spec.per_unit_unit.as_deref(), Some("kg"));
    }

    #[test]
    fn usd_marker_in_latin() {
        let spec = decode_rate_string("5 + 2 USD/литр");
        assert_eq!(spec.per_unit_amount, Some(2.0));
        assert_eq!(spec.per_unit_unit.as_deref(), Some("l"));
    }

    #[test]
    fn thousand_units_short_circuit() {
        let spec = decode_rate_string("10, но не менее 5 долл. США за 1000 шт");
        assert_eq!(spec.per_unit_unit.as_deref(), Some("1000_pcs"));
    }

    #[test]
    fn missing_amount_degrades_to_zero() {
        let decoded = decode_rate_string_checked("10 + за 1 кг");
        assert_eq!(decoded.spec.per_unit_amount, Some(0.0));
        assert!(matches!(
            decoded.issue,
            Some(DecodeIssue::MissingPerUnitAmount(_))
        ));
    }

    #[test]
    fn residue_without_marker_is_percentage() {
        let decoded = decode_rate_string_checked("5 (см. примечание)");
        assert_eq!(decoded.spec, RateSpec::percentage(5.0));
        assert!(matches!(
            decoded.issue,
            Some(DecodeIssue::IgnoredResidue(_))
        ));
    }

    #[test]
    fn garbage_is_zero() {
        let decoded = decode_rate_string_checked("свободно");
        assert_eq!(decoded.spec, RateSpec::zero());
        assert!(matches!(
            decoded.issue,
            Some(DecodeIssue::NoLeadingNumber(_))
        ));
    }

    #[test]
    fn empty_is_zero() {
        let decoded = decode_rate_string_checked("  ");
        assert_eq!(decoded.spec, RateSpec::zero());
        assert_eq!(decoded.issue, Some(DecodeIssue::Empty));
    }

    #[test]
    fn unknown_unit_is_reported() {
        let decoded = decode_rate_string_checked("10 + 2 usd per widget");
        assert!(matches!(
            decoded.issue,
            Some(DecodeIssue::UnrecognizedUnit { .. })
        ));
        assert_eq!(decoded.spec.kind, RateKind::Sum);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn never_panics_and_never_negative(text in "\\PC{0,40}") {
                let spec = decode_rate_string(&text);
                prop_assert!(spec.percent >= 0.0);
                prop_assert!(spec.per_unit_amount.unwrap_or(0.0) >= 0.0);
            }

            #[test]
            fn integer_cells_round_trip(pct in 0u32..500) {
                let spec = decode_rate_string(&pct.to_string());
                prop_assert_eq!(spec, RateSpec::percentage(f64::from(pct)));
            }
        }
    }
}

//! # Rate Specifications
//!
//! A [`RateSpec`] is the structured form of one tariff cell: a percentage of
//! customs value, a per-unit amount, or a combination of the two.
//!
//! ## Wire names
//!
//! Kinds serialize under the names used by the source tariff tables
//! (`ad_valorem`, `specific`, `mixed`, `combined`). The aliases
//! `mixed_min`, `percentage`, `per_unit`, `greater_of` and `sum` are accepted
//! on input.
//!
//! ## Currency defaults
//!
//! A per-unit duty amount defaults to USD. Excise amounts are filed in local
//! currency; [`RateSpec::deserialize_excise`] applies the UZS default for
//! those fields.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ValidationError;

/// How the percentage and per-unit terms combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RateKind {
    /// Percentage of customs value only.
    #[default]
    #[serde(rename = "ad_valorem", alias = "percentage")]
    Percentage,
    /// Per-unit amount only.
    #[serde(rename = "specific", alias = "per_unit")]
    PerUnit,
    /// Larger of the percentage and per-unit terms.
    #[serde(rename = "mixed", alias = "mixed_min", alias = "greater_of")]
    GreaterOf,
    /// Percentage term plus per-unit term.
    #[serde(rename = "combined", alias = "sum")]
    Sum,
}

impl RateKind {
    /// Return the wire name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Percentage => "ad_valorem",
            Self::PerUnit => "specific",
            Self::GreaterOf => "mixed",
            Self::Sum => "combined",
        }
    }

    /// Return all rate kinds.
    pub fn all() -> &'static [RateKind] {
        &[Self::Percentage, Self::PerUnit, Self::GreaterOf, Self::Sum]
    }

    /// Whether the per-unit term participates.
    pub fn uses_per_unit(&self) -> bool {
        !matches!(self, Self::Percentage)
    }
}

impl std::fmt::Display for RateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Currency a per-unit amount is denominated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// US dollar.
    #[default]
    Usd,
    /// Uzbek sum (local currency).
    Uzs,
}

impl Currency {
    /// ISO 4217 code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Usd => "USD",
            Self::Uzs => "UZS",
        }
    }

    /// Symbol used in derivation texts.
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Usd => "$",
            Self::Uzs => "сум",
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured rate for one tariff component (duty or excise).
///
/// A [`RateKind::Percentage`] spec ignores the per-unit fields. The other
/// kinds contribute a zero per-unit term when `per_unit_unit` does not
/// resolve to a known unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RateSpecFields")]
pub struct RateSpec {
    /// Combination rule.
    pub kind: RateKind,
    /// Percentage of customs value.
    pub percent: f64,
    /// Amount per unit, if any.
    pub per_unit_amount: Option<f64>,
    /// Currency of `per_unit_amount`.
    pub per_unit_currency: Currency,
    /// Canonical unit code of `per_unit_amount`.
    pub per_unit_unit: Option<String>,
}

impl Default for RateSpec {
    fn default() -> Self {
        Self::zero()
    }
}

impl RateSpec {
    /// A percentage-only rate of zero.
    pub fn zero() -> Self {
        Self::percentage(0.0)
    }

    /// A percentage-only rate.
    pub fn percentage(percent: f64) -> Self {
        Self {
            kind: RateKind::Percentage,
            percent,
            per_unit_amount: None,
            per_unit_currency: Currency::Usd,
            per_unit_unit: None,
        }
    }

    /// A per-unit-only rate.
    pub fn per_unit(amount: f64, currency: Currency, unit: impl Into<String>) -> Self {
        Self {
            kind: RateKind::PerUnit,
            percent: 0.0,
            per_unit_amount: Some(amount),
            per_unit_currency: currency,
            per_unit_unit: Some(unit.into()),
        }
    }

    /// The larger of a percentage and a per-unit term.
    pub fn greater_of(percent: f64, amount: f64, unit: impl Into<String>) -> Self {
        Self::percentage(percent).with_per_unit(RateKind::GreaterOf, amount, unit)
    }

    /// A percentage term plus a per-unit term.
    pub fn sum(percent: f64, amount: f64, unit: impl Into<String>) -> Self {
        Self::percentage(percent).with_per_unit(RateKind::Sum, amount, unit)
    }

    fn with_per_unit(mut self, kind: RateKind, amount: f64, unit: impl Into<String>) -> Self {
        self.kind = kind;
        self.per_unit_amount = Some(amount);
        self.per_unit_unit = Some(unit.into());
        self
    }

    /// Set the per-unit currency.
    pub fn with_currency(mut self, currency: Currency) -> Self {
        self.per_unit_currency = currency;
        self
    }

    /// Reject negative or non-finite values.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidRateValue`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.percent.is_finite() || self.percent < 0.0 {
            return Err(ValidationError::InvalidRateValue {
                field: "percent",
                value: self.percent,
            });
        }
        if let Some(amount) = self.per_unit_amount {
            if !amount.is_finite() || amount < 0.0 {
                return Err(ValidationError::InvalidRateValue {
                    field: "per_unit_amount",
                    value: amount,
                });
            }
        }
        Ok(())
    }

    /// Deserialize an excise spec, defaulting the per-unit currency to UZS.
    pub fn deserialize_excise<'de, D>(deserializer: D) -> Result<RateSpec, D::Error>
    where
        D: Deserializer<'de>,
    {
        let fields = RateSpecFields::deserialize(deserializer)?;
        Ok(fields.into_spec(Currency::Uzs))
    }

    /// A zero excise spec with the local-currency default.
    pub fn excise_none() -> Self {
        Self::zero().with_currency(Currency::Uzs)
    }
}

/// Wire form of [`RateSpec`] with an optional currency, so the default can
/// depend on which component the spec belongs to.
#[derive(Deserialize)]
struct RateSpecFields {
    #[serde(default)]
    kind: RateKind,
    #[serde(default)]
    percent: f64,
    #[serde(default)]
    per_unit_amount: Option<f64>,
    #[serde(default)]
    per_unit_currency: Option<Currency>,
    #[serde(default)]
    per_unit_unit: Option<String>,
}

impl RateSpecFields {
    fn into_spec(self, default_currency: Currency) -> RateSpec {
        RateSpec {
            kind: self.kind,
            percent: self.percent,
            per_unit_amount: self.per_unit_amount,
            per_unit_currency: self.per_unit_currency.unwrap_or(default_currency),
            per_unit_unit: self.per_unit_unit,
        }
    }
}

impl From<RateSpecFields> for RateSpec {
    fn from(fields: RateSpecFields) -> Self {
        fields.into_spec(Currency::Usd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_accepts_aliases() {
        let k: RateKind = serde_json::from_str("\"mixed_min\"").unwrap();
        assert_eq!(k, RateKind::GreaterOf);
        let k: RateKind = serde_json::from_str("\"sum\"").unwrap();
        assert_eq!(k, RateKind::Sum);
        assert_eq!(
            serde_json::to_string(&RateKind::PerUnit).unwrap(),
            "\"specific\""
        );
    }

    #[test]
    fn kind_uses_per_unit() {
        assert!(!RateKind::Percentage.uses_per_unit());
        assert!(RateKind::all()[1..].iter().all(|k| k.uses_per_unit()));
    }

    #[test]
    fn currency_wire_names_and_symbols() {
        assert_eq!(serde_json::to_string(&Currency::Uzs).unwrap(), "\"UZS\"");
        assert_eq!(Currency::Usd.symbol(), "$");
        assert_eq!(Currency::Uzs.symbol(), "сум");
    }

    #[test]
    fn duty_spec_defaults_to_usd() {
        let spec: RateSpec = serde_json::from_str(
            r#"{"kind":"mixed","percent":10,"per_unit_amount":2,"per_unit_unit":"kg"}"#,
        )
        .unwrap();
        assert_eq!(spec.per_unit_currency, Currency::Usd);
        assert_eq!(spec, RateSpec::greater_of(10.0, 2.0, "kg"));
    }

    #[test]
    fn excise_spec_defaults_to_uzs() {
        let mut de = serde_json::Deserializer::from_str(
            r#"{"kind":"specific","per_unit_amount":5000,"per_unit_unit":"l"}"#,
        );
        let spec = RateSpec::deserialize_excise(&mut de).unwrap();
        assert_eq!(spec.per_unit_currency, Currency::Uzs);
        assert_eq!(spec.kind, RateKind::PerUnit);
    }

    #[test]
    fn validate_rejects_negative_values() {
        assert!(RateSpec::percentage(-1.0).validate().is_err());
        assert!(RateSpec::sum(5.0, f64::NAN, "kg").validate().is_err());
        assert!(RateSpec::sum(5.0, 1.0, "kg").validate().is_ok());
    }
}

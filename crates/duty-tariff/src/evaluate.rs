//! # Rate Formula Evaluator
//!
//! Applies a [`RateSpec`] to a customs value and declared quantities.
//!
//! - percentage term = base × percent / 100
//! - per-unit term = per-unit amount (in USD) × declared quantity in the
//!   rate's unit, the quantity selected and scaled through
//!   [`duty_core::units::UNIT_TABLE`]
//!
//! The kind then picks the percentage term, the per-unit term, their sum,
//! or their maximum. A zero amount, zero quantity, unknown unit or
//! non-positive exchange rate contributes zero; nothing divides by zero.

use serde::Serialize;

use duty_core::{format_number, Currency, Quantities, RateKind, RateSpec};

/// Shown when a per-unit rate has no unit.
const UNSPECIFIED_UNIT: &str = "ед.";

/// Result of evaluating one rate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateOutcome {
    /// Combined amount in USD, unrounded.
    pub amount_usd: f64,
    /// Percentage term in USD.
    pub percentage_term_usd: f64,
    /// Per-unit term in USD.
    pub per_unit_term_usd: f64,
    /// Human-readable formula, e.g. `10%, но не менее 2 $/kg`.
    pub derivation: String,
}

impl RateOutcome {
    /// A fixed amount with a custom derivation.
    pub fn fixed(amount_usd: f64, derivation: impl Into<String>) -> Self {
        Self {
            amount_usd,
            percentage_term_usd: 0.0,
            per_unit_term_usd: 0.0,
            derivation: derivation.into(),
        }
    }
}

/// Evaluate `spec` against `base_usd` and `quantities`.
///
/// `usd_rate` is local currency per USD; it converts local-currency per-unit
/// amounts and is never read from ambient state.
pub fn evaluate(
    spec: &RateSpec,
    base_usd: f64,
    quantities: &Quantities,
    usd_rate: f64,
) -> RateOutcome {
    let percentage_term_usd = percentage_term(spec.percent, base_usd);
    let per_unit_term_usd = if spec.kind.uses_per_unit() {
        per_unit_term(spec, quantities, usd_rate)
    } else {
        0.0
    };

    let amount_usd = match spec.kind {
        RateKind::Percentage => percentage_term_usd,
        RateKind::PerUnit => per_unit_term_usd,
        RateKind::Sum => percentage_term_usd + per_unit_term_usd,
        RateKind::GreaterOf => percentage_term_usd.max(per_unit_term_usd),
    };

    RateOutcome {
        amount_usd,
        percentage_term_usd,
        per_unit_term_usd,
        derivation: derivation(spec),
    }
}

fn percentage_term(percent: f64, base_usd: f64) -> f64 {
    if !percent.is_finite() || !base_usd.is_finite() {
        return 0.0;
    }
    base_usd * percent / 100.0
}

fn per_unit_term(spec: &RateSpec, quantities: &Quantities, usd_rate: f64) -> f64 {
    let amount = spec.per_unit_amount.unwrap_or(0.0);
    if !(amount.is_finite() && amount > 0.0) {
        return 0.0;
    }
    let Some(quantity) = spec
        .per_unit_unit
        .as_deref()
        .and_then(|unit| quantities.measure(unit))
    else {
        return 0.0;
    };
    if !(quantity.is_finite() && quantity > 0.0) {
        return 0.0;
    }
    let amount_usd = match spec.per_unit_currency {
        Currency::Usd => amount,
        Currency::Uzs if usd_rate > 0.0 => amount / usd_rate,
        Currency::Uzs => return 0.0,
    };
    amount_usd * quantity
}

/// The formula text for `spec`.
pub fn derivation(spec: &RateSpec) -> String {
    let pct = format_number(spec.percent);
    let per_unit = || {
        format!(
            "{} {}/{}",
            format_number(spec.per_unit_amount.unwrap_or(0.0)),
            spec.per_unit_currency.symbol(),
            spec.per_unit_unit.as_deref().unwrap_or(UNSPECIFIED_UNIT),
        )
    };
    match spec.kind {
        RateKind::Percentage => format!("{pct}%"),
        RateKind::PerUnit => per_unit(),
        RateKind::Sum => format!("{pct}% + {}", per_unit()),
        RateKind::GreaterOf => format!("{pct}%, но не менее {}", per_unit()),
    }
}

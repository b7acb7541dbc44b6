//! # Processing Fee
//!
//! Customs clearance fee as a multiple of the reference unit value, chosen
//! by customs-value bracket. Brackets are half-open `[lower, next lower)`,
//! cover the whole non-negative line, and the first bracket also absorbs
//! negative or non-finite values.

use serde::Serialize;

use duty_core::format_number;

/// One fee bracket: values at or above `lower_usd` (up to the next
/// bracket) pay `multiplier` reference units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeeBracket {
    /// Inclusive lower bound, USD.
    pub lower_usd: f64,
    /// Reference units charged.
    pub multiplier: f64,
}

/// Fee schedule, ascending by lower bound.
pub const FEE_BRACKETS: &[FeeBracket] = &[
    FeeBracket {
        lower_usd: 0.0,
        multiplier: 1.0,
    },
    FeeBracket {
        lower_usd: 10_000.0,
        multiplier: 1.5,
    },
    FeeBracket {
        lower_usd: 20_000.0,
        multiplier: 2.5,
    },
    FeeBracket {
        lower_usd: 40_000.0,
        multiplier: 4.0,
    },
    FeeBracket {
        lower_usd: 60_000.0,
        multiplier: 7.0,
    },
    FeeBracket {
        lower_usd: 100_000.0,
        multiplier: 10.0,
    },
    FeeBracket {
        lower_usd: 200_000.0,
        multiplier: 15.0,
    },
    FeeBracket {
        lower_usd: 500_000.0,
        multiplier: 20.0,
    },
    FeeBracket {
        lower_usd: 1_000_000.0,
        multiplier: 25.0,
    },
];

/// The processing fee for one declaration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessingFee {
    /// Reference units charged.
    pub multiplier: f64,
    /// Fee in local currency.
    pub amount_local: f64,
    /// Fee in USD at the calculation rate.
    pub amount_usd: f64,
    /// Derivation text for the payment line.
    pub description: String,
}

/// Multiplier for a customs value.
pub fn fee_multiplier(customs_value_usd: f64) -> f64 {
    FEE_BRACKETS
        .iter()
        .rev()
        .find(|b| customs_value_usd >= b.lower_usd)
        .or_else(|| FEE_BRACKETS.first())
        .map_or(1.0, |b| b.multiplier)
}

/// Compute the processing fee.
///
/// A non-positive `usd_rate` yields a zero USD amount; the local amount is
/// unaffected.
pub fn processing_fee(
    customs_value_usd: f64,
    reference_unit_value: f64,
    usd_rate: f64,
) -> ProcessingFee {
    let multiplier = fee_multiplier(customs_value_usd);
    let amount_local = multiplier * reference_unit_value;
    let amount_usd = if usd_rate > 0.0 { amount_local / usd_rate } else { 0.0 };
    ProcessingFee {
        multiplier,
        amount_local,
        amount_usd,
        description: format!(
            "Сбор за оформление ({} БРВ) по ПКМ №55",
            format_number(multiplier)
        ),
    }
}

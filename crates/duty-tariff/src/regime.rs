//! # Trade Regime
//!
//! Maps the country of origin to a [`TradeRegime`] and adjusts the duty.
//!
//! | Regime | Duty |
//! |--------|------|
//! | free trade | 0 |
//! | most favored | unchanged |
//! | general | ×2 |
//!
//! An absent origin, a malformed code, or a code missing from the country
//! table all resolve to [`TradeRegime::General`]. Unknown codes add a warning
//! so the caller can see the least favorable regime was assumed. Excise is
//! never adjusted.

use serde::Serialize;

use duty_core::{CountryCode, CountryLookup, TradeRegime};

use crate::evaluate::RateOutcome;

/// Outcome of regime resolution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegimeResolution {
    pub regime: TradeRegime,
    /// Upper-cased origin code as supplied, if any.
    pub origin: Option<String>,
    /// Set when an origin was supplied but not recognized.
    pub warning: Option<String>,
}

/// Duty multiplier for a regime.
pub fn duty_multiplier(regime: TradeRegime) -> f64 {
    match regime {
        TradeRegime::FreeTrade => 0.0,
        TradeRegime::MostFavored => 1.0,
        TradeRegime::General => 2.0,
    }
}

/// Resolve the regime for an optional origin country code.
pub fn resolve_regime<L>(countries: &L, origin: Option<&str>) -> RegimeResolution
where
    L: CountryLookup + ?Sized,
{
    let origin = origin.map(str::trim).filter(|o| !o.is_empty());
    let Some(raw) = origin else {
        return RegimeResolution {
            regime: TradeRegime::General,
            origin: None,
            warning: None,
        };
    };

    let upper = raw.to_uppercase();
    let found = CountryCode::new(raw)
        .ok()
        .and_then(|code| countries.country_by_iso(code.as_str()));

    match found {
        Some(country) => RegimeResolution {
            regime: country.trade_regime,
            origin: Some(upper),
            warning: None,
        },
        None => {
            tracing::warn!(
                origin = %upper,
                "unknown country of origin, applying general regime"
            );
            RegimeResolution {
                regime: TradeRegime::General,
                warning: Some(format!(
                    "country of origin \"{upper}\" not recognized; general regime applied"
                )),
                origin: Some(upper),
            }
        }
    }
}

/// Apply the regime multiplier to an evaluated duty.
pub fn apply_regime(resolution: &RegimeResolution, duty: RateOutcome) -> RateOutcome {
    match resolution.regime {
        TradeRegime::FreeTrade => RateOutcome::fixed(
            0.0,
            format!(
                "0% (Зона свободной торговли: {})",
                resolution.origin.as_deref().unwrap_or_default()
            ),
        ),
        TradeRegime::MostFavored => duty,
        TradeRegime::General => RateOutcome {
            amount_usd: duty.amount_usd * duty_multiplier(TradeRegime::General),
            derivation: format!("{} x 2 (Двойная ставка)", duty.derivation),
            ..duty
        },
    }
}

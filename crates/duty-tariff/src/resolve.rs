//! # Tariff Resolver
//!
//! Finds the narrowest commodity with a filed tariff for a requested code.
//! Walks [`prefix_chain`]: exact lookup of the current code, and on a miss
//! (no commodity, or a commodity without a tariff) drops the trailing two
//! characters and retries. Below four characters the search stops.

use serde::Serialize;
use thiserror::Error;

use duty_core::{prefix_chain, CommodityLookup, CommodityRecord, TariffLookup, TariffRecord};

/// No commodity on the fallback chain carries a tariff.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("no tariff found for classification code \"{code}\"")]
pub struct TariffNotFound {
    /// The requested code, trimmed.
    pub code: String,
}

/// A tariff together with the commodity it was found on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedTariff {
    pub commodity: CommodityRecord,
    pub tariff: TariffRecord,
    /// The code the match was made at (a prefix of the requested code).
    pub matched_code: String,
    /// Number of fallback steps taken (0 for an exact match).
    pub fallback_depth: usize,
}

/// Resolve the tariff for `code` by prefix fallback.
///
/// # Errors
///
/// Returns [`TariffNotFound`] when the chain is exhausted.
pub fn resolve_tariff<C, T>(
    commodities: &C,
    tariffs: &T,
    code: &str,
) -> Result<ResolvedTariff, TariffNotFound>
where
    C: CommodityLookup + ?Sized,
    T: TariffLookup + ?Sized,
{
    for (depth, candidate) in prefix_chain(code).enumerate() {
        let Some(commodity) = commodities.commodity_by_code(candidate) else {
            tracing::trace!(candidate, "no commodity at code");
            continue;
        };
        match tariffs.tariff_for(commodity.id) {
            Some(tariff) => {
                tracing::debug!(
                    requested = code.trim(),
                    matched = candidate,
                    depth,
                    "tariff resolved"
                );
                return Ok(ResolvedTariff {
                    matched_code: candidate.to_string(),
                    commodity,
                    tariff,
                    fallback_depth: depth,
                });
            }
            None => tracing::trace!(candidate, "commodity has no tariff"),
        }
    }
    Err(TariffNotFound {
        code: code.trim().to_string(),
    })
}

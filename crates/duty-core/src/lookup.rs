//! # Reference-Data Collaborators
//!
//! The engine reaches reference data only through these traits. Each returns
//! an owned record or `None`; "not found" is never an error here. Callers
//! decide how absence degrades (fallback chain, default regime, fallback
//! exchange rate).
//!
//! Implementations must be read-only for the duration of a calculation.
//! The `Send + Sync` bounds let a single snapshot serve concurrent requests.

use crate::records::{CommodityId, CommodityRecord, CountryRecord, CurrencySnapshot, TariffRecord};

/// Exact-match commodity lookup.
pub trait CommodityLookup: Send + Sync {
    /// The commodity filed under exactly `code`. No prefix matching.
    fn commodity_by_code(&self, code: &str) -> Option<CommodityRecord>;
}

/// Tariff lookup by commodity.
pub trait TariffLookup: Send + Sync {
    /// The tariff attached to `commodity`, if any.
    fn tariff_for(&self, commodity: CommodityId) -> Option<TariffRecord>;
}

/// Country lookup by ISO code.
pub trait CountryLookup: Send + Sync {
    /// The country with ISO code `iso` (already upper-cased by the caller).
    fn country_by_iso(&self, iso: &str) -> Option<CountryRecord>;
}

/// Source of the latest USD exchange rate.
pub trait UsdRateSource: Send + Sync {
    /// The most recent USD snapshot, if one has been published.
    fn latest_usd_rate(&self) -> Option<CurrencySnapshot>;
}

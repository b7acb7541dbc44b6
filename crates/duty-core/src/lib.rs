#![deny(missing_docs)]

//! # duty-core: Foundational Types for the Customs Duty Stack
//!
//! This crate is the leaf of the workspace. It defines the reference-data
//! records the calculation engine consumes and the primitives every other
//! crate shares. It depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Validated newtypes.** [`ClassificationCode`] and [`CountryCode`] are
//!    checked at construction and at deserialization. No bare strings for
//!    codes stored in reference data.
//!
//! 2. **Declarative unit table.** Units of measure resolve through
//!    [`units::UNIT_TABLE`], an ordered `(code, category, scale)` table.
//!    Adding a unit is a data change, not an evaluator change.
//!
//! 3. **Read-only collaborators.** Reference data is reached through the
//!    traits in [`lookup`]. Implementations own their storage; the engine
//!    never mutates it.
//!
//! 4. **Explicit money rounding.** [`money::round2`] is the single rounding
//!    point for reported amounts.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `duty-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod code;
pub mod digest;
pub mod error;
pub mod lookup;
pub mod money;
pub mod rate;
pub mod records;
pub mod units;

// Re-export primary types for ergonomic imports.
pub use code::{prefix_chain, ClassificationCode, CountryCode, MIN_RESOLVABLE_LEN};
pub use digest::{sha256_hex, ContentDigest};
pub use error::ValidationError;
pub use lookup::{CommodityLookup, CountryLookup, TariffLookup, UsdRateSource};
pub use money::{format_number, round2};
pub use rate::{Currency, RateKind, RateSpec};
pub use records::{
    CommodityId, CommodityRecord, CountryRecord, CurrencySnapshot, LevyMetadata, Propulsion,
    TariffRecord, TradeRegime, VehicleCategory, DEFAULT_VAT_PERCENT,
};
pub use units::{normalize_unit, resolve_unit, MeasureCategory, Quantities, UnitScale};

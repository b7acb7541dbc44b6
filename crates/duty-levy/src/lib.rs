//! # duty-levy: Processing Fee and Recycling Levy
//!
//! Both schedules are denominated in reference units (БРВ), the statutory
//! monetary constant in local currency, and converted to USD at the
//! calculation's exchange rate.
//!
//! - [`fee`]: processing fee by customs-value bracket.
//! - [`recycling`]: recycling levy by vehicle category, propulsion,
//!   displacement/weight/power and age.
//! - [`classify`]: derives levy metadata from a nomenclature entry's code
//!   and description, for reference data that lacks it.
//!
//! All bracket tables are ordered `const` slices; evaluation is a linear
//! scan for the first matching row.

pub mod classify;
pub mod fee;
pub mod recycling;

pub use classify::infer_levy_metadata;
pub use fee::{fee_multiplier, processing_fee, FeeBracket, ProcessingFee, FEE_BRACKETS};
pub use recycling::{
    compute_levy, LevyAssessment, LevyContext, LevyInputs, LevyRate, VehicleProfile,
};

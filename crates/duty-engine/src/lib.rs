//! # duty-engine: Customs Payment Calculator
//!
//! Composes the tariff and levy crates into a single calculation over
//! read-only reference data.
//!
//! - [`DutyCalculator`] assesses one [`CalculationInput`] into an itemized
//!   [`CalculationResult`]. Every input yields a well-formed result; failures
//!   are reported in its `error` field with zero totals.
//! - [`ReferenceSnapshot`] is an in-memory store loaded from YAML or JSON
//!   that implements every lookup trait the calculator needs.
//! - [`EngineConfig`] carries the reference unit value, fallback exchange
//!   rate, default VAT and vehicle age threshold.

pub mod calculator;
pub mod config;
pub mod snapshot;

pub use calculator::{
    CalculationError, CalculationInput, CalculationResult, DutyCalculator, LineItem, LineKind,
    RateOrigin, ReferenceData,
};
pub use config::{ConfigError, EngineConfig};
pub use snapshot::{ReferenceSnapshot, SnapshotError, SnapshotFile};

//! # duty-tariff: Tariff Resolution and Rate Evaluation
//!
//! Turns reference tariff data into duty and excise amounts.
//!
//! ## Pipeline
//!
//! 1. **Decode** ([`decode`]): free-text tariff cells such as
//!    `"10%, но не менее 2 долл. США за 1 кг"` become structured
//!    [`RateSpec`](duty_core::RateSpec)s.
//! 2. **Ingest** ([`ingest`]): decoded rows are spread over every commodity
//!    they cover, narrowest source code winning, and excise overlays are
//!    patched in.
//! 3. **Resolve** ([`resolve`]): a requested classification code finds its
//!    tariff by walking up the code hierarchy.
//! 4. **Evaluate** ([`evaluate`]): a spec, the customs value and declared
//!    quantities give an amount and a human-readable derivation.
//! 5. **Regime** ([`regime`]): the country of origin scales the duty.
//!
//! ## Determinism
//!
//! Every function here is pure over its arguments and the read-only lookups
//! it is given. The USD exchange rate is always passed in, never fetched.

pub mod decode;
pub mod evaluate;
pub mod ingest;
pub mod regime;
pub mod resolve;

pub use decode::{decode_rate_string, decode_rate_string_checked, DecodeIssue, DecodedRate};
pub use evaluate::{evaluate, RateOutcome};
pub use ingest::{DutyRow, ExciseOverlay, TariffTable, TariffTableBuilder};
pub use regime::{apply_regime, resolve_regime, RegimeResolution};
pub use resolve::{resolve_tariff, ResolvedTariff, TariffNotFound};

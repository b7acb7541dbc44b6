//! # Tariff-Table Ingestion
//!
//! Builds [`TariffRecord`]s from published rate rows.
//!
//! A duty row names one or more source codes (comma-separated) and a rate
//! cell. Every commodity whose code starts with a source code receives the
//! decoded rate. When several rows cover the same commodity, the longer
//! source code wins; rows of equal length overwrite in input order.
//!
//! Excise overlays are applied afterwards: each overlay patches the excise
//! spec of every tariff whose commodity code starts with one of its prefixes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use duty_core::{
    CommodityId, CommodityRecord, Currency, RateKind, RateSpec, TariffRecord, DEFAULT_VAT_PERCENT,
};

use crate::decode::{decode_rate_string_checked, DecodeIssue};

/// One published duty row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DutyRow {
    /// Comma-separated source codes.
    #[serde(alias = "tn_code")]
    pub codes: String,
    /// Rate cell text.
    pub rate: String,
}

impl DutyRow {
    /// Split and trim the source codes, dropping empties.
    pub fn source_codes(&self) -> impl Iterator<Item = &str> {
        self.codes.split(',').map(str::trim).filter(|c| !c.is_empty())
    }
}

fn default_excise_currency() -> Currency {
    Currency::Uzs
}

/// One excise overlay entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExciseOverlay {
    /// Code prefixes the overlay applies to.
    #[serde(alias = "approx_codes")]
    pub prefixes: Vec<String>,
    #[serde(default, alias = "excise_type")]
    pub kind: RateKind,
    #[serde(default, alias = "excise_percent")]
    pub percent: f64,
    #[serde(default, alias = "excise_specific_amount")]
    pub specific_amount: f64,
    #[serde(default = "default_excise_currency", alias = "excise_currency")]
    pub currency: Currency,
    #[serde(default, alias = "excise_unit")]
    pub unit: Option<String>,
}

impl ExciseOverlay {
    /// The excise spec this overlay installs. A non-positive specific
    /// amount is stored as absent.
    pub fn to_spec(&self) -> RateSpec {
        RateSpec {
            kind: self.kind,
            percent: self.percent,
            per_unit_amount: (self.specific_amount > 0.0).then_some(self.specific_amount),
            per_unit_currency: self.currency,
            per_unit_unit: self.unit.clone(),
        }
    }
}

/// A rate cell that decoded with an issue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DegradedCell {
    /// Source code list of the row.
    pub codes: String,
    /// What the decoder could not read.
    pub issue: DecodeIssue,
}

/// Result of a build.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TariffTable {
    /// One tariff per covered commodity.
    pub tariffs: BTreeMap<CommodityId, TariffRecord>,
    /// Source codes that matched no commodity.
    pub unmatched_codes: Vec<String>,
    /// Cells that decoded with an issue.
    pub degraded_cells: Vec<DegradedCell>,
    /// Number of tariff entries touched by excise overlays.
    pub excise_updates: usize,
}

/// Builds a tariff table from duty rows and excise overlays.
#[derive(Debug, Clone)]
pub struct TariffTableBuilder {
    vat_percent: f64,
}

impl Default for TariffTableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TariffTableBuilder {
    pub fn new() -> Self {
        Self {
            vat_percent: DEFAULT_VAT_PERCENT,
        }
    }

    /// VAT percentage stamped on every built tariff.
    pub fn with_vat(mut self, vat_percent: f64) -> Self {
        self.vat_percent = vat_percent;
        self
    }

    /// Spread duty rows over `commodities`.
    pub fn build(&self, commodities: &[CommodityRecord], rows: &[DutyRow]) -> TariffTable {
        let mut table = TariffTable::default();
        // commodity -> (source code length, tariff)
        let mut best: BTreeMap<CommodityId, (usize, TariffRecord)> = BTreeMap::new();

        for row in rows {
            let decoded = decode_rate_string_checked(&row.rate);
            if let Some(issue) = decoded.issue.clone() {
                table.degraded_cells.push(DegradedCell {
                    codes: row.codes.clone(),
                    issue,
                });
            }

            for source in row.source_codes() {
                let source_len = source.chars().count();
                let mut matched = false;
                for commodity in commodities.iter().filter(|c| c.code.starts_with(source)) {
                    matched = true;
                    if let Some((existing_len, _)) = best.get(&commodity.id) {
                        if source_len < *existing_len {
                            continue;
                        }
                    }
                    let tariff = TariffRecord::new(commodity.id, decoded.spec.clone())
                        .with_vat(self.vat_percent);
                    best.insert(commodity.id, (source_len, tariff));
                }
                if !matched {
                    table.unmatched_codes.push(source.to_string());
                }
            }
        }

        table.tariffs = best.into_iter().map(|(id, (_, t))| (id, t)).collect();
        tracing::info!(
            tariffs = table.tariffs.len(),
            unmatched = table.unmatched_codes.len(),
            degraded = table.degraded_cells.len(),
            "tariff table built"
        );
        table
    }

    /// Patch excise specs onto an existing table.
    ///
    /// Returns the number of tariff updates, counting a tariff once per
    /// prefix that reached it.
    pub fn apply_excise(
        &self,
        table: &mut TariffTable,
        commodities: &[CommodityRecord],
        overlays: &[ExciseOverlay],
    ) -> usize {
        let mut updated = 0;
        for overlay in overlays {
            let spec = overlay.to_spec();
            for prefix in overlay.prefixes.iter().map(|p| p.trim()) {
                for commodity in commodities.iter().filter(|c| c.code.starts_with(prefix)) {
                    if let Some(tariff) = table.tariffs.get_mut(&commodity.id) {
                        tariff.excise = spec.clone();
                        updated += 1;
                    }
                }
            }
        }
        table.excise_updates += updated;
        tracing::info!(updated, "excise overlays applied");
        updated
    }
}

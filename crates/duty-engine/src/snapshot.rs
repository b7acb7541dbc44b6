//! # Reference Snapshot
//!
//! In-memory reference data implementing every collaborator trait in
//! [`duty_core::lookup`]. Loaded from a YAML or JSON file (chosen by
//! extension) with four top-level lists:
//!
//! ```yaml
//! commodities:
//!   - { id: 1, code: "8703231199", description: "...", recycling_levy_applicable: true,
//!       levy_metadata: { type: M1, engine_type: ice } }
//! tariffs:
//!   - { commodity_id: 1, duty: { kind: ad_valorem, percent: 15 } }
//! countries:
//!   - { iso_code: KZ, name: Казахстан, trade_regime: free_trade }
//! currencies:
//!   - { code: USD, rate: 12850.0, as_of: 2025-01-10 }
//! ```
//!
//! ## Invariants
//!
//! Enforced at load: classification codes are unique, at most one tariff
//! per commodity, every tariff names a known commodity, ISO codes are
//! unique.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use duty_core::{
    CommodityId, CommodityLookup, CommodityRecord, ContentDigest, CountryLookup, CountryRecord,
    CurrencySnapshot, TariffLookup, TariffRecord, UsdRateSource,
};
use duty_levy::infer_levy_metadata;
use duty_tariff::TariffTable;

/// Errors loading or saving a snapshot.
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid snapshot YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid snapshot JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported snapshot format: {0} (expected .yaml, .yml or .json)")]
    UnsupportedFormat(String),
    #[error("inconsistent reference data: {0}")]
    Inconsistent(String),
}

/// File layout of a snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotFile {
    #[serde(default)]
    pub commodities: Vec<CommodityRecord>,
    #[serde(default)]
    pub tariffs: Vec<TariffRecord>,
    #[serde(default)]
    pub countries: Vec<CountryRecord>,
    #[serde(default)]
    pub currencies: Vec<CurrencySnapshot>,
}

/// Indexed, validated reference data.
#[derive(Clone, Default)]
pub struct ReferenceSnapshot {
    commodities: BTreeMap<String, CommodityRecord>,
    tariffs: BTreeMap<CommodityId, TariffRecord>,
    countries: BTreeMap<String, CountryRecord>,
    currencies: Vec<CurrencySnapshot>,
}

impl std::fmt::Debug for ReferenceSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReferenceSnapshot")
            .field("commodities", &self.commodities.len())
            .field("tariffs", &self.tariffs.len())
            .field("countries", &self.countries.len())
            .field("currencies", &self.currencies.len())
            .finish()
    }
}

impl ReferenceSnapshot {
    /// Index and validate a snapshot file.
    pub fn from_parts(file: SnapshotFile) -> Result<Self, SnapshotError> {
        let mut snapshot = Self::default();
        for commodity in file.commodities {
            let code = commodity.code.as_str().to_string();
            if snapshot.commodities.insert(code.clone(), commodity).is_some() {
                return Err(SnapshotError::Inconsistent(format!(
                    "duplicate classification code {code}"
                )));
            }
        }
        let known: std::collections::BTreeSet<CommodityId> =
            snapshot.commodities.values().map(|c| c.id).collect();
        for tariff in file.tariffs {
            let id = tariff.commodity_id;
            if !known.contains(&id) {
                return Err(SnapshotError::Inconsistent(format!(
                    "tariff references unknown commodity {id}"
                )));
            }
            if snapshot.tariffs.insert(id, tariff).is_some() {
                return Err(SnapshotError::Inconsistent(format!(
                    "more than one tariff for commodity {id}"
                )));
            }
        }
        for country in file.countries {
            let iso = country.iso_code.as_str().to_string();
            if snapshot.countries.insert(iso.clone(), country).is_some() {
                let message = format!("duplicate country {iso}");
                return Err(SnapshotError::Inconsistent(message));
            }
        }
        snapshot.currencies = file.currencies;
        tracing::debug!(?snapshot, "reference snapshot indexed");
        Ok(snapshot)
    }

    /// Parse YAML text.
    pub fn from_yaml_str(text: &str) -> Result<Self, SnapshotError> {
        Self::from_parts(serde_yaml::from_str(text)?)
    }

    /// Parse JSON text.
    pub fn from_json_str(text: &str) -> Result<Self, SnapshotError> {
        Self::from_parts(serde_json::from_str(text)?)
    }

    /// Load from a `.yaml`, `.yml` or `.json` file.
    pub fn from_file(path: &Path) -> Result<Self, SnapshotError> {
        let format = Format::of(path)?;
        let text = std::fs::read_to_string(path).map_err(|e| SnapshotError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        match format {
            Format::Yaml => Self::from_yaml_str(&text),
            Format::Json => Self::from_json_str(&text),
        }
    }

    /// Write to a `.yaml`, `.yml` or `.json` file.
    pub fn to_file(&self, path: &Path) -> Result<(), SnapshotError> {
        let file = self.to_parts();
        let text = match Format::of(path)? {
            Format::Yaml => serde_yaml::to_string(&file)?,
            Format::Json => serde_json::to_string_pretty(&file)?,
        };
        std::fs::write(path, text).map_err(|e| SnapshotError::Io {
            path: path.display().to_string(),
            source: e,
        })
    }

    /// The file form, in key order.
    pub fn to_parts(&self) -> SnapshotFile {
        SnapshotFile {
            commodities: self.commodities.values().cloned().collect(),
            tariffs: self.tariffs.values().cloned().collect(),
            countries: self.countries.values().cloned().collect(),
            currencies: self.currencies.clone(),
        }
    }

    /// Content digest over the canonical file form.
    pub fn digest(&self) -> Result<ContentDigest, SnapshotError> {
        Ok(ContentDigest::of_json(&self.to_parts())?)
    }

    /// All commodities, ordered by code.
    pub fn commodities(&self) -> impl Iterator<Item = &CommodityRecord> {
        self.commodities.values()
    }

    /// Commodities whose code starts with the digits in `query`, ordered by
    /// code. Non-numeric queries match nothing.
    pub fn search_codes(&self, query: &str, limit: usize) -> Vec<&CommodityRecord> {
        let query = query.trim();
        if query.is_empty() || !query.bytes().all(|b| b.is_ascii_digit()) {
            return Vec::new();
        }
        self.commodities
            .range(query.to_string()..)
            .take_while(|(code, _)| code.starts_with(query))
            .map(|(_, c)| c)
            .take(limit)
            .collect()
    }

    /// Replace all tariffs with a built table.
    pub fn replace_tariffs(&mut self, table: TariffTable) {
        self.tariffs = table.tariffs;
    }

    /// Fill in levy metadata for commodities without it, marking the levy
    /// applicable where metadata was found. Returns the number updated.
    pub fn infer_missing_levy_metadata(&mut self) -> usize {
        let mut updated = 0;
        for commodity in self.commodities.values_mut() {
            if commodity.levy_metadata.is_some() {
                continue;
            }
            let inferred = infer_levy_metadata(commodity.code.as_str(), &commodity.description);
            if let Some(meta) = inferred {
                commodity.levy_metadata = Some(meta);
                commodity.recycling_levy_applicable = true;
                updated += 1;
            }
        }
        updated
    }

    pub fn tariff_count(&self) -> usize {
        self.tariffs.len()
    }
}

enum Format {
    Yaml,
    Json,
}

impl Format {
    fn of(path: &Path) -> Result<Self, SnapshotError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => Ok(Self::Yaml),
            Some("json") => Ok(Self::Json),
            _ => Err(SnapshotError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Collaborator implementations
// ---------------------------------------------------------------------------

impl CommodityLookup for ReferenceSnapshot {
    fn commodity_by_code(&self, code: &str) -> Option<CommodityRecord> {
        self.commodities.get(code).cloned()
    }
}

impl TariffLookup for ReferenceSnapshot {
    fn tariff_for(&self, commodity: CommodityId) -> Option<TariffRecord> {
        self.tariffs.get(&commodity).cloned()
    }
}

impl CountryLookup for ReferenceSnapshot {
    fn country_by_iso(&self, iso: &str) -> Option<CountryRecord> {
        self.countries.get(&iso.to_ascii_uppercase()).cloned()
    }
}

impl UsdRateSource for ReferenceSnapshot {
    fn latest_usd_rate(&self) -> Option<CurrencySnapshot> {
        self.currencies
            .iter()
            .filter(|c| c.code.eq_ignore_ascii_case("USD"))
            .max_by_key(|c| c.as_of)
            .cloned()
    }
}

//! # Reference-Data Records
//!
//! Commodity, tariff, country and currency records as supplied by the
//! reference store. The engine treats all of them as read-only.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::code::{ClassificationCode, CountryCode};
use crate::rate::RateSpec;

/// VAT percentage applied when a tariff row does not carry one.
pub const DEFAULT_VAT_PERCENT: f64 = 12.0;

// ---------------------------------------------------------------------------
// Commodities
// ---------------------------------------------------------------------------

/// Identifier of a commodity row in the reference store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommodityId(pub u64);

impl std::fmt::Display for CommodityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A nomenclature entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommodityRecord {
    /// Row identifier.
    pub id: CommodityId,
    /// Classification code the entry is filed under.
    pub code: ClassificationCode,
    /// Nomenclature text.
    #[serde(default)]
    pub description: String,
    /// Supplementary unit of measure, as printed in the nomenclature.
    #[serde(default)]
    pub unit: Option<String>,
    /// Whether the recycling levy is charged on this commodity.
    #[serde(default)]
    pub recycling_levy_applicable: bool,
    /// Vehicle/tire attributes used by the levy schedule.
    #[serde(default)]
    pub levy_metadata: Option<LevyMetadata>,
}

impl CommodityRecord {
    /// A plain commodity with no levy.
    pub fn new(id: u64, code: ClassificationCode, description: impl Into<String>) -> Self {
        Self {
            id: CommodityId(id),
            code,
            description: description.into(),
            unit: None,
            recycling_levy_applicable: false,
            levy_metadata: None,
        }
    }

    /// Attach levy metadata and mark the levy applicable.
    pub fn with_levy(mut self, metadata: LevyMetadata) -> Self {
        self.recycling_levy_applicable = true;
        self.levy_metadata = Some(metadata);
        self
    }
}

/// Vehicle category for the recycling levy.
///
/// Reference files use the regulatory class names (`M1`, `N`) as well as
/// plain names. Unrecognized values (including buses, `M2_M3`) map to
/// [`VehicleCategory::Other`], which carries no levy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VehicleCategory {
    /// Pneumatic tires, levied by weight.
    Tire,
    /// Passenger cars (`M1`).
    Passenger,
    /// Goods vehicles (`N`).
    Truck,
    /// Tractors, including road tractors for semi-trailers.
    Tractor,
    /// Special-purpose machinery.
    Special,
    /// Anything without a levy schedule.
    Other,
}

impl VehicleCategory {
    /// Parse a category name, case-insensitively.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "tire" | "tyre" => Self::Tire,
            "m1" | "passenger" => Self::Passenger,
            "n" | "truck" => Self::Truck,
            "tractor" => Self::Tractor,
            "special" => Self::Special,
            _ => Self::Other,
        }
    }

    /// Canonical name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tire => "tire",
            Self::Passenger => "passenger",
            Self::Truck => "truck",
            Self::Tractor => "tractor",
            Self::Special => "special",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for VehicleCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for VehicleCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for VehicleCategory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

/// Vehicle propulsion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Propulsion {
    /// Internal combustion engine.
    #[default]
    Ice,
    /// Battery electric.
    Electric,
    /// Combustion and electric motors together.
    Hybrid,
}

impl Propulsion {
    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ice => "ice",
            Self::Electric => "electric",
            Self::Hybrid => "hybrid",
        }
    }
}

/// Levy-relevant attributes attached to a commodity.
///
/// Numeric fields are hints extracted from the nomenclature text; request
/// values take precedence when present. Unknown keys are preserved in
/// `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevyMetadata {
    /// Levy schedule the commodity falls under.
    #[serde(rename = "type")]
    pub category: VehicleCategory,
    /// Propulsion, combustion when unstated.
    #[serde(default)]
    pub engine_type: Propulsion,
    /// Inclusive upper bound of the stated displacement range, cm³.
    #[serde(default, alias = "engine_volume_max", skip_serializing_if = "Option::is_none")]
    pub engine_volume_cm3: Option<f64>,
    /// Exclusive lower bound of the stated displacement range, cm³.
    #[serde(default, alias = "engine_volume_min", skip_serializing_if = "Option::is_none")]
    pub engine_volume_min_cm3: Option<f64>,
    /// Engine power, hp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power_hp: Option<f64>,
    /// Engine power, kW.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power_kw: Option<f64>,
    /// Gross vehicle weight, tonnes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_ton: Option<f64>,
    /// `new` or `used`, as stated in the nomenclature.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    /// Keys this type does not model.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl LevyMetadata {
    /// Metadata with only a category and propulsion.
    pub fn new(category: VehicleCategory, engine_type: Propulsion) -> Self {
        Self {
            category,
            engine_type,
            engine_volume_cm3: None,
            engine_volume_min_cm3: None,
            power_hp: None,
            power_kw: None,
            weight_ton: None,
            condition: None,
            extra: BTreeMap::new(),
        }
    }

    /// A representative displacement for the stated range: the middle of
    /// `(min, max]`, with a missing lower bound read as 0. Only a lower
    /// bound gives that bound, which the half-open levy brackets place in
    /// the band just above it.
    pub fn displacement_hint(&self) -> Option<f64> {
        match (self.engine_volume_min_cm3, self.engine_volume_cm3) {
            (lo, Some(hi)) => {
                let lo = lo.unwrap_or(0.0);
                Some(if hi > lo { (lo + hi) / 2.0 } else { hi })
            }
            (Some(lo), None) => Some(lo),
            (None, None) => None,
        }
    }

    /// Power in horsepower, converting from kW when only that is known.
    pub fn power_hp_hint(&self) -> Option<f64> {
        self.power_hp.or(self.power_kw.map(|kw| kw * HP_PER_KW))
    }
}

/// Metric horsepower per kilowatt.
pub const HP_PER_KW: f64 = 1.35962;

// ---------------------------------------------------------------------------
// Tariffs
// ---------------------------------------------------------------------------

fn default_vat_percent() -> f64 {
    DEFAULT_VAT_PERCENT
}

/// Duty, excise and VAT rates for one commodity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TariffRecord {
    /// Commodity the tariff is attached to.
    pub commodity_id: CommodityId,
    /// Import duty rate.
    #[serde(default)]
    pub duty: RateSpec,
    /// Excise rate; per-unit amounts default to local currency.
    #[serde(
        default = "RateSpec::excise_none",
        deserialize_with = "RateSpec::deserialize_excise"
    )]
    pub excise: RateSpec,
    /// VAT percentage.
    #[serde(default = "default_vat_percent")]
    pub vat_percent: f64,
}

impl TariffRecord {
    /// A tariff with the given duty, no excise, and the default VAT.
    pub fn new(commodity_id: CommodityId, duty: RateSpec) -> Self {
        Self {
            commodity_id,
            duty,
            excise: RateSpec::excise_none(),
            vat_percent: DEFAULT_VAT_PERCENT,
        }
    }

    /// Replace the excise rate.
    pub fn with_excise(mut self, excise: RateSpec) -> Self {
        self.excise = excise;
        self
    }

    /// Replace the VAT percentage.
    pub fn with_vat(mut self, vat_percent: f64) -> Self {
        self.vat_percent = vat_percent;
        self
    }
}

// ---------------------------------------------------------------------------
// Countries
// ---------------------------------------------------------------------------

/// Trade regime between the importing state and a country of origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeRegime {
    /// Free-trade agreement: duty exempt.
    FreeTrade,
    /// Most-favored nation: base duty.
    MostFavored,
    /// No agreement: double duty.
    General,
}

impl TradeRegime {
    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FreeTrade => "free_trade",
            Self::MostFavored => "most_favored",
            Self::General => "general",
        }
    }

    /// Every regime.
    pub fn all() -> &'static [TradeRegime] {
        &[Self::FreeTrade, Self::MostFavored, Self::General]
    }
}

impl std::fmt::Display for TradeRegime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A country and its trade regime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryRecord {
    /// ISO 3166 code.
    pub iso_code: CountryCode,
    /// Display name.
    pub name: String,
    /// Regime applied to goods originating here.
    pub trade_regime: TradeRegime,
}

// ---------------------------------------------------------------------------
// Currency
// ---------------------------------------------------------------------------

fn default_nominal() -> u32 {
    1
}

/// Published exchange rate of a foreign currency to local currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencySnapshot {
    /// ISO 4217 letter code (e.g. `USD`).
    pub code: String,
    /// Local currency per `nominal` units.
    pub rate: f64,
    /// Number of foreign units the rate is quoted for.
    #[serde(default = "default_nominal")]
    pub nominal: u32,
    /// Publication date.
    pub as_of: NaiveDate,
}

impl CurrencySnapshot {
    /// Local currency per single unit of the foreign currency.
    pub fn rate_per_unit(&self) -> f64 {
        if self.nominal == 0 {
            return self.rate;
        }
        self.rate / f64::from(self.nominal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate::{Currency, RateKind};

    #[test]
    fn vehicle_category_parses_regulatory_names() {
        assert_eq!(VehicleCategory::parse("M1"), VehicleCategory::Passenger);
        assert_eq!(VehicleCategory::parse("n"), VehicleCategory::Truck);
        assert_eq!(VehicleCategory::parse("M2_M3"), VehicleCategory::Other);
        assert_eq!(VehicleCategory::parse(" tire "), VehicleCategory::Tire);
    }

    #[test]
    fn levy_metadata_from_reference_json() {
        let meta: LevyMetadata = serde_json::from_str(
            r#"{"type":"M1","engine_type":"electric","engine_volume_max":1500,"age_group":"0-3"}"#,
        )
        .unwrap();
        assert_eq!(meta.category, VehicleCategory::Passenger);
        assert_eq!(meta.engine_type, Propulsion::Electric);
        assert_eq!(meta.engine_volume_cm3, Some(1500.0));
        assert_eq!(
            meta.extra.get("age_group").and_then(|v| v.as_str()),
            Some("0-3")
        );
    }

    #[test]
    fn displacement_hint_stays_inside_stated_range() {
        let mut meta = LevyMetadata::new(VehicleCategory::Passenger, Propulsion::Ice);
        assert_eq!(meta.displacement_hint(), None);
        meta.engine_volume_cm3 = Some(1000.0);
        assert_eq!(meta.displacement_hint(), Some(500.0));
        meta.engine_volume_min_cm3 = Some(1500.0);
        meta.engine_volume_cm3 = Some(3000.0);
        assert_eq!(meta.displacement_hint(), Some(2250.0));
        meta.engine_volume_cm3 = None;
        assert_eq!(meta.displacement_hint(), Some(1500.0));
    }

    #[test]
    fn levy_metadata_defaults_to_ice() {
        let meta: LevyMetadata = serde_json::from_str(r#"{"type":"tractor"}"#).unwrap();
        assert_eq!(meta.engine_type, Propulsion::Ice);
    }

    #[test]
    fn power_hint_converts_kw() {
        let mut meta = LevyMetadata::new(VehicleCategory::Tractor, Propulsion::Ice);
        meta.power_kw = Some(100.0);
        let hp = meta.power_hp_hint().unwrap();
        assert!((hp - 135.962).abs() < 1e-9);
        meta.power_hp = Some(80.0);
        assert_eq!(meta.power_hp_hint(), Some(80.0));
    }

    #[test]
    fn tariff_defaults() {
        let t: TariffRecord = serde_json::from_str(r#"{"commodity_id":7}"#).unwrap();
        assert_eq!(t.vat_percent, DEFAULT_VAT_PERCENT);
        assert_eq!(t.duty.kind, RateKind::Percentage);
        assert_eq!(t.duty.per_unit_currency, Currency::Usd);
        assert_eq!(t.excise.per_unit_currency, Currency::Uzs);
    }

    #[test]
    fn tariff_excise_currency_default_applies_when_present() {
        let t: TariffRecord = serde_json::from_str(
            r#"{"commodity_id":7,
                "excise":{"kind":"specific","per_unit_amount":1200,"per_unit_unit":"l"}}"#,
        )
        .unwrap();
        assert_eq!(t.excise.per_unit_currency, Currency::Uzs);
    }

    #[test]
    fn trade_regime_wire_names() {
        let r: TradeRegime = serde_json::from_str("\"most_favored\"").unwrap();
        assert_eq!(r, TradeRegime::MostFavored);
        assert_eq!(TradeRegime::all().len(), 3);
    }

    #[test]
    fn currency_rate_per_unit_respects_nominal() {
        let snap = CurrencySnapshot {
            code: "JPY".into(),
            rate: 8500.0,
            nominal: 100,
            as_of: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
        };
        assert_eq!(snap.rate_per_unit(), 85.0);
    }
}

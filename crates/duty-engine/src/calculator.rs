//! # Duty Calculator
//!
//! Composes tariff resolution, rate evaluation, trade regime, VAT, the
//! processing fee and the recycling levy into an itemized payment.
//!
//! ## Pipeline
//!
//! 1. Fetch the USD rate once; fall back to the configured rate with a
//!    warning when none is published.
//! 2. Resolve the tariff by prefix fallback. No match yields an error
//!    result with zero totals.
//! 3. Resolve the trade regime and apply it to the evaluated duty.
//! 4. Evaluate excise (never adjusted by regime).
//! 5. VAT over `customs value + duty + excise`.
//! 6. Processing fee by customs-value bracket.
//! 7. Recycling levy when the commodity carries it. The levy is not part
//!    of the VAT base.
//!
//! Each line is rounded to cents on its own; totals sum the rounded lines.
//!
//! ## Determinism
//!
//! Given identical input, reference data and `as_of_year`, the result is
//! identical. [`DutyCalculator::calculate`] reads the current year from the
//! clock; use [`DutyCalculator::calculate_as_of`] for reproducible output.

use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use duty_core::{
    format_number, round2, CommodityLookup, CountryLookup, Quantities, TariffLookup, UsdRateSource,
};
use duty_levy::{compute_levy, processing_fee, LevyContext, LevyInputs};
use duty_tariff::{apply_regime, evaluate, resolve_regime, resolve_tariff};

use crate::config::EngineConfig;

/// Excise at or below this many USD is not itemized unless a percentage
/// is filed.
const EXCISE_DISPLAY_THRESHOLD_USD: f64 = 0.01;

/// Everything the calculator reads.
pub trait ReferenceData: CommodityLookup + TariffLookup + CountryLookup + UsdRateSource {}

impl<T> ReferenceData for T where
    T: CommodityLookup + TariffLookup + CountryLookup + UsdRateSource + ?Sized
{
}

// ---------------------------------------------------------------------------
// Request and result
// ---------------------------------------------------------------------------

/// One declaration line to be assessed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalculationInput {
    /// Declared classification code; surrounding whitespace is ignored.
    pub classification_code: String,
    /// Customs value, USD.
    pub customs_value_usd: f64,
    /// Net weight, kg. Also drives the tire and truck levies.
    #[serde(default)]
    pub weight_kg: f64,
    /// Piece count.
    #[serde(default)]
    pub pieces: f64,
    /// Liquid volume, litres.
    #[serde(default)]
    pub liters: f64,
    /// Item or engine volume, cm³.
    #[serde(default)]
    pub item_volume_cm3: f64,
    /// ISO code of the country of origin.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_country: Option<String>,
    /// Year of manufacture, for vehicles.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturing_year: Option<i32>,
    /// Engine power, hp, for tractors and special machinery.
    #[serde(default)]
    pub engine_power_hp: f64,
}

impl CalculationInput {
    pub fn new(classification_code: impl Into<String>, customs_value_usd: f64) -> Self {
        Self {
            classification_code: classification_code.into(),
            customs_value_usd,
            ..Self::default()
        }
    }

    pub fn with_weight(mut self, kg: f64) -> Self {
        self.weight_kg = kg;
        self
    }

    pub fn with_pieces(mut self, pieces: f64) -> Self {
        self.pieces = pieces;
        self
    }

    pub fn with_liters(mut self, liters: f64) -> Self {
        self.liters = liters;
        self
    }

    pub fn with_volume_cm3(mut self, cm3: f64) -> Self {
        self.item_volume_cm3 = cm3;
        self
    }

    pub fn with_origin(mut self, iso: impl Into<String>) -> Self {
        self.origin_country = Some(iso.into());
        self
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.manufacturing_year = Some(year);
        self
    }

    pub fn with_power_hp(mut self, hp: f64) -> Self {
        self.engine_power_hp = hp;
        self
    }

    fn quantities(&self) -> Quantities {
        Quantities {
            weight_kg: self.weight_kg,
            pieces: self.pieces,
            liters: self.liters,
            item_volume_cm3: self.item_volume_cm3,
        }
    }
}

/// Where the exchange rate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum RateOrigin {
    /// A published snapshot.
    Snapshot { as_of: NaiveDate },
    /// The configured fallback constant.
    Fallback,
}

/// Kind of payment line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    ImportDuty,
    Excise,
    Vat,
    ProcessingFee,
    RecyclingLevy,
}

impl LineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ImportDuty => "import_duty",
            Self::Excise => "excise",
            Self::Vat => "vat",
            Self::ProcessingFee => "processing_fee",
            Self::RecyclingLevy => "recycling_levy",
        }
    }
}

impl std::fmt::Display for LineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One itemized payment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineItem {
    /// Which payment this is.
    pub kind: LineKind,
    /// Name as printed on the declaration.
    pub name: String,
    /// How the amount was derived.
    pub derivation: String,
    /// Amount in USD, rounded to cents.
    pub amount_usd: f64,
    /// Amount in local currency, rounded to cents.
    pub amount_local: f64,
}

impl LineItem {
    fn new(
        kind: LineKind,
        name: impl Into<String>,
        derivation: impl Into<String>,
        usd: f64,
        local: f64,
    ) -> Self {
        Self {
            kind,
            name: name.into(),
            derivation: derivation.into(),
            amount_usd: round2(usd),
            amount_local: round2(local),
        }
    }
}

/// Why a calculation produced no payments.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CalculationError {
    /// No tariff on the code's fallback chain.
    #[error("Код ТН ВЭД не найден")]
    TariffNotFound { code: String },
    /// The input cannot be assessed.
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },
}

/// Itemized outcome of one calculation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalculationResult {
    pub classification_code: String,
    /// Code the tariff was filed under; `None` on error.
    pub matched_code: Option<String>,
    /// Local currency per USD.
    pub currency_rate: f64,
    pub rate_origin: RateOrigin,
    pub reference_unit_value: f64,
    pub total_usd: f64,
    pub total_local: f64,
    /// Sum of all components before rounding.
    pub unrounded_total_usd: f64,
    pub line_items: Vec<LineItem>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<CalculationError>,
    /// Digest of the reference data, when the caller supplied one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_version: Option<String>,
}

impl CalculationResult {
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// The line of the given kind, if emitted.
    pub fn line(&self, kind: LineKind) -> Option<&LineItem> {
        self.line_items.iter().find(|l| l.kind == kind)
    }
}

// ---------------------------------------------------------------------------
// Calculator
// ---------------------------------------------------------------------------

/// Calculates customs payments against borrowed reference data.
pub struct DutyCalculator<'a, R: ReferenceData + ?Sized> {
    reference: &'a R,
    config: EngineConfig,
    reference_version: Option<String>,
}

impl<R: ReferenceData + ?Sized> std::fmt::Debug for DutyCalculator<'_, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DutyCalculator")
            .field("config", &self.config)
            .field("reference_version", &self.reference_version)
            .finish()
    }
}

struct UsdRate {
    rate: f64,
    origin: RateOrigin,
}

impl<'a, R: ReferenceData + ?Sized> DutyCalculator<'a, R> {
    /// A calculator with default configuration.
    pub fn new(reference: &'a R) -> Self {
        Self::with_config(reference, EngineConfig::default())
    }

    pub fn with_config(reference: &'a R, config: EngineConfig) -> Self {
        Self {
            reference,
            config,
            reference_version: None,
        }
    }

    /// Stamp results with a reference-data version (usually a snapshot
    /// digest).
    pub fn with_reference_version(mut self, version: impl Into<String>) -> Self {
        self.reference_version = Some(version.into());
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Calculate, measuring vehicle age against the current year.
    pub fn calculate(&self, input: &CalculationInput) -> CalculationResult {
        self.calculate_as_of(input, Utc::now().year())
    }

    /// Calculate, measuring vehicle age against `as_of_year`.
    pub fn calculate_as_of(&self, input: &CalculationInput, as_of_year: i32) -> CalculationResult {
        let code = input.classification_code.trim();
        let mut warnings = Vec::new();
        let usd = self.usd_rate(&mut warnings);

        let value = input.customs_value_usd;
        if !value.is_finite() || value < 0.0 {
            tracing::warn!(code, value, "rejecting customs value");
            return self.error_result(
                code,
                &usd,
                warnings,
                CalculationError::InvalidInput {
                    reason: format!("customs value must be a non-negative number, got {value}"),
                },
            );
        }

        let resolved = match resolve_tariff(self.reference, self.reference, code) {
            Ok(resolved) => resolved,
            Err(e) => {
                tracing::info!(code, "{e}");
                let error = CalculationError::TariffNotFound { code: e.code };
                return self.error_result(code, &usd, warnings, error);
            }
        };
        let tariff = &resolved.tariff;
        let quantities = input.quantities();

        let regime = resolve_regime(self.reference, input.origin_country.as_deref());
        if let Some(w) = &regime.warning {
            warnings.push(w.clone());
        }
        let base_duty = evaluate(&tariff.duty, value, &quantities, usd.rate);
        let duty = apply_regime(&regime, base_duty);
        let excise = evaluate(&tariff.excise, value, &quantities, usd.rate);

        let vat_percent = tariff.vat_percent;
        let vat_usd = (value + duty.amount_usd + excise.amount_usd) * vat_percent / 100.0;

        let fee = processing_fee(value, self.config.reference_unit_value, usd.rate);

        let mut lines = Vec::with_capacity(5);
        lines.push(LineItem::new(
            LineKind::ImportDuty,
            "Импортная пошлина",
            duty.derivation.clone(),
            duty.amount_usd,
            duty.amount_usd * usd.rate,
        ));
        if excise.amount_usd > EXCISE_DISPLAY_THRESHOLD_USD || tariff.excise.percent > 0.0 {
            lines.push(LineItem::new(
                LineKind::Excise,
                "Акцизный налог",
                excise.derivation.clone(),
                excise.amount_usd,
                excise.amount_usd * usd.rate,
            ));
        }
        lines.push(LineItem::new(
            LineKind::Vat,
            format!("НДС ({}%)", format_number(vat_percent)),
            format!(
                "{}% от (Стоимость + Пошлина + Акциз)",
                format_number(vat_percent)
            ),
            vat_usd,
            vat_usd * usd.rate,
        ));
        lines.push(LineItem::new(
            LineKind::ProcessingFee,
            "Таможенный сбор",
            fee.description.clone(),
            fee.amount_usd,
            fee.amount_local,
        ));

        let mut levy_usd = 0.0;
        if resolved.commodity.recycling_levy_applicable {
            let levy = compute_levy(
                resolved.commodity.levy_metadata.as_ref(),
                &LevyInputs {
                    classification_code: code.to_string(),
                    weight_kg: input.weight_kg,
                    engine_volume_cm3: input.item_volume_cm3,
                    power_hp: input.engine_power_hp,
                    manufacturing_year: input.manufacturing_year,
                },
                &LevyContext {
                    reference_unit_value: self.config.reference_unit_value,
                    usd_rate: usd.rate,
                    as_of_year,
                    old_age_years: self.config.old_vehicle_age_years,
                },
            );
            warnings.extend(levy.warnings.iter().cloned());
            if levy.amount_usd > 0.0 {
                levy_usd = levy.amount_usd;
                lines.push(LineItem::new(
                    LineKind::RecyclingLevy,
                    "Утилизационный сбор",
                    levy.description,
                    levy.amount_usd,
                    levy.amount_local,
                ));
            }
        }

        let unrounded_total_usd =
            duty.amount_usd + excise.amount_usd + vat_usd + fee.amount_usd + levy_usd;
        let total_usd = round2(lines.iter().map(|l| l.amount_usd).sum());
        let total_local = round2(lines.iter().map(|l| l.amount_local).sum());

        tracing::debug!(
            code,
            matched = %resolved.matched_code,
            regime = %regime.regime,
            total_usd,
            "calculation complete"
        );

        CalculationResult {
            classification_code: code.to_string(),
            matched_code: Some(resolved.matched_code),
            currency_rate: round2(usd.rate),
            rate_origin: usd.origin,
            reference_unit_value: self.config.reference_unit_value,
            total_usd,
            total_local,
            unrounded_total_usd,
            line_items: lines,
            warnings,
            error: None,
            reference_version: self.reference_version.clone(),
        }
    }

    fn usd_rate(&self, warnings: &mut Vec<String>) -> UsdRate {
        let published = self
            .reference
            .latest_usd_rate()
            .filter(|s| s.rate_per_unit().is_finite() && s.rate_per_unit() > 0.0);
        match published {
            Some(snapshot) => UsdRate {
                rate: snapshot.rate_per_unit(),
                origin: RateOrigin::Snapshot { as_of: snapshot.as_of },
            },
            None => {
                let rate = self.config.fallback_usd_rate;
                tracing::warn!(rate, "no USD rate published, using fallback");
                warnings.push(format!(
                    "no published USD rate; fallback rate {} applied",
                    format_number(rate)
                ));
                UsdRate {
                    rate,
                    origin: RateOrigin::Fallback,
                }
            }
        }
    }

    fn error_result(
        &self,
        code: &str,
        usd: &UsdRate,
        warnings: Vec<String>,
        error: CalculationError,
    ) -> CalculationResult {
        CalculationResult {
            classification_code: code.to_string(),
            matched_code: None,
            currency_rate: round2(usd.rate),
            rate_origin: usd.origin,
            reference_unit_value: self.config.reference_unit_value,
            total_usd: 0.0,
            total_local: 0.0,
            unrounded_total_usd: 0.0,
            line_items: Vec::new(),
            warnings,
            error: Some(error),
            reference_version: self.reference_version.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::ReferenceSnapshot;

    const DATA: &str = r#"
commodities:
  - { id: 1, code: "870323", description: "легковые" }
  - { id: 2, code: "8703800000", description: "электромобили", recycling_levy_applicable: true,
      levy_metadata: { type: M1, engine_type: electric } }
  - { id: 3, code: "2203000100", description: "пиво" }
  - { id: 4, code: "6403", description: "обувь" }
tariffs:
  - { commodity_id: 1, duty: { kind: ad_valorem, percent: 15 } }
  - { commodity_id: 2, duty: { kind: ad_valorem, percent: 0 } }
  - { commodity_id: 3, duty: { kind: ad_valorem, percent: 10 },
      excise: { kind: specific, per_unit_amount: 12875, per_unit_unit: l } }
  - { commodity_id: 4, duty: { kind: mixed, percent: 10, per_unit_amount: 2, per_unit_unit: kg } }
countries:
  - { iso_code: KZ, name: Казахстан, trade_regime: free_trade }
  - { iso_code: CN, name: Китай, trade_regime: most_favored }
currencies:
  - { code: USD, rate: 12875.0, as_of: 2025-01-10 }
"#;

    fn snapshot() -> ReferenceSnapshot {
        ReferenceSnapshot::from_yaml_str(DATA).unwrap()
    }

    #[test]
    fn not_found_is_zero_result() {
        let snap = snapshot();
        let calc = DutyCalculator::new(&snap);
        let out = calc.calculate_as_of(&CalculationInput::new("9999999999", 1000.0), 2025);
        assert!(matches!(
            out.error,
            Some(CalculationError::TariffNotFound { .. })
        ));
        assert_eq!(out.total_usd, 0.0);
        assert!(out.line_items.is_empty());
        assert_eq!(
            out.error.map(|e| e.to_string()).as_deref(),
            Some("Код ТН ВЭД не найден")
        );
    }

    #[test]
    fn falls_back_to_heading_tariff() {
        let snap = snapshot();
        let calc = DutyCalculator::new(&snap);
        let out = calc.calculate_as_of(
            &CalculationInput::new("8703231199", 10_000.0).with_origin("CN"),
            2025,
        );
        assert_eq!(out.matched_code.as_deref(), Some("870323"));
        let duty = out.line(LineKind::ImportDuty).unwrap();
        assert_eq!(duty.amount_usd, 1500.0);
        assert_eq!(duty.derivation, "15%");
    }

    #[test]
    fn mfn_line_items_and_totals() {
        let snap = snapshot();
        let calc = DutyCalculator::new(&snap);
        let out = calc.calculate_as_of(
            &CalculationInput::new("870323", 10_000.0).with_origin("cn"),
            2025,
        );
        let names: Vec<&str> = out.line_items.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, ["Импортная пошлина", "НДС (12%)", "Таможенный сбор"]);
        let vat = out.line(LineKind::Vat).unwrap();
        assert_eq!(vat.amount_usd, 1380.0);
        let fee = out.line(LineKind::ProcessingFee).unwrap();
        assert_eq!(fee.amount_local, 618_000.0);
        assert_eq!(fee.amount_usd, 48.0);
        assert_eq!(out.total_usd, 1500.0 + 1380.0 + 48.0);
        assert_eq!(out.rate_origin, RateOrigin::Snapshot {
            as_of: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap()
        });
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn free_trade_and_general_regimes() {
        let snap = snapshot();
        let calc = DutyCalculator::new(&snap);
        let kz = calc.calculate_as_of(
            &CalculationInput::new("870323", 1000.0).with_origin("KZ"),
            2025,
        );
        let duty = kz.line(LineKind::ImportDuty).unwrap();
        assert_eq!(duty.amount_usd, 0.0);
        assert_eq!(duty.derivation, "0% (Зона свободной торговли: KZ)");

        let none = calc.calculate_as_of(&CalculationInput::new("870323", 1000.0), 2025);
        assert_eq!(none.line(LineKind::ImportDuty).unwrap().amount_usd, 300.0);
        assert!(none.warnings.is_empty());

        let unknown = calc.calculate_as_of(
            &CalculationInput::new("870323", 1000.0).with_origin("ZZ"),
            2025,
        );
        assert_eq!(
            unknown.line(LineKind::ImportDuty).unwrap().amount_usd,
            300.0
        );
        assert_eq!(unknown.warnings.len(), 1);
    }

    #[test]
    fn greater_of_picks_per_unit_term() {
        let snap = snapshot();
        let calc = DutyCalculator::new(&snap);
        let out = calc.calculate_as_of(
            &CalculationInput::new("6403", 1000.0).with_weight(60.0).with_origin("CN"),
            2025,
        );
        let duty = out.line(LineKind::ImportDuty).unwrap();
        assert_eq!(duty.amount_usd, 120.0);
        assert!(duty.derivation.contains("не менее"));
    }

    #[test]
    fn excise_enters_vat_base() {
        let snap = snapshot();
        let calc = DutyCalculator::new(&snap);
        let out = calc.calculate_as_of(
            &CalculationInput::new("2203000100", 1000.0).with_liters(100.0).with_origin("CN"),
            2025,
        );
        let excise = out.line(LineKind::Excise).unwrap();
        assert_eq!(excise.amount_usd, 100.0);
        assert_eq!(excise.amount_local, 1_287_500.0);
        assert_eq!(out.line(LineKind::Vat).unwrap().amount_usd, 144.0);
    }

    #[test]
    fn levy_excluded_from_vat() {
        let snap = snapshot();
        let calc = DutyCalculator::new(&snap);
        let out = calc.calculate_as_of(
            &CalculationInput::new("8703800000", 30_000.0).with_origin("CN").with_year(2020),
            2025,
        );
        let levy = out.line(LineKind::RecyclingLevy).unwrap();
        assert_eq!(levy.amount_local, 90.0 * 412_000.0);
        assert_eq!(out.line(LineKind::Vat).unwrap().amount_usd, 3600.0);
    }

    #[test]
    fn missing_year_warns() {
        let snap = snapshot();
        let calc = DutyCalculator::new(&snap);
        let out = calc.calculate_as_of(&CalculationInput::new("8703800000", 30_000.0), 2025);
        assert_eq!(
            out.line(LineKind::RecyclingLevy).unwrap().amount_local,
            30.0 * 412_000.0
        );
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn fallback_rate_when_unpublished() {
        let snap = ReferenceSnapshot::from_yaml_str(
            r#"
commodities:
  - { id: 1, code: "870323" }
tariffs:
  - { commodity_id: 1, duty: { percent: 15 } }
"#,
        )
        .unwrap();
        let calc = DutyCalculator::new(&snap);
        let out = calc.calculate_as_of(&CalculationInput::new("870323", 100.0), 2025);
        assert_eq!(out.rate_origin, RateOrigin::Fallback);
        assert_eq!(out.currency_rate, 12_850.0);
        assert!(out.warnings.iter().any(|w| w.contains("fallback")));
    }

    #[test]
    fn invalid_value_is_error_result() {
        let snap = snapshot();
        let calc = DutyCalculator::new(&snap);
        let out = calc.calculate_as_of(&CalculationInput::new("870323", f64::NAN), 2025);
        assert!(matches!(
            out.error,
            Some(CalculationError::InvalidInput { .. })
        ));
        assert_eq!(out.total_local, 0.0);
    }

    #[test]
    fn reference_version_is_stamped() {
        let snap = snapshot();
        let digest = snap.digest().unwrap().to_string();
        let calc = DutyCalculator::new(&snap).with_reference_version(digest.clone());
        let out = calc.calculate_as_of(&CalculationInput::new("870323", 100.0), 2025);
        assert_eq!(out.reference_version, Some(digest));
    }

    #[test]
    fn result_serializes_with_tagged_rate_origin() {
        let snap = snapshot();
        let out = DutyCalculator::new(&snap)
            .calculate_as_of(&CalculationInput::new("870323", 100.0), 2025);
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["rate_origin"]["source"], "snapshot");
        assert_eq!(json["line_items"][0]["kind"], "import_duty");
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn general_duty_is_twice_most_favored(value in 0.0f64..1e7) {
                let snap = snapshot();
                let calc = DutyCalculator::new(&snap);
                let mfn = calc.calculate_as_of(
                    &CalculationInput::new("870323", value).with_origin("CN"),
                    2025,
                );
                let gen = calc.calculate_as_of(&CalculationInput::new("870323", value), 2025);
                let a = mfn.line(LineKind::ImportDuty).map(|l| l.amount_usd).unwrap_or_default();
                let b = gen.line(LineKind::ImportDuty).map(|l| l.amount_usd).unwrap_or_default();
                prop_assert!((b - 2.0 * a).abs() <= 0.011);
            }

            #[test]
            fn repeated_calculation_is_identical(value in 0.0f64..1e6, liters in 0.0f64..1e4) {
                let snap = snapshot();
                let calc = DutyCalculator::new(&snap);
                let input = CalculationInput::new("2203000100", value)
                    .with_liters(liters)
                    .with_origin("CN");
                prop_assert_eq!(calc
                    .calculate_as_of(&input, 2025), calc.calculate_as_of(&input, 2025));
            }

            #[test]
            fn total_is_sum_of_rounded_lines(value in 0.0f64..1e7) {
                let snap = snapshot();
                let out = DutyCalculator::new(&snap)
                    .calculate_as_of(&CalculationInput::new("870323", value), 2025);
                let sum: f64 = out.line_items.iter().map(|l| l.amount_usd).sum();
                prop_assert_eq!(out.total_usd, round2(sum));
            }
        }
    }
}

//! # Recycling Levy
//!
//! Levy on imported vehicles and tires, in reference units (БРВ).
//!
//! ## Schedule
//!
//! | Category | Driver | Table |
//! |----------|--------|-------|
//! | tire | weight | `weight_kg × 0.003` reference units |
//! | passenger, electric | none | [`ELECTRIC_PASSENGER`] |
//! | passenger, ICE/hybrid | displacement cm³ | [`PASSENGER_BY_DISPLACEMENT`] |
//! | truck | weight in tonnes | [`TRUCK_BY_TONNES`], [`ELECTRIC_TRUCK`] override |
//! | tractor | horsepower | [`TRACTOR_BY_HP`], [`ROAD_TRACTOR`] override for code `87012…` |
//! | special | horsepower | [`SPECIAL_BASE`] with power uplifts when old |
//! | other | none | no levy |
//!
//! Every vehicle row has a new and an old rate. A vehicle is old when more
//! than [`LevyContext::old_age_years`] years have passed since manufacture.
//! A missing manufacturing year is treated as new and reported as a warning.
//!
//! The levy is excluded from the VAT base; that is the orchestrator's
//! concern, not this module's.

use serde::{Deserialize, Serialize};

use duty_core::{format_number, LevyMetadata, Propulsion, VehicleCategory};

/// Years after which a vehicle is old.
pub const DEFAULT_OLD_AGE_YEARS: i32 = 3;

/// Tire levy in reference units per kilogram.
pub const TIRE_UNITS_PER_KG: f64 = 0.003;

/// Code prefix of road tractors for semi-trailers.
pub const ROAD_TRACTOR_PREFIX: &str = "87012";

// ---------------------------------------------------------------------------
// Bracket tables
// ---------------------------------------------------------------------------

/// New and old rates in reference units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LevyRate {
    /// Units for a vehicle no older than the age threshold.
    pub new_units: f64,
    /// Units for an old vehicle.
    pub old_units: f64,
}

impl LevyRate {
    pub const fn new(new_units: f64, old_units: f64) -> Self {
        Self {
            new_units,
            old_units,
        }
    }

    /// The rate for the given age class.
    pub fn for_age(&self, is_old: bool) -> f64 {
        if is_old {
            self.old_units
        } else {
            self.new_units
        }
    }
}

/// Upper edge of a bracket.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UpperBound {
    /// `value < bound`
    Below(f64),
    /// `value <= bound`
    AtMost(f64),
    /// Catches everything.
    Unbounded,
}

impl UpperBound {
    fn admits(self, value: f64) -> bool {
        match self {
            Self::Below(b) => value < b,
            Self::AtMost(b) => value <= b,
            Self::Unbounded => true,
        }
    }
}

/// One bracket row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevyBracket {
    /// Upper edge; the lower edge is the previous row's.
    pub upper: UpperBound,
    /// Rate for values in this row.
    pub rate: LevyRate,
}

const fn bracket(upper: UpperBound, new_units: f64, old_units: f64) -> LevyBracket {
    LevyBracket {
        upper,
        rate: LevyRate::new(new_units, old_units),
    }
}

/// Passenger cars with combustion or hybrid propulsion, by displacement.
pub const PASSENGER_BY_DISPLACEMENT: &[LevyBracket] = &[
    bracket(UpperBound::Below(1000.0), 30.0, 90.0),
    bracket(UpperBound::Below(2000.0), 120.0, 210.0),
    bracket(UpperBound::Below(3000.0), 180.0, 330.0),
    bracket(UpperBound::Below(3500.0), 180.0, 390.0),
    bracket(UpperBound::Unbounded, 300.0, 480.0),
];

/// Electric passenger cars.
pub const ELECTRIC_PASSENGER: LevyRate = LevyRate::new(30.0, 90.0);

/// Trucks by gross weight in tonnes. Above the last row no levy applies.
pub const TRUCK_BY_TONNES: &[LevyBracket] = &[
    bracket(UpperBound::AtMost(2.5), 100.0, 150.0),
    bracket(UpperBound::AtMost(3.5), 210.0, 300.0),
    bracket(UpperBound::AtMost(5.0), 210.0, 300.0),
    bracket(UpperBound::AtMost(8.0), 210.0, 300.0),
    bracket(UpperBound::AtMost(12.0), 300.0, 810.0),
    bracket(UpperBound::AtMost(20.0), 330.0, 1200.0),
    bracket(UpperBound::AtMost(50.0), 690.0, 1410.0),
];

/// Electric trucks, regardless of weight.
pub const ELECTRIC_TRUCK: LevyRate = LevyRate::new(120.0, 150.0);

/// Tractors by engine power in horsepower.
pub const TRACTOR_BY_HP: &[LevyBracket] = &[
    bracket(UpperBound::AtMost(25.0), 0.0, 120.0),
    bracket(UpperBound::AtMost(51.0), 0.0, 240.0),
    bracket(UpperBound::AtMost(102.0), 0.0, 360.0),
    bracket(UpperBound::AtMost(177.0), 0.0, 480.0),
    bracket(UpperBound::Unbounded, 0.0, 600.0),
];

/// Road tractors for semi-trailers.
pub const ROAD_TRACTOR: LevyRate = LevyRate::new(670.0, 1360.0);

/// Special-purpose machinery before power uplifts.
pub const SPECIAL_BASE: LevyRate = LevyRate::new(0.0, 240.0);

/// Old special machinery: (power above, old rate), checked in order, last
/// match wins.
pub const SPECIAL_OLD_POWER_UPLIFTS: &[(f64, f64)] = &[(170.0, 360.0), (250.0, 480.0)];

/// First bracket admitting `value`.
pub fn lookup(table: &[LevyBracket], value: f64) -> Option<LevyRate> {
    table.iter().find(|b| b.upper.admits(value)).map(|b| b.rate)
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Request-side inputs to the levy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LevyInputs {
    /// Requested classification code.
    pub classification_code: String,
    /// Gross weight, kg.
    #[serde(default)]
    pub weight_kg: f64,
    /// Engine displacement, cm³.
    #[serde(default)]
    pub engine_volume_cm3: f64,
    /// Engine power, hp.
    #[serde(default)]
    pub power_hp: f64,
    /// Year of manufacture.
    #[serde(default)]
    pub manufacturing_year: Option<i32>,
}

/// Per-calculation parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevyContext {
    /// Local currency per reference unit.
    pub reference_unit_value: f64,
    /// Local currency per USD.
    pub usd_rate: f64,
    /// Year the vehicle age is measured at.
    pub as_of_year: i32,
    /// Age (in years) above which a vehicle counts as old.
    pub old_age_years: i32,
}

/// A vehicle as the schedule sees it: metadata merged with request values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleProfile {
    pub category: VehicleCategory,
    pub propulsion: Propulsion,
    pub displacement_cm3: f64,
    /// Displacement came from the nomenclature range, not the request.
    pub displacement_estimated: bool,
    pub weight_kg: f64,
    pub power_hp: f64,
    pub manufacturing_year: Option<i32>,
    pub classification_code: String,
}

impl VehicleProfile {
    /// Merge commodity metadata with request inputs. A positive request
    /// value wins; otherwise the metadata hint is used; otherwise zero.
    ///
    /// The displacement hint is [`LevyMetadata::displacement_hint`], a
    /// point inside the stated range rather than its upper edge.
    pub fn resolve(metadata: &LevyMetadata, inputs: &LevyInputs) -> Self {
        let prefer = |request: f64, hint: Option<f64>| {
            if request > 0.0 {
                request
            } else {
                hint.unwrap_or(0.0)
            }
        };
        let displacement_hint = metadata.displacement_hint();
        Self {
            category: metadata.category,
            propulsion: metadata.engine_type,
            displacement_cm3: prefer(inputs.engine_volume_cm3, displacement_hint),
            displacement_estimated: inputs.engine_volume_cm3 <= 0.0 && displacement_hint.is_some(),
            weight_kg: prefer(inputs.weight_kg, metadata.weight_ton.map(|t| t * 1000.0)),
            power_hp: prefer(inputs.power_hp, metadata.power_hp_hint()),
            manufacturing_year: inputs.manufacturing_year,
            classification_code: inputs.classification_code.trim().to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Assessment
// ---------------------------------------------------------------------------

/// Computed levy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevyAssessment {
    /// Levy in reference units.
    pub units: f64,
    /// Levy in local currency.
    pub amount_local: f64,
    /// Levy in USD at the calculation rate.
    pub amount_usd: f64,
    /// Assessed at the old-vehicle rate.
    pub is_old: bool,
    /// Derivation text for the payment line.
    pub description: String,
    /// Assumptions made for missing inputs.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl LevyAssessment {
    fn none(description: impl Into<String>) -> Self {
        Self {
            units: 0.0,
            amount_local: 0.0,
            amount_usd: 0.0,
            is_old: false,
            description: description.into(),
            warnings: Vec::new(),
        }
    }

    fn from_units(units: f64, is_old: bool, description: String, ctx: &LevyContext) -> Self {
        let amount_local = units * ctx.reference_unit_value;
        let amount_usd = if ctx.usd_rate > 0.0 {
            amount_local / ctx.usd_rate
        } else {
            0.0
        };
        Self {
            units,
            amount_local,
            amount_usd,
            is_old,
            description,
            warnings: Vec::new(),
        }
    }
}

/// Compute the recycling levy. `None` metadata means the levy does not
/// apply to the commodity.
pub fn compute_levy(
    metadata: Option<&LevyMetadata>,
    inputs: &LevyInputs,
    ctx: &LevyContext,
) -> LevyAssessment {
    let Some(metadata) = metadata else {
        return LevyAssessment::none("Не применяется");
    };
    let profile = VehicleProfile::resolve(metadata, inputs);

    if profile.category == VehicleCategory::Tire {
        return tire_levy(&profile, ctx);
    }

    let mut warnings = Vec::new();
    let year = match profile.manufacturing_year {
        Some(year) => year,
        None => {
            tracing::warn!(
                code = %profile.classification_code,
                "manufacturing year missing, assessing levy as new vehicle"
            );
            warnings.push(
                "manufacturing year not provided; levy assessed as for a new vehicle".to_string(),
            );
            ctx.as_of_year
        }
    };
    let age = i64::from(ctx.as_of_year) - i64::from(year);
    let is_old = age > i64::from(ctx.old_age_years);

    if profile.displacement_estimated
        && profile.category == VehicleCategory::Passenger
        && profile.propulsion != Propulsion::Electric
    {
        tracing::warn!(
            code = %profile.classification_code,
            displacement = profile.displacement_cm3,
            "engine displacement missing, using nomenclature range"
        );
        warnings.push(format!(
            "engine displacement not provided; assessed at {} cm3 from the nomenclature range",
            format_number(profile.displacement_cm3)
        ));
    }

    let Some((units, label)) = vehicle_units(&profile, is_old) else {
        let mut out = LevyAssessment::none("Утильсбор не начисляется (или 0)");
        out.warnings = warnings;
        return out;
    };

    let mut out = if units > 0.0 {
        let age_label = if is_old {
            format!("> {} лет", ctx.old_age_years)
        } else {
            format!("до {} лет", ctx.old_age_years)
        };
        LevyAssessment::from_units(
            units,
            is_old,
            format!(
                "Утильсбор ({label}, {age_label}): {} БРВ",
                format_number(units)
            ),
            ctx,
        )
    } else {
        let mut none = LevyAssessment::none("Утильсбор не начисляется (или 0)");
        none.is_old = is_old;
        none
    };
    out.warnings = warnings;
    out
}

fn tire_levy(profile: &VehicleProfile, ctx: &LevyContext) -> LevyAssessment {
    if profile.weight_kg <= 0.0 || !profile.weight_kg.is_finite() {
        tracing::warn!(
            code = %profile.classification_code,
            "tire weight missing, levy not assessed"
        );
        let mut out = LevyAssessment::none("Требуется вес шин");
        out.warnings.push("tire weight not provided; levy not assessed".to_string());
        return out;
    }
    let units = profile.weight_kg * TIRE_UNITS_PER_KG;
    LevyAssessment::from_units(
        units,
        false,
        format!("Шины: {}кг * 0.3% БРВ", format_number(profile.weight_kg)),
        ctx,
    )
}

/// Units and description label for a vehicle; `None` when no row applies.
fn vehicle_units(profile: &VehicleProfile, is_old: bool) -> Option<(f64, String)> {
    match profile.category {
        VehicleCategory::Passenger => {
            if profile.propulsion == Propulsion::Electric {
                return Some((
                    ELECTRIC_PASSENGER.for_age(is_old),
                    "Электромобиль".to_string(),
                ));
            }
            let rate = lookup(PASSENGER_BY_DISPLACEMENT, profile.displacement_cm3)?;
            Some((
                rate.for_age(is_old),
                format!(
                    "Легковой (V={} см3)",
                    format_number(profile.displacement_cm3)
                ),
            ))
        }
        VehicleCategory::Truck => {
            if profile.propulsion == Propulsion::Electric {
                return Some((
                    ELECTRIC_TRUCK.for_age(is_old),
                    "Электрогрузовик".to_string(),
                ));
            }
            let tonnes = profile.weight_kg / 1000.0;
            let rate = lookup(TRUCK_BY_TONNES, tonnes)?;
            Some((rate.for_age(is_old), format!("Грузовик ({tonnes:.1}т)")))
        }
        VehicleCategory::Tractor => {
            if profile.classification_code.starts_with(ROAD_TRACTOR_PREFIX) {
                return Some((
                    ROAD_TRACTOR.for_age(is_old),
                    "Седельный тягач".to_string(),
                ));
            }
            let rate = lookup(TRACTOR_BY_HP, profile.power_hp)?;
            Some((
                rate.for_age(is_old),
                format!("Трактор ({} л.с.)", format_number(profile.power_hp)),
            ))
        }
        VehicleCategory::Special => {
            let mut units = SPECIAL_BASE.for_age(is_old);
            if is_old {
                for (above, old_units) in SPECIAL_OLD_POWER_UPLIFTS {
                    if profile.power_hp > *above {
                        units = *old_units;
                    }
                }
            }
            Some((units, "Спецтехника".to_string()))
        }
        VehicleCategory::Tire | VehicleCategory::Other => {
            tracing::debug!(
                category = %profile.category,
                "no levy schedule for category"
            );
            None
        }
    }
}

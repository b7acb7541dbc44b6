//! # Units of Measure
//!
//! Two tables drive all unit handling:
//!
//! - [`UNIT_ROOTS`] maps raw bilingual (Russian/Uzbek) tokens found in
//!   tariff cells to canonical unit codes. Used by [`normalize_unit`].
//! - [`UNIT_TABLE`] maps canonical codes (and their Cyrillic spellings) to a
//!   [`MeasureCategory`] and a [`UnitScale`]. Used by [`resolve_unit`] when a
//!   per-unit rate is evaluated against declared quantities.
//!
//! Both tables are ordered; the first matching row wins.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Categories and scales
// ---------------------------------------------------------------------------

/// The physical quantity a unit measures.
///
/// Each category selects one declared quantity from [`Quantities`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasureCategory {
    /// Net weight in kilograms.
    Mass,
    /// Piece count.
    Count,
    /// Liquid volume in litres.
    LiquidVolume,
    /// Engine or item volume in cubic centimetres.
    ItemVolume,
    /// Area, length, energy, radioactivity, carats. Measured in pieces
    /// as declared by the caller.
    Other,
}

impl MeasureCategory {
    /// Return the string representation of this category.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mass => "mass",
            Self::Count => "count",
            Self::LiquidVolume => "liquid_volume",
            Self::ItemVolume => "item_volume",
            Self::Other => "other",
        }
    }

    /// Return all category variants.
    pub fn all() -> &'static [MeasureCategory] {
        &[
            Self::Mass,
            Self::Count,
            Self::LiquidVolume,
            Self::ItemVolume,
            Self::Other,
        ]
    }
}

impl std::fmt::Display for MeasureCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a declared quantity converts into the rate's unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnitScale {
    /// Quantity multiplied by the factor (kg → g is `Multiply(1000.0)`).
    Multiply(f64),
    /// Quantity divided by the divisor (pieces → thousands is `Divide(1000.0)`).
    Divide(f64),
    /// Declared volume is taken as cm³ and converted to m³ when it exceeds
    /// 100; smaller values are assumed to already be m³.
    CubicMetres,
}

impl UnitScale {
    /// Threshold above which a declared volume is read as cm³.
    pub const CUBIC_CENTIMETRE_THRESHOLD: f64 = 100.0;

    /// Convert a declared quantity into the rate's unit.
    pub fn apply(self, quantity: f64) -> f64 {
        match self {
            Self::Multiply(f) => quantity * f,
            Self::Divide(d) => quantity / d,
            Self::CubicMetres => {
                if quantity > Self::CUBIC_CENTIMETRE_THRESHOLD {
                    quantity / 1_000_000.0
                } else {
                    quantity
                }
            }
        }
    }
}

/// One row of the unit table.
#[derive(Debug, Clone, Copy)]
pub struct UnitEntry {
    /// Canonical code first, then accepted spellings. Lower-case.
    pub codes: &'static [&'static str],
    /// Which declared quantity the unit measures.
    pub category: MeasureCategory,
    /// Conversion from the declared quantity.
    pub scale: UnitScale,
}

impl UnitEntry {
    /// The canonical code for this row.
    pub fn canonical(&self) -> &'static str {
        self.codes.first().copied().unwrap_or_default()
    }
}

/// Units a per-unit rate can be denominated in.
pub const UNIT_TABLE: &[UnitEntry] = &[
    // Mass
    UnitEntry {
        codes: &[
            "kg", "кг", "kg_90_dry", "kg_h2o2", "kg_k2o", "kg_n", "kg_naoh", "kg_p2o5", "kg_u",
            "kg_koh",
        ],
        category: MeasureCategory::Mass,
        scale: UnitScale::Multiply(1.0),
    },
    UnitEntry {
        codes: &["g", "г", "g_di"],
        category: MeasureCategory::Mass,
        scale: UnitScale::Multiply(1000.0),
    },
    UnitEntry {
        codes: &["t", "т"],
        category: MeasureCategory::Mass,
        scale: UnitScale::Divide(1000.0),
    },
    // Count
    UnitEntry {
        codes: &["pcs", "шт", "pair", "пар"],
        category: MeasureCategory::Count,
        scale: UnitScale::Multiply(1.0),
    },
    UnitEntry {
        codes: &["100_pcs", "100 шт"],
        category: MeasureCategory::Count,
        scale: UnitScale::Divide(100.0),
    },
    UnitEntry {
        codes: &["1000_pcs", "1000 шт"],
        category: MeasureCategory::Count,
        scale: UnitScale::Divide(1000.0),
    },
    // Liquid volume
    UnitEntry {
        codes: &["l", "л", "литр", "l_alc_100", "л100% сп."],
        category: MeasureCategory::LiquidVolume,
        scale: UnitScale::Multiply(1.0),
    },
    UnitEntry {
        codes: &["ml"],
        category: MeasureCategory::LiquidVolume,
        scale: UnitScale::Multiply(1000.0),
    },
    UnitEntry {
        codes: &["1000_l", "1000 л."],
        category: MeasureCategory::LiquidVolume,
        scale: UnitScale::Divide(1000.0),
    },
    // Item volume
    UnitEntry {
        codes: &["cm3", "см3"],
        category: MeasureCategory::ItemVolume,
        scale: UnitScale::Multiply(1.0),
    },
    UnitEntry {
        codes: &["m3", "м3"],
        category: MeasureCategory::ItemVolume,
        scale: UnitScale::CubicMetres,
    },
    // Other
    UnitEntry {
        codes: &["m2", "м2", "m", "м", "carat", "кар", "ci", "кюри"],
        category: MeasureCategory::Other,
        scale: UnitScale::Multiply(1.0),
    },
    UnitEntry {
        codes: &["1000_m2", "1000 м2", "1000_kwh", "1000 квтч"],
        category: MeasureCategory::Other,
        scale: UnitScale::Divide(1000.0),
    },
];

/// Look up a unit code in [`UNIT_TABLE`]. Case and surrounding whitespace
/// are ignored.
pub fn resolve_unit(code: &str) -> Option<&'static UnitEntry> {
    let needle = code.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }
    UNIT_TABLE
        .iter()
        .find(|entry| entry.codes.iter().any(|c| *c == needle))
}

// ---------------------------------------------------------------------------
// Normalization of raw tokens
// ---------------------------------------------------------------------------

/// Marker for "per thousand units" in source tables.
const THOUSAND_MARKER: &str = "1000";

/// Canonical code for thousands of pieces.
pub const THOUSAND_PIECES: &str = "1000_pcs";

/// Substring roots checked in order against a lower-cased token.
pub const UNIT_ROOTS: &[(&[&str], &str)] = &[
    (&["кило", "кг"], "kg"),
    (&["литр"], "l"),
    (&["штук", "шт", "дон"], "pcs"),
    (&["пар", "жуфт"], "pair"),
    (&["куб", "см"], "cm3"),
    (&["м2"], "m2"),
];

/// Normalize a raw unit token to a canonical unit code.
///
/// A `1000` anywhere in the token short-circuits to [`THOUSAND_PIECES`].
/// Otherwise the first [`UNIT_ROOTS`] row with a root contained in the
/// token wins. Unrecognized tokens pass through lower-cased and trimmed.
pub fn normalize_unit(raw: &str) -> String {
    let token = raw.trim().to_lowercase();
    if token.contains(THOUSAND_MARKER) {
        return THOUSAND_PIECES.to_string();
    }
    UNIT_ROOTS
        .iter()
        .find(|(roots, _)| roots.iter().any(|root| token.contains(root)))
        .map(|(_, code)| (*code).to_string())
        .unwrap_or(token)
}

// ---------------------------------------------------------------------------
// Declared quantities
// ---------------------------------------------------------------------------

/// Physical quantities declared for a consignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Quantities {
    /// Net weight, kilograms.
    #[serde(default)]
    pub weight_kg: f64,
    /// Piece count (also used for area, length and energy units).
    #[serde(default)]
    pub pieces: f64,
    /// Liquid volume, litres.
    #[serde(default)]
    pub liters: f64,
    /// Engine or item volume, cm³.
    #[serde(default)]
    pub item_volume_cm3: f64,
}

impl Quantities {
    /// The declared quantity measured by `category`.
    pub fn for_category(&self, category: MeasureCategory) -> f64 {
        match category {
            MeasureCategory::Mass => self.weight_kg,
            MeasureCategory::Count | MeasureCategory::Other => self.pieces,
            MeasureCategory::LiquidVolume => self.liters,
            MeasureCategory::ItemVolume => self.item_volume_cm3,
        }
    }

    /// The declared quantity converted into `unit`, or `None` when the unit
    /// is not in [`UNIT_TABLE`].
    pub fn measure(&self, unit: &str) -> Option<f64> {
        resolve_unit(unit).map(|entry| entry.scale.apply(self.for_category(entry.category)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_known_roots() {
        assert_eq!(normalize_unit("Кг"), "kg");
        assert_eq!(normalize_unit("килограмм"), "kg");
        assert_eq!(normalize_unit("литр"), "l");
        assert_eq!(normalize_unit("шт."), "pcs");
        assert_eq!(normalize_unit("дона"), "pcs");
        assert_eq!(normalize_unit("пара"), "pair");
        assert_eq!(normalize_unit("жуфт"), "pair");
        assert_eq!(normalize_unit("см3"), "cm3");
        assert_eq!(normalize_unit("м2"), "m2");
    }

    #[test]
    fn normalize_thousand_short_circuits() {
        assert_eq!(normalize_unit("1000 шт"), THOUSAND_PIECES);
        assert_eq!(normalize_unit("за 1000 кг"), THOUSAND_PIECES);
    }

    #[test]
    fn normalize_passes_unknown_through() {
        assert_eq!(normalize_unit("  Carat "), "carat");
        assert_eq!(normalize_unit(""), "");
    }

    #[test]
    fn normalize_order_prefers_earlier_rows() {
        // "кг" is checked before "шт".
        assert_eq!(normalize_unit("кг/шт"), "kg");
    }

    #[test]
    fn resolve_every_canonical_code() {
        for entry in UNIT_TABLE {
            let found = resolve_unit(entry.canonical()).unwrap();
            assert_eq!(found.category, entry.category);
        }
    }

    #[test]
    fn resolve_is_case_insensitive() {
        assert_eq!(
            resolve_unit("1000 кВтч").unwrap().category,
            MeasureCategory::Other
        );
        assert_eq!(resolve_unit("KG").unwrap().category, MeasureCategory::Mass);
        assert!(resolve_unit("furlong").is_none());
        assert!(resolve_unit("").is_none());
    }

    #[test]
    fn every_category_has_a_unit() {
        for cat in MeasureCategory::all() {
            assert!(UNIT_TABLE.iter().any(|e| e.category == *cat), "{cat}");
        }
    }

    #[test]
    fn measure_scales_quantities() {
        let q = Quantities {
            weight_kg: 60.0,
            pieces: 2500.0,
            liters: 3.0,
            item_volume_cm3: 1_500_000.0,
        };
        assert_eq!(q.measure("kg"), Some(60.0));
        assert_eq!(q.measure("g"), Some(60_000.0));
        assert_eq!(q.measure("т"), Some(0.06));
        assert_eq!(q.measure("1000_pcs"), Some(2.5));
        assert_eq!(q.measure("100 шт"), Some(25.0));
        assert_eq!(q.measure("ml"), Some(3000.0));
        assert_eq!(q.measure("m3"), Some(1.5));
        assert_eq!(q.measure("carat"), Some(2500.0));
        assert_eq!(q.measure("unknown"), None);
    }

    #[test]
    fn cubic_metres_small_values_pass_through() {
        assert_eq!(UnitScale::CubicMetres.apply(12.0), 12.0);
        assert_eq!(UnitScale::CubicMetres.apply(100.0), 100.0);
        assert_eq!(UnitScale::CubicMetres.apply(2_000_000.0), 2.0);
    }
}

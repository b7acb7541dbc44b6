//! Levy metadata inferred from a nomenclature entry.
//!
//! Reference data is often loaded without levy attributes. The category
//! follows from the code heading; propulsion, displacement, power,
//! condition and gross weight are read from the Russian description text.

use std::sync::OnceLock;

use regex::Regex;

use duty_core::{LevyMetadata, Propulsion, VehicleCategory};

/// Heading prefixes and the category they imply, checked in order.
const HEADINGS: &[(&str, &str)] = &[
    ("8703", "M1"),
    ("8701", "tractor"),
    ("8704", "N"),
    ("8702", "M2_M3"),
    ("8705", "special"),
    ("4011", "tire"),
    ("4012", "tire"),
];

struct Patterns {
    volume: Regex,
    power_kw: Regex,
    power_hp: Regex,
    used_years: Regex,
    gross_weight: Regex,
}

static PATTERNS: OnceLock<Option<Patterns>> = OnceLock::new();

fn patterns() -> Option<&'static Patterns> {
    PATTERNS
        .get_or_init(|| {
            Some(Patterns {
                volume: Regex::new(r"([0-9]+)\s*см").ok()?,
                power_kw: Regex::new(r"([0-9]+)\s*квт").ok()?,
                power_hp: Regex::new(r"([0-9]+)\s*л\.?с").ok()?,
                used_years: Regex::new(r"прошло более ([0-9]+)\s*лет").ok()?,
                gross_weight: Regex::new(r"массой.*?([0-9]+(?:[.,][0-9]+)?)\s*т").ok()?,
            })
        })
        .as_ref()
}

fn first_number(re: &Regex, text: &str) -> Option<f64> {
    re.captures(text)?
        .get(1)?
        .as_str()
        .replace(',', ".")
        .parse()
        .ok()
}

/// How a displacement figure relates to the vehicle.
#[derive(Debug, Clone, Copy, PartialEq)]
enum VolumeBound {
    /// "более X": strictly above.
    Above,
    /// "не более X": at most.
    AtMost,
    /// A plain figure.
    Exact,
}

fn stated_volumes(re: &Regex, text: &str) -> Vec<(VolumeBound, f64)> {
    re.captures_iter(text)
        .filter_map(|c| {
            let m = c.get(1)?;
            let value: f64 = m.as_str().parse().ok()?;
            let before = text[..m.start()].trim_end();
            let bound = if before.ends_with("не более") {
                VolumeBound::AtMost
            } else if before.ends_with("более") {
                VolumeBound::Above
            } else {
                VolumeBound::Exact
            };
            Some((bound, value))
        })
        .collect()
}

/// Tightest `(exclusive lower, inclusive upper)` range the figures state.
/// A plain figure pins both ends.
fn volume_bounds(volumes: &[(VolumeBound, f64)]) -> (Option<f64>, Option<f64>) {
    let mut lower: Option<f64> = None;
    let mut upper: Option<f64> = None;
    for &(bound, value) in volumes {
        match bound {
            VolumeBound::Above => lower = Some(lower.map_or(value, |l| l.max(value))),
            VolumeBound::AtMost => upper = Some(upper.map_or(value, |u| u.min(value))),
            VolumeBound::Exact => return (Some(value), Some(value)),
        }
    }
    (lower, upper)
}

/// Infer levy metadata for a commodity. `None` for commodities outside the
/// vehicle and tire headings.
pub fn infer_levy_metadata(code: &str, description: &str) -> Option<LevyMetadata> {
    let code = code.trim();
    let (_, class) = HEADINGS.iter().find(|(prefix, _)| code.starts_with(prefix))?;
    let category = VehicleCategory::parse(class);

    let mut meta = LevyMetadata::new(category, Propulsion::Ice);
    if category == VehicleCategory::Other {
        meta.extra.insert("class".into(), serde_json::Value::from(*class));
    }
    if category == VehicleCategory::Tire {
        return Some(meta);
    }

    let text = description.to_lowercase();
    let electric = text.contains("электрическим двигателем");
    let combustion = text.contains("внутреннего сгорания");
    meta.engine_type = if electric && !combustion {
        Propulsion::Electric
    } else if text.contains("гибрид") || electric {
        Propulsion::Hybrid
    } else {
        Propulsion::Ice
    };

    let Some(p) = patterns() else {
        return Some(meta);
    };

    let volumes = stated_volumes(&p.volume, &text);
    if !volumes.is_empty() {
        let (lower, upper) = volume_bounds(&volumes);
        meta.engine_volume_min_cm3 = lower;
        meta.engine_volume_cm3 = upper;
        let mentioned: Vec<f64> = volumes.iter().map(|(_, v)| *v).collect();
        meta.extra.insert("volumes_mentioned".into(), mentioned.into());
    }

    meta.power_kw = first_number(&p.power_kw, &text);
    meta.power_hp = first_number(&p.power_hp, &text);

    if text.contains("новые") {
        meta.condition = Some("new".into());
        meta.extra.insert("age_group".into(), "0-3".into());
    } else if text.contains("бывшие в эксплуатации") {
        meta.condition = Some("used".into());
        let group = match first_number(&p.used_years, &text) {
            Some(years) => format!(">{years}"),
            None => "3+".to_string(),
        };
        meta.extra.insert("age_group".into(), group.into());
    }

    meta.weight_ton = first_number(&p.gross_weight, &text);
    Some(meta)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_vehicle_is_none() {
        let beer = infer_levy_metadata("2203000100", "пиво солодовое");
        assert!(beer.is_none());
    }

    #[test]
    fn tire_by_heading() {
        let m = infer_levy_metadata("4011100000", "шины пневматические").unwrap();
        assert_eq!(m.category, VehicleCategory::Tire);
        assert!(m.engine_volume_cm3.is_none());
    }

    #[test]
    fn passenger_with_volume_range() {
        let m = infer_levy_metadata(
            "8703231199",
            "с рабочим объемом цилиндров более 1500 см3, но не более 3000 см3, новые",
        )
        .unwrap();
        assert_eq!(m.category, VehicleCategory::Passenger);
        assert_eq!(m.engine_type, Propulsion::Ice);
        assert_eq!(m.engine_volume_min_cm3, Some(1500.0));
        assert_eq!(m.engine_volume_cm3, Some(3000.0));
        assert_eq!(m.displacement_hint(), Some(2250.0));
        assert_eq!(m.condition.as_deref(), Some("new"));
        assert_eq!(m.extra["age_group"], "0-3");
    }

    #[test]
    fn upper_bound_only() {
        let m = infer_levy_metadata(
            "8703210000",
            "с рабочим объемом цилиндров двигателя не более 1000 см3",
        )
        .unwrap();
        assert_eq!(m.engine_volume_min_cm3, None);
        assert_eq!(m.engine_volume_cm3, Some(1000.0));
        assert_eq!(m.displacement_hint(), Some(500.0));
    }

    #[test]
    fn lower_bound_only() {
        let m = infer_levy_metadata(
            "8703240000",
            "с рабочим объемом цилиндров двигателя более 3000 см3",
        )
        .unwrap();
        assert_eq!(m.engine_volume_min_cm3, Some(3000.0));
        assert_eq!(m.engine_volume_cm3, None);
    }

    #[test]
    fn electric_and_hybrid() {
        let e = infer_levy_metadata("8703800000", "с электрическим двигателем").unwrap();
        assert_eq!(e.engine_type, Propulsion::Electric);
        let h = infer_levy_metadata(
            "8703400000",
            "с двигателем внутреннего сгорания и электрическим двигателем",
        )
        .unwrap();
        assert_eq!(h.engine_type, Propulsion::Hybrid);
    }

    #[test]
    fn used_with_age() {
        let m = infer_levy_metadata(
            "8703239090",
            "бывшие в эксплуатации, с момента выпуска которых прошло более 7 лет",
        )
        .unwrap();
        assert_eq!(m.condition.as_deref(), Some("used"));
        assert_eq!(m.extra["age_group"], ">7");
    }

    #[test]
    fn truck_weight_and_tractor_power() {
        let t = infer_levy_metadata(
            "8704219900",
            "с полной массой транспортного средства не более 5т",
        )
        .unwrap();
        assert_eq!(t.category, VehicleCategory::Truck);
        assert_eq!(t.weight_ton, Some(5.0));

        let tr = infer_levy_metadata("8701910000", "мощностью двигателя не более 18 кВт").unwrap();
        assert_eq!(tr.category, VehicleCategory::Tractor);
        assert_eq!(tr.power_kw, Some(18.0));
        assert!(tr.power_hp_hint().is_some());
    }

    #[test]
    fn bus_keeps_class() {
        let b = infer_levy_metadata("8702109000", "автобусы").unwrap();
        assert_eq!(b.category, VehicleCategory::Other);
        assert_eq!(b.extra["class"], "M2_M3");
    }
}

//! # Calculate Subcommand
//!
//! Loads a reference snapshot, runs one calculation and prints the result
//! as JSON. The result is stamped with the snapshot digest.
//!
//! Exit code 0 on a successful assessment, 1 when the result carries an
//! error (unknown code, invalid value).

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use duty_engine::{
    CalculationInput, CalculationResult, DutyCalculator, EngineConfig, ReferenceSnapshot,
};

/// Arguments for the `duty calculate` subcommand.
#[derive(Args, Debug)]
pub struct CalculateArgs {
    /// Reference data snapshot (.yaml, .yml or .json).
    #[arg(long, value_name = "FILE")]
    pub data: PathBuf,

    /// Classification code (2 to 10 digits).
    #[arg(long)]
    pub code: String,

    /// Customs value in USD.
    #[arg(long)]
    pub value: f64,

    /// Net weight, kg.
    #[arg(long, default_value_t = 0.0)]
    pub weight: f64,

    /// Quantity in pieces.
    #[arg(long, default_value_t = 0.0)]
    pub pieces: f64,

    /// Item or engine volume, cm³.
    #[arg(long, default_value_t = 0.0)]
    pub volume_cm3: f64,

    /// Liquid volume, litres.
    #[arg(long, default_value_t = 0.0)]
    pub liters: f64,

    /// Country of origin (ISO code).
    #[arg(long)]
    pub origin: Option<String>,

    /// Manufacturing year (vehicles).
    #[arg(long)]
    pub year: Option<i32>,

    /// Engine power, hp (tractors and special machinery).
    #[arg(long, default_value_t = 0.0)]
    pub power_hp: f64,

    /// Measure vehicle age against this year instead of the current one.
    #[arg(long)]
    pub as_of_year: Option<i32>,
}

impl CalculateArgs {
    fn input(&self) -> CalculationInput {
        CalculationInput {
            classification_code: self.code.clone(),
            customs_value_usd: self.value,
            weight_kg: self.weight,
            pieces: self.pieces,
            liters: self.liters,
            item_volume_cm3: self.volume_cm3,
            origin_country: self.origin.clone(),
            manufacturing_year: self.year,
            engine_power_hp: self.power_hp,
        }
    }
}

/// Execute the calculate subcommand.
pub fn run_calculate(args: &CalculateArgs, config: &EngineConfig) -> Result<u8> {
    let snapshot = crate::load_snapshot(&args.data)?;
    let result = calculate(&snapshot, args, config)?;
    crate::print_json(&result)?;
    if let Some(err) = &result.error {
        tracing::error!(code = %result.classification_code, "{err}");
        return Ok(1);
    }
    Ok(0)
}

fn calculate(
    snapshot: &ReferenceSnapshot,
    args: &CalculateArgs,
    config: &EngineConfig,
) -> Result<CalculationResult> {
    let digest = snapshot.digest().context("failed to digest reference data")?;
    let calculator = DutyCalculator::with_config(snapshot, config.clone())
        .with_reference_version(digest.to_string());
    let input = args.input();
    Ok(match args.as_of_year {
        Some(year) => calculator.calculate_as_of(&input, year),
        None => calculator.calculate(&input),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use duty_engine::LineKind;

    const DATA: &str = r#"
commodities:
  - { id: 1, code: "870323", description: "легковые" }
tariffs:
  - { commodity_id: 1, duty: { kind: ad_valorem, percent: 15 } }
countries:
  - { iso_code: CN, name: Китай, trade_regime: most_favored }
currencies:
  - { code: USD, rate: 12850.0, as_of: 2025-01-10 }
"#;

    fn args(code: &str) -> CalculateArgs {
        CalculateArgs {
            data: PathBuf::new(),
            code: code.into(),
            value: 1000.0,
            weight: 0.0,
            pieces: 0.0,
            volume_cm3: 0.0,
            liters: 0.0,
            origin: Some("CN".into()),
            year: None,
            power_hp: 0.0,
            as_of_year: Some(2025),
        }
    }

    #[test]
    fn stamps_reference_digest() {
        let snap = ReferenceSnapshot::from_yaml_str(DATA).unwrap();
        let out = calculate(&snap, &args("8703231199"), &EngineConfig::default()).unwrap();
        assert_eq!(out.line(LineKind::ImportDuty).unwrap().amount_usd, 150.0);
        assert!(out
            .reference_version
            .as_deref()
            .is_some_and(|v| v.starts_with("sha256:")));
    }

    #[test]
    fn run_reports_missing_code_with_exit_one() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reference.yaml");
        std::fs::write(&path, DATA).unwrap();
        let mut a = args("9999");
        a.data = path;
        assert_eq!(run_calculate(&a, &EngineConfig::default()).unwrap(), 1);
    }

    #[test]
    fn run_fails_on_missing_data_file() {
        let mut a = args("870323");
        a.data = PathBuf::from("/nonexistent/reference.yaml");
        assert!(run_calculate(&a, &EngineConfig::default()).is_err());
    }
}

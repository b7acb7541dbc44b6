//! # Build-Tariffs Subcommand
//!
//! Rebuilds the tariffs of a snapshot from a list of rate rows, optionally
//! patches excise overlays and infers missing levy metadata, then writes
//! the result to a new snapshot file.
//!
//! ## Input files
//!
//! Duty rows (`--duties`), YAML or JSON:
//!
//! ```yaml
//! - { codes: "8703 21, 8703 22", rate: "15" }
//! - { codes: "6403", rate: "10, но не менее 2 долл. США за 1 кг" }
//! ```
//!
//! Excise overlays (`--excise`):
//!
//! ```yaml
//! - { prefixes: ["2203"], kind: specific, specific_amount: 1250, unit: l }
//! ```
//!
//! Degraded rate cells and unmatched source codes are logged as warnings and
//! summarized on stdout; they do not fail the build.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use duty_core::CommodityRecord;
use duty_engine::{EngineConfig, ReferenceSnapshot};
use duty_tariff::{DutyRow, ExciseOverlay, TariffTableBuilder};

/// Arguments for the `duty build-tariffs` subcommand.
#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Reference data snapshot providing commodities.
    #[arg(long, value_name = "FILE")]
    pub data: PathBuf,

    /// Duty rate rows.
    #[arg(long, value_name = "FILE")]
    pub duties: PathBuf,

    /// Excise overlays.
    #[arg(long, value_name = "FILE")]
    pub excise: Option<PathBuf>,

    /// Infer levy metadata for commodities that lack it.
    #[arg(long)]
    pub infer_levy: bool,

    /// Output snapshot path (.yaml, .yml or .json).
    #[arg(long, short)]
    pub out: PathBuf,
}

/// What a build changed.
#[derive(Debug, Serialize)]
pub struct BuildSummary {
    pub tariffs: usize,
    pub unmatched_codes: Vec<String>,
    pub degraded_cells: usize,
    pub excise_updates: usize,
    pub levy_inferred: usize,
    pub digest: String,
}

/// Rebuild `snapshot` in place.
pub fn rebuild(
    snapshot: &mut ReferenceSnapshot,
    rows: &[DutyRow],
    overlays: &[ExciseOverlay],
    infer_levy: bool,
    config: &EngineConfig,
) -> Result<BuildSummary> {
    let commodities: Vec<CommodityRecord> = snapshot.commodities().cloned().collect();
    let builder = TariffTableBuilder::new().with_vat(config.default_vat_percent);
    let mut table = builder.build(&commodities, rows);
    if !overlays.is_empty() {
        builder.apply_excise(&mut table, &commodities, overlays);
    }

    for cell in &table.degraded_cells {
        tracing::warn!(codes = %cell.codes, "{}", cell.issue);
    }
    for code in &table.unmatched_codes {
        tracing::warn!(code = %code, "source code matches no commodity");
    }

    let degraded_cells = table.degraded_cells.len();
    let excise_updates = table.excise_updates;
    let unmatched_codes = table.unmatched_codes.clone();
    snapshot.replace_tariffs(table);

    let levy_inferred = if infer_levy {
        snapshot.infer_missing_levy_metadata()
    } else {
        0
    };

    let digest = snapshot.digest().context("failed to digest rebuilt reference data")?;
    Ok(BuildSummary {
        tariffs: snapshot.tariff_count(),
        unmatched_codes,
        degraded_cells,
        excise_updates,
        levy_inferred,
        digest: digest.to_string(),
    })
}

/// Execute the build-tariffs subcommand.
pub fn run_build(args: &BuildArgs, config: &EngineConfig) -> Result<u8> {
    let mut snapshot = crate::load_snapshot(&args.data)?;
    let rows: Vec<DutyRow> = crate::read_records(&args.duties)?;
    let overlays: Vec<ExciseOverlay> = match &args.excise {
        Some(path) => crate::read_records(path)?,
        None => Vec::new(),
    };

    let summary = rebuild(&mut snapshot, &rows, &overlays, args.infer_levy, config)?;
    snapshot
        .to_file(&args.out)
        .with_context(|| format!("failed to write {}", args.out.display()))?;
    tracing::info!(
        out = %args.out.display(),
        tariffs = summary.tariffs,
        "snapshot written"
    );
    crate::print_json(&summary)?;
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use duty_core::{CommodityLookup, CommodityId, RateKind, TariffLookup};

    const DATA: &str = r#"
commodities:
  - { id: 1, code: "8703210000", description: "легковые, не более 1000 см3, новые" }
  - { id: 2, code: "2203000100", description: "пиво" }
  - { id: 3, code: "6403990000", description: "обувь" }
"#;

    const DUTIES: &str = r#"
- { codes: "8703", rate: "15" }
- { codes: "2203", rate: "20" }
- { codes: "6403", rate: "10, но не менее 2 долл. США за 1 кг" }
- { codes: "9999", rate: "5" }
"#;

    const EXCISE: &str = r#"
- { prefixes: ["2203"], kind: specific, specific_amount: 1250, unit: l }
"#;

    #[test]
    fn rebuild_spreads_rows_and_excise() {
        let mut snap = ReferenceSnapshot::from_yaml_str(DATA).unwrap();
        let rows: Vec<DutyRow> = serde_yaml::from_str(DUTIES).unwrap();
        let overlays: Vec<ExciseOverlay> = serde_yaml::from_str(EXCISE).unwrap();
        let summary = rebuild(&mut snap, &rows, &overlays, true, &EngineConfig::default()).unwrap();

        assert_eq!(summary.tariffs, 3);
        assert_eq!(summary.unmatched_codes, ["9999"]);
        assert_eq!(summary.excise_updates, 1);
        assert_eq!(summary.levy_inferred, 1);
        assert_eq!(
            snap.tariff_for(CommodityId(3)).unwrap().duty.kind,
            RateKind::GreaterOf
        );
        let beer = snap.tariff_for(CommodityId(2)).unwrap();
        assert_eq!(beer.excise.per_unit_amount, Some(1250.0));
        let car = snap.commodity_by_code("8703210000").unwrap();
        assert!(car.recycling_levy_applicable);
    }

    #[test]
    fn run_writes_loadable_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("reference.yaml");
        let duties = dir.path().join("duties.yaml");
        let out = dir.path().join("rebuilt.json");
        std::fs::write(&data, DATA).unwrap();
        std::fs::write(&duties, DUTIES).unwrap();

        let args = BuildArgs {
            data,
            duties,
            excise: None,
            infer_levy: false,
            out: out.clone(),
        };
        assert_eq!(run_build(&args, &EngineConfig::default()).unwrap(), 0);
        let loaded = ReferenceSnapshot::from_file(&out).unwrap();
        assert_eq!(loaded.tariff_count(), 3);
    }
}

//! # duty-cli: Customs Duty Command Line
//!
//! Provides the `duty` command-line interface over [`duty_engine`].
//!
//! ## Subcommands
//!
//! - `duty calculate`: Itemized payment for one declaration line.
//! - `duty decode-rate`: Structured form of a free-text tariff cell.
//! - `duty search`: Commodities by code prefix.
//! - `duty build-tariffs`: Rebuild a snapshot's tariffs from rate rows.
//!
//! ```bash
//! duty calculate --data reference.yaml --code 8703231199 --value 15000 --origin CN --year 2021
//! duty decode-rate "10%, но не менее 2 долл. США за 1 кг"
//! duty search 8703 --data reference.yaml --limit 5
//! duty build-tariffs --data reference.yaml --duties duties.yaml \
//!     --excise excise.yaml --out rebuilt.json
//! ```

pub mod build;
pub mod calculate;
pub mod decode;
pub mod search;

use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;

use duty_engine::ReferenceSnapshot;

/// Load a reference snapshot, naming the file on failure.
pub fn load_snapshot(path: &Path) -> Result<ReferenceSnapshot> {
    let snapshot = ReferenceSnapshot::from_file(path)
        .with_context(|| format!("failed to load {}", path.display()))?;
    tracing::info!(path = %path.display(), ?snapshot, "reference data loaded");
    Ok(snapshot)
}

/// Read a YAML or JSON list (JSON when the extension is `.json`).
pub fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read file: {}", path.display()))?;
    let records = if path.extension().is_some_and(|e| e == "json") {
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse JSON: {}", path.display()))?
    } else {
        serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse YAML: {}", path.display()))?
    };
    Ok(records)
}

/// Print `value` as pretty JSON on stdout.
pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{text}");
    Ok(())
}

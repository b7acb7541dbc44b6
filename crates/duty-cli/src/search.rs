//! # Search Subcommand
//!
//! Lists commodities whose classification code starts with a digit prefix.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;
use serde::Serialize;

use duty_engine::ReferenceSnapshot;

/// Arguments for the `duty search` subcommand.
#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Code prefix (digits only).
    #[arg(value_name = "PREFIX")]
    pub prefix: String,

    /// Reference data snapshot (.yaml, .yml or .json).
    #[arg(long, value_name = "FILE")]
    pub data: PathBuf,

    /// Maximum number of hits.
    #[arg(long, default_value_t = 20)]
    pub limit: usize,
}

#[derive(Debug, Serialize)]
struct Hit<'a> {
    code: &'a str,
    description: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    unit: Option<&'a str>,
}

fn hits<'a>(snapshot: &'a ReferenceSnapshot, prefix: &str, limit: usize) -> Vec<Hit<'a>> {
    snapshot
        .search_codes(prefix, limit)
        .into_iter()
        .map(|c| Hit {
            code: c.code.as_str(),
            description: &c.description,
            unit: c.unit.as_deref(),
        })
        .collect()
}

/// Execute the search subcommand.
pub fn run_search(args: &SearchArgs) -> Result<u8> {
    let prefix = args.prefix.trim();
    if prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_digit()) {
        bail!("search prefix must be digits, got \"{}\"", args.prefix);
    }
    let snapshot = crate::load_snapshot(&args.data)?;
    let found = hits(&snapshot, prefix, args.limit);
    tracing::info!(prefix, hits = found.len(), "search complete");
    crate::print_json(&found)?;
    Ok(0)
}

//! # duty CLI entry point
//!
//! Parses command-line arguments, loads engine configuration and dispatches
//! to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use duty_cli::build::{run_build, BuildArgs};
use duty_cli::calculate::{run_calculate, CalculateArgs};
use duty_cli::decode::{run_decode, DecodeArgs};
use duty_cli::search::{run_search, SearchArgs};
use duty_engine::EngineConfig;

/// Customs duty calculator.
///
/// Computes import duty, excise, VAT, the processing fee and the recycling
/// levy for a declaration line against a reference data snapshot.
#[derive(Parser, Debug)]
#[command(name = "duty", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to an engine configuration file (YAML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Calculate customs payments for one declaration line.
    Calculate(CalculateArgs),

    /// Decode a free-text tariff rate cell.
    DecodeRate(DecodeArgs),

    /// Search commodities by classification code prefix.
    Search(SearchArgs),

    /// Rebuild a snapshot's tariffs from rate rows and excise overlays.
    BuildTariffs(BuildArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "duty CLI starting");

    let result = EngineConfig::load(cli.config.as_deref())
        .context("failed to load engine configuration")
        .and_then(|config| {
            tracing::debug!(?config, "engine configuration");
            match cli.command {
                Commands::Calculate(args) => run_calculate(&args, &config),
                Commands::DecodeRate(args) => run_decode(&args),
                Commands::Search(args) => run_search(&args),
                Commands::BuildTariffs(args) => run_build(&args, &config),
            }
        });

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

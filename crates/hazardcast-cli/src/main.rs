//! HazardCast command-line pipeline.
//!
//! Thin wiring around the core and dataset crates: loads CSVs, runs the
//! requested stage, writes CSVs. Model training and inference live
//! outside this binary; `forecast` and `score-routes` consume the
//! probability columns an external classifier produces.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use hazardcast_core::config::HazardConfig;

mod commands;

#[derive(Parser)]
#[command(name = "hazardcast", version, about = "Site and route hazard-risk pipeline")]
struct Cli {
    /// Path to a TOML configuration file; defaults come from
    /// config/default.toml and HAZARDCAST_ environment overrides.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Assemble train/test datasets from event CSVs
    BuildDataset(commands::build_dataset::BuildDatasetArgs),
    /// Score sites: apply weather adjustment and combine hazard probabilities
    Forecast(commands::forecast::ForecastArgs),
    /// Aggregate per-site predictions along routes
    ScoreRoutes(commands::score_routes::ScoreRoutesArgs),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => HazardConfig::from_file(path)?,
        None => HazardConfig::load()?,
    };

    match cli.command {
        Command::BuildDataset(args) => commands::build_dataset::run(args, &config),
        Command::Forecast(args) => commands::forecast::run(args, &config),
        Command::ScoreRoutes(args) => commands::score_routes::run(args),
    }
}

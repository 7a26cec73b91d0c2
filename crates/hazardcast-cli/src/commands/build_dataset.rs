//! `build-dataset`: assemble fire and quake train/test CSVs.
//!
//! Fire and quake use separate sample-date ranges: the fire archive only
//! reaches back a couple of years while the seismic catalog spans
//! decades, and wasting the long catalog on the short range would shrink
//! the quake dataset for no reason.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use clap::Args;
use tracing::{info, warn};

use hazardcast_core::config::HazardConfig;
use hazardcast_core::features::{HazardMode, WeatherMode};
use hazardcast_dataset::assembler::{assemble, AssemblyInputs, DatasetBuild};
use hazardcast_dataset::io::{load_fire_csv, load_quake_csv, load_sites_csv, write_samples_csv};
use hazardcast_dataset::sampler::sample_dates;
use hazardcast_dataset::split::{chronological_split, stratified_split};

#[derive(Debug, Args)]
pub struct BuildDatasetArgs {
    /// Fire-detection CSV exports (archive + near-real-time), concatenated
    #[arg(long, required = true, num_args = 1..)]
    fire_csv: Vec<PathBuf>,

    /// Seismic catalog CSV
    #[arg(long)]
    quake_csv: PathBuf,

    /// Site registry CSV (name, lat, lon)
    #[arg(long)]
    sites: PathBuf,

    /// Output directory for the train/test CSVs
    #[arg(long, default_value = "outputs")]
    out_dir: PathBuf,

    /// First fire sample date (YYYY-MM-DD)
    #[arg(long, default_value = "2024-01-01")]
    fire_start: NaiveDate,

    /// End of the fire sample range, exclusive (YYYY-MM-DD)
    #[arg(long, default_value = "2025-11-01")]
    fire_end: NaiveDate,

    /// First quake sample date (YYYY-MM-DD)
    #[arg(long, default_value = "2015-01-01")]
    quake_start: NaiveDate,

    /// End of the quake sample range, exclusive (YYYY-MM-DD)
    #[arg(long, default_value = "2025-11-01")]
    quake_end: NaiveDate,

    /// Days between samples
    #[arg(long, default_value_t = 7)]
    stride_days: i64,

    /// Chronological split date; when absent, the stratified split is used
    #[arg(long)]
    split_date: Option<NaiveDate>,

    /// Test fraction for the stratified split
    #[arg(long, default_value_t = 0.2)]
    test_fraction: f64,

    /// Seed for the stratified split
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

pub fn run(args: BuildDatasetArgs, config: &HazardConfig) -> Result<()> {
    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("creating output directory {}", args.out_dir.display()))?;

    let registry = load_sites_csv(&args.sites)?;
    let fire_store = load_fire_csv(&args.fire_csv)?;
    let quake_store = load_quake_csv(&args.quake_csv)?;

    let inputs = AssemblyInputs {
        fire_store: &fire_store,
        quake_store: &quake_store,
        // Batch builds run offline; fire samples carry the flagged
        // neutral weather defaults.
        weather: None,
    };

    info!("building fire dataset");
    let fire_dates = sample_dates(
        midnight_utc(args.fire_start),
        midnight_utc(args.fire_end),
        args.stride_days,
    );
    let fire_build = assemble(
        &registry,
        &fire_dates,
        &inputs,
        HazardMode::Fire,
        WeatherMode::Historical,
        config,
    )?;
    write_split(&args, &fire_build, "fire")?;

    if quake_store.is_empty() {
        warn!("quake store is empty, skipping quake dataset");
        return Ok(());
    }

    info!("building quake dataset");
    let quake_dates = sample_dates(
        midnight_utc(args.quake_start),
        midnight_utc(args.quake_end),
        args.stride_days,
    );
    let quake_build = assemble(
        &registry,
        &quake_dates,
        &inputs,
        HazardMode::Quake,
        WeatherMode::Historical,
        config,
    )?;
    write_split(&args, &quake_build, "quake")?;

    Ok(())
}

fn write_split(args: &BuildDatasetArgs, build: &DatasetBuild, prefix: &str) -> Result<()> {
    let (train, test) = match args.split_date {
        Some(date) => chronological_split(build.samples.clone(), midnight_utc(date)),
        None => stratified_split(build.samples.clone(), args.test_fraction, args.seed)?,
    };

    let train_path = args.out_dir.join(format!("{prefix}_train.csv"));
    let test_path = args.out_dir.join(format!("{prefix}_test.csv"));
    write_samples_csv(&train_path, &train)?;
    write_samples_csv(&test_path, &test)?;

    info!(
        prefix,
        train = train.len(),
        test = test.len(),
        positive_rate = build.positive_rate(),
        "datasets written"
    );
    Ok(())
}

fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    DateTime::from_naive_utc_and_offset(
        date.and_time(NaiveTime::from_hms_opt(0, 0, 0).unwrap()),
        Utc,
    )
}

//! `forecast`: turn raw per-site model probabilities into final risk
//! scores.
//!
//! The external classifier emits one raw fire and quake probability per
//! site. This command applies the weather-based fire adjustment, combines
//! the two hazards per site and writes a ranked predictions CSV.

use std::path::PathBuf;

use anyhow::Result;
use chrono::Utc;
use clap::Args;
use tracing::info;

use hazardcast_core::config::HazardConfig;
use hazardcast_core::event::{FireEventStore, QuakeEventStore};
use hazardcast_core::features::{extract_features, HazardMode, WeatherMode};
use hazardcast_core::risk::{adjust_fire_probability, SiteRisk};
use hazardcast_dataset::io::{load_fire_csv, load_predictions_csv, write_predictions_csv};

#[derive(Debug, Args)]
pub struct ForecastArgs {
    /// External model output: site_name, lat, lon, fire_probability,
    /// quake_probability
    #[arg(long)]
    scores: PathBuf,

    /// Fire-detection CSVs for current-activity features (optional)
    #[arg(long, num_args = 0..)]
    fire_csv: Vec<PathBuf>,

    /// Output CSV, ranked by combined risk
    #[arg(long, default_value = "outputs/forecast_72h.csv")]
    out: PathBuf,
}

pub fn run(args: ForecastArgs, config: &HazardConfig) -> Result<()> {
    let raw = load_predictions_csv(&args.scores)?;
    let fire_store = if args.fire_csv.is_empty() {
        FireEventStore::default()
    } else {
        load_fire_csv(&args.fire_csv)?
    };
    let quake_store = QuakeEventStore::default();

    let target = Utc::now();
    info!(sites = raw.len(), %target, "scoring 72 h forecast");

    let mut adjusted = Vec::with_capacity(raw.len());
    for risk in raw {
        // Forecast-mode features supply the weather aggregates for the
        // adjustment; without a weather collaborator they are the flagged
        // neutral defaults and the adjustment is a no-op.
        let features = extract_features(
            &risk.site,
            target,
            &fire_store,
            &quake_store,
            None,
            HazardMode::Fire,
            WeatherMode::Forecast,
            &config.features,
        );

        let fire_probability = adjust_fire_probability(
            risk.fire_probability,
            features.get("temp_mean").unwrap_or(15.0),
            features.get("humidity_mean").unwrap_or(60.0),
            features.get("humidity_min").unwrap_or(40.0),
        );

        adjusted.push(SiteRisk::new(
            risk.site,
            fire_probability,
            risk.quake_probability,
        ));
    }

    adjusted.sort_by(|a, b| b.combined_probability.total_cmp(&a.combined_probability));
    for risk in adjusted.iter().take(5) {
        info!(
            site = %risk.site.name,
            combined = risk.combined_score(),
            fire = risk.fire_score(),
            quake = risk.quake_score(),
            "top site"
        );
    }

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)?;
    }
    write_predictions_csv(&args.out, &adjusted)?;
    Ok(())
}

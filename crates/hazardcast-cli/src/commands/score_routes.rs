//! `score-routes`: fold per-site predictions along route waypoints.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use tracing::info;

use hazardcast_core::route::Route;
use hazardcast_dataset::io::{load_predictions_csv, load_routes_csv, write_route_summary_csv};

#[derive(Debug, Args)]
pub struct ScoreRoutesArgs {
    /// Route definitions CSV: route_id, order, name, lat, lon
    #[arg(long)]
    routes: PathBuf,

    /// Per-site predictions CSV (output of `forecast`)
    #[arg(long)]
    predictions: PathBuf,

    /// Output CSV with per-waypoint and per-route aggregates
    #[arg(long, default_value = "outputs/route_risk.csv")]
    out: PathBuf,
}

pub fn run(args: ScoreRoutesArgs) -> Result<()> {
    let predictions = load_predictions_csv(&args.predictions)?;
    let raw_routes = load_routes_csv(&args.routes)?;

    let routes: Vec<Route> = raw_routes
        .into_iter()
        .map(|(route_id, points)| Route::build(route_id, points, &predictions))
        .collect();

    for route in &routes {
        info!(
            route_id = %route.route_id,
            level = %route.risk_level(),
            dominant = %route.dominant_hazard,
            aggregated = route.aggregated_combined_risk,
            "route scored"
        );
    }

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)?;
    }
    write_route_summary_csv(&args.out, &routes)?;
    Ok(())
}

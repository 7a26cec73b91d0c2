//! Dataset assembly: sites x dates, labels then features.
//!
//! Each (site, date) pair is independent of every other, so the cross
//! product runs on the rayon thread pool; the event stores are shared
//! read-only. A per-sample weather failure degrades that one sample to
//! the neutral weather defaults (flagged in its features) and the build
//! continues. An entirely absent event source for the labeled hazard is
//! fatal before any work starts.

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{info, warn};
use uuid::Uuid;

use hazardcast_core::config::HazardConfig;
use hazardcast_core::event::{FireEventStore, QuakeEventStore, SiteRegistry};
use hazardcast_core::features::{extract_features, FeatureVector, HazardMode, WeatherMode};
use hazardcast_core::label::{fire_label, quake_label, LabelMetadata};
use hazardcast_core::weather::WeatherProvider;

use crate::error::{DatasetError, DatasetResult};

/// Log a progress line every this many samples.
const PROGRESS_INTERVAL: usize = 100;

/// One training/test row: the unit of model data. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub site_name: String,
    pub lat: f64,
    pub lon: f64,
    pub target_date: DateTime<Utc>,
    pub features: FeatureVector,
    pub label: u8,
    pub metadata: LabelMetadata,
}

/// A finished assembly run with provenance.
#[derive(Debug, Clone)]
pub struct DatasetBuild {
    /// Identifier stamped on this run for audit trails.
    pub run_id: Uuid,
    pub mode: HazardMode,
    pub samples: Vec<Sample>,
    /// Samples whose weather degraded to the neutral defaults.
    pub weather_fallbacks: usize,
}

impl DatasetBuild {
    /// Fraction of positive labels, 0 when empty.
    pub fn positive_rate(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let positives = self.samples.iter().filter(|s| s.label == 1).count();
        positives as f64 / self.samples.len() as f64
    }
}

/// Read-only inputs shared across the whole assembly.
pub struct AssemblyInputs<'a> {
    pub fire_store: &'a FireEventStore,
    pub quake_store: &'a QuakeEventStore,
    /// Absent in offline batch runs; fire-mode features then carry the
    /// neutral weather defaults with the fallback flag set.
    pub weather: Option<&'a (dyn WeatherProvider + Sync)>,
}

/// Build every sample for `registry.sites() x dates`.
///
/// Labels are generated first, features second, both against the same
/// target date. `weather_mode` should be `Historical` when building
/// training data and `Forecast` only when scoring live.
pub fn assemble(
    registry: &SiteRegistry,
    dates: &[DateTime<Utc>],
    inputs: &AssemblyInputs<'_>,
    mode: HazardMode,
    weather_mode: WeatherMode,
    config: &HazardConfig,
) -> DatasetResult<DatasetBuild> {
    if registry.is_empty() {
        return Err(DatasetError::NoSites);
    }
    match mode {
        HazardMode::Fire if inputs.fire_store.is_empty() => {
            return Err(DatasetError::EmptySource {
                kind: "fire".to_string(),
            });
        }
        HazardMode::Quake if inputs.quake_store.is_empty() => {
            return Err(DatasetError::EmptySource {
                kind: "quake".to_string(),
            });
        }
        _ => {}
    }

    let total = registry.len() * dates.len();
    info!(
        %mode,
        sites = registry.len(),
        dates = dates.len(),
        total,
        "assembling dataset"
    );

    let pairs: Vec<_> = registry
        .sites()
        .iter()
        .flat_map(|site| dates.iter().map(move |&date| (site, date)))
        .collect();

    let progress = AtomicUsize::new(0);
    let samples: Vec<Sample> = pairs
        .par_iter()
        .map(|&(site, target_date)| {
            let (label, metadata) = match mode {
                HazardMode::Fire => fire_label(site, target_date, inputs.fire_store, &config.fire),
                HazardMode::Quake => {
                    quake_label(site, target_date, inputs.quake_store, &config.quake)
                }
            };

            let weather: Option<&dyn WeatherProvider> = match inputs.weather {
                Some(w) => Some(w),
                None => None,
            };
            let features = extract_features(
                site,
                target_date,
                inputs.fire_store,
                inputs.quake_store,
                weather,
                mode,
                weather_mode,
                &config.features,
            );

            let done = progress.fetch_add(1, Ordering::Relaxed) + 1;
            if done % PROGRESS_INTERVAL == 0 || done == total {
                info!(done, total, "assembly progress");
            }

            Sample {
                site_name: site.name.clone(),
                lat: site.lat,
                lon: site.lon,
                target_date,
                features,
                label,
                metadata,
            }
        })
        .collect();

    let weather_fallbacks = samples
        .iter()
        .filter(|s| s.features.get("weather_fallback") == Some(1.0))
        .count();
    if weather_fallbacks > 0 {
        warn!(
            weather_fallbacks,
            total = samples.len(),
            "samples built with neutral weather defaults"
        );
    }

    let build = DatasetBuild {
        run_id: Uuid::new_v4(),
        mode,
        samples,
        weather_fallbacks,
    };
    info!(
        run_id = %build.run_id,
        samples = build.samples.len(),
        positive_rate = build.positive_rate(),
        "dataset assembled"
    );
    Ok(build)
}

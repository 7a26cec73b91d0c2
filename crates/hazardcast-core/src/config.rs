//! Configuration for the hazard-risk engine.
//!
//! There are no module-level tunables: every threshold, radius and window
//! length lives in a [`HazardConfig`] value that callers pass into each
//! component. Fire and quake deliberately carry separate sections so the
//! hazards can diverge (a quake's felt radius is regional, an ignition's
//! is local) without shadowing shared constants.
//!
//! Configuration is loaded in order:
//! 1. `config/default.toml` (base settings)
//! 2. `config/{HAZARDCAST_ENV}.toml` (environment-specific)
//! 3. Environment variables with `HAZARDCAST_` prefix

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HazardConfig {
    pub fire: FireLabelConfig,
    pub quake: QuakeLabelConfig,
    pub features: FeatureConfig,
}

impl HazardConfig {
    /// Load configuration from files and environment.
    pub fn load() -> CoreResult<Self> {
        let env = std::env::var("HAZARDCAST_ENV").unwrap_or_else(|_| "development".to_string());

        let builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{}", env)).required(false))
            .add_source(config::Environment::with_prefix("HAZARDCAST").separator("__"));

        let config: HazardConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from an explicit TOML file.
    pub fn from_file(path: &std::path::Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CoreError::ConfigError(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        let config: HazardConfig = toml::from_str(&content)
            .map_err(|e| CoreError::ConfigError(format!("Failed to parse config file: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> CoreResult<()> {
        fn positive(field: &str, value: f64) -> CoreResult<()> {
            if value <= 0.0 {
                return Err(CoreError::ValidationError {
                    field: field.to_string(),
                    message: format!("must be positive, got {value}"),
                });
            }
            Ok(())
        }

        positive("fire.radius_km", self.fire.radius_km)?;
        positive("quake.radius_km", self.quake.radius_km)?;
        positive("features.radius_km", self.features.radius_km)?;
        positive("fire.horizon_hours", self.fire.horizon_hours as f64)?;
        positive("quake.horizon_hours", self.quake.horizon_hours as f64)?;
        positive(
            "features.lookback_days_short",
            self.features.lookback_days_short as f64,
        )?;
        positive(
            "features.lookback_days_long",
            self.features.lookback_days_long as f64,
        )?;

        if self.features.lookback_days_short > self.features.lookback_days_long {
            return Err(CoreError::ValidationError {
                field: "features.lookback_days_short".to_string(),
                message: "short lookback must not exceed long lookback".to_string(),
            });
        }

        if !(0.0..=100.0).contains(&self.fire.min_confidence) {
            return Err(CoreError::ValidationError {
                field: "fire.min_confidence".to_string(),
                message: format!("must be within [0, 100], got {}", self.fire.min_confidence),
            });
        }

        Ok(())
    }
}

/// Fire-hazard labeling thresholds.
///
/// FRP guide: below 10 MW is often agricultural or industrial, 10-30 MW
/// moderate fires, above 30 MW sustained wildfires. The daylight filter
/// drops industrial heat sources that detect at night.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FireLabelConfig {
    /// Search radius around a site for label events, km.
    pub radius_km: f64,
    /// Prediction horizon, hours.
    pub horizon_hours: i64,
    /// Minimum detection confidence, 0-100.
    pub min_confidence: f64,
    /// Minimum fire radiative power, MW.
    pub min_frp_mw: f64,
    /// Keep only daylight detections.
    pub daylight_only: bool,
    /// Detections required for a positive label.
    pub min_detections: usize,
}

impl Default for FireLabelConfig {
    fn default() -> Self {
        Self {
            radius_km: 100.0,
            horizon_hours: 72,
            min_confidence: 70.0,
            min_frp_mw: 30.0,
            daylight_only: true,
            min_detections: 1,
        }
    }
}

/// Quake-hazard labeling thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuakeLabelConfig {
    /// Search radius around a site for label events, km. Larger than the
    /// fire radius: earthquakes have regional impact.
    pub radius_km: f64,
    /// Prediction horizon, hours.
    pub horizon_hours: i64,
    /// Minimum magnitude for a label event.
    pub min_magnitude: f64,
    /// Events required for a positive label.
    pub min_events: usize,
    /// Threshold counted separately in label metadata.
    pub significant_magnitude: f64,
}

impl Default for QuakeLabelConfig {
    fn default() -> Self {
        Self {
            radius_km: 150.0,
            horizon_hours: 72,
            min_magnitude: 2.0,
            min_events: 1,
            significant_magnitude: 4.0,
        }
    }
}

/// Feature-extraction parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Search radius for historical activity, km. Tighter than the label
    /// radii: features describe the immediate surroundings.
    pub radius_km: f64,
    /// Short lookback window, days.
    pub lookback_days_short: i64,
    /// Long lookback window, days.
    pub lookback_days_long: i64,
    /// Minimum detection confidence for historical fire features, 0-100.
    pub fire_min_confidence: f64,
    /// Minimum fire radiative power for historical fire features, MW.
    pub fire_min_frp_mw: f64,
    /// Keep only daylight detections in historical fire features.
    pub fire_daylight_only: bool,
    /// Minimum magnitude for historical quake features.
    pub quake_min_magnitude: f64,
    /// Days of weather history aggregated before the target date.
    pub weather_lookback_days: i64,
    /// Days of forecast weather aggregated from the target date.
    pub weather_forecast_days: i64,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            radius_km: 50.0,
            lookback_days_short: 7,
            lookback_days_long: 30,
            fire_min_confidence: 70.0,
            fire_min_frp_mw: 30.0,
            fire_daylight_only: true,
            quake_min_magnitude: 2.5,
            weather_lookback_days: 7,
            weather_forecast_days: 3,
        }
    }
}

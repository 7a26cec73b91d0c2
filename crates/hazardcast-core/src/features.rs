//! Leakage-free feature extraction for a (site, target date) pair.
//!
//! Every event aggregated here is strictly older than the target date:
//! the extractor only ever builds lookback windows, the mirror image of
//! the label generator's horizon windows. Weather is the one input that
//! legitimately differs by mode (historical reanalysis while building
//! training data, forecast while scoring), selected by an explicit
//! [`WeatherMode`] from the caller.
//!
//! The downstream classifier consumes features as an ordered, named
//! vector; the name set and order for a given [`HazardMode`] are fixed
//! and identical on every call, whatever the data contains.

use chrono::{DateTime, Datelike, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::FeatureConfig;
use crate::event::{FireEventStore, FireFilter, QuakeEventStore, QuakeFilter, Site};
use crate::weather::{WeatherProvider, WeatherSummary};
use crate::window::{TemporalWindow, WindowKind};

/// Cap for the days-since-last-event features when no qualifying event
/// exists in the lookback window.
pub const DAYS_SINCE_SENTINEL: f64 = 999.0;

/// Which hazard's feature family to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HazardMode {
    Fire,
    Quake,
}

impl std::fmt::Display for HazardMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HazardMode::Fire => write!(f, "fire"),
            HazardMode::Quake => write!(f, "quake"),
        }
    }
}

/// Which weather source the caller wants consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherMode {
    /// Reanalysis strictly before the target date (training).
    Historical,
    /// Forecast from the target date forward (scoring).
    Forecast,
}

/// Ordered, named feature values.
///
/// Insertion order is the vector order; names are unique.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    entries: Vec<(String, f64)>,
}

impl FeatureVector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a feature, or overwrite it in place if the name exists.
    pub fn insert(&mut self, name: &str, value: f64) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value,
            None => self.entries.push((name.to_string(), value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.entries.iter().map(|(_, v)| *v).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), *v))
    }
}

/// The fixed feature name set for a hazard mode, in vector order.
pub fn feature_names(mode: HazardMode) -> Vec<&'static str> {
    match mode {
        HazardMode::Fire => vec![
            "fires_7d_count",
            "fires_30d_count",
            "fire_max_brightness_7d",
            "fire_avg_brightness_7d",
            "fire_max_frp_7d",
            "fire_avg_frp_7d",
            "fires_persistent_days",
            "days_since_last_fire",
            "temp_mean",
            "temp_max",
            "humidity_mean",
            "humidity_min",
            "wind_max",
            "rain_total",
            "dry_days",
            "weather_fallback",
            "latitude",
            "longitude",
            "month",
            "season",
        ],
        HazardMode::Quake => vec![
            "quakes_7d_count",
            "quakes_30d_count",
            "quake_max_mag_30d",
            "quake_avg_mag_30d",
            "quakes_5plus_count",
            "seismic_trend",
            "days_since_last_quake",
            "latitude",
            "longitude",
            "month",
            "season",
        ],
    }
}

/// Extract the full feature vector for one (site, target) pair.
///
/// `weather` may be `None` for batch runs without a weather collaborator;
/// fire-mode features then carry the neutral defaults with the fallback
/// flag set, identical to a failed fetch.
pub fn extract_features(
    site: &Site,
    target: DateTime<Utc>,
    fire_store: &FireEventStore,
    quake_store: &QuakeEventStore,
    weather: Option<&dyn WeatherProvider>,
    mode: HazardMode,
    weather_mode: WeatherMode,
    config: &FeatureConfig,
) -> FeatureVector {
    let mut features = FeatureVector::new();

    match mode {
        HazardMode::Fire => {
            fire_history_features(site, target, fire_store, config, &mut features);
            weather_features(site, target, weather, weather_mode, config, &mut features);
        }
        HazardMode::Quake => {
            quake_history_features(site, target, quake_store, config, &mut features);
        }
    }

    temporal_geo_features(site, target, &mut features);
    features
}

/// Historical fire activity over the short and long lookback windows.
fn fire_history_features(
    site: &Site,
    target: DateTime<Utc>,
    store: &FireEventStore,
    config: &FeatureConfig,
    out: &mut FeatureVector,
) {
    let short = TemporalWindow::lookback(target, config.lookback_days_short);
    let long = TemporalWindow::lookback(target, config.lookback_days_long);
    short
        .ensure_kind(WindowKind::Lookback)
        .expect("lookback constructor produces lookback windows");

    let filter = FireFilter {
        min_confidence: config.fire_min_confidence,
        min_frp_mw: config.fire_min_frp_mw,
        daylight_only: config.fire_daylight_only,
    };

    let recent = store.select(&short, &filter, site.lat, site.lon, config.radius_km);
    let month = store.select(&long, &filter, site.lat, site.lon, config.radius_km);

    out.insert("fires_7d_count", recent.len() as f64);
    out.insert("fires_30d_count", month.len() as f64);

    if recent.is_empty() {
        out.insert("fire_max_brightness_7d", 0.0);
        out.insert("fire_avg_brightness_7d", 0.0);
        out.insert("fire_max_frp_7d", 0.0);
        out.insert("fire_avg_frp_7d", 0.0);
        out.insert("fires_persistent_days", 0.0);
        out.insert("days_since_last_fire", DAYS_SINCE_SENTINEL);
    } else {
        let n = recent.len() as f64;
        out.insert(
            "fire_max_brightness_7d",
            recent
                .iter()
                .map(|d| d.brightness_k)
                .fold(f64::NEG_INFINITY, f64::max),
        );
        out.insert(
            "fire_avg_brightness_7d",
            recent.iter().map(|d| d.brightness_k).sum::<f64>() / n,
        );
        out.insert(
            "fire_max_frp_7d",
            recent
                .iter()
                .map(|d| d.frp_mw)
                .fold(f64::NEG_INFINITY, f64::max),
        );
        out.insert(
            "fire_avg_frp_7d",
            recent.iter().map(|d| d.frp_mw).sum::<f64>() / n,
        );

        let mut days: Vec<_> = recent.iter().map(|d| d.acquired_at.date_naive()).collect();
        days.sort_unstable();
        days.dedup();
        out.insert("fires_persistent_days", days.len() as f64);

        let most_recent = recent
            .iter()
            .map(|d| d.acquired_at)
            .max()
            .expect("recent is non-empty");
        out.insert(
            "days_since_last_fire",
            days_since(target, most_recent),
        );
    }
}

/// Historical seismic activity over the short and long lookback windows.
fn quake_history_features(
    site: &Site,
    target: DateTime<Utc>,
    store: &QuakeEventStore,
    config: &FeatureConfig,
    out: &mut FeatureVector,
) {
    let short = TemporalWindow::lookback(target, config.lookback_days_short);
    let long = TemporalWindow::lookback(target, config.lookback_days_long);
    short
        .ensure_kind(WindowKind::Lookback)
        .expect("lookback constructor produces lookback windows");

    let filter = QuakeFilter {
        min_magnitude: config.quake_min_magnitude,
    };

    let recent = store.select(&short, &filter, site.lat, site.lon, config.radius_km);
    let month = store.select(&long, &filter, site.lat, site.lon, config.radius_km);

    out.insert("quakes_7d_count", recent.len() as f64);
    out.insert("quakes_30d_count", month.len() as f64);

    if month.is_empty() {
        out.insert("quake_max_mag_30d", 0.0);
        out.insert("quake_avg_mag_30d", 0.0);
        out.insert("quakes_5plus_count", 0.0);
        out.insert("seismic_trend", 0.0);
        out.insert("days_since_last_quake", DAYS_SINCE_SENTINEL);
    } else {
        let n = month.len() as f64;
        out.insert(
            "quake_max_mag_30d",
            month
                .iter()
                .map(|e| e.magnitude)
                .fold(f64::NEG_INFINITY, f64::max),
        );
        out.insert(
            "quake_avg_mag_30d",
            month.iter().map(|e| e.magnitude).sum::<f64>() / n,
        );
        out.insert(
            "quakes_5plus_count",
            month.iter().filter(|e| e.magnitude >= 5.0).count() as f64,
        );
        // Short-window share of the month's activity, scaled by the
        // window-length ratio so a steady rate reads as ~1.0.
        out.insert("seismic_trend", (recent.len() as f64 / n) * 4.3);

        let most_recent = month
            .iter()
            .map(|e| e.occurred_at)
            .max()
            .expect("month is non-empty");
        out.insert(
            "days_since_last_quake",
            days_since(target, most_recent),
        );
    }
}

/// Aggregated weather around the target, from whichever source the mode
/// selects. Failures and absent providers degrade to neutral defaults
/// with the fallback flag set.
fn weather_features(
    site: &Site,
    target: DateTime<Utc>,
    provider: Option<&dyn WeatherProvider>,
    mode: WeatherMode,
    config: &FeatureConfig,
    out: &mut FeatureVector,
) {
    let summary = match provider {
        None => WeatherSummary::neutral(),
        Some(provider) => {
            let fetched = match mode {
                WeatherMode::Historical => {
                    // End the day before the target so nothing dated at or
                    // after the target leaks in.
                    let end = (target - Duration::days(1)).date_naive();
                    let start = end - Duration::days(config.weather_lookback_days - 1);
                    provider.historical(site.lat, site.lon, start, end)
                }
                WeatherMode::Forecast => {
                    provider.forecast(site.lat, site.lon, config.weather_forecast_days)
                }
            };
            match fetched {
                Ok(days) => WeatherSummary::aggregate(&days),
                Err(err) => {
                    warn!(site = %site.name, %err, "weather fetch failed, using neutral defaults");
                    WeatherSummary::neutral()
                }
            }
        }
    };

    out.insert("temp_mean", summary.temp_mean);
    out.insert("temp_max", summary.temp_max);
    out.insert("humidity_mean", summary.humidity_mean);
    out.insert("humidity_min", summary.humidity_min);
    out.insert("wind_max", summary.wind_max);
    out.insert("rain_total", summary.rain_total);
    out.insert("dry_days", summary.dry_days);
    out.insert("weather_fallback", f64::from(u8::from(summary.used_fallback)));
}

/// Raw position plus calendar features.
fn temporal_geo_features(site: &Site, target: DateTime<Utc>, out: &mut FeatureVector) {
    out.insert("latitude", site.lat);
    out.insert("longitude", site.lon);
    out.insert("month", f64::from(target.month()));
    out.insert("season", f64::from(season_of_month(target.month())));
}

/// Northern-hemisphere season index: Dec-Feb 0, Mar-May 1, Jun-Aug 2,
/// Sep-Nov 3.
pub fn season_of_month(month: u32) -> u8 {
    match month {
        12 | 1 | 2 => 0,
        3..=5 => 1,
        6..=8 => 2,
        _ => 3,
    }
}

fn days_since(target: DateTime<Utc>, event: DateTime<Utc>) -> f64 {
    ((target - event).num_days() as f64).min(DAYS_SINCE_SENTINEL)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{DayNight, FireDetection, SeismicEvent};
    use crate::weather::DailyWeather;
    use chrono::{NaiveDate, TimeZone};

    fn site() -> Site {
        Site::new("Los Angeles", 34.0522, -118.2437)
    }

    fn target() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 0, 0, 0).unwrap()
    }

    fn detection_at(at: DateTime<Utc>) -> FireDetection {
        FireDetection {
            lat: 34.05,
            lon: -118.24,
            acquired_at: at,
            confidence: 85.0,
            brightness_k: 330.0,
            frp_mw: 45.0,
            daynight: Some(DayNight::Day),
        }
    }

    fn quake_at(at: DateTime<Utc>, magnitude: f64) -> SeismicEvent {
        SeismicEvent {
            lat: 34.1,
            lon: -118.3,
            occurred_at: at,
            magnitude,
            place: None,
        }
    }

    struct StaticWeather(Vec<DailyWeather>);

    impl WeatherProvider for StaticWeather {
        fn historical(
            &self,
            _lat: f64,
            _lon: f64,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> crate::error::CoreResult<Vec<DailyWeather>> {
            Ok(self.0.clone())
        }

        fn forecast(
            &self,
            _lat: f64,
            _lon: f64,
            _days: i64,
        ) -> crate::error::CoreResult<Vec<DailyWeather>> {
            Ok(self.0.clone())
        }
    }

    struct FailingWeather;

    impl WeatherProvider for FailingWeather {
        fn historical(
            &self,
            _lat: f64,
            _lon: f64,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> crate::error::CoreResult<Vec<DailyWeather>> {
            Err(crate::error::CoreError::WeatherError("timeout".to_string()))
        }

        fn forecast(
            &self,
            _lat: f64,
            _lon: f64,
            _days: i64,
        ) -> crate::error::CoreResult<Vec<DailyWeather>> {
            Err(crate::error::CoreError::WeatherError("timeout".to_string()))
        }
    }

    fn extract(
        fire_store: &FireEventStore,
        quake_store: &QuakeEventStore,
        mode: HazardMode,
    ) -> FeatureVector {
        extract_features(
            &site(),
            target(),
            fire_store,
            quake_store,
            None,
            mode,
            WeatherMode::Historical,
            &FeatureConfig::default(),
        )
    }

    #[test]
    fn test_no_event_at_or_after_target_contributes() {
        use chrono::Duration;
        // One detection before, one exactly at, one after the target.
        let fire_store = FireEventStore::new(vec![
            detection_at(target() - Duration::days(2)),
            detection_at(target()),
            detection_at(target() + Duration::hours(1)),
        ]);
        let features = extract(&fire_store, &QuakeEventStore::default(), HazardMode::Fire);
        assert_eq!(
            features.get("fires_7d_count"),
            Some(1.0),
            "only the strictly-past detection may contribute"
        );
    }

    #[test]
    fn test_fire_history_aggregates() {
        use chrono::Duration;
        let fire_store = FireEventStore::new(vec![
            detection_at(target() - Duration::days(1)),
            detection_at(target() - Duration::days(3)),
            detection_at(target() - Duration::days(3) - Duration::hours(2)),
            detection_at(target() - Duration::days(20)),
        ]);
        let features = extract(&fire_store, &QuakeEventStore::default(), HazardMode::Fire);
        assert_eq!(features.get("fires_7d_count"), Some(3.0));
        assert_eq!(features.get("fires_30d_count"), Some(4.0));
        // Three detections on two distinct days.
        assert_eq!(features.get("fires_persistent_days"), Some(2.0));
        assert_eq!(features.get("days_since_last_fire"), Some(1.0));
        assert_eq!(features.get("fire_max_frp_7d"), Some(45.0));
    }

    #[test]
    fn test_empty_stores_yield_zero_counts_and_sentinels() {
        let features = extract(
            &FireEventStore::default(),
            &QuakeEventStore::default(),
            HazardMode::Fire,
        );
        assert_eq!(features.get("fires_7d_count"), Some(0.0));
        assert_eq!(features.get("days_since_last_fire"), Some(DAYS_SINCE_SENTINEL));
        assert_eq!(features.get("weather_fallback"), Some(1.0));

        let features = extract(
            &FireEventStore::default(),
            &QuakeEventStore::default(),
            HazardMode::Quake,
        );
        assert_eq!(features.get("quakes_30d_count"), Some(0.0));
        assert_eq!(features.get("days_since_last_quake"), Some(DAYS_SINCE_SENTINEL));
    }

    #[test]
    fn test_quake_history_aggregates_and_trend() {
        use chrono::Duration;
        let quake_store = QuakeEventStore::new(vec![
            quake_at(target() - Duration::days(2), 3.0),
            quake_at(target() - Duration::days(10), 5.5),
            quake_at(target() - Duration::days(25), 4.0),
            quake_at(target() - Duration::days(40), 6.0), // outside 30 d
        ]);
        let features = extract(&FireEventStore::default(), &quake_store, HazardMode::Quake);
        assert_eq!(features.get("quakes_7d_count"), Some(1.0));
        assert_eq!(features.get("quakes_30d_count"), Some(3.0));
        assert_eq!(features.get("quake_max_mag_30d"), Some(5.5));
        assert_eq!(features.get("quakes_5plus_count"), Some(1.0));
        let trend = features.get("seismic_trend").unwrap();
        assert!((trend - (1.0 / 3.0) * 4.3).abs() < 1e-9);
        assert_eq!(features.get("days_since_last_quake"), Some(2.0));
    }

    #[test]
    fn test_feature_quake_threshold_differs_from_label() {
        use chrono::Duration;
        // Magnitude 2.2 labels (>= 2.0) but is below the feature bar of 2.5.
        let quake_store = QuakeEventStore::new(vec![quake_at(target() - Duration::days(1), 2.2)]);
        let features = extract(&FireEventStore::default(), &quake_store, HazardMode::Quake);
        assert_eq!(features.get("quakes_7d_count"), Some(0.0));
    }

    #[test]
    fn test_name_set_stable_across_data() {
        let empty = extract(
            &FireEventStore::default(),
            &QuakeEventStore::default(),
            HazardMode::Fire,
        );
        use chrono::Duration;
        let busy_store = FireEventStore::new(vec![detection_at(target() - Duration::days(1))]);
        let busy = extract(&busy_store, &QuakeEventStore::default(), HazardMode::Fire);

        assert_eq!(empty.names(), busy.names());
        assert_eq!(empty.names(), feature_names(HazardMode::Fire));
        assert_eq!(
            extract(
                &FireEventStore::default(),
                &QuakeEventStore::default(),
                HazardMode::Quake
            )
            .names(),
            feature_names(HazardMode::Quake)
        );
    }

    #[test]
    fn test_weather_summary_is_aggregated() {
        let weather = StaticWeather(vec![
            DailyWeather {
                date: NaiveDate::from_ymd_opt(2025, 6, 10).unwrap(),
                temp_mean_c: 28.0,
                temp_max_c: 36.0,
                humidity_mean_pct: 30.0,
                humidity_min_pct: 15.0,
                wind_max_kmh: 40.0,
                precipitation_mm: 0.0,
            },
            DailyWeather {
                date: NaiveDate::from_ymd_opt(2025, 6, 11).unwrap(),
                temp_mean_c: 30.0,
                temp_max_c: 38.0,
                humidity_mean_pct: 26.0,
                humidity_min_pct: 12.0,
                wind_max_kmh: 25.0,
                precipitation_mm: 0.2,
            },
        ]);
        let features = extract_features(
            &site(),
            target(),
            &FireEventStore::default(),
            &QuakeEventStore::default(),
            Some(&weather),
            HazardMode::Fire,
            WeatherMode::Forecast,
            &FeatureConfig::default(),
        );
        assert_eq!(features.get("temp_mean"), Some(29.0));
        assert_eq!(features.get("temp_max"), Some(38.0));
        assert_eq!(features.get("humidity_min"), Some(12.0));
        assert_eq!(features.get("dry_days"), Some(2.0));
        assert_eq!(features.get("weather_fallback"), Some(0.0));
    }

    #[test]
    fn test_weather_failure_sets_fallback_flag() {
        let features = extract_features(
            &site(),
            target(),
            &FireEventStore::default(),
            &QuakeEventStore::default(),
            Some(&FailingWeather),
            HazardMode::Fire,
            WeatherMode::Forecast,
            &FeatureConfig::default(),
        );
        assert_eq!(features.get("weather_fallback"), Some(1.0));
        assert_eq!(features.get("temp_mean"), Some(15.0));
        assert_eq!(features.get("wind_max"), Some(15.0));
    }

    #[test]
    fn test_quake_mode_has_no_weather() {
        let features = extract(
            &FireEventStore::default(),
            &QuakeEventStore::default(),
            HazardMode::Quake,
        );
        assert!(features.get("temp_mean").is_none());
        assert!(features.get("weather_fallback").is_none());
    }

    #[test]
    fn test_season_mapping() {
        assert_eq!(season_of_month(12), 0);
        assert_eq!(season_of_month(1), 0);
        assert_eq!(season_of_month(4), 1);
        assert_eq!(season_of_month(7), 2);
        assert_eq!(season_of_month(10), 3);
    }

    #[test]
    fn test_temporal_geo_values() {
        let features = extract(
            &FireEventStore::default(),
            &QuakeEventStore::default(),
            HazardMode::Quake,
        );
        assert_eq!(features.get("latitude"), Some(34.0522));
        assert_eq!(features.get("longitude"), Some(-118.2437));
        assert_eq!(features.get("month"), Some(6.0));
        assert_eq!(features.get("season"), Some(2.0));
    }

    #[test]
    fn test_feature_vector_serde_roundtrip() {
        let mut fv = FeatureVector::new();
        fv.insert("a", 1.0);
        fv.insert("b", 2.5);
        let json = serde_json::to_string(&fv).unwrap();
        let back: FeatureVector = serde_json::from_str(&json).unwrap();
        assert_eq!(fv, back);
        assert_eq!(back.names(), vec!["a", "b"]);
    }
}

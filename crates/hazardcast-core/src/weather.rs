//! Weather collaborator interface and daily-record aggregation.
//!
//! The engine never fetches weather itself. Callers hand in a
//! [`WeatherProvider`] (historical reanalysis for training, forecast for
//! scoring) and the extractor aggregates whatever daily records come
//! back. A provider failure is a recoverable condition: the aggregate
//! degrades to fixed temperate defaults and the resulting features carry
//! an explicit fallback flag so affected samples remain auditable.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::CoreResult;

/// Precipitation below this many millimeters counts as a dry day.
pub const DRY_DAY_THRESHOLD_MM: f64 = 1.0;

/// One day of weather observations or forecast for a point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyWeather {
    pub date: NaiveDate,
    pub temp_mean_c: f64,
    pub temp_max_c: f64,
    pub humidity_mean_pct: f64,
    pub humidity_min_pct: f64,
    pub wind_max_kmh: f64,
    pub precipitation_mm: f64,
}

/// Source of daily weather records.
///
/// `historical` returns records for `[start, end]` inclusive;
/// `forecast` returns records for the next `days` days. Implementations
/// live outside this crate (HTTP clients, caches, test fixtures); any
/// network or timeout handling is theirs.
pub trait WeatherProvider {
    fn historical(
        &self,
        lat: f64,
        lon: f64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> CoreResult<Vec<DailyWeather>>;

    fn forecast(&self, lat: f64, lon: f64, days: i64) -> CoreResult<Vec<DailyWeather>>;
}

/// Aggregated weather over a span of days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSummary {
    pub temp_mean: f64,
    pub temp_max: f64,
    pub humidity_mean: f64,
    pub humidity_min: f64,
    pub wind_max: f64,
    pub rain_total: f64,
    pub dry_days: f64,
    /// True when the provider failed and the neutral defaults below were
    /// substituted.
    pub used_fallback: bool,
}

impl WeatherSummary {
    /// Aggregate a non-empty run of daily records.
    ///
    /// Returns the neutral fallback when `days` is empty, since an empty
    /// response is indistinguishable from a failed fetch for downstream
    /// purposes.
    pub fn aggregate(days: &[DailyWeather]) -> Self {
        if days.is_empty() {
            return Self::neutral();
        }

        let n = days.len() as f64;
        Self {
            temp_mean: days.iter().map(|d| d.temp_mean_c).sum::<f64>() / n,
            temp_max: days
                .iter()
                .map(|d| d.temp_max_c)
                .fold(f64::NEG_INFINITY, f64::max),
            humidity_mean: days.iter().map(|d| d.humidity_mean_pct).sum::<f64>() / n,
            humidity_min: days
                .iter()
                .map(|d| d.humidity_min_pct)
                .fold(f64::INFINITY, f64::min),
            wind_max: days
                .iter()
                .map(|d| d.wind_max_kmh)
                .fold(f64::NEG_INFINITY, f64::max),
            rain_total: days.iter().map(|d| d.precipitation_mm).sum(),
            dry_days: days
                .iter()
                .filter(|d| d.precipitation_mm < DRY_DAY_THRESHOLD_MM)
                .count() as f64,
            used_fallback: false,
        }
    }

    /// Temperate defaults substituted when no weather is available.
    pub fn neutral() -> Self {
        Self {
            temp_mean: 15.0,
            temp_max: 20.0,
            humidity_mean: 60.0,
            humidity_min: 40.0,
            wind_max: 15.0,
            rain_total: 0.0,
            dry_days: 2.0,
            used_fallback: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32, temp: f64, rain: f64) -> DailyWeather {
        DailyWeather {
            date: NaiveDate::from_ymd_opt(2025, 6, d).unwrap(),
            temp_mean_c: temp,
            temp_max_c: temp + 6.0,
            humidity_mean_pct: 55.0,
            humidity_min_pct: 30.0 + d as f64,
            wind_max_kmh: 10.0 * d as f64,
            precipitation_mm: rain,
        }
    }

    #[test]
    fn test_aggregate_means_and_extremes() {
        let summary = WeatherSummary::aggregate(&[day(1, 10.0, 0.0), day(2, 20.0, 3.0)]);
        assert!((summary.temp_mean - 15.0).abs() < 1e-9);
        assert_eq!(summary.temp_max, 26.0);
        assert_eq!(summary.humidity_min, 31.0);
        assert_eq!(summary.wind_max, 20.0);
        assert_eq!(summary.rain_total, 3.0);
        assert!(!summary.used_fallback);
    }

    #[test]
    fn test_dry_day_threshold_is_one_millimeter() {
        let summary = WeatherSummary::aggregate(&[
            day(1, 15.0, 0.0),
            day(2, 15.0, 0.9),
            day(3, 15.0, 1.0),
            day(4, 15.0, 12.0),
        ]);
        assert_eq!(summary.dry_days, 2.0);
    }

    #[test]
    fn test_empty_input_falls_back_to_neutral() {
        let summary = WeatherSummary::aggregate(&[]);
        assert!(summary.used_fallback);
        assert_eq!(summary.temp_mean, 15.0);
        assert_eq!(summary.dry_days, 2.0);
    }
}

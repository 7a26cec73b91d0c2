//! Deterministic fixture builders for hazardcast tests.
//!
//! All generated data is plain domain data with realistic values; nothing
//! here mocks in-crate logic. Timestamps are derived from a fixed anchor
//! so tests are reproducible without seeding.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

use hazardcast_core::error::{CoreError, CoreResult};
use hazardcast_core::event::{
    DayNight, FireDetection, FireEventStore, QuakeEventStore, SeismicEvent, Site, SiteRegistry,
};
use hazardcast_core::weather::{DailyWeather, WeatherProvider};

/// Fixed anchor timestamp used by all fixtures: 2025-06-15 00:00 UTC.
pub fn anchor() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 15, 0, 0, 0).unwrap()
}

/// A small registry of coastal test sites.
pub fn test_registry() -> SiteRegistry {
    SiteRegistry::new(vec![
        Site::new("Los Angeles", 34.0522, -118.2437),
        Site::new("San Francisco", 37.7749, -122.4194),
        Site::new("Anchorage", 61.2181, -149.9003),
    ])
}

/// A qualifying fire detection near `site`, offset from the anchor.
///
/// Confidence 85, FRP 45 MW, daylight: passes the default severity
/// filters.
pub fn fire_detection(site: &Site, offset: Duration) -> FireDetection {
    FireDetection {
        lat: site.lat + 0.05,
        lon: site.lon - 0.05,
        acquired_at: anchor() + offset,
        confidence: 85.0,
        brightness_k: 330.0,
        frp_mw: 45.0,
        daynight: Some(DayNight::Day),
    }
}

/// A seismic event near `site`, offset from the anchor.
pub fn seismic_event(site: &Site, offset: Duration, magnitude: f64) -> SeismicEvent {
    SeismicEvent {
        lat: site.lat + 0.1,
        lon: site.lon + 0.1,
        occurred_at: anchor() + offset,
        magnitude,
        place: Some(format!("near {}", site.name)),
    }
}

/// Fire store with one qualifying detection per given hour offset.
pub fn fire_store(site: &Site, hour_offsets: &[i64]) -> FireEventStore {
    FireEventStore::new(
        hour_offsets
            .iter()
            .map(|&h| fire_detection(site, Duration::hours(h)))
            .collect(),
    )
}

/// Quake store with one event per `(hour offset, magnitude)` pair.
pub fn quake_store(site: &Site, events: &[(i64, f64)]) -> QuakeEventStore {
    QuakeEventStore::new(
        events
            .iter()
            .map(|&(h, mag)| seismic_event(site, Duration::hours(h), mag))
            .collect(),
    )
}

/// Weather provider returning the same fixed run of days for every query.
pub struct StaticWeather {
    pub days: Vec<DailyWeather>,
}

impl StaticWeather {
    /// A week of hot, dry summer days ending the day before the anchor.
    pub fn hot_and_dry() -> Self {
        let days = (0..7)
            .map(|i| DailyWeather {
                date: NaiveDate::from_ymd_opt(2025, 6, 8 + i).unwrap(),
                temp_mean_c: 31.0 + i as f64 * 0.5,
                temp_max_c: 38.0 + i as f64 * 0.5,
                humidity_mean_pct: 28.0,
                humidity_min_pct: 14.0,
                wind_max_kmh: 35.0,
                precipitation_mm: 0.0,
            })
            .collect();
        Self { days }
    }

    /// A week of cold, wet days ending the day before the anchor.
    pub fn cold_and_wet() -> Self {
        let days = (0..7)
            .map(|i| DailyWeather {
                date: NaiveDate::from_ymd_opt(2025, 6, 8 + i).unwrap(),
                temp_mean_c: -1.0,
                temp_max_c: 3.0,
                humidity_mean_pct: 85.0,
                humidity_min_pct: 70.0,
                wind_max_kmh: 20.0,
                precipitation_mm: 6.0,
            })
            .collect();
        Self { days }
    }
}

impl WeatherProvider for StaticWeather {
    fn historical(
        &self,
        _lat: f64,
        _lon: f64,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> CoreResult<Vec<DailyWeather>> {
        Ok(self.days.clone())
    }

    fn forecast(&self, _lat: f64, _lon: f64, _days: i64) -> CoreResult<Vec<DailyWeather>> {
        Ok(self.days.clone())
    }
}

/// Weather provider that fails every call, for fallback-path tests.
pub struct FailingWeather;

impl WeatherProvider for FailingWeather {
    fn historical(
        &self,
        _lat: f64,
        _lon: f64,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> CoreResult<Vec<DailyWeather>> {
        Err(CoreError::WeatherError("fixture: fetch failed".to_string()))
    }

    fn forecast(&self, _lat: f64, _lon: f64, _days: i64) -> CoreResult<Vec<DailyWeather>> {
        Err(CoreError::WeatherError("fixture: fetch failed".to_string()))
    }
}

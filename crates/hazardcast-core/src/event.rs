//! Sites and the two read-only event collections.
//!
//! Event stores are immutable once built and sized for millions of rows:
//! latitude/longitude are kept as separate columns so a spatial query runs
//! one [`batch_distance_km`](crate::geo::batch_distance_km) call per store
//! instead of a per-row distance function call. Rows with non-finite
//! severity values are dropped at construction with a counted warning;
//! they can only come from malformed upstream exports and must never
//! poison an aggregate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::geo::{batch_distance_km, distance_km};
use crate::window::TemporalWindow;

/// A fixed location to score, identified by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

impl Site {
    pub fn new(name: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            name: name.into(),
            lat,
            lon,
        }
    }
}

/// Satellite overpass illumination flag on a fire detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DayNight {
    Day,
    Night,
}

/// One satellite active-fire detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FireDetection {
    pub lat: f64,
    pub lon: f64,
    pub acquired_at: DateTime<Utc>,
    /// Detection confidence, 0-100.
    pub confidence: f64,
    /// Brightness temperature in Kelvin.
    pub brightness_k: f64,
    /// Fire radiative power in megawatts.
    pub frp_mw: f64,
    pub daynight: Option<DayNight>,
}

/// One catalog earthquake.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeismicEvent {
    pub lat: f64,
    pub lon: f64,
    pub occurred_at: DateTime<Utc>,
    pub magnitude: f64,
    pub place: Option<String>,
}

/// Severity filter applied to fire detections before the spatial filter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FireFilter {
    pub min_confidence: f64,
    pub min_frp_mw: f64,
    /// When set, only daylight detections qualify; detections without a
    /// daynight flag pass (not every export carries the column).
    pub daylight_only: bool,
}

/// Severity filter applied to seismic events before the spatial filter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuakeFilter {
    pub min_magnitude: f64,
}

/// Immutable collection of fire detections with columnar coordinates.
#[derive(Debug, Clone, Default)]
pub struct FireEventStore {
    detections: Vec<FireDetection>,
    lats: Vec<f64>,
    lons: Vec<f64>,
    dropped_rows: usize,
}

impl FireEventStore {
    /// Build a store, dropping rows with non-finite severity or timestamp
    /// coordinates.
    pub fn new(detections: Vec<FireDetection>) -> Self {
        let before = detections.len();
        let detections: Vec<FireDetection> = detections
            .into_iter()
            .filter(|d| {
                d.confidence.is_finite()
                    && d.brightness_k.is_finite()
                    && d.frp_mw.is_finite()
                    && d.lat.is_finite()
                    && d.lon.is_finite()
            })
            .collect();
        let dropped_rows = before - detections.len();
        if dropped_rows > 0 {
            warn!(dropped_rows, "dropped fire detections with non-finite values");
        }

        let lats = detections.iter().map(|d| d.lat).collect();
        let lons = detections.iter().map(|d| d.lon).collect();
        Self {
            detections,
            lats,
            lons,
            dropped_rows,
        }
    }

    pub fn len(&self) -> usize {
        self.detections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }

    /// Rows discarded at construction for data-quality reasons.
    pub fn dropped_rows(&self) -> usize {
        self.dropped_rows
    }

    pub fn detections(&self) -> &[FireDetection] {
        &self.detections
    }

    /// Detections inside `window`, passing `filter`, strictly closer than
    /// `radius_km` to `(lat, lon)`.
    ///
    /// The time/severity pass runs first so the distance batch only
    /// covers surviving rows.
    pub fn select(
        &self,
        window: &TemporalWindow,
        filter: &FireFilter,
        lat: f64,
        lon: f64,
        radius_km: f64,
    ) -> Vec<&FireDetection> {
        let candidates: Vec<usize> = self
            .detections
            .iter()
            .enumerate()
            .filter(|(_, d)| {
                window.contains(d.acquired_at)
                    && d.confidence >= filter.min_confidence
                    && d.frp_mw >= filter.min_frp_mw
                    && (!filter.daylight_only || d.daynight != Some(DayNight::Night))
            })
            .map(|(i, _)| i)
            .collect();

        let cand_lats: Vec<f64> = candidates.iter().map(|&i| self.lats[i]).collect();
        let cand_lons: Vec<f64> = candidates.iter().map(|&i| self.lons[i]).collect();
        let distances = batch_distance_km(lat, lon, &cand_lats, &cand_lons);

        let selected: Vec<&FireDetection> = candidates
            .iter()
            .zip(distances.iter())
            .filter(|(_, &d)| d < radius_km)
            .map(|(&i, _)| &self.detections[i])
            .collect();
        debug!(
            candidates = candidates.len(),
            selected = selected.len(),
            "fire store query"
        );
        selected
    }
}

/// Immutable collection of seismic events with columnar coordinates.
#[derive(Debug, Clone, Default)]
pub struct QuakeEventStore {
    events: Vec<SeismicEvent>,
    lats: Vec<f64>,
    lons: Vec<f64>,
    dropped_rows: usize,
}

impl QuakeEventStore {
    pub fn new(events: Vec<SeismicEvent>) -> Self {
        let before = events.len();
        let events: Vec<SeismicEvent> = events
            .into_iter()
            .filter(|e| e.magnitude.is_finite() && e.lat.is_finite() && e.lon.is_finite())
            .collect();
        let dropped_rows = before - events.len();
        if dropped_rows > 0 {
            warn!(dropped_rows, "dropped seismic events with non-finite values");
        }

        let lats = events.iter().map(|e| e.lat).collect();
        let lons = events.iter().map(|e| e.lon).collect();
        Self {
            events,
            lats,
            lons,
            dropped_rows,
        }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn dropped_rows(&self) -> usize {
        self.dropped_rows
    }

    pub fn events(&self) -> &[SeismicEvent] {
        &self.events
    }

    /// Events inside `window`, at or above `filter.min_magnitude`,
    /// strictly closer than `radius_km` to `(lat, lon)`.
    pub fn select(
        &self,
        window: &TemporalWindow,
        filter: &QuakeFilter,
        lat: f64,
        lon: f64,
        radius_km: f64,
    ) -> Vec<&SeismicEvent> {
        let candidates: Vec<usize> = self
            .events
            .iter()
            .enumerate()
            .filter(|(_, e)| window.contains(e.occurred_at) && e.magnitude >= filter.min_magnitude)
            .map(|(i, _)| i)
            .collect();

        let cand_lats: Vec<f64> = candidates.iter().map(|&i| self.lats[i]).collect();
        let cand_lons: Vec<f64> = candidates.iter().map(|&i| self.lons[i]).collect();
        let distances = batch_distance_km(lat, lon, &cand_lats, &cand_lons);

        candidates
            .iter()
            .zip(distances.iter())
            .filter(|(_, &d)| d < radius_km)
            .map(|(&i, _)| &self.events[i])
            .collect()
    }
}

/// Registry of scoreable sites, loaded once.
#[derive(Debug, Clone, Default)]
pub struct SiteRegistry {
    sites: Vec<Site>,
}

impl SiteRegistry {
    pub fn new(sites: Vec<Site>) -> Self {
        Self { sites }
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    /// Case-insensitive lookup by name.
    pub fn get(&self, name: &str) -> Option<&Site> {
        self.sites
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
    }

    /// Closest registered site to a point, with its distance in km.
    pub fn nearest(&self, lat: f64, lon: f64) -> Option<(&Site, f64)> {
        self.sites
            .iter()
            .map(|s| (s, distance_km(lat, lon, s.lat, s.lon)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }
}

//! Binary hazard labels over a future horizon window.
//!
//! A label answers: does a qualifying event occur near this site within
//! the prediction horizon after the target timestamp? Qualification is
//! severity (confidence + radiative power for fire, magnitude for quake)
//! then distance, both configurable per hazard. The horizon starts at the
//! target inclusively and ends exclusively; getting either boundary wrong
//! silently shifts the positive rate, so both are pinned by tests.
//!
//! Metadata is populated for every call, including label 0 (zero-valued
//! severities), so downstream code never branches on the label to know
//! which fields exist.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{FireLabelConfig, QuakeLabelConfig};
use crate::event::{FireEventStore, FireFilter, QuakeEventStore, QuakeFilter, Site};
use crate::window::{TemporalWindow, WindowKind};

/// Descriptive statistics about the events behind a label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelMetadata {
    /// Qualifying events inside the horizon window and radius.
    pub event_count: usize,
    /// Highest severity among qualifying events (brightness Kelvin for
    /// fire, magnitude for quake); 0.0 when none.
    pub max_severity: f64,
    /// Mean severity among qualifying events; 0.0 when none.
    pub avg_severity: f64,
    /// Highest fire radiative power in MW; only set for fire labels.
    pub max_frp_mw: Option<f64>,
    /// Events at or above the significant-magnitude threshold; only set
    /// for quake labels.
    pub significant_count: Option<usize>,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
}

/// Fire label for `site` at `target`: 1 iff at least
/// `config.min_detections` qualifying detections fall inside the horizon
/// window and strictly within `config.radius_km`.
pub fn fire_label(
    site: &Site,
    target: DateTime<Utc>,
    store: &FireEventStore,
    config: &FireLabelConfig,
) -> (u8, LabelMetadata) {
    let window = TemporalWindow::horizon(target, config.horizon_hours);
    window
        .ensure_kind(WindowKind::Horizon)
        .expect("horizon constructor produces horizon windows");

    let filter = FireFilter {
        min_confidence: config.min_confidence,
        min_frp_mw: config.min_frp_mw,
        daylight_only: config.daylight_only,
    };
    let hits = store.select(&window, &filter, site.lat, site.lon, config.radius_km);

    let count = hits.len();
    let label = u8::from(count >= config.min_detections);

    let (max_severity, avg_severity, max_frp) = if count > 0 {
        let max_b = hits
            .iter()
            .map(|d| d.brightness_k)
            .fold(f64::NEG_INFINITY, f64::max);
        let avg_b = hits.iter().map(|d| d.brightness_k).sum::<f64>() / count as f64;
        let max_frp = hits
            .iter()
            .map(|d| d.frp_mw)
            .fold(f64::NEG_INFINITY, f64::max);
        (max_b, avg_b, max_frp)
    } else {
        (0.0, 0.0, 0.0)
    };

    let metadata = LabelMetadata {
        event_count: count,
        max_severity,
        avg_severity,
        max_frp_mw: Some(max_frp),
        significant_count: None,
        window_start: window.start(),
        window_end: window.end(),
    };

    (label, metadata)
}

/// Quake label for `site` at `target`: 1 iff at least `config.min_events`
/// qualifying events fall inside the horizon window and strictly within
/// `config.radius_km`.
pub fn quake_label(
    site: &Site,
    target: DateTime<Utc>,
    store: &QuakeEventStore,
    config: &QuakeLabelConfig,
) -> (u8, LabelMetadata) {
    let window = TemporalWindow::horizon(target, config.horizon_hours);
    window
        .ensure_kind(WindowKind::Horizon)
        .expect("horizon constructor produces horizon windows");

    let filter = QuakeFilter {
        min_magnitude: config.min_magnitude,
    };
    let hits = store.select(&window, &filter, site.lat, site.lon, config.radius_km);

    let count = hits.len();
    let label = u8::from(count >= config.min_events);

    let (max_severity, avg_severity, significant) = if count > 0 {
        let max_m = hits
            .iter()
            .map(|e| e.magnitude)
            .fold(f64::NEG_INFINITY, f64::max);
        let avg_m = hits.iter().map(|e| e.magnitude).sum::<f64>() / count as f64;
        let significant = hits
            .iter()
            .filter(|e| e.magnitude >= config.significant_magnitude)
            .count();
        (max_m, avg_m, significant)
    } else {
        (0.0, 0.0, 0)
    };

    let metadata = LabelMetadata {
        event_count: count,
        max_severity,
        avg_severity,
        max_frp_mw: None,
        significant_count: Some(significant),
        window_start: window.start(),
        window_end: window.end(),
    };

    (label, metadata)
}

//! CSV ingestion and egress.
//!
//! Readers accept the column layouts of the upstream exports: the
//! satellite fire archive (latitude, longitude, acq_date, acq_time,
//! confidence, brightness, frp, optional daynight), the seismic catalog
//! (latitude, longitude, time, mag, optional place), the site registry
//! (name, lat, lon) and route definitions (route_id, order, name, lat,
//! lon). A missing file is fatal; a malformed row is skipped with a
//! counted warning.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;
use tracing::{info, warn};

use hazardcast_core::event::{
    DayNight, FireDetection, FireEventStore, QuakeEventStore, SeismicEvent, Site, SiteRegistry,
};
use hazardcast_core::risk::SiteRisk;
use hazardcast_core::route::{Route, RoutePoint};

use crate::assembler::Sample;
use crate::error::{DatasetError, DatasetResult};

#[derive(Debug, Deserialize)]
struct FireCsvRow {
    latitude: f64,
    longitude: f64,
    acq_date: String,
    #[serde(default)]
    acq_time: Option<String>,
    confidence: f64,
    brightness: f64,
    frp: f64,
    #[serde(default)]
    daynight: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QuakeCsvRow {
    latitude: f64,
    longitude: f64,
    time: String,
    mag: f64,
    #[serde(default)]
    place: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SiteCsvRow {
    name: String,
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct RouteCsvRow {
    route_id: String,
    order: u32,
    name: String,
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct PredictionCsvRow {
    site_name: String,
    lat: f64,
    lon: f64,
    fire_probability: f64,
    quake_probability: f64,
}

fn require_exists(kind: &str, path: &Path) -> DatasetResult<()> {
    if !path.exists() {
        return Err(DatasetError::MissingSource {
            kind: kind.to_string(),
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

/// Fail fast when a required column is absent, instead of silently
/// skipping every row.
fn require_columns(
    reader: &mut csv::Reader<std::fs::File>,
    required: &[&str],
    path: &Path,
) -> DatasetResult<()> {
    let headers = reader.headers()?.clone();
    for column in required {
        if !headers.iter().any(|h| h == *column) {
            return Err(DatasetError::MissingColumn {
                column: column.to_string(),
                path: path.to_path_buf(),
            });
        }
    }
    Ok(())
}

/// Load and concatenate one or more fire-detection CSV exports
/// (archive plus near-real-time files).
///
/// Files that do not exist are skipped with a warning; at least one must
/// be present.
pub fn load_fire_csv(paths: &[PathBuf]) -> DatasetResult<FireEventStore> {
    let existing: Vec<&PathBuf> = paths.iter().filter(|p| p.exists()).collect();
    for missing in paths.iter().filter(|p| !p.exists()) {
        warn!(path = %missing.display(), "fire CSV not found, skipping");
    }
    if existing.is_empty() {
        return Err(DatasetError::MissingSource {
            kind: "fire".to_string(),
            path: paths.first().cloned().unwrap_or_default(),
        });
    }

    let mut detections = Vec::new();
    for path in existing {
        let mut reader = csv::Reader::from_path(path)?;
        require_columns(
            &mut reader,
            &["latitude", "longitude", "acq_date", "confidence", "brightness", "frp"],
            path,
        )?;
        let mut skipped = 0usize;
        let before = detections.len();

        for row in reader.deserialize::<FireCsvRow>() {
            match row {
                Ok(row) => match parse_fire_row(&row) {
                    Some(detection) => detections.push(detection),
                    None => skipped += 1,
                },
                Err(_) => skipped += 1,
            }
        }

        if skipped > 0 {
            warn!(path = %path.display(), skipped, "skipped malformed fire rows");
        }
        info!(
            path = %path.display(),
            rows = detections.len() - before,
            "loaded fire detections"
        );
    }

    Ok(FireEventStore::new(detections))
}

fn parse_fire_row(row: &FireCsvRow) -> Option<FireDetection> {
    let date = NaiveDate::parse_from_str(&row.acq_date, "%Y-%m-%d").ok()?;
    // acq_time is HHMM ("1230"); midnight when absent or malformed.
    let time = row
        .acq_time
        .as_deref()
        .and_then(parse_hhmm)
        .unwrap_or_else(|| NaiveTime::from_hms_opt(0, 0, 0).unwrap());
    let acquired_at = DateTime::<Utc>::from_naive_utc_and_offset(date.and_time(time), Utc);

    let daynight = match row.daynight.as_deref() {
        Some("D") => Some(DayNight::Day),
        Some("N") => Some(DayNight::Night),
        _ => None,
    };

    Some(FireDetection {
        lat: row.latitude,
        lon: row.longitude,
        acquired_at,
        confidence: row.confidence,
        brightness_k: row.brightness,
        frp_mw: row.frp,
        daynight,
    })
}

fn parse_hhmm(raw: &str) -> Option<NaiveTime> {
    let padded = format!("{raw:0>4}");
    NaiveTime::parse_from_str(&padded, "%H%M").ok()
}

/// Load the seismic catalog CSV.
pub fn load_quake_csv(path: &Path) -> DatasetResult<QuakeEventStore> {
    require_exists("quake", path)?;

    let mut reader = csv::Reader::from_path(path)?;
    require_columns(&mut reader, &["latitude", "longitude", "time", "mag"], path)?;
    let mut events = Vec::new();
    let mut skipped = 0usize;

    for row in reader.deserialize::<QuakeCsvRow>() {
        match row {
            Ok(row) => match parse_timestamp(&row.time) {
                Some(occurred_at) => events.push(SeismicEvent {
                    lat: row.latitude,
                    lon: row.longitude,
                    occurred_at,
                    magnitude: row.mag,
                    place: row.place.clone().filter(|p| !p.is_empty()),
                }),
                None => skipped += 1,
            },
            Err(_) => skipped += 1,
        }
    }

    if skipped > 0 {
        warn!(path = %path.display(), skipped, "skipped malformed quake rows");
    }
    info!(path = %path.display(), rows = events.len(), "loaded seismic events");
    Ok(QuakeEventStore::new(events))
}

/// Parse the timestamp formats seen in catalog exports: RFC 3339,
/// space-separated datetime, or bare date.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Some(t.with_timezone(&Utc));
    }
    if let Ok(t) = chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(DateTime::from_naive_utc_and_offset(t, Utc));
    }
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(DateTime::from_naive_utc_and_offset(
            d.and_time(NaiveTime::from_hms_opt(0, 0, 0).unwrap()),
            Utc,
        ));
    }
    None
}

/// Load the site registry CSV.
pub fn load_sites_csv(path: &Path) -> DatasetResult<SiteRegistry> {
    require_exists("sites", path)?;

    let mut reader = csv::Reader::from_path(path)?;
    let mut sites = Vec::new();
    for row in reader.deserialize::<SiteCsvRow>() {
        let row = row?;
        sites.push(Site::new(row.name, row.lat, row.lon));
    }

    if sites.is_empty() {
        return Err(DatasetError::NoSites);
    }
    info!(path = %path.display(), sites = sites.len(), "loaded site registry");
    Ok(SiteRegistry::new(sites))
}

/// Load route definitions: `(route_id, unprocessed waypoints)` pairs in
/// first-seen order.
pub fn load_routes_csv(path: &Path) -> DatasetResult<Vec<(String, Vec<RoutePoint>)>> {
    require_exists("routes", path)?;

    let mut reader = csv::Reader::from_path(path)?;
    let mut routes: Vec<(String, Vec<RoutePoint>)> = Vec::new();
    for row in reader.deserialize::<RouteCsvRow>() {
        let row = row?;
        let point = RoutePoint::new(row.order, row.name, row.lat, row.lon);
        match routes.iter_mut().find(|(id, _)| *id == row.route_id) {
            Some((_, points)) => points.push(point),
            None => routes.push((row.route_id, vec![point])),
        }
    }

    info!(path = %path.display(), routes = routes.len(), "loaded routes");
    Ok(routes)
}

/// Load per-site probability predictions into site risks.
pub fn load_predictions_csv(path: &Path) -> DatasetResult<Vec<SiteRisk>> {
    require_exists("predictions", path)?;

    let mut reader = csv::Reader::from_path(path)?;
    let mut risks = Vec::new();
    for row in reader.deserialize::<PredictionCsvRow>() {
        let row = row?;
        risks.push(SiteRisk::new(
            Site::new(row.site_name, row.lat, row.lon),
            row.fire_probability,
            row.quake_probability,
        ));
    }

    info!(path = %path.display(), sites = risks.len(), "loaded predictions");
    Ok(risks)
}

/// Write assembled samples with one column per feature.
///
/// Feature columns follow the stable per-mode order; every sample must
/// carry the same name set.
pub fn write_samples_csv(path: &Path, samples: &[Sample]) -> DatasetResult<()> {
    let mut writer = csv::Writer::from_path(path)?;

    let feature_names: Vec<&str> = samples.first().map(|s| s.features.names()).unwrap_or_default();

    let mut header = vec!["site_name", "target_date", "lat", "lon"];
    header.extend(feature_names.iter().copied());
    header.extend(["label", "label_event_count", "label_max_severity"]);
    writer.write_record(&header)?;

    for sample in samples {
        let mut record = vec![
            sample.site_name.clone(),
            sample.target_date.to_rfc3339(),
            sample.lat.to_string(),
            sample.lon.to_string(),
        ];
        for &name in &feature_names {
            let value = sample.features.get(name).unwrap_or_default();
            record.push(value.to_string());
        }
        record.push(sample.label.to_string());
        record.push(sample.metadata.event_count.to_string());
        record.push(sample.metadata.max_severity.to_string());
        writer.write_record(&record)?;
    }

    writer.flush()?;
    info!(path = %path.display(), rows = samples.len(), "wrote samples");
    Ok(())
}

/// Write per-site risk scores, highest combined risk first.
pub fn write_predictions_csv(path: &Path, risks: &[SiteRisk]) -> DatasetResult<()> {
    let mut sorted: Vec<&SiteRisk> = risks.iter().collect();
    sorted.sort_by(|a, b| b.combined_probability.total_cmp(&a.combined_probability));

    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([
        "site_name",
        "lat",
        "lon",
        "fire_probability",
        "fire_risk_score",
        "quake_probability",
        "quake_risk_score",
        "combined_probability",
        "combined_risk_score",
    ])?;
    for risk in sorted {
        writer.write_record([
            risk.site.name.clone(),
            risk.site.lat.to_string(),
            risk.site.lon.to_string(),
            risk.fire_probability.to_string(),
            risk.fire_score().to_string(),
            risk.quake_probability.to_string(),
            risk.quake_score().to_string(),
            risk.combined_probability.to_string(),
            risk.combined_score().to_string(),
        ])?;
    }

    writer.flush()?;
    info!(path = %path.display(), rows = risks.len(), "wrote predictions");
    Ok(())
}

/// Write one row per waypoint with its route's aggregates alongside.
pub fn write_route_summary_csv(path: &Path, routes: &[Route]) -> DatasetResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([
        "route_id",
        "order",
        "waypoint_name",
        "lat",
        "lon",
        "fire_risk",
        "quake_risk",
        "combined_risk",
        "distance_from_prev_km",
        "accumulated_risk",
        "route_total_distance_km",
        "route_aggregated_risk",
        "route_risk_level",
        "route_dominant_hazard",
    ])?;

    for route in routes {
        for point in &route.points {
            writer.write_record([
                route.route_id.clone(),
                point.order.to_string(),
                point.name.clone(),
                point.lat.to_string(),
                point.lon.to_string(),
                point.fire_risk.to_string(),
                point.quake_risk.to_string(),
                point.combined_risk.to_string(),
                point.distance_from_prev_km.to_string(),
                point.accumulated_risk.to_string(),
                route.total_distance_km.to_string(),
                route.aggregated_combined_risk.to_string(),
                route.risk_level().to_string(),
                route.dominant_hazard.to_string(),
            ])?;
        }
    }

    writer.flush()?;
    info!(path = %path.display(), routes = routes.len(), "wrote route summary");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, "{content}").unwrap();
        path
    }

    #[test]
    fn test_load_fire_csv_parses_rows() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "fire.csv",
            "latitude,longitude,acq_date,acq_time,confidence,brightness,frp,daynight\n\
             34.05,-118.24,2025-06-16,1230,85,330.1,45.2,D\n\
             34.06,-118.25,2025-06-17,0830,92,341.0,18.3,N\n",
        );

        let store = load_fire_csv(&[path]).unwrap();
        assert_eq!(store.len(), 2);
        let first = &store.detections()[0];
        assert_eq!(first.acquired_at.to_rfc3339(), "2025-06-16T12:30:00+00:00");
        assert_eq!(first.daynight, Some(DayNight::Day));
        assert_eq!(first.frp_mw, 45.2);
    }

    #[test]
    fn test_load_fire_csv_without_daynight_column() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "fire.csv",
            "latitude,longitude,acq_date,acq_time,confidence,brightness,frp\n\
             34.05,-118.24,2025-06-16,1230,85,330.1,45.2\n",
        );

        let store = load_fire_csv(&[path]).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.detections()[0].daynight, None);
    }

    #[test]
    fn test_load_fire_csv_concatenates_and_skips_missing() {
        let dir = TempDir::new().unwrap();
        let a = write_file(
            &dir,
            "a.csv",
            "latitude,longitude,acq_date,acq_time,confidence,brightness,frp\n\
             34.05,-118.24,2025-06-16,1230,85,330.1,45.2\n",
        );
        let b = write_file(
            &dir,
            "b.csv",
            "latitude,longitude,acq_date,acq_time,confidence,brightness,frp\n\
             34.06,-118.25,2025-06-17,0830,92,341.0,18.3\n",
        );
        let missing = dir.path().join("nope.csv");

        let store = load_fire_csv(&[a, missing, b]).unwrap();
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_load_fire_csv_all_missing_is_fatal() {
        let dir = TempDir::new().unwrap();
        let err = load_fire_csv(&[dir.path().join("nope.csv")]).unwrap_err();
        assert!(matches!(err, DatasetError::MissingSource { .. }));
    }

    #[test]
    fn test_malformed_fire_rows_are_skipped() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "fire.csv",
            "latitude,longitude,acq_date,acq_time,confidence,brightness,frp\n\
             34.05,-118.24,2025-06-16,1230,85,330.1,45.2\n\
             not-a-number,-118.24,2025-06-16,1230,85,330.1,45.2\n\
             34.05,-118.24,16/06/2025,1230,85,330.1,45.2\n",
        );

        let store = load_fire_csv(&[path]).unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_missing_required_column_is_fatal() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "quakes.csv",
            "latitude,longitude,time\n61.22,-149.90,2025-06-16T10:30:00Z\n",
        );
        let err = load_quake_csv(&path).unwrap_err();
        assert!(matches!(err, DatasetError::MissingColumn { column, .. } if column == "mag"));
    }

    #[test]
    fn test_load_quake_csv_timestamp_formats() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "quakes.csv",
            "latitude,longitude,time,mag,place\n\
             61.22,-149.90,2025-06-16T10:30:00.000Z,4.5,southern Alaska\n\
             61.25,-149.85,2025-06-17 14:20:00,3.2,\n\
             61.20,-149.95,2025-06-18,2.8,\n",
        );

        let store = load_quake_csv(&path).unwrap();
        assert_eq!(store.len(), 3);
        let events = store.events();
        assert_eq!(events[0].place.as_deref(), Some("southern Alaska"));
        assert_eq!(events[1].place, None);
        assert_eq!(events[2].occurred_at.to_rfc3339(), "2025-06-18T00:00:00+00:00");
    }

    #[test]
    fn test_load_sites_csv() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "sites.csv",
            "name,lat,lon\nLos Angeles,34.0522,-118.2437\nTokyo,35.6762,139.6503\n",
        );

        let registry = load_sites_csv(&path).unwrap();
        assert_eq!(registry.len(), 2);
        assert!(registry.get("tokyo").is_some());
    }

    #[test]
    fn test_load_sites_csv_empty_is_fatal() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "sites.csv", "name,lat,lon\n");
        assert!(matches!(
            load_sites_csv(&path).unwrap_err(),
            DatasetError::NoSites
        ));
    }

    #[test]
    fn test_load_routes_groups_by_route_id() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "routes.csv",
            "route_id,order,name,lat,lon\n\
             A,1,Hamburg,53.5511,9.9937\n\
             A,2,Munich,48.1351,11.582\n\
             B,1,Rome,41.9028,12.4964\n",
        );

        let routes = load_routes_csv(&path).unwrap();
        assert_eq!(routes.len(), 2);
        assert_eq!(routes[0].0, "A");
        assert_eq!(routes[0].1.len(), 2);
        assert_eq!(routes[1].1[0].name, "Rome");
    }

    #[test]
    fn test_predictions_roundtrip() {
        use hazardcast_core::event::Site;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("predictions.csv");
        let risks = vec![
            SiteRisk::new(Site::new("LA", 34.05, -118.24), 0.3, 0.1),
            SiteRisk::new(Site::new("Anchorage", 61.22, -149.9), 0.05, 0.6),
        ];
        write_predictions_csv(&path, &risks).unwrap();

        let loaded = load_predictions_csv(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        // Sorted by combined risk descending on write.
        assert_eq!(loaded[0].site.name, "Anchorage");
        assert!((loaded[1].fire_probability - 0.3).abs() < 1e-9);
    }
}

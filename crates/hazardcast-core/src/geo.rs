//! Great-circle distance math and GeoJSON coordinate extraction.
//!
//! Distances use the haversine formula with a spherical Earth of radius
//! 6371 km. Geometry handling normalizes the GeoJSON coordinate nesting
//! schemes into flat `(lat, lon)` lists; unknown geometry types degrade to
//! an empty list with a logged warning rather than an error, so one
//! malformed upstream record never aborts a batch.

use serde_json::Value;
use tracing::warn;

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two points in kilometers.
pub fn distance_km(lat_a: f64, lon_a: f64, lat_b: f64, lon_b: f64) -> f64 {
    let lat_a_rad = lat_a.to_radians();
    let lat_b_rad = lat_b.to_radians();
    let dlat = (lat_b - lat_a).to_radians();
    let dlon = (lon_b - lon_a).to_radians();

    let a = (dlat / 2.0).sin().powi(2)
        + lat_a_rad.cos() * lat_b_rad.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Distances from one reference point to every `(lats[i], lons[i])` pair.
///
/// Bulk form of [`distance_km`] used for spatial filtering over whole
/// event collections; results are element-wise identical to scalar calls.
///
/// # Panics
/// Panics if `lats` and `lons` have different lengths.
pub fn batch_distance_km(lat: f64, lon: f64, lats: &[f64], lons: &[f64]) -> Vec<f64> {
    assert_eq!(
        lats.len(),
        lons.len(),
        "latitude and longitude columns must have equal length"
    );

    let lat_rad = lat.to_radians();
    let lat_cos = lat_rad.cos();

    lats.iter()
        .zip(lons.iter())
        .map(|(&lat_b, &lon_b)| {
            let lat_b_rad = lat_b.to_radians();
            let dlat = (lat_b - lat).to_radians();
            let dlon = (lon_b - lon).to_radians();
            let a = (dlat / 2.0).sin().powi(2)
                + lat_cos * lat_b_rad.cos() * (dlon / 2.0).sin().powi(2);
            EARTH_RADIUS_KM * 2.0 * a.sqrt().atan2((1.0 - a).sqrt())
        })
        .collect()
}

/// Check that coordinates are within valid latitude/longitude ranges.
pub fn validate_coordinates(lat: f64, lon: f64) -> bool {
    (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon)
}

/// Extract all coordinate pairs from a GeoJSON geometry as `(lat, lon)`.
///
/// Supports Point, MultiPoint, LineString, MultiLineString, Polygon and
/// MultiPolygon. GeoJSON stores positions lon-first; the output is
/// lat-first. Unknown geometry types and malformed coordinate arrays
/// yield whatever could be extracted (possibly nothing) plus a warning.
pub fn extract_points(geometry: &Value) -> Vec<(f64, f64)> {
    let geom_type = geometry.get("type").and_then(Value::as_str).unwrap_or("");
    let coordinates = match geometry.get("coordinates") {
        Some(c) => c,
        None => return Vec::new(),
    };

    let mut coords = Vec::new();
    match geom_type {
        "Point" => push_position(coordinates, &mut coords),
        "MultiPoint" | "LineString" => push_position_array(coordinates, &mut coords),
        "MultiLineString" | "Polygon" => {
            for line in coordinates.as_array().unwrap_or(&Vec::new()) {
                push_position_array(line, &mut coords);
            }
        }
        "MultiPolygon" => {
            for polygon in coordinates.as_array().unwrap_or(&Vec::new()) {
                for ring in polygon.as_array().unwrap_or(&Vec::new()) {
                    push_position_array(ring, &mut coords);
                }
            }
        }
        other => {
            warn!(geometry_type = other, "unknown geometry type, skipping");
        }
    }

    coords
}

/// Append one `[lon, lat, ...]` position, if well-formed.
fn push_position(position: &Value, out: &mut Vec<(f64, f64)>) {
    let pair = position.as_array().and_then(|p| {
        let lon = p.first().and_then(Value::as_f64)?;
        let lat = p.get(1).and_then(Value::as_f64)?;
        Some((lat, lon))
    });
    match pair {
        Some(p) => out.push(p),
        None => warn!("malformed GeoJSON position, skipping"),
    }
}

fn push_position_array(positions: &Value, out: &mut Vec<(f64, f64)>) {
    for position in positions.as_array().unwrap_or(&Vec::new()) {
        push_position(position, out);
    }
}

/// Minimum distance from a point to any coordinate of a geometry.
///
/// Returns `f64::INFINITY` when the geometry yields no coordinates; the
/// sentinel lets callers treat "no geometry" as "infinitely far" without
/// a separate error path.
pub fn min_distance_to_geometry(lat: f64, lon: f64, geometry: &Value) -> f64 {
    extract_points(geometry)
        .iter()
        .map(|&(g_lat, g_lon)| distance_km(lat, lon, g_lat, g_lon))
        .fold(f64::INFINITY, f64::min)
}

/// Approximate centroid of a geometry (simple coordinate mean).
pub fn centroid(geometry: &Value) -> Option<(f64, f64)> {
    let coords = extract_points(geometry);
    if coords.is_empty() {
        return None;
    }

    let n = coords.len() as f64;
    let (lat_sum, lon_sum) = coords
        .iter()
        .fold((0.0, 0.0), |(la, lo), &(lat, lon)| (la + lat, lo + lon));
    Some((lat_sum / n, lon_sum / n))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_distance_zero_for_identical_points() {
        assert_eq!(distance_km(34.05, -118.24, 34.05, -118.24), 0.0);
        assert_eq!(distance_km(0.0, 0.0, 0.0, 0.0), 0.0);
    }

    #[test]
    fn test_distance_symmetric() {
        let ab = distance_km(52.52, 13.405, 48.8566, 2.3522);
        let ba = distance_km(48.8566, 2.3522, 52.52, 13.405);
        assert!((ab - ba).abs() < 1e-9);
    }

    #[test]
    fn test_known_distance_berlin_paris() {
        // Berlin -> Paris is roughly 878 km.
        let d = distance_km(52.52, 13.405, 48.8566, 2.3522);
        assert!((d - 878.0).abs() < 10.0, "got {d}");
    }

    #[test]
    fn test_batch_matches_scalar() {
        let lats = [34.0, -12.5, 61.2181, 0.0, 89.9];
        let lons = [-118.0, 130.2, -149.9003, 0.0, 179.0];
        let batch = batch_distance_km(48.1351, 11.582, &lats, &lons);
        for (i, d) in batch.iter().enumerate() {
            let scalar = distance_km(48.1351, 11.582, lats[i], lons[i]);
            assert!((d - scalar).abs() < 1e-9, "index {i}: {d} vs {scalar}");
        }
    }

    #[test]
    fn test_validate_coordinates() {
        assert!(validate_coordinates(0.0, 0.0));
        assert!(validate_coordinates(-90.0, 180.0));
        assert!(!validate_coordinates(90.1, 0.0));
        assert!(!validate_coordinates(0.0, -180.5));
    }

    #[test]
    fn test_extract_points_point() {
        let geom = json!({"type": "Point", "coordinates": [-118.24, 34.05]});
        assert_eq!(extract_points(&geom), vec![(34.05, -118.24)]);
    }

    #[test]
    fn test_extract_points_polygon() {
        let geom = json!({
            "type": "Polygon",
            "coordinates": [[[0.0, 1.0], [2.0, 3.0], [4.0, 5.0], [0.0, 1.0]]]
        });
        let points = extract_points(&geom);
        assert_eq!(points.len(), 4);
        assert_eq!(points[1], (3.0, 2.0));
    }

    #[test]
    fn test_extract_points_multi_polygon() {
        let geom = json!({
            "type": "MultiPolygon",
            "coordinates": [
                [[[0.0, 0.0], [1.0, 1.0]]],
                [[[2.0, 2.0], [3.0, 3.0]]]
            ]
        });
        assert_eq!(extract_points(&geom).len(), 4);
    }

    #[test]
    fn test_extract_points_unknown_type_is_empty() {
        let geom = json!({"type": "GeometryCollection", "coordinates": [1.0, 2.0]});
        assert!(extract_points(&geom).is_empty());
    }

    #[test]
    fn test_min_distance_empty_geometry_is_infinite() {
        let geom = json!({"type": "Point", "coordinates": []});
        assert_eq!(min_distance_to_geometry(0.0, 0.0, &geom), f64::INFINITY);
    }

    #[test]
    fn test_min_distance_picks_closest_vertex() {
        let geom = json!({
            "type": "LineString",
            // lon-first: second vertex sits on the query point
            "coordinates": [[10.0, 50.0], [-118.24, 34.05]]
        });
        let d = min_distance_to_geometry(34.05, -118.24, &geom);
        assert!(d < 1e-9);
    }

    #[test]
    fn test_centroid() {
        let geom = json!({
            "type": "MultiPoint",
            "coordinates": [[0.0, 0.0], [2.0, 4.0]]
        });
        let c = centroid(&geom).unwrap();
        assert!((c.0 - 2.0).abs() < 1e-9);
        assert!((c.1 - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_centroid_empty_is_none() {
        let geom = json!({"type": "Point"});
        assert!(centroid(&geom).is_none());
    }
}

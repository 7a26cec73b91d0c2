//! Route-level risk: waypoint assignment, leg distances, accumulation.
//!
//! A route is a derived entity. It is rebuilt from an ordered waypoint
//! list plus a set of per-site risk predictions whenever those inputs
//! change; nothing patches a processed route in place. Risk values on
//! waypoints and routes use the x100 percentage scale of
//! [`SiteRisk`](crate::risk::SiteRisk) scores.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::geo::distance_km;
use crate::risk::{combine, SiteRisk};

/// Maximum distance at which a waypoint adopts the nearest prediction
/// when no name match exists, km.
pub const WAYPOINT_MATCH_RADIUS_KM: f64 = 100.0;

/// The two modeled hazards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hazard {
    Fire,
    Quake,
}

impl std::fmt::Display for Hazard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Hazard::Fire => write!(f, "fire"),
            Hazard::Quake => write!(f, "quake"),
        }
    }
}

/// Qualitative banding of a percentage risk score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl RiskLevel {
    /// Band a percentage score: >=75 very high, >=50 high, >=25 medium.
    pub fn from_score(percent: f64) -> Self {
        if percent >= 75.0 {
            RiskLevel::VeryHigh
        } else if percent >= 50.0 {
            RiskLevel::High
        } else if percent >= 25.0 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "Low"),
            RiskLevel::Medium => write!(f, "Medium"),
            RiskLevel::High => write!(f, "High"),
            RiskLevel::VeryHigh => write!(f, "Very High"),
        }
    }
}

/// A waypoint on a route with its assigned and derived risks (percent).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutePoint {
    pub order: u32,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub fire_risk: f64,
    pub quake_risk: f64,
    pub combined_risk: f64,
    /// Kilometers from the previous waypoint; 0 for the first.
    pub distance_from_prev_km: f64,
    /// Combined risk folded over the waypoints visited so far.
    pub accumulated_risk: f64,
}

impl RoutePoint {
    pub fn new(order: u32, name: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            order,
            name: name.into(),
            lat,
            lon,
            fire_risk: 0.0,
            quake_risk: 0.0,
            combined_risk: 0.0,
            distance_from_prev_km: 0.0,
            accumulated_risk: 0.0,
        }
    }
}

/// An ordered sequence of waypoints with aggregated route risks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub route_id: String,
    pub points: Vec<RoutePoint>,
    pub total_distance_km: f64,
    pub aggregated_fire_risk: f64,
    pub aggregated_quake_risk: f64,
    pub aggregated_combined_risk: f64,
    pub dominant_hazard: Hazard,
}

impl Route {
    /// Assemble and fully process a route from raw waypoints and per-site
    /// predictions.
    pub fn build(
        route_id: impl Into<String>,
        mut points: Vec<RoutePoint>,
        predictions: &[SiteRisk],
    ) -> Self {
        let route_id = route_id.into();
        points.sort_by_key(|p| p.order);

        assign_risks(&route_id, &mut points, predictions);
        let total_distance_km = compute_leg_distances(&mut points);
        let (fire, quake, combined) = accumulate(&mut points);

        // Ties (typically the all-zero route) read as quake.
        let dominant_hazard = if fire > quake {
            Hazard::Fire
        } else {
            Hazard::Quake
        };

        let route = Self {
            route_id,
            points,
            total_distance_km,
            aggregated_fire_risk: fire,
            aggregated_quake_risk: quake,
            aggregated_combined_risk: combined,
            dominant_hazard,
        };
        info!(
            route_id = %route.route_id,
            waypoints = route.points.len(),
            total_km = route.total_distance_km,
            combined_risk = route.aggregated_combined_risk,
            "route processed"
        );
        route
    }

    pub fn risk_level(&self) -> RiskLevel {
        RiskLevel::from_score(self.aggregated_combined_risk)
    }
}

/// Copy risk scores onto each waypoint from the prediction set.
///
/// Match order: exact case-insensitive name, then the nearest predicted
/// site within [`WAYPOINT_MATCH_RADIUS_KM`], else zeros with a warning.
fn assign_risks(route_id: &str, points: &mut [RoutePoint], predictions: &[SiteRisk]) {
    for point in points.iter_mut() {
        let by_name = predictions
            .iter()
            .find(|p| p.site.name.eq_ignore_ascii_case(&point.name));

        let matched = by_name.or_else(|| {
            let nearest = predictions
                .iter()
                .map(|p| (p, distance_km(point.lat, point.lon, p.site.lat, p.site.lon)))
                .min_by(|a, b| a.1.total_cmp(&b.1));
            match nearest {
                Some((p, d)) if d < WAYPOINT_MATCH_RADIUS_KM => {
                    info!(
                        route_id,
                        waypoint = %point.name,
                        site = %p.site.name,
                        distance_km = d,
                        "waypoint matched by proximity"
                    );
                    Some(p)
                }
                _ => None,
            }
        });

        match matched {
            Some(prediction) => {
                point.fire_risk = prediction.fire_score();
                point.quake_risk = prediction.quake_score();
                point.combined_risk = prediction.combined_score();
            }
            None => {
                warn!(route_id, waypoint = %point.name, "no prediction for waypoint");
            }
        }
    }
}

/// Fill per-leg distances and return the route total.
fn compute_leg_distances(points: &mut [RoutePoint]) -> f64 {
    let mut total = 0.0;
    for i in 0..points.len() {
        points[i].distance_from_prev_km = if i == 0 {
            0.0
        } else {
            let prev = &points[i - 1];
            let d = distance_km(prev.lat, prev.lon, points[i].lat, points[i].lon);
            total += d;
            d
        };
    }
    total
}

/// Fold the combiner over the waypoints and aggregate each hazard.
///
/// Returns `(fire, quake, combined)` aggregated percentages.
fn accumulate(points: &mut [RoutePoint]) -> (f64, f64, f64) {
    let fire_probs: Vec<f64> = points.iter().map(|p| p.fire_risk / 100.0).collect();
    let quake_probs: Vec<f64> = points.iter().map(|p| p.quake_risk / 100.0).collect();
    let combined_probs: Vec<f64> = points.iter().map(|p| p.combined_risk / 100.0).collect();

    let mut running = 0.0;
    for point in points.iter_mut() {
        running = combine(&[running, point.combined_risk / 100.0]);
        point.accumulated_risk = running * 100.0;
    }

    (
        combine(&fire_probs) * 100.0,
        combine(&quake_probs) * 100.0,
        combine(&combined_probs) * 100.0,
    )
}

//! Probability composition for per-site and route-level risk.
//!
//! Composition uses the "at least one independent event" formula
//! `1 - prod(1 - p_i)`. Treating hazards and waypoints as statistically
//! independent is a modeling simplification, not a derived fact; see
//! [`combine`].

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::event::Site;

/// Probability that at least one of the given independent events occurs.
///
/// Returns 0.0 for an empty slice. Inputs must already be within [0, 1];
/// anything else is a caller bug (clamp after heuristic adjustments),
/// checked by a debug assertion.
///
/// Independence between the inputs is assumed, not verified. For
/// co-located hazards and adjacent waypoints this overstates the joint
/// probability somewhat; the output is a comparative score, not a
/// calibrated probability.
pub fn combine(probabilities: &[f64]) -> f64 {
    debug_assert!(
        probabilities.iter().all(|p| (0.0..=1.0).contains(p)),
        "probabilities must be within [0, 1]: {probabilities:?}"
    );
    1.0 - probabilities.iter().map(|p| 1.0 - p).product::<f64>()
}

/// Per-hazard and combined risk for one site.
///
/// Probabilities are clamped into [0, 1] on construction; the `*_score`
/// accessors expose the x100 percentage forms used in reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteRisk {
    pub site: Site,
    pub fire_probability: f64,
    pub quake_probability: f64,
    pub combined_probability: f64,
}

impl SiteRisk {
    pub fn new(site: Site, fire_probability: f64, quake_probability: f64) -> Self {
        let fire_probability = fire_probability.clamp(0.0, 1.0);
        let quake_probability = quake_probability.clamp(0.0, 1.0);
        Self {
            site,
            fire_probability,
            quake_probability,
            combined_probability: combine(&[fire_probability, quake_probability]),
        }
    }

    pub fn fire_score(&self) -> f64 {
        self.fire_probability * 100.0
    }

    pub fn quake_score(&self) -> f64 {
        self.quake_probability * 100.0
    }

    pub fn combined_score(&self) -> f64 {
        self.combined_probability * 100.0
    }
}

/// Dampen or boost a raw fire probability using aggregated weather.
///
/// Heuristic corrections for regimes the historical-activity features
/// cannot see: frost and saturated air make ignition implausible however
/// active the area was, extreme heat with dry air does the opposite. The
/// result is always clamped back into [0, 1].
pub fn adjust_fire_probability(
    probability: f64,
    temp_mean: f64,
    humidity_mean: f64,
    humidity_min: f64,
) -> f64 {
    let factor = if temp_mean <= 0.0 && humidity_mean > 70.0 {
        0.01
    } else if temp_mean <= 0.0 {
        0.05
    } else if temp_mean < 5.0 {
        0.2
    } else if temp_mean < 10.0 {
        0.5
    } else if temp_mean > 35.0 && humidity_min < 20.0 {
        1.5
    } else if temp_mean > 30.0 && humidity_min < 30.0 {
        1.3
    } else if (10.0..25.0).contains(&temp_mean) && humidity_min > 40.0 {
        0.85
    } else {
        1.0
    };

    if factor != 1.0 {
        debug!(
            probability,
            temp_mean, humidity_mean, humidity_min, factor, "weather adjustment applied"
        );
    }

    (probability * factor).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combine_empty_is_zero() {
        assert_eq!(combine(&[]), 0.0);
    }

    #[test]
    fn test_combine_certain_event_is_one() {
        assert_eq!(combine(&[1.0]), 1.0);
        assert_eq!(combine(&[0.3, 1.0, 0.2]), 1.0);
    }

    #[test]
    fn test_combine_two_halves() {
        assert!((combine(&[0.5, 0.5]) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_combine_zero_inputs_are_neutral() {
        assert_eq!(combine(&[0.0, 0.0, 0.0]), 0.0);
        assert!((combine(&[0.4, 0.0]) - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_combine_never_below_max_input() {
        let inputs = [0.1, 0.35, 0.2];
        let combined = combine(&inputs);
        assert!(combined >= 0.35);
        assert!(combined <= 1.0);
    }

    #[test]
    fn test_site_risk_clamps_and_combines() {
        let risk = SiteRisk::new(Site::new("LA", 34.05, -118.24), 1.2, -0.1);
        assert_eq!(risk.fire_probability, 1.0);
        assert_eq!(risk.quake_probability, 0.0);
        assert_eq!(risk.combined_probability, 1.0);
        assert_eq!(risk.combined_score(), 100.0);
    }

    #[test]
    fn test_adjustment_frost_and_humid() {
        let p = adjust_fire_probability(0.8, -2.0, 80.0, 60.0);
        assert!((p - 0.008).abs() < 1e-12);
    }

    #[test]
    fn test_adjustment_frost_dry() {
        let p = adjust_fire_probability(0.8, -2.0, 50.0, 30.0);
        assert!((p - 0.04).abs() < 1e-12);
    }

    #[test]
    fn test_adjustment_cold_bands() {
        assert!((adjust_fire_probability(0.5, 3.0, 50.0, 30.0) - 0.1).abs() < 1e-12);
        assert!((adjust_fire_probability(0.5, 8.0, 50.0, 30.0) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_adjustment_moderate_damp() {
        let p = adjust_fire_probability(0.4, 18.0, 60.0, 55.0);
        assert!((p - 0.34).abs() < 1e-12);
    }

    #[test]
    fn test_adjustment_hot_dry_boost_clamped() {
        let p = adjust_fire_probability(0.9, 38.0, 25.0, 10.0);
        assert_eq!(p, 1.0, "boost must clamp at 1.0");
        let p = adjust_fire_probability(0.4, 32.0, 35.0, 25.0);
        assert!((p - 0.52).abs() < 1e-12);
    }

    #[test]
    fn test_adjustment_neutral_band_unchanged() {
        // Warm but not hot, reasonably dry: no rule fires.
        let p = adjust_fire_probability(0.4, 27.0, 50.0, 35.0);
        assert_eq!(p, 0.4);
    }
}

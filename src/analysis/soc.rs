//! Soil organic carbon: baseline wrapper and covariate projection.
//!
//! The projection is a coarse heuristic (vegetation trend and rainfall
//! anomaly as covariates, 2 %/yr scale). It is not a calibrated soil model
//! and `projected` must not be treated as measurement-grade.

use crate::models::{SocEstimate, SoilBaseline};
use crate::stats::round_to;

// ---

pub const DEFAULT_PROJECTION_YEARS: u32 = 5;

/// Baseline mode: the raw measurement with no projected change.
pub fn from_baseline(baseline: SoilBaseline) -> SocEstimate {
    SocEstimate {
        baseline_0_30cm: baseline.baseline_0_30cm,
        projected: baseline.baseline_0_30cm,
        delta: 0.0,
        uncertainty: baseline.uncertainty,
    }
}

/// Projection mode over `years` using NDVI trend and rainfall anomaly.
pub fn project(baseline: f64, ndvi_trend: f64, rainfall_anomaly: f64, years: u32) -> SocEstimate {
    // ---
    let vegetation_factor = if ndvi_trend > 0.0 { 0.5 } else { -0.3 };
    let climate_factor = if rainfall_anomaly > 0.0 { 0.2 } else { -0.1 };

    let annual_change = baseline * (vegetation_factor + climate_factor) * 0.02;
    let delta = annual_change * f64::from(years);

    SocEstimate {
        baseline_0_30cm: baseline,
        projected: round_to(baseline + delta, 1),
        delta: round_to(delta, 1),
        uncertainty: round_to(delta.abs() * 0.3, 1),
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_baseline_mode() {
        // ---
        let estimate = from_baseline(SoilBaseline {
            baseline_0_30cm: 31.2,
            uncertainty: 4.1,
        });
        assert_eq!(estimate.projected, 31.2);
        assert_eq!(estimate.delta, 0.0);
        assert_eq!(estimate.uncertainty, 4.1);
    }

    #[test]
    fn test_projection_improving() {
        // ---
        // 40 * (0.5 + 0.2) * 0.02 = 0.56/yr, 2.8 over 5 years
        let estimate = project(40.0, 0.002, 0.4, DEFAULT_PROJECTION_YEARS);
        assert_eq!(estimate.delta, 2.8);
        assert_eq!(estimate.projected, 42.8);
        assert_eq!(estimate.uncertainty, 0.8);
    }

    #[test]
    fn test_projection_degrading() {
        // ---
        // 40 * (-0.3 - 0.1) * 0.02 = -0.32/yr, -1.6 over 5 years
        let estimate = project(40.0, 0.0, 0.0, DEFAULT_PROJECTION_YEARS);
        assert_eq!(estimate.delta, -1.6);
        assert_eq!(estimate.projected, 38.4);
        assert_eq!(estimate.uncertainty, 0.5);
    }

    #[test]
    fn test_zero_horizon() {
        let estimate = project(25.0, 1.0, 1.0, 0);
        assert_eq!(estimate.delta, 0.0);
        assert_eq!(estimate.projected, 25.0);
    }
}

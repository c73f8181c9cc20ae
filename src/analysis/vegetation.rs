//! Vegetation-index reduction: current level, OLS trend and NDVI stress.

use crate::models::{VegetationSample, VegetationSummary};
use crate::stats::{mean, ols_trend, population_stddev, round_to, z_score};

// ---

/// Reduce a chronological vegetation series to its summary.
///
/// Empty or single-sample series degrade to neutral values (level 0 when
/// empty, trend 0, stress 0) rather than failing.
pub fn analyze(series: Vec<VegetationSample>) -> VegetationSummary {
    // ---
    let ndvi: Vec<f64> = series.iter().map(|s| s.ndvi).collect();
    let evi: Vec<f64> = series.iter().map(|s| s.evi).collect();

    let current_ndvi = ndvi.last().copied().unwrap_or(0.0);
    let current_evi = evi.last().copied().unwrap_or(0.0);

    let stress_index = z_score(current_ndvi, mean(&ndvi), population_stddev(&ndvi));

    VegetationSummary {
        current_ndvi: round_to(current_ndvi, 3),
        current_evi: round_to(current_evi, 3),
        ndvi_trend: round_to(ols_trend(&ndvi), 4),
        evi_trend: round_to(ols_trend(&evi), 4),
        stress_index: round_to(stress_index, 2),
        series,
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use chrono::NaiveDate;

    fn series(values: &[f64]) -> Vec<VegetationSample> {
        // ---
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, v)| VegetationSample {
                date: start + chrono::Duration::weeks(i as i64),
                ndvi: *v,
                evi: v * 0.7,
                cloud_cover: 5.0,
            })
            .collect()
    }

    #[test]
    fn test_empty_series_is_neutral() {
        // ---
        let summary = analyze(vec![]);
        assert_eq!(summary.current_ndvi, 0.0);
        assert_eq!(summary.current_evi, 0.0);
        assert_eq!(summary.ndvi_trend, 0.0);
        assert_eq!(summary.stress_index, 0.0);
        assert!(summary.series.is_empty());
    }

    #[test]
    fn test_single_sample() {
        // ---
        let summary = analyze(series(&[0.71234]));
        assert_eq!(summary.current_ndvi, 0.712);
        assert_eq!(summary.ndvi_trend, 0.0);
        assert_eq!(summary.stress_index, 0.0);
    }

    #[test]
    fn test_constant_series_has_no_stress() {
        // ---
        let summary = analyze(series(&[0.6; 20]));
        assert_eq!(summary.ndvi_trend, 0.0);
        assert_eq!(summary.stress_index, 0.0);
    }

    #[test]
    fn test_sudden_drop_is_stress() {
        // ---
        // five samples at 0.6 then a drop: z = -sqrt(5)
        let summary = analyze(series(&[0.6, 0.6, 0.6, 0.6, 0.6, 0.2]));
        assert_eq!(summary.stress_index, -2.24);
        assert!(summary.ndvi_trend < 0.0);
        assert_eq!(summary.current_ndvi, 0.2);
        assert_eq!(summary.current_evi, 0.14);
    }

    #[test]
    fn test_increasing_series_trend() {
        // ---
        let values: Vec<f64> = (0..8).map(|i| 0.4 + 0.01 * i as f64).collect();
        let summary = analyze(series(&values));
        assert_eq!(summary.ndvi_trend, 0.01);
        assert_eq!(summary.evi_trend, 0.007);
    }
}

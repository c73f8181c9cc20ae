//! Small statistics kernel shared by the analyzers.

// ---

/// Round `value` to `decimals` places (half away from zero).
pub fn round_to(value: f64, decimals: i32) -> f64 {
    // ---
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Arithmetic mean; 0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (divides by n); 0 for an empty slice.
pub fn population_stddev(values: &[f64]) -> f64 {
    // ---
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Standard score, 0 when `stddev` is 0.
pub fn z_score(value: f64, mean: f64, stddev: f64) -> f64 {
    if stddev == 0.0 {
        return 0.0;
    }
    (value - mean) / stddev
}

/// Ordinary least squares slope of `values` against their 0-based index.
///
/// Returns 0 for fewer than two samples.
pub fn ols_trend(values: &[f64]) -> f64 {
    // ---
    let n = values.len();
    if n < 2 {
        return 0.0;
    }

    let x_mean = (n - 1) as f64 / 2.0;
    let y_mean = mean(values);

    let (numerator, denominator) =
        values
            .iter()
            .enumerate()
            .fold((0.0, 0.0), |(num, den), (i, y)| {
                let dx = i as f64 - x_mean;
                (num + dx * (y - y_mean), den + dx * dx)
            });

    if denominator == 0.0 {
        return 0.0;
    }
    numerator / denominator
}

/// SPI-style standardized precipitation anomaly.
pub fn spi(precipitation_mm: f64, mean_mm: f64, stddev_mm: f64) -> f64 {
    z_score(precipitation_mm, mean_mm, stddev_mm)
}

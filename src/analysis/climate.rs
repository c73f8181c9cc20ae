//! Rainfall and temperature anomalies plus a reference ET0 estimate.

use serde::{Deserialize, Serialize};

use crate::models::{ClimateSample, ClimateSummary, TemperatureSample};
use crate::stats::{mean, round_to, spi, z_score};

// ---

/// Number of trailing samples averaged into the headline anomalies.
const RECENT_WINDOW: usize = 3;

/// Temperature used for ET0 when no temperature samples exist.
const DEFAULT_ET0_TEMP_C: f64 = 22.0;

/// Climatological reference the per-sample anomalies are scored against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Climatology {
    // ---
    pub rainfall_mean_mm: f64,
    pub rainfall_stddev_mm: f64,
    pub temperature_mean_c: f64,
    pub temperature_stddev_c: f64,
}

impl Default for Climatology {
    fn default() -> Self {
        Self {
            rainfall_mean_mm: 150.0,
            rainfall_stddev_mm: 45.0,
            temperature_mean_c: 22.0,
            temperature_stddev_c: 3.0,
        }
    }
}

impl Climatology {
    pub fn rainfall_anomaly(&self, precipitation_mm: f64) -> f64 {
        round_to(
            spi(precipitation_mm, self.rainfall_mean_mm, self.rainfall_stddev_mm),
            2,
        )
    }

    pub fn temperature_anomaly(&self, temp_c: f64) -> f64 {
        round_to(
            z_score(temp_c, self.temperature_mean_c, self.temperature_stddev_c),
            2,
        )
    }
}

/// Re-score both series against `climatology` and condense them.
pub fn analyze(
    mut rainfall: Vec<ClimateSample>,
    mut temperature: Vec<TemperatureSample>,
    climatology: &Climatology,
) -> ClimateSummary {
    // ---
    for sample in &mut rainfall {
        sample.anomaly = climatology.rainfall_anomaly(sample.precipitation_mm);
    }
    for sample in &mut temperature {
        sample.anomaly = climatology.temperature_anomaly(sample.temp_c);
    }

    let rainfall_anomaly = recent_mean(rainfall.iter().map(|s| s.anomaly));
    let temperature_anomaly = recent_mean(temperature.iter().map(|s| s.anomaly));

    let latest_temp = temperature
        .last()
        .map(|s| s.temp_c)
        .unwrap_or(DEFAULT_ET0_TEMP_C);

    ClimateSummary {
        rainfall_anomaly: round_to(rainfall_anomaly, 2),
        temperature_anomaly: round_to(temperature_anomaly, 2),
        et0: round_to(reference_et0(latest_temp), 1),
        rainfall_series: rainfall,
        temperature_series: temperature,
    }
}

/// Hargreaves-style ET0 approximation (mm/day).
///
/// Uncalibrated placeholder kept for compatibility with existing reports.
pub fn reference_et0(temp_c: f64) -> f64 {
    0.0023 * (temp_c + 17.8) * temp_c.abs().sqrt() * 0.408
}

/// Mean of the last `RECENT_WINDOW` values, 0 when fewer are available.
fn recent_mean(values: impl DoubleEndedIterator<Item = f64> + ExactSizeIterator) -> f64 {
    // ---
    if values.len() < RECENT_WINDOW {
        return 0.0;
    }
    let recent: Vec<f64> = values.rev().take(RECENT_WINDOW).collect();
    mean(&recent)
}

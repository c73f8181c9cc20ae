//! Forest-change detection: external change areas OR'd with an NDVI shift.

use crate::models::{ForestChangeAssessment, ForestChangeSignal, VegetationSample};
use crate::stats::{mean, round_to};

// ---

/// Minimum external change area (ha) that counts as a detection.
pub const AREA_THRESHOLD_HA: f64 = 0.1;

/// NDVI mean shift that counts as loss (below −) or gain (above +).
pub const NDVI_SHIFT_THRESHOLD: f64 = 0.15;

/// Number of trailing samples forming the "recent" NDVI window.
const RECENT_WINDOW: usize = 4;

/// Outcome of the NDVI-only comparison.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NdviChange {
    pub loss_detected: bool,
    pub gain_detected: bool,
    pub change_magnitude: f64,
}

impl NdviChange {
    const NONE: NdviChange = NdviChange {
        loss_detected: false,
        gain_detected: false,
        change_magnitude: 0.0,
    };
}

/// Compare the mean of the last 4 NDVI samples with the mean of everything
/// before them. Needs at least one historical sample beyond the window.
pub fn detect_from_ndvi(series: &[VegetationSample]) -> NdviChange {
    // ---
    if series.len() <= RECENT_WINDOW {
        return NdviChange::NONE;
    }

    let (historical, recent) = series.split_at(series.len() - RECENT_WINDOW);
    let historical: Vec<f64> = historical.iter().map(|s| s.ndvi).collect();
    let recent: Vec<f64> = recent.iter().map(|s| s.ndvi).collect();

    let change = mean(&recent) - mean(&historical);

    NdviChange {
        loss_detected: change < -NDVI_SHIFT_THRESHOLD,
        gain_detected: change > NDVI_SHIFT_THRESHOLD,
        change_magnitude: round_to(change, 3),
    }
}

/// Fuse the external signal with the NDVI signal. Areas come only from the
/// external signal.
pub fn assess(signal: &ForestChangeSignal, series: &[VegetationSample]) -> ForestChangeAssessment {
    // ---
    let ndvi = detect_from_ndvi(series);

    ForestChangeAssessment {
        loss_detected: signal.loss_area_ha > AREA_THRESHOLD_HA || ndvi.loss_detected,
        gain_detected: signal.gain_area_ha > AREA_THRESHOLD_HA || ndvi.gain_detected,
        loss_area_ha: signal.loss_area_ha.max(0.0),
        gain_area_ha: signal.gain_area_ha.max(0.0),
        last_change_date: signal.last_change_date,
    }
}

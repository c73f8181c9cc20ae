//! Fixed rule table over the analyzer outputs.
//!
//! Stateless: every rule is evaluated independently and all applicable rules
//! fire. Alerts are not deduplicated against earlier runs.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{
    Alert, AlertType, ClimateSummary, ForestChangeAssessment, Severity, VegetationSummary,
};

// ---

const STRESS_MEDIUM: f64 = -1.5;
const STRESS_HIGH: f64 = -2.0;
const DROUGHT_MEDIUM: f64 = -1.5;
const DROUGHT_HIGH: f64 = -2.0;
const TEMPERATURE_MEDIUM: f64 = 1.5;
const TEMPERATURE_HIGH: f64 = 2.0;

/// Evaluate the rule table. `issued_at` stamps every alert and is the time
/// of evaluation, not of the underlying samples.
pub fn evaluate(
    vegetation: &VegetationSummary,
    climate: &ClimateSummary,
    forest_change: &ForestChangeAssessment,
    issued_at: DateTime<Utc>,
) -> Vec<Alert> {
    // ---
    let mut alerts = Vec::new();

    if let Some(severity) = stress_severity(vegetation.stress_index) {
        alerts.push(new_alert(
            "veg",
            AlertType::VegetationStress,
            severity,
            format!(
                "Vegetation stress detected. NDVI z-score: {:.2}",
                vegetation.stress_index
            ),
            issued_at,
        ));
    }

    if forest_change.loss_detected {
        alerts.push(new_alert(
            "forest",
            AlertType::ForestLoss,
            Severity::High,
            format!(
                "Forest cover loss detected in the parcel area ({:.2} ha)",
                forest_change.loss_area_ha
            ),
            issued_at,
        ));
    }

    if let Some(severity) = drought_severity(climate.rainfall_anomaly) {
        alerts.push(new_alert(
            "drought",
            AlertType::Drought,
            severity,
            format!(
                "Drought conditions detected. SPI: {:.2}",
                climate.rainfall_anomaly
            ),
            issued_at,
        ));
    }

    if let Some(severity) = temperature_severity(climate.temperature_anomaly) {
        alerts.push(new_alert(
            "temp",
            AlertType::TemperatureAnomaly,
            severity,
            format!(
                "Temperature anomaly detected: {:+.2} standard deviations",
                climate.temperature_anomaly
            ),
            issued_at,
        ));
    }

    alerts
}

/// High at or below −2.0, medium strictly below −1.5.
pub fn stress_severity(stress_index: f64) -> Option<Severity> {
    // ---
    if stress_index <= STRESS_HIGH {
        Some(Severity::High)
    } else if stress_index < STRESS_MEDIUM {
        Some(Severity::Medium)
    } else {
        None
    }
}

/// High strictly below −2.0, medium in [−2.0, −1.5).
pub fn drought_severity(rainfall_anomaly: f64) -> Option<Severity> {
    // ---
    if rainfall_anomaly < DROUGHT_HIGH {
        Some(Severity::High)
    } else if rainfall_anomaly < DROUGHT_MEDIUM {
        Some(Severity::Medium)
    } else {
        None
    }
}

/// Symmetric in sign: high above 2.0, medium in (1.5, 2.0].
pub fn temperature_severity(temperature_anomaly: f64) -> Option<Severity> {
    // ---
    let magnitude = temperature_anomaly.abs();
    if magnitude > TEMPERATURE_HIGH {
        Some(Severity::High)
    } else if magnitude > TEMPERATURE_MEDIUM {
        Some(Severity::Medium)
    } else {
        None
    }
}

fn new_alert(
    tag: &str,
    kind: AlertType,
    severity: Severity,
    message: String,
    issued_at: DateTime<Utc>,
) -> Alert {
    Alert {
        id: format!("alert_{tag}_{}", Uuid::new_v4().simple()),
        kind,
        severity,
        message,
        date: issued_at,
    }
}

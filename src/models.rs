//! Data models for the MRV pipeline.
//!
//! `Farm` is the immutable input owned by the external registry; every other
//! type here is a derived value recomputed on each pipeline run. Field names
//! follow the exported JSON shape, so renames here are wire-visible.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ---

/// A longitude/latitude pair in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    // ---
    pub lng: f64,
    pub lat: f64,
}

/// GeoJSON geometry discriminator. Only polygons are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeometryKind {
    Polygon,
}

/// GeoJSON-style polygon: `coordinates[0]` is the outer ring of `[lng, lat]`
/// positions, closed (first position repeated last).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    // ---
    #[serde(rename = "type")]
    pub kind: GeometryKind,
    pub coordinates: Vec<Vec<[f64; 2]>>,
}

impl Polygon {
    /// Build a polygon from a single outer ring.
    pub fn from_ring(ring: Vec<[f64; 2]>) -> Self {
        Self {
            kind: GeometryKind::Polygon,
            coordinates: vec![ring],
        }
    }

    /// Outer ring, or an empty slice when the polygon has no rings.
    pub fn outer_ring(&self) -> &[[f64; 2]] {
        self.coordinates.first().map(Vec::as_slice).unwrap_or(&[])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FarmerInfo {
    // ---
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
}

/// Farm parcel as held by the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Farm {
    // ---
    pub id: String,
    pub name: String,
    pub farmer_info: FarmerInfo,
    pub polygon: Polygon,
    pub centroid: Coordinates,
    pub area_ha: f64,
    pub altitude_m: f64,
    pub country: String,
    pub region: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- raw observational samples

/// One vegetation-index observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VegetationSample {
    // ---
    pub date: NaiveDate,
    pub ndvi: f64,
    pub evi: f64,
    pub cloud_cover: f64,
}

/// Monthly (or daily) rainfall total with its standardized anomaly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClimateSample {
    // ---
    pub date: NaiveDate,
    pub precipitation_mm: f64,
    pub anomaly: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureSample {
    // ---
    pub date: NaiveDate,
    pub temp_c: f64,
    pub anomaly: f64,
}

/// Soil carbon reading at a point, t C/ha for the 0-30 cm layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SoilBaseline {
    // ---
    pub baseline_0_30cm: f64,
    pub uncertainty: f64,
}

/// External forest-change signal over a query window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestChangeSignal {
    // ---
    pub loss_area_ha: f64,
    pub gain_area_ha: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_change_date: Option<NaiveDate>,
}

/// Axis-aligned bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    // ---
    pub min_lng: f64,
    pub min_lat: f64,
    pub max_lng: f64,
    pub max_lat: f64,
}

/// Elevations (m) sampled at the centroid and the four bbox corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElevationProfile {
    // ---
    pub bbox: BoundingBox,
    pub centroid: f64,
    pub south_west: f64,
    pub north_east: f64,
    pub south_east: f64,
    pub north_west: f64,
}

impl ElevationProfile {
    pub fn samples(&self) -> [f64; 5] {
        [
            self.centroid,
            self.south_west,
            self.north_east,
            self.south_east,
            self.north_west,
        ]
    }
}

// --- derived summaries

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VegetationSummary {
    // ---
    pub current_ndvi: f64,
    pub current_evi: f64,
    pub ndvi_trend: f64,
    pub evi_trend: f64,
    pub stress_index: f64,
    pub series: Vec<VegetationSample>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClimateSummary {
    // ---
    pub rainfall_anomaly: f64,
    pub temperature_anomaly: f64,
    pub et0: f64,
    pub rainfall_series: Vec<ClimateSample>,
    pub temperature_series: Vec<TemperatureSample>,
}

/// Soil organic carbon stock and its projection, all t C/ha.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SocEstimate {
    // ---
    pub baseline_0_30cm: f64,
    pub projected: f64,
    pub delta: f64,
    pub uncertainty: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestChangeAssessment {
    // ---
    pub loss_detected: bool,
    pub gain_detected: bool,
    pub loss_area_ha: f64,
    pub gain_area_ha: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_change_date: Option<NaiveDate>,
}

/// 8-point compass direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Aspect {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl Aspect {
    pub const ALL: [Aspect; 8] = [
        Aspect::N,
        Aspect::NE,
        Aspect::E,
        Aspect::SE,
        Aspect::S,
        Aspect::SW,
        Aspect::W,
        Aspect::NW,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlopeClass {
    Flat,
    Gentle,
    Moderate,
    Steep,
    #[serde(rename = "Very Steep")]
    VerySteep,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TerrainProfile {
    // ---
    pub slope_degrees: f64,
    pub aspect: Aspect,
    pub elevation_m: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    VegetationStress,
    ForestLoss,
    Drought,
    TemperatureAnomaly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    // ---
    pub id: String,
    #[serde(rename = "type")]
    pub kind: AlertType,
    pub severity: Severity,
    pub message: String,
    pub date: DateTime<Utc>,
}

// --- exported artifact

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NdviSnapshot {
    // ---
    pub current: f64,
    pub trend: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EviSnapshot {
    // ---
    pub current: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestChangeFlags {
    // ---
    pub loss: bool,
    pub gain: bool,
}

/// Compact, protocol-agnostic projection of an assessment. This is the
/// persisted/exported unit; keep field names and nesting stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MrvSummary {
    // ---
    pub farm_id: String,
    pub area_ha: f64,
    pub ndvi: NdviSnapshot,
    pub evi: EviSnapshot,
    pub rainfall_anomaly: f64,
    pub temperature_anomaly: f64,
    pub soc_baseline: f64,
    pub forest_change: ForestChangeFlags,
    pub alerts: Vec<Alert>,
    pub last_updated: DateTime<Utc>,
}

/// The pipeline's single output value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FarmAssessment {
    // ---
    pub farm: Farm,
    pub vegetation: VegetationSummary,
    pub climate: ClimateSummary,
    pub soc: SocEstimate,
    pub forest_change: ForestChangeAssessment,
    pub terrain: TerrainProfile,
    pub alerts: Vec<Alert>,
    pub mrv_summary: MrvSummary,
}

//! Open-Elevation lookup for the 5-point terrain profile.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ProviderResult, TerrainProvider};
use crate::error::ProviderError;
use crate::geometry;
use crate::models::{ElevationProfile, Polygon};

// ---

#[derive(Debug, Serialize)]
struct Location {
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Serialize)]
struct LookupRequest {
    locations: Vec<Location>,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    results: Vec<LookupResult>,
}

#[derive(Debug, Deserialize)]
struct LookupResult {
    elevation: f64,
}

pub struct OpenElevationClient {
    http: reqwest::Client,
    base_url: String,
}

impl OpenElevationClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl TerrainProvider for OpenElevationClient {
    fn name(&self) -> &'static str {
        "open-elevation"
    }

    async fn fetch_elevation_profile(&self, polygon: &Polygon) -> ProviderResult<ElevationProfile> {
        // ---
        let bbox = geometry::bounding_box(polygon);
        let centroid = geometry::centroid(polygon);

        // order: centroid, SW, NE, SE, NW
        let points = [
            (centroid.lat, centroid.lng),
            (bbox.min_lat, bbox.min_lng),
            (bbox.max_lat, bbox.max_lng),
            (bbox.min_lat, bbox.max_lng),
            (bbox.max_lat, bbox.min_lng),
        ];
        let request = LookupRequest {
            locations: points
                .iter()
                .map(|(latitude, longitude)| Location {
                    latitude: *latitude,
                    longitude: *longitude,
                })
                .collect(),
        };

        let url = format!("{}/lookup", self.base_url);
        debug!(url = %url, "Requesting elevation profile");

        let response: LookupResponse = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        match response.results.as_slice() {
            [c, sw, ne, se, nw, ..] => Ok(ElevationProfile {
                bbox,
                centroid: c.elevation,
                south_west: sw.elevation,
                north_east: ne.elevation,
                south_east: se.elevation,
                north_west: nw.elevation,
            }),
            other => Err(ProviderError::Malformed(format!(
                "expected 5 elevations, got {}",
                other.len()
            ))),
        }
    }
}

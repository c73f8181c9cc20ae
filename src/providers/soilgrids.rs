//! ISRIC SoilGrids point query for the 0-30 cm SOC baseline.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::{ProviderResult, SoilProvider};
use crate::error::ProviderError;
use crate::models::{Coordinates, SoilBaseline};

// ---

/// SoilGrids mapped units per t C/ha.
const SOC_SCALE: f64 = 10.0;

#[derive(Debug, Deserialize)]
struct SoilGridsResponse {
    properties: Properties,
}

#[derive(Debug, Deserialize)]
struct Properties {
    layers: Vec<Layer>,
}

#[derive(Debug, Deserialize)]
struct Layer {
    name: String,
    depths: Vec<Depth>,
}

#[derive(Debug, Deserialize)]
struct Depth {
    label: String,
    values: DepthValues,
}

#[derive(Debug, Deserialize)]
struct DepthValues {
    mean: Option<f64>,
    #[serde(default)]
    uncertainty: Option<f64>,
}

pub struct SoilGridsClient {
    http: reqwest::Client,
    base_url: String,
}

impl SoilGridsClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl SoilProvider for SoilGridsClient {
    fn name(&self) -> &'static str {
        "soilgrids"
    }

    async fn fetch_baseline(&self, point: Coordinates) -> ProviderResult<SoilBaseline> {
        // ---
        let url = format!("{}/properties/query", self.base_url);
        debug!(url = %url, lng = point.lng, lat = point.lat, "Requesting SoilGrids SOC");

        let response: SoilGridsResponse = self
            .http
            .get(&url)
            .query(&[
                ("lon", point.lng.to_string()),
                ("lat", point.lat.to_string()),
                ("property", "soc".to_string()),
                ("depth", "0-30cm".to_string()),
                ("value", "mean".to_string()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let depth = response
            .properties
            .layers
            .iter()
            .find(|l| l.name == "soc")
            .ok_or_else(|| ProviderError::Malformed("soc layer missing".to_string()))?
            .depths
            .iter()
            .find(|d| d.label == "0-30cm")
            .ok_or_else(|| ProviderError::Malformed("0-30cm depth missing".to_string()))?;

        let mean = depth
            .values
            .mean
            .ok_or_else(|| ProviderError::Malformed("soc mean is null".to_string()))?;

        Ok(SoilBaseline {
            baseline_0_30cm: mean / SOC_SCALE,
            uncertainty: depth.values.uncertainty.unwrap_or(0.0) / SOC_SCALE,
        })
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const POINT: Coordinates = Coordinates {
        lng: -91.5106,
        lat: 15.32285,
    };

    #[tokio::test]
    async fn test_baseline_scaled() {
        // ---
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/properties/query"))
            .and(query_param("property", "soc"))
            .and(query_param("depth", "0-30cm"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "properties": { "layers": [
                    { "name": "soc", "depths": [
                        {
                            "label": "0-5cm",
                            "range": {},
                            "values": { "mean": 900.0, "uncertainty": 10.0 }
                        },
                        {
                            "label": "0-30cm",
                            "range": {},
                            "values": { "mean": 312.0, "uncertainty": 41.0 }
                        }
                    ]}
                ]}
            })))
            .mount(&server)
            .await;

        let client = SoilGridsClient::new(reqwest::Client::new(), server.uri());
        let baseline = client.fetch_baseline(POINT).await.unwrap();

        assert_eq!(baseline.baseline_0_30cm, 31.2);
        assert_eq!(baseline.uncertainty, 4.1);
    }

    #[tokio::test]
    async fn test_missing_layer_is_malformed() {
        // ---
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/properties/query"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "properties": { "layers": [] } })),
            )
            .mount(&server)
            .await;

        let client = SoilGridsClient::new(reqwest::Client::new(), server.uri());
        let result = client.fetch_baseline(POINT).await;
        assert!(matches!(result, Err(ProviderError::Malformed(_))));
    }

    #[tokio::test]
    async fn test_server_error_is_http_error() {
        // ---
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = SoilGridsClient::new(reqwest::Client::new(), server.uri());
        assert!(matches!(
            client.fetch_baseline(POINT).await,
            Err(ProviderError::Http(_))
        ));
    }
}

//! Sentinel Hub Statistics API client for NDVI/EVI time series.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::token::{ClientCredentials, TokenCache};
use super::{ProviderResult, VegetationProvider};
use crate::error::ProviderError;
use crate::geometry;
use crate::models::{Polygon, VegetationSample};

// ---

const NDVI_EVALSCRIPT: &str = r#"
//VERSION=3
function setup() {
  return {
    input: [{ bands: ["B04", "B08", "SCL"], units: "DN" }],
    output: { bands: 2, sampleType: "FLOAT32" }
  };
}
function evaluatePixel(sample) {
  let ndvi = (sample.B08 - sample.B04) / (sample.B08 + sample.B04);
  let cloud = (sample.SCL == 3 || sample.SCL == 8 || sample.SCL == 9 || sample.SCL == 10) ? 1 : 0;
  return [ndvi, cloud];
}
"#;

const EVI_EVALSCRIPT: &str = r#"
//VERSION=3
function setup() {
  return {
    input: [{ bands: ["B02", "B04", "B08", "SCL"], units: "DN" }],
    output: { bands: 2, sampleType: "FLOAT32" }
  };
}
function evaluatePixel(sample) {
  let denominator = sample.B08 + 6 * sample.B04 - 7.5 * sample.B02 + 1;
  let evi = 2.5 * ((sample.B08 - sample.B04) / denominator);
  let cloud = (sample.SCL == 3 || sample.SCL == 8 || sample.SCL == 9 || sample.SCL == 10) ? 1 : 0;
  return [evi, cloud];
}
"#;

#[derive(Debug, Deserialize)]
struct StatisticsResponse {
    data: Vec<StatisticsInterval>,
}

#[derive(Debug, Deserialize)]
struct StatisticsInterval {
    interval: Interval,
    outputs: Outputs,
}

#[derive(Debug, Deserialize)]
struct Interval {
    from: String,
}

#[derive(Debug, Deserialize)]
struct Outputs {
    default: BandOutput,
}

#[derive(Debug, Deserialize)]
struct BandOutput {
    bands: BTreeMap<String, BandStats>,
}

#[derive(Debug, Deserialize)]
struct BandStats {
    stats: Stats,
}

#[derive(Debug, Deserialize)]
struct Stats {
    #[serde(default)]
    mean: Option<f64>,
}

/// Per-interval band means: (index mean, cloud fraction).
type IndexSeries = BTreeMap<NaiveDate, (f64, f64)>;

pub struct SentinelHubClient {
    http: reqwest::Client,
    base_url: String,
    tokens: TokenCache,
}

impl SentinelHubClient {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        // ---
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let credentials = ClientCredentials::new(
            http.clone(),
            format!("{base_url}/oauth/token"),
            client_id,
            client_secret,
        );

        Self {
            http,
            base_url,
            tokens: TokenCache::new(Arc::new(credentials)),
        }
    }

    async fn statistics(
        &self,
        polygon: &Polygon,
        start: NaiveDate,
        end: NaiveDate,
        evalscript: &str,
    ) -> ProviderResult<IndexSeries> {
        // ---
        let token = self.tokens.get_valid_token().await?;
        let bbox = geometry::bounding_box(polygon).as_array();
        let time_range = json!({
            "from": format!("{start}T00:00:00Z"),
            "to": format!("{end}T23:59:59Z"),
        });

        let request = json!({
            "input": {
                "bounds": {
                    "bbox": bbox,
                    "properties": { "crs": "http://www.opengis.net/def/crs/EPSG/0/4326" }
                },
                "data": [{
                    "type": "sentinel-2-l2a",
                    "dataFilter": { "timeRange": time_range, "maxCloudCoverage": 50 }
                }]
            },
            "aggregation": {
                "timeRange": time_range,
                "aggregationInterval": { "of": "P7D" },
                "evalscript": evalscript,
                "resx": 10,
                "resy": 10
            }
        });

        let url = format!("{}/api/v1/statistics", self.base_url);
        debug!(url = %url, "Requesting Sentinel Hub statistics");

        let response = self.http.post(&url).bearer_auth(&token).json(&request).send().await?;
        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            self.tokens.invalidate().await;
        }
        let body: StatisticsResponse = response.error_for_status()?.json().await?;

        let mut series = IndexSeries::new();
        for item in body.data {
            let date = interval_date(&item.interval.from)?;
            let band = |name: &str| {
                item.outputs
                    .default
                    .bands
                    .get(name)
                    .and_then(|b| b.stats.mean)
                    .filter(|v| v.is_finite())
                    .unwrap_or(0.0)
            };
            series.insert(date, (band("B0"), band("B1")));
        }

        Ok(series)
    }
}

#[async_trait]
impl VegetationProvider for SentinelHubClient {
    fn name(&self) -> &'static str {
        "sentinel-hub"
    }

    async fn fetch_series(
        &self,
        polygon: &Polygon,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ProviderResult<Vec<VegetationSample>> {
        // ---
        let (ndvi, evi) = futures::try_join!(
            self.statistics(polygon, start, end, NDVI_EVALSCRIPT),
            self.statistics(polygon, start, end, EVI_EVALSCRIPT),
        )?;

        Ok(merge_indices(&ndvi, &evi))
    }
}

/// Join NDVI and EVI intervals on their start date. NDVI drives the series.
fn merge_indices(ndvi: &IndexSeries, evi: &IndexSeries) -> Vec<VegetationSample> {
    // ---
    ndvi.iter()
        .map(|(date, (ndvi, cloud))| VegetationSample {
            date: *date,
            ndvi: ndvi.clamp(0.0, 1.0),
            evi: evi.get(date).map(|(v, _)| v.clamp(0.0, 1.0)).unwrap_or(0.0),
            cloud_cover: (cloud * 100.0).clamp(0.0, 100.0),
        })
        .collect()
}

fn interval_date(from: &str) -> ProviderResult<NaiveDate> {
    let day = from.split('T').next().unwrap_or(from);
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map_err(|e| ProviderError::Malformed(format!("interval date {from:?}: {e}")))
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn polygon() -> Polygon {
        Polygon::from_ring(vec![
            [-90.7234, 14.5567],
            [-90.7198, 14.5567],
            [-90.7198, 14.5534],
            [-90.7234, 14.5534],
            [-90.7234, 14.5567],
        ])
    }

    fn stats_body(values: &[(&str, f64, f64)]) -> serde_json::Value {
        // ---
        let data: Vec<_> = values
            .iter()
            .map(|(from, b0, b1)| {
                json!({
                    "interval": { "from": from, "to": from },
                    "outputs": { "default": { "bands": {
                        "B0": { "stats": { "mean": b0 } },
                        "B1": { "stats": { "mean": b1 } }
                    }}}
                })
            })
            .collect();
        json!({ "data": data })
    }

    #[tokio::test]
    async fn test_fetch_series_merges_indices() {
        // ---
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "access_token": "abc", "expires_in": 3600 })),
            )
            .expect(1)
            .mount(&server)
            .await;

        // NDVI and EVI requests hit the same endpoint; both get the same body
        Mock::given(method("POST"))
            .and(path("/api/v1/statistics"))
            .and(header("authorization", "Bearer abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(stats_body(&[
                ("2024-01-01T00:00:00Z", 0.61, 0.1),
                ("2024-01-08T00:00:00Z", 0.64, 0.0),
            ])))
            .expect(2)
            .mount(&server)
            .await;

        let client = SentinelHubClient::new(reqwest::Client::new(), server.uri(), "id", "secret");
        let series = client
            .fetch_series(
                &polygon(),
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 14).unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(series[0].date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(series[0].ndvi, 0.61);
        assert_eq!(series[0].evi, 0.61);
        assert_eq!(series[0].cloud_cover, 10.0);
        assert_eq!(series[1].ndvi, 0.64);
    }

    #[tokio::test]
    async fn test_token_failure_is_provider_error() {
        // ---
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = SentinelHubClient::new(reqwest::Client::new(), server.uri(), "id", "bad");
        let result = client
            .fetch_series(
                &polygon(),
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            )
            .await;

        assert!(matches!(result, Err(ProviderError::Http(_))));
    }

    #[test]
    fn test_merge_keeps_ndvi_dates() {
        // ---
        let d1 = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2024, 3, 11).unwrap();
        let ndvi = IndexSeries::from([(d1, (0.7, 0.0)), (d2, (1.3, 0.5))]);
        let evi = IndexSeries::from([(d1, (0.4, 0.0))]);

        let merged = merge_indices(&ndvi, &evi);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].evi, 0.4);
        assert_eq!(merged[1].evi, 0.0);
        assert_eq!(merged[1].ndvi, 1.0);
        assert_eq!(merged[1].cloud_cover, 50.0);
    }
}

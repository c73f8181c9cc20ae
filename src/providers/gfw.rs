//! Global Forest Watch tree-cover loss/gain query.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::{ForestChangeProvider, ProviderResult};
use crate::models::{ForestChangeSignal, Polygon};
use crate::stats::round_to;

// ---

#[derive(Debug, Deserialize)]
struct GfwResponse {
    data: GfwData,
}

#[derive(Debug, Deserialize)]
struct GfwData {
    attributes: GfwAttributes,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GfwAttributes {
    #[serde(default)]
    tree_cover_loss: Option<f64>,
    #[serde(default)]
    tree_cover_gain: Option<f64>,
}

pub struct GfwClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GfwClient {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl ForestChangeProvider for GfwClient {
    fn name(&self) -> &'static str {
        "global-forest-watch"
    }

    async fn fetch_change(
        &self,
        polygon: &Polygon,
        start_year: i32,
        end_year: i32,
    ) -> ProviderResult<ForestChangeSignal> {
        // ---
        let url = format!("{}/dataset/umd_tree_cover_loss/latest/query", self.base_url);
        let sql = format!(
            "SELECT SUM(area__ha) as treeCoverLoss FROM data \
             WHERE umd_tree_cover_loss__year >= {start_year} \
             AND umd_tree_cover_loss__year <= {end_year}"
        );
        let body = json!({
            "geometry": { "type": "Feature", "geometry": polygon, "properties": {} },
            "sql": sql,
        });

        debug!(url = %url, start_year, end_year, "Requesting GFW tree cover change");
        let response: GfwResponse = self
            .http
            .post(&url)
            .header("x-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(signal_from(response.data.attributes, Utc::now().date_naive()))
    }
}

fn signal_from(attributes: GfwAttributes, queried_on: NaiveDate) -> ForestChangeSignal {
    // ---
    let loss = attributes.tree_cover_loss.unwrap_or(0.0).max(0.0);
    let gain = attributes.tree_cover_gain.unwrap_or(0.0).max(0.0);

    ForestChangeSignal {
        loss_area_ha: round_to(loss, 2),
        gain_area_ha: round_to(gain, 2),
        last_change_date: (loss > 0.0 || gain > 0.0).then_some(queried_on),
    }
}

//! CHIRPS rainfall and ERA5 (Copernicus CDS) temperature client.
//!
//! Both upstreams deliver daily values; they are folded into calendar-month
//! samples (rainfall totals, temperature means) so the climatology reference
//! applies at monthly cadence. Rainfall keeps only months the window covers
//! end to end, since a partial total would read as drought. Anomalies are
//! left at 0 here and scored by the climate analyzer.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{Datelike, Months, NaiveDate};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::{ClimateProvider, ProviderResult};
use crate::error::ProviderError;
use crate::geometry;
use crate::models::{ClimateSample, Polygon, TemperatureSample};
use crate::stats::{mean, round_to};

// ---

const KELVIN_OFFSET: f64 = 273.15;

#[derive(Debug, Deserialize)]
struct DailyRainfall {
    date: NaiveDate,
    precipitation: f64,
}

#[derive(Debug, Deserialize)]
struct DailyTemperature {
    date: NaiveDate,
    /// Kelvin.
    temperature: f64,
}

pub struct ClimateClient {
    http: reqwest::Client,
    chirps_url: String,
    cds_url: String,
    cds_api_key: Option<String>,
}

impl ClimateClient {
    pub fn new(
        http: reqwest::Client,
        chirps_url: impl Into<String>,
        cds_url: impl Into<String>,
        cds_api_key: Option<String>,
    ) -> Self {
        Self {
            http,
            chirps_url: chirps_url.into().trim_end_matches('/').to_string(),
            cds_url: cds_url.into().trim_end_matches('/').to_string(),
            cds_api_key,
        }
    }
}

#[async_trait]
impl ClimateProvider for ClimateClient {
    fn name(&self) -> &'static str {
        "chirps+era5"
    }

    async fn fetch_rainfall(
        &self,
        polygon: &Polygon,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ProviderResult<Vec<ClimateSample>> {
        // ---
        let bbox = geometry::bounding_box(polygon).as_array();
        let url = format!("{}/global_daily/netcdf/p05", self.chirps_url);
        debug!(url = %url, "Requesting CHIRPS rainfall");

        let bbox_param = bbox.map(|v| v.to_string()).join(",");
        let daily: Vec<DailyRainfall> = self
            .http
            .get(&url)
            .query(&[
                ("bbox", bbox_param),
                ("start", start.to_string()),
                ("end", end.to_string()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let monthly = by_month(daily.iter().map(|d| (d.date, d.precipitation)));
        Ok(monthly
            .into_iter()
            .filter(|(first, _)| month_within(*first, start, end))
            .map(|(date, values)| ClimateSample {
                date,
                precipitation_mm: round_to(values.iter().sum::<f64>().max(0.0), 1),
                anomaly: 0.0,
            })
            .collect())
    }

    async fn fetch_temperature(
        &self,
        polygon: &Polygon,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ProviderResult<Vec<TemperatureSample>> {
        // ---
        let api_key = self
            .cds_api_key
            .as_deref()
            .ok_or(ProviderError::MissingCredentials("CDS"))?;

        let bbox = geometry::bounding_box(polygon);
        let url = format!("{}/resources/reanalysis-era5-single-levels", self.cds_url);
        let months: Vec<String> = (1..=12).map(|m| format!("{m:02}")).collect();
        let days: Vec<String> = (1..=31).map(|d| format!("{d:02}")).collect();
        let years: Vec<String> = (start.year()..=end.year()).map(|y| y.to_string()).collect();

        let request = json!({
            "product_type": "reanalysis",
            "variable": ["2m_temperature"],
            "year": years,
            "month": months,
            "day": days,
            "time": "12:00",
            // north, west, south, east
            "area": [bbox.max_lat, bbox.min_lng, bbox.min_lat, bbox.max_lng],
            "format": "json",
        });

        debug!(url = %url, "Requesting ERA5 temperature");
        let daily: Vec<DailyTemperature> = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let in_window = daily
            .iter()
            .filter(|d| d.date >= start && d.date <= end)
            .map(|d| (d.date, d.temperature - KELVIN_OFFSET));

        Ok(by_month(in_window)
            .into_iter()
            .map(|(date, values)| TemperatureSample {
                date,
                temp_c: round_to(mean(&values), 1),
                anomaly: 0.0,
            })
            .collect())
    }
}

/// Whether the calendar month starting on `first` lies entirely in
/// `start..=end`.
fn month_within(first: NaiveDate, start: NaiveDate, end: NaiveDate) -> bool {
    // ---
    let last = first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt());
    first >= start && last.is_some_and(|last| last <= end)
}

/// Group daily values by the first day of their calendar month.
fn by_month(daily: impl Iterator<Item = (NaiveDate, f64)>) -> BTreeMap<NaiveDate, Vec<f64>> {
    // ---
    let mut months: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
    for (date, value) in daily {
        if let Some(first) = date.with_day(1) {
            months.entry(first).or_default().push(value);
        }
    }
    months
}

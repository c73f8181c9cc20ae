//! Fallback adapter: one place where "real provider or synthetic estimate"
//! is decided.
//!
//! Which variant backs each provider is fixed at construction (config flag,
//! credentials present). At call time a configured provider that errors or
//! exceeds the timeout is replaced by the synthetic estimate for that call
//! only; the error is logged and never reaches the pipeline.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::{
    ClimateClient, ClimateProvider, ForestChangeProvider, GfwClient, OpenElevationClient,
    ProviderResult, SentinelHubClient, SoilGridsClient, SoilProvider, TerrainProvider,
    VegetationProvider,
};
use crate::config::Config;
use crate::error::ProviderError;
use crate::models::{
    ClimateSample, Coordinates, ElevationProfile, ForestChangeSignal, Polygon, SoilBaseline,
    TemperatureSample, VegetationSample,
};
use crate::synthetic::SyntheticEstimator;

// ---

const SYNTHETIC: &str = "synthetic";

/// Which implementation backs each provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceDescription {
    pub vegetation: &'static str,
    pub rainfall: &'static str,
    pub temperature: &'static str,
    pub soil: &'static str,
    pub forest_change: &'static str,
    pub terrain: &'static str,
}

#[derive(Clone)]
pub struct DataSources {
    vegetation: Option<Arc<dyn VegetationProvider>>,
    rainfall: Option<Arc<dyn ClimateProvider>>,
    temperature: Option<Arc<dyn ClimateProvider>>,
    soil: Option<Arc<dyn SoilProvider>>,
    forest_change: Option<Arc<dyn ForestChangeProvider>>,
    terrain: Option<Arc<dyn TerrainProvider>>,
    synthetic: Arc<SyntheticEstimator>,
    timeout: Duration,
}

impl DataSources {
    /// Every provider served by the synthetic estimator.
    pub fn synthetic(estimator: SyntheticEstimator) -> Self {
        Self {
            vegetation: None,
            rainfall: None,
            temperature: None,
            soil: None,
            forest_change: None,
            terrain: None,
            synthetic: Arc::new(estimator),
            timeout: Duration::from_secs(20),
        }
    }

    /// Build real clients for every provider that is configured, synthetic
    /// for the rest. Fails only if the HTTP client cannot be built.
    pub fn from_config(config: &Config) -> ProviderResult<Self> {
        // ---
        let estimator = SyntheticEstimator::new(config.synthetic_seed, config.climatology);
        let mut sources = Self::synthetic(estimator).with_timeout(config.provider_timeout);

        if config.use_synthetic {
            info!("MRV_USE_SYNTHETIC set, all providers use synthetic estimates");
            return Ok(sources);
        }

        let http = http_client(config.provider_timeout)?;

        match (
            &config.sentinel_hub_client_id,
            &config.sentinel_hub_client_secret,
        ) {
            (Some(id), Some(secret)) => {
                sources = sources.with_vegetation(Arc::new(SentinelHubClient::new(
                    http.clone(),
                    &config.sentinel_hub_url,
                    id,
                    secret,
                )));
            }
            _ => warn!("Sentinel Hub credentials not configured, vegetation uses synthetic data"),
        }

        let climate = Arc::new(ClimateClient::new(
            http.clone(),
            &config.chirps_url,
            &config.cds_api_url,
            config.cds_api_key.clone(),
        ));
        sources = if config.cds_api_key.is_some() {
            sources.with_climate(climate)
        } else {
            warn!("CDS API key not configured, temperature uses synthetic data");
            sources.with_rainfall(climate)
        };

        sources = sources.with_soil(Arc::new(SoilGridsClient::new(
            http.clone(),
            &config.soilgrids_url,
        )));

        match &config.gfw_api_key {
            Some(key) => {
                sources = sources.with_forest_change(Arc::new(GfwClient::new(
                    http.clone(),
                    &config.gfw_api_url,
                    key,
                )));
            }
            None => warn!("GFW API key not configured, forest change uses synthetic data"),
        }

        Ok(sources.with_terrain(Arc::new(OpenElevationClient::new(
            http,
            &config.open_elevation_url,
        ))))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_vegetation(mut self, provider: Arc<dyn VegetationProvider>) -> Self {
        self.vegetation = Some(provider);
        self
    }

    /// Serve both rainfall and temperature from `provider`.
    pub fn with_climate(mut self, provider: Arc<dyn ClimateProvider>) -> Self {
        self.temperature = Some(Arc::clone(&provider));
        self.rainfall = Some(provider);
        self
    }

    /// Serve rainfall only from `provider`; temperature is left as is.
    pub fn with_rainfall(mut self, provider: Arc<dyn ClimateProvider>) -> Self {
        self.rainfall = Some(provider);
        self
    }

    pub fn with_soil(mut self, provider: Arc<dyn SoilProvider>) -> Self {
        self.soil = Some(provider);
        self
    }

    pub fn with_forest_change(mut self, provider: Arc<dyn ForestChangeProvider>) -> Self {
        self.forest_change = Some(provider);
        self
    }

    pub fn with_terrain(mut self, provider: Arc<dyn TerrainProvider>) -> Self {
        self.terrain = Some(provider);
        self
    }

    pub fn describe(&self) -> SourceDescription {
        SourceDescription {
            vegetation: self.vegetation.as_ref().map_or(SYNTHETIC, |p| p.name()),
            rainfall: self.rainfall.as_ref().map_or(SYNTHETIC, |p| p.name()),
            temperature: self.temperature.as_ref().map_or(SYNTHETIC, |p| p.name()),
            soil: self.soil.as_ref().map_or(SYNTHETIC, |p| p.name()),
            forest_change: self.forest_change.as_ref().map_or(SYNTHETIC, |p| p.name()),
            terrain: self.terrain.as_ref().map_or(SYNTHETIC, |p| p.name()),
        }
    }

    // --- fetches, each infallible

    pub async fn vegetation_series(
        &self,
        polygon: &Polygon,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Vec<VegetationSample> {
        // ---
        let fallback = || self.synthetic.vegetation_series(polygon, start, end);
        match &self.vegetation {
            Some(p) => {
                let fetch = p.fetch_series(polygon, start, end);
                self.or_synthetic(p.name(), "vegetation", fetch, fallback).await
            }
            None => fallback(),
        }
    }

    pub async fn rainfall_series(
        &self,
        polygon: &Polygon,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Vec<ClimateSample> {
        // ---
        let fallback = || self.synthetic.rainfall_series(polygon, start, end);
        match &self.rainfall {
            Some(p) => {
                let fetch = p.fetch_rainfall(polygon, start, end);
                self.or_synthetic(p.name(), "rainfall", fetch, fallback).await
            }
            None => fallback(),
        }
    }

    pub async fn temperature_series(
        &self,
        polygon: &Polygon,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Vec<TemperatureSample> {
        // ---
        let fallback = || self.synthetic.temperature_series(polygon, start, end);
        match &self.temperature {
            Some(p) => {
                let fetch = p.fetch_temperature(polygon, start, end);
                self.or_synthetic(p.name(), "temperature", fetch, fallback).await
            }
            None => fallback(),
        }
    }

    pub async fn soil_baseline(&self, point: Coordinates) -> SoilBaseline {
        // ---
        let fallback = || self.synthetic.soil_baseline(point);
        match &self.soil {
            Some(p) => {
                let fetch = p.fetch_baseline(point);
                self.or_synthetic(p.name(), "soil", fetch, fallback).await
            }
            None => fallback(),
        }
    }

    /// Change signal from `start_year` through the year of `as_of`.
    pub async fn forest_change(
        &self,
        polygon: &Polygon,
        start_year: i32,
        as_of: NaiveDate,
    ) -> ForestChangeSignal {
        // ---
        let fallback = || self.synthetic.forest_change(polygon, as_of);
        match &self.forest_change {
            Some(p) => {
                let fetch = p.fetch_change(polygon, start_year, as_of.year());
                self.or_synthetic(p.name(), "forest_change", fetch, fallback).await
            }
            None => fallback(),
        }
    }

    pub async fn elevation_profile(&self, polygon: &Polygon) -> ElevationProfile {
        // ---
        let fallback = || self.synthetic.elevation_profile(polygon);
        match &self.terrain {
            Some(p) => {
                let fetch = p.fetch_elevation_profile(polygon);
                self.or_synthetic(p.name(), "terrain", fetch, fallback).await
            }
            None => fallback(),
        }
    }

    async fn or_synthetic<T>(
        &self,
        provider: &'static str,
        signal: &'static str,
        fetch: impl Future<Output = Result<T, ProviderError>>,
        fallback: impl FnOnce() -> T,
    ) -> T {
        // ---
        let outcome = match tokio::time::timeout(self.timeout, fetch).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(self.timeout)),
        };

        match outcome {
            Ok(value) => {
                debug!(provider, signal, "Provider data fetched");
                value
            }
            Err(e) => {
                warn!(
                    provider,
                    signal,
                    error = %e,
                    "Provider unavailable, using synthetic estimate"
                );
                fallback()
            }
        }
    }
}

/// Shared HTTP client for every real provider.
fn http_client(timeout: Duration) -> ProviderResult<reqwest::Client> {
    // ---
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("farm-mrv/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

//! Data-provider contracts and their real HTTP implementations.
//!
//! Every provider can fail. Callers never talk to a provider directly; they
//! go through [`DataSources`], which applies the timeout and substitutes the
//! synthetic estimator on any failure.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::ProviderError;
use crate::models::{
    ClimateSample, Coordinates, ElevationProfile, ForestChangeSignal, Polygon, SoilBaseline,
    TemperatureSample, VegetationSample,
};

mod climate;
mod elevation;
mod gfw;
mod sentinel;
mod soilgrids;
mod sources;
mod token;

pub use climate::ClimateClient;
pub use elevation::OpenElevationClient;
pub use gfw::GfwClient;
pub use sentinel::SentinelHubClient;
pub use soilgrids::SoilGridsClient;
pub use sources::{DataSources, SourceDescription};
pub use token::{ClientCredentials, IssuedToken, TokenCache, TokenFetcher};

// ---

pub type ProviderResult<T> = Result<T, ProviderError>;

#[async_trait]
pub trait VegetationProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch_series(
        &self,
        polygon: &Polygon,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ProviderResult<Vec<VegetationSample>>;
}

#[async_trait]
pub trait ClimateProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch_rainfall(
        &self,
        polygon: &Polygon,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ProviderResult<Vec<ClimateSample>>;

    async fn fetch_temperature(
        &self,
        polygon: &Polygon,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ProviderResult<Vec<TemperatureSample>>;
}

#[async_trait]
pub trait SoilProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch_baseline(&self, point: Coordinates) -> ProviderResult<SoilBaseline>;
}

#[async_trait]
pub trait ForestChangeProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch_change(
        &self,
        polygon: &Polygon,
        start_year: i32,
        end_year: i32,
    ) -> ProviderResult<ForestChangeSignal>;
}

#[async_trait]
pub trait TerrainProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Elevations at the centroid and the four bbox corners.
    async fn fetch_elevation_profile(&self, polygon: &Polygon) -> ProviderResult<ElevationProfile>;
}

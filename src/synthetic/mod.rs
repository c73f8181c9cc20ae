//! Synthetic estimators: statistically plausible stand-ins for every data
//! provider, sharing the providers' output contracts.
//!
//! Randomness comes from a per-call `StdRng`. With a seed configured, the
//! generator is keyed on (seed, stream, geometry) through a fixed SplitMix64
//! fold, so the same farm always gets the same series no matter how a batch
//! is scheduled or which toolchain built it. Without a seed each call draws
//! from OS entropy.

use std::f64::consts::PI;

use async_trait::async_trait;
use chrono::{Datelike, Duration, Months, NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::analysis::Climatology;
use crate::geometry::{self, METRES_PER_DEGREE};
use crate::models::{
    ClimateSample, Coordinates, ElevationProfile, ForestChangeSignal, Polygon, SoilBaseline,
    TemperatureSample, VegetationSample,
};
use crate::providers::{
    ClimateProvider, ForestChangeProvider, ProviderResult, SoilProvider, TerrainProvider,
    VegetationProvider,
};
use crate::stats::round_to;

// ---

const BASE_NDVI: f64 = 0.65;
const BASE_EVI: f64 = 0.45;

#[derive(Debug, Clone, Default)]
pub struct SyntheticEstimator {
    seed: Option<u64>,
    climatology: Climatology,
}

impl SyntheticEstimator {
    pub fn new(seed: Option<u64>, climatology: Climatology) -> Self {
        Self { seed, climatology }
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(Some(seed), Climatology::default())
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    fn rng(&self, stream: &str, key: impl IntoIterator<Item = u64>) -> StdRng {
        // ---
        match self.seed {
            Some(seed) => {
                let words = stream.bytes().map(u64::from).chain(key);
                StdRng::seed_from_u64(words.fold(splitmix64(seed), |state, word| {
                    splitmix64(state ^ word)
                }))
            }
            None => StdRng::from_entropy(),
        }
    }

    /// Weekly NDVI/EVI with a seasonal cycle and uniform noise.
    pub fn vegetation_series(
        &self,
        polygon: &Polygon,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Vec<VegetationSample> {
        // ---
        let mut rng = self.rng("vegetation", ring_bits(polygon));
        let mut samples = Vec::new();
        let mut date = start;

        while date <= end {
            let seasonal = seasonal_wave(date) * 0.1;
            let noise = (rng.gen::<f64>() - 0.5) * 0.1;

            samples.push(VegetationSample {
                date,
                ndvi: (BASE_NDVI + seasonal + noise).clamp(0.0, 1.0),
                evi: (BASE_EVI + seasonal * 0.8 + noise * 0.8).clamp(0.0, 1.0),
                cloud_cover: rng.gen::<f64>() * 30.0,
            });
            date += Duration::days(7);
        }

        samples
    }

    /// Monthly rainfall with a May–November rainy season.
    pub fn rainfall_series(
        &self,
        polygon: &Polygon,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Vec<ClimateSample> {
        // ---
        let mut rng = self.rng("rainfall", ring_bits(polygon));
        let mean = self.climatology.rainfall_mean_mm;
        let stddev = self.climatology.rainfall_stddev_mm;

        monthly_dates(start, end)
            .map(|date| {
                let rainy_season = (4..=10).contains(&date.month0());
                let seasonal_factor = if rainy_season { 1.5 } else { 0.5 };
                let noise = (rng.gen::<f64>() - 0.5) * stddev * 2.0;
                let precipitation_mm = round_to((mean * seasonal_factor + noise).max(0.0), 1);

                ClimateSample {
                    date,
                    precipitation_mm,
                    anomaly: self.climatology.rainfall_anomaly(precipitation_mm),
                }
            })
            .collect()
    }

    /// Monthly temperature around the climatological mean.
    pub fn temperature_series(
        &self,
        polygon: &Polygon,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Vec<TemperatureSample> {
        // ---
        let mut rng = self.rng("temperature", ring_bits(polygon));
        let mean = self.climatology.temperature_mean_c;

        monthly_dates(start, end)
            .map(|date| {
                let noise = (rng.gen::<f64>() - 0.5) * 4.0;
                let temp_c = round_to(mean + seasonal_wave(date) * 3.0 + noise, 1);

                TemperatureSample {
                    date,
                    temp_c,
                    anomaly: self.climatology.temperature_anomaly(temp_c),
                }
            })
            .collect()
    }

    /// SOC baseline rising with distance from 15°N.
    pub fn soil_baseline(&self, point: Coordinates) -> SoilBaseline {
        // ---
        let mut rng = self.rng("soil", [point.lng.to_bits(), point.lat.to_bits()]);
        let lat_factor = (point.lat - 15.0).abs() / 10.0;
        let base = 25.0 + lat_factor * 10.0 + (rng.gen::<f64>() - 0.5) * 10.0;

        SoilBaseline {
            baseline_0_30cm: round_to(base, 1),
            uncertainty: round_to(base * 0.15, 1),
        }
    }

    /// Occasional loss (p=0.15) and gain (p=0.25) proportional to bbox area,
    /// dated within the year before `as_of`.
    pub fn forest_change(&self, polygon: &Polygon, as_of: NaiveDate) -> ForestChangeSignal {
        // ---
        let mut rng = self.rng("forest", ring_bits(polygon));
        let area = geometry::bounding_box(polygon).approx_area_ha();

        let has_loss = rng.gen_bool(0.15);
        let has_gain = rng.gen_bool(0.25);
        let loss_area_ha = if has_loss { rng.gen::<f64>() * area * 0.05 } else { 0.0 };
        let gain_area_ha = if has_gain { rng.gen::<f64>() * area * 0.08 } else { 0.0 };

        let last_change_date = if has_loss || has_gain {
            Some(as_of - Duration::days(rng.gen_range(0..365)))
        } else {
            None
        };

        ForestChangeSignal {
            loss_area_ha: round_to(loss_area_ha, 2),
            gain_area_ha: round_to(gain_area_ha, 2),
            last_change_date,
        }
    }

    /// Planar hillside through the centroid: random 5–30° slope facing one
    /// of the 8 compass points.
    pub fn elevation_profile(&self, polygon: &Polygon) -> ElevationProfile {
        // ---
        let mut rng = self.rng("terrain", ring_bits(polygon));
        let bbox = geometry::bounding_box(polygon);
        let centroid = geometry::centroid(polygon);

        let base = 1200.0 + (centroid.lat - 14.5).abs() * 100.0 + (rng.gen::<f64>() - 0.5) * 400.0;
        let gradient = (5.0 + rng.gen::<f64>() * 25.0).to_radians().tan();
        let facing = (rng.gen_range(0..8) as f64 * 45.0).to_radians();

        let at = |lng: f64, lat: f64| {
            let east_m = (lng - centroid.lng) * METRES_PER_DEGREE;
            let north_m = (lat - centroid.lat) * METRES_PER_DEGREE;
            round_to(base + gradient * (east_m * facing.sin() + north_m * facing.cos()), 1)
        };

        ElevationProfile {
            bbox,
            centroid: round_to(base, 1),
            south_west: at(bbox.min_lng, bbox.min_lat),
            north_east: at(bbox.max_lng, bbox.max_lat),
            south_east: at(bbox.max_lng, bbox.min_lat),
            north_west: at(bbox.min_lng, bbox.max_lat),
        }
    }
}

/// Bit patterns of the outer ring, in order.
fn ring_bits(polygon: &Polygon) -> impl Iterator<Item = u64> + '_ {
    polygon
        .outer_ring()
        .iter()
        .flat_map(|[lng, lat]| [lng.to_bits(), lat.to_bits()])
}

/// One SplitMix64 step.
fn splitmix64(state: u64) -> u64 {
    let mut z = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn seasonal_wave(date: NaiveDate) -> f64 {
    (f64::from(date.month0()) / 12.0 * 2.0 * PI).sin()
}

fn monthly_dates(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    std::iter::successors(Some(start), |d| d.checked_add_months(Months::new(1)))
        .take_while(move |d| *d <= end)
}

// --- provider contracts

#[async_trait]
impl VegetationProvider for SyntheticEstimator {
    fn name(&self) -> &'static str {
        "synthetic"
    }

    async fn fetch_series(
        &self,
        polygon: &Polygon,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ProviderResult<Vec<VegetationSample>> {
        Ok(self.vegetation_series(polygon, start, end))
    }
}

#[async_trait]
impl ClimateProvider for SyntheticEstimator {
    fn name(&self) -> &'static str {
        "synthetic"
    }

    async fn fetch_rainfall(
        &self,
        polygon: &Polygon,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ProviderResult<Vec<ClimateSample>> {
        Ok(self.rainfall_series(polygon, start, end))
    }

    async fn fetch_temperature(
        &self,
        polygon: &Polygon,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ProviderResult<Vec<TemperatureSample>> {
        Ok(self.temperature_series(polygon, start, end))
    }
}

#[async_trait]
impl SoilProvider for SyntheticEstimator {
    fn name(&self) -> &'static str {
        "synthetic"
    }

    async fn fetch_baseline(&self, point: Coordinates) -> ProviderResult<SoilBaseline> {
        Ok(self.soil_baseline(point))
    }
}

#[async_trait]
impl ForestChangeProvider for SyntheticEstimator {
    fn name(&self) -> &'static str {
        "synthetic"
    }

    async fn fetch_change(
        &self,
        polygon: &Polygon,
        _start_year: i32,
        end_year: i32,
    ) -> ProviderResult<ForestChangeSignal> {
        // ---
        let today = Utc::now().date_naive();
        let as_of = NaiveDate::from_ymd_opt(end_year, 12, 31).map_or(today, |d| d.min(today));
        Ok(self.forest_change(polygon, as_of))
    }
}

#[async_trait]
impl TerrainProvider for SyntheticEstimator {
    fn name(&self) -> &'static str {
        "synthetic"
    }

    async fn fetch_elevation_profile(&self, polygon: &Polygon) -> ProviderResult<ElevationProfile> {
        Ok(self.elevation_profile(polygon))
    }
}

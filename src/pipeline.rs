//! Per-farm orchestration: fetch every signal, run the analyzers, raise
//! alerts and assemble the exported summary.
//!
//! `MrvAggregator` holds no mutable state. Each `assess` call owns its
//! inputs and outputs, so calls can run concurrently; `assess_batch` does
//! exactly that behind a semaphore.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::analysis::{alerts, climate, forest, soc, terrain, vegetation, Climatology};
use crate::config::Config;
use crate::error::{ProviderError, Result};
use crate::geometry;
use crate::models::{
    EviSnapshot, Farm, FarmAssessment, ForestChangeFlags, MrvSummary, NdviSnapshot,
};
use crate::providers::DataSources;

// ---

#[derive(Clone)]
pub struct MrvAggregator {
    // ---
    sources: DataSources,
    climatology: Climatology,
    soc_projection_years: u32,
    forest_start_year: i32,
    batch_concurrency: usize,
}

impl MrvAggregator {
    pub fn new(sources: DataSources) -> Self {
        Self {
            sources,
            climatology: Climatology::default(),
            soc_projection_years: soc::DEFAULT_PROJECTION_YEARS,
            forest_start_year: 2020,
            batch_concurrency: 4,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, ProviderError> {
        Ok(Self::new(DataSources::from_config(config)?)
            .with_climatology(config.climatology)
            .with_soc_projection_years(config.soc_projection_years)
            .with_forest_start_year(config.forest_start_year)
            .with_batch_concurrency(config.batch_concurrency))
    }

    pub fn with_climatology(mut self, climatology: Climatology) -> Self {
        self.climatology = climatology;
        self
    }

    /// Zero years reports the measured baseline without projecting.
    pub fn with_soc_projection_years(mut self, years: u32) -> Self {
        self.soc_projection_years = years;
        self
    }

    pub fn with_forest_start_year(mut self, year: i32) -> Self {
        self.forest_start_year = year;
        self
    }

    pub fn with_batch_concurrency(mut self, permits: usize) -> Self {
        self.batch_concurrency = permits.max(1);
        self
    }

    pub fn sources(&self) -> &DataSources {
        &self.sources
    }

    /// Assess a farm over the trailing 12 months ending today.
    pub async fn assess(&self, farm: &Farm) -> Result<FarmAssessment> {
        let now = Utc::now();
        self.assess_at(farm, now.date_naive(), now).await
    }

    /// Assess a farm over the 12 months ending `as_of`, stamping alerts and
    /// the summary with `now`.
    ///
    /// Fails only on an unusable boundary; provider problems are absorbed by
    /// the synthetic fallback.
    pub async fn assess_at(
        &self,
        farm: &Farm,
        as_of: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<FarmAssessment> {
        // ---
        geometry::validate(&farm.polygon)?;

        let start = as_of.checked_sub_months(Months::new(12)).unwrap_or(as_of);
        let start_year = self.forest_start_year.min(as_of.year());
        let polygon = &farm.polygon;
        let centroid = geometry::centroid(polygon);

        info!(farm_id = %farm.id, %start, end = %as_of, "Assessing farm");

        let (series, rainfall, temperature, baseline, signal, elevation) = futures::join!(
            self.sources.vegetation_series(polygon, start, as_of),
            self.sources.rainfall_series(polygon, start, as_of),
            self.sources.temperature_series(polygon, start, as_of),
            self.sources.soil_baseline(centroid),
            self.sources.forest_change(polygon, start_year, as_of),
            self.sources.elevation_profile(polygon),
        );

        debug!(
            farm_id = %farm.id,
            vegetation = series.len(),
            rainfall = rainfall.len(),
            temperature = temperature.len(),
            "Signals fetched"
        );

        let forest_change = forest::assess(&signal, &series);
        let vegetation = vegetation::analyze(series);
        let climate = climate::analyze(rainfall, temperature, &self.climatology);

        let soc = match self.soc_projection_years {
            0 => soc::from_baseline(baseline),
            years => soc::project(
                baseline.baseline_0_30cm,
                vegetation.ndvi_trend,
                climate.rainfall_anomaly,
                years,
            ),
        };

        let terrain = terrain::classify(&elevation);
        let alerts = alerts::evaluate(&vegetation, &climate, &forest_change, now);

        let mrv_summary = MrvSummary {
            farm_id: farm.id.clone(),
            area_ha: farm.area_ha,
            ndvi: NdviSnapshot {
                current: vegetation.current_ndvi,
                trend: vegetation.ndvi_trend,
            },
            evi: EviSnapshot {
                current: vegetation.current_evi,
            },
            rainfall_anomaly: climate.rainfall_anomaly,
            temperature_anomaly: climate.temperature_anomaly,
            soc_baseline: soc.baseline_0_30cm,
            forest_change: ForestChangeFlags {
                loss: forest_change.loss_detected,
                gain: forest_change.gain_detected,
            },
            alerts: alerts.clone(),
            last_updated: now,
        };

        info!(
            farm_id = %farm.id,
            stress_index = vegetation.stress_index,
            alerts = alerts.len(),
            "Assessment complete"
        );

        Ok(FarmAssessment {
            farm: farm.clone(),
            vegetation,
            climate,
            soc,
            forest_change,
            terrain,
            alerts,
            mrv_summary,
        })
    }

    /// Assess every farm independently with bounded concurrency.
    ///
    /// A farm that fails is logged and left out of the map; the batch itself
    /// never fails. Duplicate ids keep the last assessment to finish.
    pub async fn assess_batch(&self, farms: Vec<Farm>) -> HashMap<String, FarmAssessment> {
        // ---
        let total = farms.len();
        let permits = Arc::new(Semaphore::new(self.batch_concurrency));
        let mut tasks = JoinSet::new();

        info!(farms = total, concurrency = self.batch_concurrency, "Starting batch");

        for farm in farms {
            let aggregator = self.clone();
            let permits = Arc::clone(&permits);
            tasks.spawn(async move {
                // Semaphore is never closed
                let _permit = permits.acquire_owned().await;
                let result = aggregator.assess(&farm).await;
                (farm.id, result)
            });
        }

        let mut results = HashMap::with_capacity(total);
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((farm_id, Ok(assessment))) => {
                    results.insert(farm_id, assessment);
                }
                Ok((farm_id, Err(e))) => {
                    error!(farm_id = %farm_id, error = %e, "Farm assessment failed, skipping");
                }
                Err(e) => {
                    error!(error = %e, "Farm assessment task aborted");
                }
            }
        }

        info!(succeeded = results.len(), failed = total - results.len(), "Batch complete");
        results
    }
}

//! Configuration loader for the `farm-mrv` pipeline and service.
//!
//! All runtime settings and their defaults live here, read from environment
//! variables (with optional `.env` support provided by the caller), so the
//! rest of the crate never calls `env::var` directly.
//!
use std::env;
use std::time::Duration;

use anyhow::{anyhow, Result};

use crate::analysis::Climatology;

/// Parse an optional environment variable into `$ty`, falling back to a default.
macro_rules! parse_env {
    ($var_name:expr, $ty:ty, $default:expr) => {
        env::var($var_name)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(|v| v.trim().parse::<$ty>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Read an optional string environment variable; blank counts as unset.
macro_rules! optional_env {
    ($var_name:expr) => {
        env::var($var_name).ok().filter(|v| !v.trim().is_empty())
    };
}

/// Read a string environment variable with a default.
macro_rules! env_or {
    ($var_name:expr, $default:expr) => {
        optional_env!($var_name).unwrap_or_else(|| $default.to_string())
    };
}

pub const DEFAULT_SENTINEL_HUB_URL: &str = "https://services.sentinel-hub.com";
pub const DEFAULT_CHIRPS_URL: &str = "https://data.chc.ucsb.edu/products/CHIRPS-2.0";
pub const DEFAULT_CDS_API_URL: &str = "https://cds.climate.copernicus.eu/api/v2";
pub const DEFAULT_SOILGRIDS_URL: &str = "https://rest.isric.org/soilgrids/v2.0";
pub const DEFAULT_GFW_API_URL: &str = "https://data-api.globalforestwatch.org";
pub const DEFAULT_OPEN_ELEVATION_URL: &str = "https://api.open-elevation.com/api/v1";

/// Strongly typed application configuration.
///
/// Immutable after loading; the whole process works from one snapshot.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// HTTP port for the service binary.
    pub listen_port: u16,

    /// Serve every provider from the synthetic estimator.
    pub use_synthetic: bool,

    /// Fixed seed for synthetic generators; `None` draws from entropy.
    pub synthetic_seed: Option<u64>,

    /// Farms assessed concurrently by a batch.
    pub batch_concurrency: usize,

    /// Per-call provider timeout.
    pub provider_timeout: Duration,

    /// SOC projection horizon in years.
    pub soc_projection_years: u32,

    /// First year of the forest-change query window.
    pub forest_start_year: i32,

    /// Reference the climate anomalies are scored against.
    pub climatology: Climatology,

    pub sentinel_hub_url: String,
    pub sentinel_hub_client_id: Option<String>,
    pub sentinel_hub_client_secret: Option<String>,
    pub chirps_url: String,
    pub cds_api_url: String,
    pub cds_api_key: Option<String>,
    pub soilgrids_url: String,
    pub gfw_api_url: String,
    pub gfw_api_key: Option<String>,
    pub open_elevation_url: String,
}

impl Default for Config {
    /// Offline configuration: synthetic providers, stock defaults.
    fn default() -> Self {
        Self {
            listen_port: 8080,
            use_synthetic: true,
            synthetic_seed: None,
            batch_concurrency: 4,
            provider_timeout: Duration::from_secs(20),
            soc_projection_years: 5,
            forest_start_year: 2020,
            climatology: Climatology::default(),
            sentinel_hub_url: DEFAULT_SENTINEL_HUB_URL.to_string(),
            sentinel_hub_client_id: None,
            sentinel_hub_client_secret: None,
            chirps_url: DEFAULT_CHIRPS_URL.to_string(),
            cds_api_url: DEFAULT_CDS_API_URL.to_string(),
            cds_api_key: None,
            soilgrids_url: DEFAULT_SOILGRIDS_URL.to_string(),
            gfw_api_url: DEFAULT_GFW_API_URL.to_string(),
            gfw_api_key: None,
            open_elevation_url: DEFAULT_OPEN_ELEVATION_URL.to_string(),
        }
    }
}

/// Load configuration from environment variables with defaults.
///
/// Nothing is required: providers without credentials fall back to synthetic
/// estimates. Returns an error only if a variable is present but unparsable
/// or out of range.
pub fn load_from_env() -> Result<Config> {
    // ---
    let defaults = Config::default();

    let batch_concurrency = parse_env!("MRV_BATCH_CONCURRENCY", usize, defaults.batch_concurrency);
    if batch_concurrency == 0 {
        return Err(anyhow!("MRV_BATCH_CONCURRENCY must be at least 1"));
    }

    let climatology = Climatology {
        rainfall_mean_mm: parse_env!(
            "CLIMATOLOGY_RAINFALL_MEAN_MM",
            f64,
            defaults.climatology.rainfall_mean_mm
        ),
        rainfall_stddev_mm: parse_env!(
            "CLIMATOLOGY_RAINFALL_STDDEV_MM",
            f64,
            defaults.climatology.rainfall_stddev_mm
        ),
        temperature_mean_c: parse_env!(
            "CLIMATOLOGY_TEMP_MEAN_C",
            f64,
            defaults.climatology.temperature_mean_c
        ),
        temperature_stddev_c: parse_env!(
            "CLIMATOLOGY_TEMP_STDDEV_C",
            f64,
            defaults.climatology.temperature_stddev_c
        ),
    };

    Ok(Config {
        listen_port: parse_env!("LISTEN_PORT", u16, defaults.listen_port),
        use_synthetic: parse_env!("MRV_USE_SYNTHETIC", bool, false),
        synthetic_seed: optional_env!("MRV_SYNTHETIC_SEED")
            .map(|v| v.trim().parse::<u64>())
            .transpose()
            .map_err(|e| anyhow!("Invalid MRV_SYNTHETIC_SEED: {}", e))?,
        batch_concurrency,
        provider_timeout: Duration::from_secs(parse_env!("PROVIDER_TIMEOUT_SECS", u64, 20)),
        soc_projection_years: parse_env!(
            "SOC_PROJECTION_YEARS",
            u32,
            defaults.soc_projection_years
        ),
        forest_start_year: parse_env!("FOREST_START_YEAR", i32, defaults.forest_start_year),
        climatology,
        sentinel_hub_url: env_or!("SENTINEL_HUB_URL", DEFAULT_SENTINEL_HUB_URL),
        sentinel_hub_client_id: optional_env!("SENTINEL_HUB_CLIENT_ID"),
        sentinel_hub_client_secret: optional_env!("SENTINEL_HUB_CLIENT_SECRET"),
        chirps_url: env_or!("CHIRPS_URL", DEFAULT_CHIRPS_URL),
        cds_api_url: env_or!("CDS_API_URL", DEFAULT_CDS_API_URL),
        cds_api_key: optional_env!("CDS_API_KEY"),
        soilgrids_url: env_or!("SOILGRIDS_API_URL", DEFAULT_SOILGRIDS_URL),
        gfw_api_url: env_or!("GFW_API_URL", DEFAULT_GFW_API_URL),
        gfw_api_key: optional_env!("GFW_API_KEY"),
        open_elevation_url: env_or!("OPEN_ELEVATION_URL", DEFAULT_OPEN_ELEVATION_URL),
    })
}

impl Config {
    /// Log the loaded configuration, masking credentials.
    pub fn log_config(&self) {
        // ---
        tracing::info!("Configuration loaded:");
        tracing::info!("  LISTEN_PORT                : {}", self.listen_port);
        tracing::info!("  MRV_USE_SYNTHETIC          : {}", self.use_synthetic);
        tracing::info!("  MRV_SYNTHETIC_SEED         : {:?}", self.synthetic_seed);
        tracing::info!("  MRV_BATCH_CONCURRENCY      : {}", self.batch_concurrency);
        tracing::info!("  PROVIDER_TIMEOUT_SECS      : {}", self.provider_timeout.as_secs());
        tracing::info!("  SOC_PROJECTION_YEARS       : {}", self.soc_projection_years);
        tracing::info!("  FOREST_START_YEAR          : {}", self.forest_start_year);
        tracing::info!("  CLIMATOLOGY                : {:?}", self.climatology);
        tracing::info!("  SENTINEL_HUB_URL           : {}", self.sentinel_hub_url);
        tracing::info!("  SENTINEL_HUB_CLIENT_ID     : {}", mask(&self.sentinel_hub_client_id));
        tracing::info!("  SENTINEL_HUB_CLIENT_SECRET : {}", mask(&self.sentinel_hub_client_secret));
        tracing::info!("  CHIRPS_URL                 : {}", self.chirps_url);
        tracing::info!("  CDS_API_URL                : {}", self.cds_api_url);
        tracing::info!("  CDS_API_KEY                : {}", mask(&self.cds_api_key));
        tracing::info!("  SOILGRIDS_API_URL          : {}", self.soilgrids_url);
        tracing::info!("  GFW_API_URL                : {}", self.gfw_api_url);
        tracing::info!("  GFW_API_KEY                : {}", mask(&self.gfw_api_key));
        tracing::info!("  OPEN_ELEVATION_URL         : {}", self.open_elevation_url);
    }
}

/// Show whether a secret is set without revealing it.
fn mask(secret: &Option<String>) -> &'static str {
    match secret {
        Some(_) => "****",
        None => "(unset)",
    }
}

//! Per-farm MRV (monitoring, reporting and verification) analytics.
//!
//! Given a farm boundary and metadata, [`MrvAggregator`] pulls vegetation,
//! climate, soil, forest-change and terrain signals from their providers
//! (falling back to [`synthetic::SyntheticEstimator`] whenever a provider is
//! missing or failing), runs the analyzers, and returns a [`FarmAssessment`]
//! with its compact [`MrvSummary`] and alerts.
//!
//! Module layout:
//! - `models`: wire-visible value types
//! - `analysis`: pure analyzers and the alert rule table
//! - `providers`: upstream clients, token cache, fallback adapter
//! - `synthetic`: deterministic estimates used as the fallback
//! - `pipeline`: orchestration and batch execution
//! - `routes`: HTTP surface used by the `farm-mrv` binary

pub mod analysis;
pub mod config;
pub mod error;
pub mod geometry;
pub mod models;
pub mod pipeline;
pub mod providers;
pub mod routes;
pub mod stats;
pub mod synthetic;

pub use config::Config;
pub use error::{MrvError, ProviderError, Result};
pub use models::{Farm, FarmAssessment, MrvSummary};
pub use pipeline::MrvAggregator;

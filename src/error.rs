//! Error types for the MRV pipeline.
//!
//! Only two things can go wrong from a caller's point of view: the farm's
//! boundary is unusable, or (internally) a data provider misbehaves. The
//! latter never escapes `assess`; it is swallowed by the fallback adapter
//! in `providers::sources`.

use std::time::Duration;

use thiserror::Error;

// ---

/// Fatal, per-farm pipeline errors.
#[derive(Debug, Error)]
pub enum MrvError {
    /// Boundary polygon is not closed or has fewer than 3 distinct vertices.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
}

/// Failures raised by a data provider. Always recovered by substituting the
/// synthetic estimator.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{0} credentials not configured")]
    MissingCredentials(&'static str),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

pub type Result<T, E = MrvError> = std::result::Result<T, E>;

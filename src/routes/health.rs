// src/routes/health.rs
//! Service health check endpoint.
//!
//! Exports a subrouter with `GET /health`. Besides liveness it reports which
//! implementation backs each provider, so operators can see at a glance when
//! the service is running on synthetic estimates.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::providers::SourceDescription;
use crate::MrvAggregator;

/// JSON response body for the `/health` endpoint.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    providers: SourceDescription,
}

/// Handle `GET /health`.
///
/// Lightweight: reads the provider wiring only and never calls upstream.
async fn health(State(aggregator): State<MrvAggregator>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        providers: aggregator.sources().describe(),
    })
}

pub fn router() -> Router<MrvAggregator> {
    Router::new().route("/health", get(health))
}

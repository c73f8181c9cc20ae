//! Assessment endpoints: one farm or a batch.

use std::collections::HashMap;

use axum::{
    extract::State, http::StatusCode, response::IntoResponse, routing::post, Json, Router,
};
use serde_json::json;
use tracing::{info, warn};

use crate::{Farm, FarmAssessment, MrvAggregator, MrvError};

// ---

pub fn router() -> Router<MrvAggregator> {
    // ---
    Router::new()
        .route("/assess", post(assess))
        .route("/assess/batch", post(assess_batch))
}

async fn assess(
    State(aggregator): State<MrvAggregator>,
    Json(farm): Json<Farm>,
) -> impl IntoResponse {
    // ---
    info!(farm_id = %farm.id, "POST /assess");

    match aggregator.assess(&farm).await {
        Ok(assessment) => (StatusCode::OK, Json(assessment)).into_response(),
        Err(e @ MrvError::InvalidGeometry(_)) => {
            warn!(farm_id = %farm.id, error = %e, "Rejected farm");
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

async fn assess_batch(
    State(aggregator): State<MrvAggregator>,
    Json(farms): Json<Vec<Farm>>,
) -> Json<HashMap<String, FarmAssessment>> {
    // ---
    info!(farms = farms.len(), "POST /assess/batch");
    Json(aggregator.assess_batch(farms).await)
}

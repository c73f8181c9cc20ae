use std::collections::HashMap;
use std::net::SocketAddr;

use anyhow::Result;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use tokio_test::assert_ok;

use farm_mrv::providers::DataSources;
use farm_mrv::synthetic::SyntheticEstimator;
use farm_mrv::{routes, FarmAssessment, MrvAggregator};

/// Serve the API on an ephemeral port and return its base URL.
async fn spawn_app() -> Result<String> {
    // ---
    let aggregator = MrvAggregator::new(DataSources::synthetic(SyntheticEstimator::seeded(1)));
    let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        axum::serve(listener, routes::router(aggregator)).await.ok();
    });

    Ok(format!("http://{addr}"))
}

fn farm_json(id: &str, ring: Value) -> Value {
    json!({
        "id": id,
        "name": "Finca El Mirador",
        "farmer_info": { "name": "Carlos Pérez" },
        "polygon": { "type": "Polygon", "coordinates": [ring] },
        "centroid": { "lng": -90.7216, "lat": 14.555 },
        "area_ha": 8.4,
        "altitude_m": 1620.0,
        "country": "Guatemala",
        "region": "Sacatepéquez",
        "created_at": "2024-01-15T10:00:00Z",
        "updated_at": "2024-06-01T08:30:00Z"
    })
}

fn closed_ring() -> Value {
    json!([
        [-90.7234, 14.5567],
        [-90.7198, 14.5567],
        [-90.7198, 14.5534],
        [-90.7234, 14.5534],
        [-90.7234, 14.5567]
    ])
}

#[tokio::test]
async fn health_reports_providers() -> Result<()> {
    // ---
    let base = spawn_app().await?;
    let body: Value = Client::new()
        .get(format!("{base}/health"))
        .send()
        .await?
        .json()
        .await?;

    assert_eq!(body["status"], "ok");
    assert_eq!(body["providers"]["vegetation"], "synthetic");
    assert_eq!(body["providers"]["terrain"], "synthetic");
    Ok(())
}

#[tokio::test]
async fn assess_returns_summary() -> Result<()> {
    // ---
    let base = spawn_app().await?;
    let response = Client::new()
        .post(format!("{base}/assess"))
        .json(&farm_json("gt-100", closed_ring()))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await?;
    let summary = &body["mrv_summary"];
    assert_eq!(summary["farm_id"], "gt-100");
    assert_eq!(summary["area_ha"], 8.4);
    assert!(summary["ndvi"]["current"].is_number());
    assert!(summary["ndvi"]["trend"].is_number());
    assert!(summary["forest_change"]["loss"].is_boolean());
    assert!(body["terrain"]["aspect"].is_string());

    // typed view parses as well
    assert_ok!(serde_json::from_value::<FarmAssessment>(body));
    Ok(())
}

#[tokio::test]
async fn assess_rejects_open_polygon() -> Result<()> {
    // ---
    let base = spawn_app().await?;
    let open = json!([[-90.72, 14.55], [-90.71, 14.55], [-90.71, 14.56]]);
    let response = Client::new()
        .post(format!("{base}/assess"))
        .json(&farm_json("gt-bad", open))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json().await?;
    assert!(body["error"].as_str().unwrap_or_default().contains("invalid geometry"));
    Ok(())
}

#[tokio::test]
async fn batch_returns_partial_results() -> Result<()> {
    // ---
    let base = spawn_app().await?;
    let farms = json!([
        farm_json("one", closed_ring()),
        farm_json("two", json!([[0.0, 0.0], [1.0, 1.0], [0.0, 0.0]])),
        farm_json("three", closed_ring()),
    ]);

    let results: HashMap<String, Value> = Client::new()
        .post(format!("{base}/assess/batch"))
        .json(&farms)
        .send()
        .await?
        .json()
        .await?;

    assert_eq!(results.len(), 2);
    assert!(results.contains_key("one"));
    assert!(results.contains_key("three"));
    Ok(())
}

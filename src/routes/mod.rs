use axum::Router;

use crate::MrvAggregator;

mod assess;
mod health;

// ---

pub fn router(aggregator: MrvAggregator) -> Router {
    // ---
    Router::new()
        .merge(assess::router())
        .merge(health::router())
        .with_state(aggregator)
}

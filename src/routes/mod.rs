use axum::Router;

use crate::state::SharedState;

pub mod analytics;
pub mod docs;
pub mod flights;
pub mod health;
pub mod pace_config;
pub mod sse;
pub mod telemetry;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(sse::router())
        .merge(flights::router())
        .merge(telemetry::router())
        .merge(pace_config::router())
        .merge(analytics::router());

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}

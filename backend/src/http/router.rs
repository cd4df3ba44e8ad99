//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (CORS, compression, tracing),
//! and creates the axum router ready for serving.

use axum::{
    routing::get,
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // Drivers' handhelds call from arbitrary origins.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Tasks
        .route("/tasks", get(handlers::list_tasks))
        .route(
            "/tasks/{task_id}",
            get(handlers::get_task).post(handlers::change_task),
        )
        .route("/buses/{bus_id}/tasks", get(handlers::list_bus_tasks))
        // Generation cycles
        .route(
            "/cycles",
            get(handlers::list_cycles).post(handlers::trigger_cycle),
        )
        .route("/cycles/{cycle_id}", get(handlers::get_cycle))
        .route("/cycles/{cycle_id}/logs", get(handlers::stream_cycle_logs));

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/v1", api_v1)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

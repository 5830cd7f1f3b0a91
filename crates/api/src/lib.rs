//! HTTP trigger endpoints for the invoice pipeline.
//!
//! This crate provides:
//! - The stage trigger endpoint
//! - Health check
//! - The [`StageRunner`] seam between HTTP and the pipeline

pub mod routes;
pub mod runner;

pub use runner::StageRunner;

use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Runs pipeline stages on demand.
    pub runner: Arc<dyn StageRunner>,
}

impl AppState {
    /// Create the state around a stage runner.
    pub fn new(runner: Arc<dyn StageRunner>) -> Self {
        Self { runner }
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

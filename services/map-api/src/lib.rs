//! Parcel Map Service Library
//!
//! HTTP server rendering PNG images of the parcel grid: ownership,
//! districts, active sale publications and selected parcels.

pub mod config;
pub mod handlers;
pub mod metrics;
pub mod service;
pub mod state;
pub mod validation;

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;

/// Build the service router around shared state.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Map images
        .route("/map.png", get(handlers::map::map_handler))
        .route("/parcels/:x/:y/map.png", get(handlers::map::parcel_map_handler))
        // Health and metrics
        .route("/health", get(handlers::health::health_handler))
        .route("/ready", get(handlers::health::ready_handler))
        .route("/metrics", get(handlers::health::metrics_handler))
        .route("/api/metrics", get(handlers::health::api_metrics_handler))
        // Middleware
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}

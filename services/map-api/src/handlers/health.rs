//! Health and metrics handlers.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::warn;

use crate::state::AppState;

/// GET /health - Liveness check
pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// GET /ready - Readiness check (probes the parcel store)
pub async fn ready_handler(Extension(state): Extension<Arc<AppState>>) -> Response {
    match state.store().ping().await {
        Ok(()) => (StatusCode::OK, "Ready").into_response(),
        Err(e) => {
            warn!(store = state.store().name(), error = %e, "Readiness probe failed");
            (StatusCode::SERVICE_UNAVAILABLE, format!("Not ready: {}", e)).into_response()
        }
    }
}

/// GET /metrics - Prometheus metrics
///
/// Without an installed recorder the in-process counters are rendered in the
/// same text format.
pub async fn metrics_handler(Extension(state): Extension<Arc<AppState>>) -> Response {
    let body = match &state.prometheus {
        Some(handle) => handle.render(),
        None => {
            let snapshot = state.metrics.snapshot();
            format!(
                "# TYPE map_requests_total counter\n\
                 map_requests_total{{endpoint=\"map\"}} {}\n\
                 map_requests_total{{endpoint=\"parcel\"}} {}\n\
                 # TYPE map_rejections_total counter\n\
                 map_rejections_total {}\n\
                 # TYPE map_renders_total counter\n\
                 map_renders_total {}\n",
                snapshot.map_requests, snapshot.parcel_requests, snapshot.rejections, snapshot.renders_total,
            )
        }
    };

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
        .into_response()
}

/// GET /api/metrics - In-process counters as JSON
pub async fn api_metrics_handler(Extension(state): Extension<Arc<AppState>>) -> impl IntoResponse {
    Json(state.metrics.snapshot())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}

//! HTTP tests for the map service.
//!
//! Drives the full router with `oneshot` against in-memory stores and decodes
//! the returned PNGs to check pixels.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use tower::ServiceExt;

use map_api::config::MapConfig;
use map_api::state::AppState;
use parcel_common::{compute_dimensions, Coordinate, MapError, MapResult, Parcel};
use renderer::Palette;
use storage::{MemoryParcelStore, ParcelStore};
use test_utils::{
    assert_pixel_eq, cell_center_pixel, cells_with_color, decode_png, expired_publication, owned_parcel,
    parcel_on_sale,
};

// ============================================================================
// Helper stores
// ============================================================================

/// Counts range fetches before delegating to an in-memory store.
struct CountingStore {
    inner: MemoryParcelStore,
    calls: AtomicUsize,
}

impl CountingStore {
    fn new(parcels: Vec<Parcel>) -> Self {
        Self {
            inner: MemoryParcelStore::with_parcels(parcels),
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ParcelStore for CountingStore {
    async fn fetch_range(&self, northwest: Coordinate, southeast: Coordinate) -> MapResult<Vec<Parcel>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch_range(northwest, southeast).await
    }

    async fn ping(&self) -> MapResult<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "counting"
    }
}

/// Always fails, like an unreachable database.
struct FailingStore;

#[async_trait]
impl ParcelStore for FailingStore {
    async fn fetch_range(&self, _: Coordinate, _: Coordinate) -> MapResult<Vec<Parcel>> {
        Err(MapError::UpstreamFailure("Query failed: connection refused".to_string()))
    }

    async fn ping(&self) -> MapResult<()> {
        Err(MapError::UpstreamFailure("connection refused".to_string()))
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

// ============================================================================
// Helper functions
// ============================================================================

fn app_with_store(store: Arc<dyn ParcelStore>) -> Router {
    let state = AppState::new(MapConfig::default(), store, None).unwrap();
    map_api::build_router(Arc::new(state))
}

fn app_with_parcels(parcels: Vec<Parcel>) -> Router {
    app_with_store(Arc::new(MemoryParcelStore::with_parcels(parcels)))
}

async fn get(app: Router, uri: &str) -> (StatusCode, Option<String>, Vec<u8>) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string());
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, content_type, body.to_vec())
}

async fn get_text(app: Router, uri: &str) -> (StatusCode, String) {
    let (status, _, body) = get(app, uri).await;
    (status, String::from_utf8(body).unwrap())
}

// ============================================================================
// Rendering
// ============================================================================

#[tokio::test]
async fn test_single_owned_parcel_scenario() {
    let palette = Palette::default();
    let app = app_with_parcels(vec![owned_parcel(0, 0)]);

    let (status, content_type, body) = get(app, "/map.png?width=64&height=64&size=32&center=0,0").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("image/png"));

    let image = decode_png(&body);
    assert_eq!(image.dimensions(), (64, 64));

    let viewport = compute_dimensions(64, 64, 32, Coordinate::ORIGIN, 1).unwrap();
    assert_eq!(
        cells_with_color(&image, &viewport, 32, palette.owned),
        vec![Coordinate::ORIGIN]
    );
}

#[tokio::test]
async fn test_publication_overlay_toggle() {
    let palette = Palette::default();
    let viewport = compute_dimensions(64, 64, 32, Coordinate::ORIGIN, 1).unwrap();

    let app = app_with_parcels(vec![parcel_on_sale(0, 0)]);
    let (status, _, body) = get(app, "/map.png?width=64&height=64&size=32&publications=true").await;
    assert_eq!(status, StatusCode::OK);
    let image = decode_png(&body);
    assert_eq!(
        cell_center_pixel(&image, &viewport, 32, Coordinate::ORIGIN),
        Some(palette.publication)
    );

    let app = app_with_parcels(vec![parcel_on_sale(0, 0)]);
    let (_, _, body) = get(app, "/map.png?width=64&height=64&size=32&publications=false").await;
    let image = decode_png(&body);
    assert_eq!(
        cell_center_pixel(&image, &viewport, 32, Coordinate::ORIGIN),
        Some(palette.owned)
    );
}

#[tokio::test]
async fn test_expired_publication_not_overlaid() {
    let palette = Palette::default();
    let viewport = compute_dimensions(64, 64, 32, Coordinate::ORIGIN, 1).unwrap();

    let mut parcel = owned_parcel(0, 0);
    parcel.publication = Some(expired_publication(0, 0));
    let app = app_with_parcels(vec![parcel]);

    let (_, _, body) = get(app, "/map.png?width=64&height=64&size=32&publications=true").await;
    let image = decode_png(&body);
    assert_eq!(
        cell_center_pixel(&image, &viewport, 32, Coordinate::ORIGIN),
        Some(palette.owned)
    );
}

#[tokio::test]
async fn test_identical_requests_are_byte_identical() {
    let store: Arc<dyn ParcelStore> = Arc::new(MemoryParcelStore::with_parcels(vec![
        owned_parcel(0, 0),
        parcel_on_sale(1, -1),
        owned_parcel(-2, 3),
    ]));
    let uri = "/map.png?width=200&height=120&size=12&publications=true&selected=0,0;1,-1";

    let (_, _, first) = get(app_with_store(Arc::clone(&store)), uri).await;
    let (_, _, second) = get(app_with_store(store), uri).await;
    assert!(!first.is_empty());
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_parameters_are_clamped() {
    let app = app_with_parcels(vec![]);
    let (status, _, body) = get(app, "/map.png?width=2000&height=10&size=40").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decode_png(&body).dimensions(), (1024, 32));
}

// ============================================================================
// Single parcel endpoint
// ============================================================================

#[tokio::test]
async fn test_parcel_endpoint_selects_path_parcel() {
    let palette = Palette::default();
    let app = app_with_parcels(vec![owned_parcel(5, 5)]);

    let (status, _, body) = get(app, "/parcels/5/5/map.png?width=64&height=64&size=32&selected=9,9&center=0,0").await;
    assert_eq!(status, StatusCode::OK);

    let image = decode_png(&body);
    let viewport = compute_dimensions(64, 64, 32, Coordinate::new(5, 5), 1).unwrap();

    // Centered on (5,5): its fill shows in the middle, the outline on its edge
    assert_eq!(
        cell_center_pixel(&image, &viewport, 32, Coordinate::new(5, 5)),
        Some(palette.owned)
    );
    assert_pixel_eq!(image, 33, 33, palette.selected);
    assert_pixel_eq!(image, 1, 1, palette.unowned);
}

#[tokio::test]
async fn test_parcel_endpoint_clamps_path_coordinate() {
    let palette = Palette::default();
    let app = app_with_parcels(vec![owned_parcel(150, 150)]);

    let (status, _, body) = get(app, "/parcels/400/400/map.png?width=64&height=64&size=32").await;
    assert_eq!(status, StatusCode::OK);

    let image = decode_png(&body);
    let viewport = compute_dimensions(64, 64, 32, Coordinate::new(150, 150), 1).unwrap();
    assert_eq!(
        cell_center_pixel(&image, &viewport, 32, Coordinate::new(150, 150)),
        Some(palette.owned)
    );
}

#[tokio::test]
async fn test_parcel_endpoint_rejects_non_numeric_path() {
    let app = app_with_parcels(vec![]);
    let (status, body) = get_text(app, "/parcels/abc/5/map.png").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "Invalid param \"x\" should be a number but got \"abc\".");
}

// ============================================================================
// Errors
// ============================================================================

#[tokio::test]
async fn test_oversized_viewport_rejected_before_fetch() {
    let store = Arc::new(CountingStore::new(vec![owned_parcel(0, 0)]));
    let app = app_with_store(store.clone());

    // 1024 / (2 * 5) = 102 cells each way, 207 x 207 with padding
    let (status, body) = get_text(app, "/map.png?width=1024&height=1024&size=5").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        "Too many parcels. You are trying to render 42849 parcels and the maximum allowed is 15000."
    );
    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn test_oversized_viewport_rejected_at_extreme_center() {
    let store = Arc::new(CountingStore::new(vec![]));

    for center in ["2147483647,2147483647", "99999999999,99999999999", "-2147483648,0"] {
        let uri = format!("/map.png?width=1024&height=1024&size=5&center={}", center);
        let (status, body) = get_text(app_with_store(store.clone()), &uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "center {}", center);
        assert_eq!(
            body,
            "Too many parcels. You are trying to render 42849 parcels and the maximum allowed is 15000."
        );
    }
    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn test_admitted_request_fetches_once() {
    let store = Arc::new(CountingStore::new(vec![owned_parcel(0, 0)]));
    let app = app_with_store(store.clone());

    let (status, _, _) = get(app, "/map.png").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(store.calls(), 1);
}

#[tokio::test]
async fn test_invalid_center() {
    let store = Arc::new(CountingStore::new(vec![]));
    let app = app_with_store(store.clone());

    let (status, body) = get_text(app, "/map.png?center=abc").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        "Invalid param \"center\" should be a coordinate \"x,y\" but got \"abc\"."
    );
    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn test_invalid_selected_list() {
    let app = app_with_parcels(vec![]);
    let (status, body) = get_text(app, "/map.png?selected=1,2;x,y").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.starts_with("Invalid param \"selected\""));
}

#[tokio::test]
async fn test_invalid_boolean() {
    let app = app_with_parcels(vec![]);
    let (status, body) = get_text(app, "/map.png?publications=1").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "Invalid param \"publications\" should be a boolean but got \"1\".");
}

#[tokio::test]
async fn test_upstream_failure_is_500() {
    let app = app_with_store(Arc::new(FailingStore));
    let (status, body) = get_text(app, "/map.png").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "Query failed: connection refused");
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_and_ready() {
    let (status, body) = get_text(app_with_parcels(vec![]), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");

    let (status, _) = get_text(app_with_parcels(vec![]), "/ready").await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = get_text(app_with_store(Arc::new(FailingStore)), "/ready").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_metrics_counts_rejections() {
    let state = Arc::new(AppState::new(MapConfig::default(), Arc::new(MemoryParcelStore::new()), None).unwrap());
    let app = map_api::build_router(Arc::clone(&state));

    let (status, _, _) = get(app.clone(), "/map.png?width=1024&height=1024&size=5").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = get_text(app, "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("map_rejections_total 1"));
    assert_eq!(state.metrics.snapshot().map_requests, 1);
}

#[tokio::test]
async fn test_shipped_fixtures_and_config_load() {
    let dir = env!("CARGO_MANIFEST_DIR");
    let config = MapConfig::from_file(format!("{}/config/map.yaml", dir)).unwrap();
    assert_eq!(config, MapConfig::default());

    let fixtures = format!("{}/fixtures/parcels.json", dir);
    let state = AppState::from_config(config, Some(&fixtures), None).await.unwrap();
    let app = map_api::build_router(Arc::new(state));

    let (status, _, body) = get(app, "/map.png?width=256&height=256&size=16&publications=true").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decode_png(&body).dimensions(), (256, 256));
}

#[tokio::test]
async fn test_api_metrics_json() {
    let app = app_with_parcels(vec![]);
    let (_, _, _) = get(app.clone(), "/map.png?width=64&height=64").await;

    let (status, content_type, body) = get(app, "/api/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/json"));
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["map_requests"], 1);
    assert_eq!(json["renders_total"], 1);
}

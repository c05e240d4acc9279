//! Map render orchestration.
//!
//! A render request moves through these stages:
//!
//! ```text
//! Validating -> ComputingViewport -> AdmissionCheck -> Fetching
//!            -> Rendering -> Streaming -> Done
//! ```
//!
//! Any stage may end in `Failed`. The admission check runs before anything
//! proportional to the viewport area is fetched or allocated.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, error, warn};

use parcel_common::{compute_dimensions, MapError, MapResult, ViewportResult};
use renderer::{grid, MapLayers, Palette, PngStream};
use storage::ParcelGateway;

use crate::metrics::{Endpoint, MetricsCollector};
use crate::validation::{RawParams, RenderRequest, RequestValidator};

/// Render pipeline stage, used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validating,
    ComputingViewport,
    AdmissionCheck,
    Fetching,
    Rendering,
    Streaming,
    Done,
    Failed,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Validating => "validating",
            Stage::ComputingViewport => "computing_viewport",
            Stage::AdmissionCheck => "admission_check",
            Stage::Fetching => "fetching",
            Stage::Rendering => "rendering",
            Stage::Streaming => "streaming",
            Stage::Done => "done",
            Stage::Failed => "failed",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reject viewports covering more than `max_area` parcels.
pub fn check_area(viewport: &ViewportResult, max_area: i64) -> MapResult<()> {
    if viewport.area > max_area {
        return Err(MapError::AreaTooLarge {
            area: viewport.area,
            max: max_area,
        });
    }
    Ok(())
}

/// Validates, admits, fetches and renders map requests.
pub struct TileService {
    validator: RequestValidator,
    gateway: ParcelGateway,
    palette: Palette,
    max_area: i64,
    padding: u32,
    metrics: Arc<MetricsCollector>,
}

impl TileService {
    pub fn new(
        validator: RequestValidator,
        gateway: ParcelGateway,
        palette: Palette,
        max_area: i64,
        padding: u32,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            validator,
            gateway,
            palette,
            max_area,
            padding,
            metrics,
        }
    }

    pub fn gateway(&self) -> &ParcelGateway {
        &self.gateway
    }

    pub fn max_area(&self) -> i64 {
        self.max_area
    }

    /// Render the viewport described by the request parameters.
    pub async fn render_map(&self, raw: &RawParams) -> MapResult<PngStream> {
        self.metrics.record_request(Endpoint::Map);
        let result = match self.validate(raw) {
            Ok(request) => self.render(request).await,
            Err(e) => Err(e),
        };
        self.finish(result)
    }

    /// Render around a single parcel. `raw.x`/`raw.y` carry the path
    /// coordinate; center and selection are forced to it after clamping.
    pub async fn render_parcel(&self, raw: &RawParams) -> MapResult<PngStream> {
        self.metrics.record_request(Endpoint::Parcel);
        let result = match self.validate(raw) {
            Ok(request) => self.render(request.focused_on_parcel()).await,
            Err(e) => Err(e),
        };
        self.finish(result)
    }

    fn validate(&self, raw: &RawParams) -> MapResult<RenderRequest> {
        debug!(stage = %Stage::Validating, "Render stage");
        self.validator.sanitize(raw)
    }

    async fn render(&self, request: RenderRequest) -> MapResult<PngStream> {
        debug!(stage = %Stage::ComputingViewport, "Render stage");
        let viewport = compute_dimensions(
            request.width,
            request.height,
            request.size,
            request.center,
            self.padding,
        )?;

        debug!(
            stage = %Stage::AdmissionCheck,
            area = viewport.area,
            max_area = self.max_area,
            "Render stage"
        );
        check_area(&viewport, self.max_area)?;

        debug!(
            stage = %Stage::Fetching,
            northwest = %viewport.northwest,
            southeast = %viewport.southeast,
            "Render stage"
        );
        let snapshot = Arc::new(
            self.gateway
                .fetch_snapshot(viewport.northwest, viewport.southeast, Utc::now())
                .await?,
        );

        debug!(stage = %Stage::Rendering, width = request.width, height = request.height, "Render stage");
        let started = Instant::now();
        let palette = self.palette;
        let stream = tokio::task::spawn_blocking(move || {
            let layers = MapLayers {
                owned: snapshot.owned(),
                publications: request.show_publications.then(|| snapshot.publications()),
                selected: &request.selected,
            };
            grid::render_map(
                request.width,
                request.height,
                &viewport,
                request.size,
                &layers,
                &palette,
            )
        })
        .await
        .map_err(|e| MapError::RenderFailure(format!("Render task failed: {}", e)))??;
        self.metrics.record_render(started.elapsed());

        debug!(stage = %Stage::Streaming, indexed = stream.is_indexed(), "Render stage");
        Ok(stream)
    }

    fn finish(&self, result: MapResult<PngStream>) -> MapResult<PngStream> {
        match &result {
            Ok(_) => debug!(stage = %Stage::Done, "Render stage"),
            Err(e) => {
                match e {
                    MapError::AreaTooLarge { .. } => {
                        self.metrics.record_rejection();
                        warn!(stage = %Stage::Failed, kind = e.kind(), error = %e, "Render rejected");
                    }
                    MapError::InvalidParameter { .. } => {
                        self.metrics.record_invalid_request();
                        warn!(stage = %Stage::Failed, kind = e.kind(), error = %e, "Render rejected");
                    }
                    MapError::UpstreamFailure(_) => {
                        self.metrics.record_upstream_failure();
                        error!(stage = %Stage::Failed, kind = e.kind(), error = %e, "Render failed");
                    }
                    MapError::RenderFailure(_) | MapError::Config(_) => {
                        self.metrics.record_render_failure();
                        error!(stage = %Stage::Failed, kind = e.kind(), error = %e, "Render failed");
                    }
                }
            }
        }
        result
    }
}

//! Application state for the map service.

use std::sync::Arc;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusHandle;
use tracing::{info, warn};

use renderer::{MapStyle, Palette};
use storage::{FieldDenyList, MemoryParcelStore, ParcelCatalog, ParcelGateway, ParcelStore};

use crate::config::MapConfig;
use crate::metrics::MetricsCollector;
use crate::service::TileService;
use crate::validation::RequestValidator;

/// Shared, read-only application state.
pub struct AppState {
    pub config: MapConfig,

    /// Render pipeline.
    pub tiles: TileService,

    /// In-process counters.
    pub metrics: Arc<MetricsCollector>,

    /// Prometheus exporter handle, when a recorder is installed.
    pub prometheus: Option<PrometheusHandle>,
}

impl AppState {
    /// Assemble state around an already constructed parcel store.
    pub fn new(
        config: MapConfig,
        store: Arc<dyn ParcelStore>,
        prometheus: Option<PrometheusHandle>,
    ) -> Result<Self> {
        let palette = load_palette(config.style_file.as_deref())?;
        let metrics = Arc::new(MetricsCollector::new());

        let gateway = ParcelGateway::new(store, FieldDenyList::new(config.deny_list.iter().cloned()));
        let tiles = TileService::new(
            RequestValidator::new(config.bounds),
            gateway,
            palette,
            config.max_area,
            config.padding,
            Arc::clone(&metrics),
        );

        Ok(Self {
            config,
            tiles,
            metrics,
            prometheus,
        })
    }

    /// Connect to the configured store and assemble state.
    ///
    /// PostgreSQL is used when `database_url` is set; otherwise parcels come
    /// from the fixture file, or the map starts empty.
    pub async fn from_config(
        config: MapConfig,
        fixtures: Option<&str>,
        prometheus: Option<PrometheusHandle>,
    ) -> Result<Self> {
        let store: Arc<dyn ParcelStore> = match &config.database_url {
            Some(url) => {
                let catalog = ParcelCatalog::connect(url, config.max_connections)
                    .await
                    .context("Failed to connect to parcel database")?;
                catalog.migrate().await.context("Failed to migrate parcel database")?;
                info!("Using PostgreSQL parcel store");
                Arc::new(catalog)
            }
            None => match fixtures {
                Some(path) => Arc::new(MemoryParcelStore::from_fixture_file(path)?),
                None => {
                    warn!("No database or fixtures configured, serving an empty map");
                    Arc::new(MemoryParcelStore::new())
                }
            },
        };

        Self::new(config, store, prometheus)
    }

    pub fn store(&self) -> &Arc<dyn ParcelStore> {
        self.tiles.gateway().store()
    }
}

fn load_palette(style_file: Option<&str>) -> Result<Palette> {
    let style = match style_file {
        Some(path) => {
            let style = MapStyle::from_file(path)
                .map_err(|e| anyhow::anyhow!("Failed to load style {}: {}", path, e))?;
            info!(path, "Loaded map style");
            style
        }
        None => MapStyle::default(),
    };
    style.palette().map_err(|e| anyhow::anyhow!("Invalid map style: {}", e))
}

//! Service configuration loading and types.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use parcel_common::GridBounds;

/// Default maximum number of parcels a single render may cover.
pub const DEFAULT_MAX_AREA: i64 = 15000;

/// Default padding, in cells, around the visible extent.
pub const DEFAULT_PADDING: u32 = 1;

/// Map service configuration, loaded from YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Valid coordinate range of the grid.
    pub bounds: GridBounds,

    /// Admission cap on the padded viewport area.
    pub max_area: i64,

    /// Extra cells fetched and drawn around the visible extent.
    pub padding: u32,

    /// Parcel fields withheld from rendering.
    pub deny_list: Vec<String>,

    /// Optional JSON style file overriding the default palette.
    pub style_file: Option<String>,

    /// PostgreSQL URL; the in-memory store is used when absent.
    pub database_url: Option<String>,

    /// Maximum database connections.
    pub max_connections: u32,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            bounds: GridBounds::default(),
            max_area: DEFAULT_MAX_AREA,
            padding: DEFAULT_PADDING,
            deny_list: vec!["auction_owner".to_string(), "tags".to_string()],
            style_file: None,
            database_url: None,
            max_connections: 10,
        }
    }
}

impl MapConfig {
    /// Load configuration from a YAML file, or defaults when no path is given.
    /// Environment overrides are applied afterwards.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.with_env_overrides()
    }

    /// Parse a YAML configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {:?}", path))?;
        Self::from_yaml(&content).with_context(|| format!("Failed to parse config: {:?}", path))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: MapConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `DATABASE_URL` and `MAP_MAX_AREA` from the environment.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(
            std::env::var("DATABASE_URL").ok(),
            std::env::var("MAP_MAX_AREA").ok(),
        )
    }

    fn with_overrides(mut self, database_url: Option<String>, max_area: Option<String>) -> Result<Self> {
        if let Some(url) = database_url.filter(|u| !u.is_empty()) {
            self.database_url = Some(url);
        }

        if let Some(raw) = max_area {
            self.max_area = raw
                .trim()
                .parse()
                .with_context(|| format!("MAP_MAX_AREA must be an integer, got {:?}", raw))?;
        }

        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<()> {
        if !self.bounds.is_valid() {
            anyhow::bail!("Grid bounds are inverted: {:?}", self.bounds);
        }
        if self.max_area <= 0 {
            anyhow::bail!("max_area must be positive, got {}", self.max_area);
        }
        Ok(())
    }
}

//! In-memory parcel store.
//!
//! Backs the service when no database is configured and serves as the store
//! in tests. Parcels can be seeded from a JSON array of parcel records.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::info;

use parcel_common::{BoundsRect, Coordinate, CoordinateKey, MapError, MapResult, Parcel};

use crate::store::ParcelStore;

#[derive(Debug, Default)]
pub struct MemoryParcelStore {
    parcels: RwLock<HashMap<CoordinateKey, Parcel>>,
}

impl MemoryParcelStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parcels(parcels: impl IntoIterator<Item = Parcel>) -> Self {
        Self {
            parcels: RwLock::new(parcels.into_iter().map(|p| (p.key(), p)).collect()),
        }
    }

    /// Load parcels from a JSON file holding an array of parcel records.
    pub fn from_fixture_file(path: impl AsRef<Path>) -> MapResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| MapError::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        let parcels: Vec<Parcel> = serde_json::from_str(&content)
            .map_err(|e| MapError::Config(format!("Failed to parse {}: {}", path.display(), e)))?;

        info!(path = %path.display(), parcels = parcels.len(), "Loaded parcel fixtures");
        Ok(Self::with_parcels(parcels))
    }

    /// Insert or replace a parcel.
    pub async fn insert(&self, parcel: Parcel) {
        self.parcels.write().await.insert(parcel.key(), parcel);
    }

    pub async fn len(&self) -> usize {
        self.parcels.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.parcels.read().await.is_empty()
    }
}

#[async_trait]
impl ParcelStore for MemoryParcelStore {
    async fn fetch_range(&self, northwest: Coordinate, southeast: Coordinate) -> MapResult<Vec<Parcel>> {
        let rect = BoundsRect::new(northwest, southeast);
        let parcels = self.parcels.read().await;

        let mut found: Vec<Parcel> = parcels
            .values()
            .filter(|p| rect.contains(p.coordinate()))
            .cloned()
            .collect();
        found.sort_by_key(|p| (p.y, p.x));
        Ok(found)
    }

    async fn ping(&self) -> MapResult<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

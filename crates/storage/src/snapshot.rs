//! Per-request parcel snapshots.
//!
//! A snapshot is built once from a single range fetch and never modified
//! afterwards: owned parcels keyed by coordinate with deny-listed fields
//! stripped, and the active publications among them.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use parcel_common::{Coordinate, CoordinateKey, MapResult, Parcel, Publication};

use crate::store::ParcelStore;

/// Parcel fields withheld from rendering input.
///
/// Names match attribute keys; `owner` and `district_id` are also honored
/// for the typed fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldDenyList {
    fields: HashSet<String>,
}

impl FieldDenyList {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains(field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Strip denied fields from a parcel.
    pub fn apply(&self, mut parcel: Parcel) -> Parcel {
        if self.fields.is_empty() {
            return parcel;
        }
        parcel.attributes.retain(|key, _| !self.fields.contains(key));
        if self.contains("owner") {
            parcel.owner = None;
        }
        if self.contains("district_id") {
            parcel.district_id = None;
        }
        parcel
    }
}

/// Immutable view of one range fetch.
#[derive(Debug, Clone, Default)]
pub struct ParcelSnapshot {
    owned: HashMap<CoordinateKey, Parcel>,
    publications: HashMap<CoordinateKey, Publication>,
}

impl ParcelSnapshot {
    /// Shape fetched records; a publication counts only if active at `now`.
    pub fn from_parcels(parcels: Vec<Parcel>, deny_list: &FieldDenyList, now: DateTime<Utc>) -> Self {
        let mut owned = HashMap::with_capacity(parcels.len());
        let mut publications = HashMap::new();

        for parcel in parcels {
            if let Some(publication) = parcel.active_publication(now) {
                publications.insert(parcel.key(), publication.clone());
            }
            owned.insert(parcel.key(), deny_list.apply(parcel));
        }

        Self { owned, publications }
    }

    pub fn owned(&self) -> &HashMap<CoordinateKey, Parcel> {
        &self.owned
    }

    pub fn publications(&self) -> &HashMap<CoordinateKey, Publication> {
        &self.publications
    }

    pub fn is_owned(&self, coord: Coordinate) -> bool {
        self.owned.contains_key(&coord.key())
    }

    pub fn has_publication(&self, coord: Coordinate) -> bool {
        self.publications.contains_key(&coord.key())
    }
}

/// Fetches parcel ranges from a store and shapes them into snapshots.
#[derive(Clone)]
pub struct ParcelGateway {
    store: Arc<dyn ParcelStore>,
    deny_list: FieldDenyList,
}

impl ParcelGateway {
    pub fn new(store: Arc<dyn ParcelStore>, deny_list: FieldDenyList) -> Self {
        Self { store, deny_list }
    }

    pub fn store(&self) -> &Arc<dyn ParcelStore> {
        &self.store
    }

    /// Fetch the inclusive range and build its snapshot. Store errors are
    /// returned unchanged.
    pub async fn fetch_snapshot(
        &self,
        northwest: Coordinate,
        southeast: Coordinate,
        now: DateTime<Utc>,
    ) -> MapResult<ParcelSnapshot> {
        let parcels = self.store.fetch_range(northwest, southeast).await?;
        let fetched = parcels.len();
        let snapshot = ParcelSnapshot::from_parcels(parcels, &self.deny_list, now);

        debug!(
            store = self.store.name(),
            %northwest,
            %southeast,
            fetched,
            publications = snapshot.publications.len(),
            "Built parcel snapshot"
        );

        Ok(snapshot)
    }
}

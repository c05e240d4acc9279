//! Range-query interface to the parcel store.

use async_trait::async_trait;

use parcel_common::{Coordinate, MapResult, Parcel};

/// A source of parcel records queried by coordinate range.
///
/// Implementations return every parcel whose coordinate lies inside the
/// inclusive rectangle spanned by `northwest` and `southeast`, each carrying
/// its latest publication if one exists. Order is up to the store.
#[async_trait]
pub trait ParcelStore: Send + Sync {
    async fn fetch_range(&self, northwest: Coordinate, southeast: Coordinate) -> MapResult<Vec<Parcel>>;

    /// Cheap connectivity probe for readiness checks.
    async fn ping(&self) -> MapResult<()>;

    /// Short backend name for logs.
    fn name(&self) -> &'static str;
}

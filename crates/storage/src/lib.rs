//! Storage abstractions for the parcel map services.
//!
//! Provides:
//! - The `ParcelStore` range-query interface
//! - PostgreSQL parcel catalog
//! - In-memory store for tests and database-less runs
//! - Per-request snapshots with the field deny-list applied

pub mod catalog;
pub mod memory;
pub mod snapshot;
pub mod store;

pub use catalog::ParcelCatalog;
pub use memory::MemoryParcelStore;
pub use snapshot::{FieldDenyList, ParcelGateway, ParcelSnapshot};
pub use store::ParcelStore;

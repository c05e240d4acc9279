//! Common types and utilities shared across the parcel map services.

pub mod bounds;
pub mod coord;
pub mod error;
pub mod parcel;
pub mod viewport;

pub use bounds::{BoundsRect, GridBounds};
pub use coord::{Coordinate, CoordinateKey, CoordParseError};
pub use error::{MapError, MapResult};
pub use parcel::{Parcel, Publication, PublicationStatus};
pub use viewport::{compute_dimensions, ViewportResult};

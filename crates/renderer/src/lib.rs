//! Image rendering for parcel maps.
//!
//! - `grid`: rasterizes owned parcels, publications and selections
//! - `style`: map color palette
//! - `png`: indexed/RGBA PNG encoding, streamed in row batches

pub mod grid;
pub mod png;
pub mod style;

pub use grid::{draw, render_map, DrawStats, MapLayers};
pub use png::PngStream;
pub use style::{MapStyle, Palette};

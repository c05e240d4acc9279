//! Helpers for inspecting rendered PNG maps.

use image::{ImageFormat, RgbaImage};
use parcel_common::{Coordinate, ViewportResult};

/// Decode PNG bytes into an RGBA image, panicking on malformed input.
pub fn decode_png(bytes: &[u8]) -> RgbaImage {
    image::load_from_memory_with_format(bytes, ImageFormat::Png)
        .expect("rendered map should be a valid PNG")
        .to_rgba8()
}

/// Pixel at the middle of a cell, or `None` if the cell is off-image.
pub fn cell_center_pixel(
    image: &RgbaImage,
    viewport: &ViewportResult,
    cell_size: u32,
    coord: Coordinate,
) -> Option<[u8; 4]> {
    let origin = viewport.origin();
    let px = (coord.x as i64 - origin.x as i64) * cell_size as i64 + cell_size as i64 / 2;
    let py = (coord.y as i64 - origin.y as i64) * cell_size as i64 + cell_size as i64 / 2;
    if px < 0 || py < 0 || px >= image.width() as i64 || py >= image.height() as i64 {
        return None;
    }
    Some(image.get_pixel(px as u32, py as u32).0)
}

/// Cells whose center pixel is exactly `color`.
pub fn cells_with_color(
    image: &RgbaImage,
    viewport: &ViewportResult,
    cell_size: u32,
    color: [u8; 4],
) -> Vec<Coordinate> {
    viewport
        .rect()
        .cells()
        .filter(|&c| cell_center_pixel(image, viewport, cell_size, c) == Some(color))
        .collect()
}

//! Viewport math: which grid cells a pixel canvas covers.

use crate::{BoundsRect, Coordinate, MapError, MapResult};
use serde::{Deserialize, Serialize};

/// The inclusive cell range visible for a canvas, padding included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewportResult {
    pub northwest: Coordinate,
    pub southeast: Coordinate,
    /// Inclusive cell count of the padded range.
    pub area: i64,
    /// Cells added on every side beyond the visible extent.
    pub padding: u32,
}

impl ViewportResult {
    pub fn rect(&self) -> BoundsRect {
        BoundsRect {
            northwest: self.northwest,
            southeast: self.southeast,
        }
    }

    /// First cell drawn at the canvas origin (top-left pixel).
    pub fn origin(&self) -> Coordinate {
        Coordinate::new(
            self.northwest.x.saturating_add_unsigned(self.padding),
            self.northwest.y.saturating_add_unsigned(self.padding),
        )
    }
}

/// Compute the padded cell range for a `width` x `height` canvas.
///
/// The half-extent on each axis is `pixels / (2 * cell_size)` using truncating
/// integer division, so a 70px canvas of 10px cells has a half-extent of 3
/// and an odd 7-cell span. The range is not clamped to the grid. Corners
/// saturate at the `i32` limits, but `area` always counts the full requested
/// span.
pub fn compute_dimensions(
    width: u32,
    height: u32,
    cell_size: u32,
    center: Coordinate,
    padding: u32,
) -> MapResult<ViewportResult> {
    if cell_size == 0 {
        return Err(MapError::InvalidParameter {
            name: "size".to_string(),
            value: cell_size.to_string(),
            expected: "a positive cell size".to_string(),
        });
    }

    let cell_span = 2 * cell_size as i64;
    let half_x = width as i64 / cell_span + padding as i64;
    let half_y = height as i64 / cell_span + padding as i64;

    let northwest = Coordinate::new(
        saturate(center.x as i64 - half_x),
        saturate(center.y as i64 - half_y),
    );
    let southeast = Coordinate::new(
        saturate(center.x as i64 + half_x),
        saturate(center.y as i64 + half_y),
    );

    // Area of the requested span, not of the saturated corners
    let area = (2 * half_x + 1).saturating_mul(2 * half_y + 1);

    Ok(ViewportResult {
        northwest,
        southeast,
        area,
        padding,
    })
}

fn saturate(value: i64) -> i32 {
    value.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

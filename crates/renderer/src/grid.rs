//! Parcel grid rasterization.
//!
//! Each cell of the padded viewport is painted as a `cell_size` square. Layers
//! are applied in priority order: base fill (owned, district or unowned),
//! publication fill, then the selection outline.

use std::collections::{HashMap, HashSet};

use tiny_skia::{Color, Paint, Pixmap, Rect, Transform};
use tracing::debug;

use parcel_common::{Coordinate, CoordinateKey, MapError, MapResult, Parcel, Publication, ViewportResult};

use crate::png::PngStream;
use crate::style::Palette;

/// Per-request data drawn on top of the empty grid.
#[derive(Debug, Clone, Copy)]
pub struct MapLayers<'a> {
    pub owned: &'a HashMap<CoordinateKey, Parcel>,
    /// `None` disables the publication overlay.
    pub publications: Option<&'a HashMap<CoordinateKey, Publication>>,
    pub selected: &'a [Coordinate],
}

/// Counts of what ended up on the surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawStats {
    pub cells: usize,
    pub owned: usize,
    pub publications: usize,
    pub selected: usize,
}

/// Allocate a drawing surface of the requested pixel size.
pub fn allocate_surface(width: u32, height: u32) -> MapResult<Pixmap> {
    Pixmap::new(width, height).ok_or_else(|| {
        MapError::RenderFailure(format!("unsupported surface size {}x{}", width, height))
    })
}

/// Paint the grid onto `surface`.
///
/// The viewport's padding cells sit just outside the surface; cell `C` starts
/// at pixel `(C - viewport.origin()) * cell_size`. Cells entirely outside the
/// surface are skipped.
pub fn draw(
    surface: &mut Pixmap,
    viewport: &ViewportResult,
    cell_size: u32,
    layers: &MapLayers<'_>,
    palette: &Palette,
) -> MapResult<DrawStats> {
    if cell_size == 0 {
        return Err(MapError::RenderFailure("cell size must be positive".to_string()));
    }

    let width = surface.width() as i64;
    let height = surface.height() as i64;
    let size = cell_size as i64;
    let origin = viewport.origin();

    let gap = if cell_size >= palette.grid_line_min_size { 1 } else { 0 };
    let inner = (size - gap) as f32;
    let outline = (cell_size / 8).max(1) as f32;

    let selected: HashSet<Coordinate> = layers.selected.iter().copied().collect();

    surface.fill(to_color(palette.background));
    let unowned = paint(palette.unowned);
    let owned = paint(palette.owned);
    let district = paint(palette.district);
    let publication = paint(palette.publication);
    let highlight = paint(palette.selected);

    let mut stats = DrawStats::default();

    for coord in viewport.rect().cells() {
        let px = (coord.x as i64 - origin.x as i64) * size;
        let py = (coord.y as i64 - origin.y as i64) * size;
        if px + size <= 0 || py + size <= 0 || px >= width || py >= height {
            continue;
        }
        stats.cells += 1;

        let (left, top) = (px as f32, py as f32);
        let key = coord.key();

        let base = match layers.owned.get(&key) {
            Some(parcel) => {
                stats.owned += 1;
                if parcel.is_district() {
                    &district
                } else {
                    &owned
                }
            }
            None => &unowned,
        };

        let on_sale = layers
            .publications
            .map(|publications| publications.contains_key(&key))
            .unwrap_or(false);
        let fill = if on_sale {
            stats.publications += 1;
            &publication
        } else {
            base
        };
        fill_rect(surface, left, top, inner, inner, fill)?;

        if selected.contains(&coord) {
            stats.selected += 1;
            stroke_cell(surface, left, top, inner, outline, &highlight)?;
        }
    }

    debug!(
        cells = stats.cells,
        owned = stats.owned,
        publications = stats.publications,
        selected = stats.selected,
        "Drew parcel grid"
    );

    Ok(stats)
}

/// Allocate, draw and hand the surface to a streaming PNG encoder.
pub fn render_map(
    width: u32,
    height: u32,
    viewport: &ViewportResult,
    cell_size: u32,
    layers: &MapLayers<'_>,
    palette: &Palette,
) -> MapResult<PngStream> {
    let mut surface = allocate_surface(width, height)?;
    draw(&mut surface, viewport, cell_size, layers, palette)?;
    encode_surface(surface)
}

/// Finalize a surface into a PNG stream.
pub fn encode_surface(surface: Pixmap) -> MapResult<PngStream> {
    let (width, height) = (surface.width() as usize, surface.height() as usize);
    let pixels: Vec<u8> = surface
        .pixels()
        .iter()
        .flat_map(|p| {
            let c = p.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
        .collect();

    PngStream::from_rgba(pixels, width, height).map_err(|e| MapError::RenderFailure(e.to_string()))
}

fn to_color(rgba: [u8; 4]) -> Color {
    Color::from_rgba8(rgba[0], rgba[1], rgba[2], rgba[3])
}

fn paint(rgba: [u8; 4]) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(rgba[0], rgba[1], rgba[2], rgba[3]);
    paint.anti_alias = false;
    paint
}

fn fill_rect(surface: &mut Pixmap, x: f32, y: f32, w: f32, h: f32, paint: &Paint<'_>) -> MapResult<()> {
    let rect = Rect::from_xywh(x, y, w, h)
        .ok_or_else(|| MapError::RenderFailure(format!("invalid cell rect at ({}, {})", x, y)))?;
    surface.fill_rect(rect, paint, Transform::identity(), None);
    Ok(())
}

/// Outline drawn inside the cell so neighbors never cover it.
fn stroke_cell(surface: &mut Pixmap, x: f32, y: f32, side: f32, thickness: f32, paint: &Paint<'_>) -> MapResult<()> {
    let t = thickness.min(side);
    fill_rect(surface, x, y, side, t, paint)?;
    fill_rect(surface, x, y + side - t, side, t, paint)?;
    fill_rect(surface, x, y, t, side, paint)?;
    fill_rect(surface, x + side - t, y, t, side, paint)
}

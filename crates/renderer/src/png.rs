//! PNG encoding for RGBA surfaces.
//!
//! Supports two encoding modes:
//! - **Indexed PNG (color type 3)**: Used when the image has ≤256 unique
//!   colors. Parcel maps use a handful of colors so this is the normal path.
//! - **RGBA PNG (color type 6)**: Fallback for images with >256 colors.
//!
//! [`PngStream`] produces the file incrementally: the header first, then
//! IDAT chunks holding a bounded batch of rows each, then the trailer. Rows
//! are only compressed when the consumer asks for the next chunk.

use flate2::{write::ZlibEncoder, Compression};
use rayon::prelude::*;
use std::collections::HashMap;
use std::io::{self, Write};

/// PNG file signature.
pub const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// Maximum colors for indexed PNG (PNG8)
const MAX_PALETTE_SIZE: usize = 256;

/// Minimum pixels to benefit from parallel index mapping
const PARALLEL_THRESHOLD: usize = 65_536; // 256x256 or larger

/// Rows compressed per IDAT chunk.
pub const DEFAULT_ROWS_PER_CHUNK: usize = 64;

/// Pixel payload after palette analysis.
#[derive(Debug, Clone)]
pub enum PixelData {
    /// One palette index per pixel.
    Indexed {
        palette: Vec<(u8, u8, u8, u8)>,
        indices: Vec<u8>,
    },
    /// Four bytes per pixel.
    Rgba(Vec<u8>),
}

impl PixelData {
    /// Analyze RGBA pixels and pick the cheapest representation.
    pub fn from_rgba(pixels: Vec<u8>) -> Self {
        match extract_palette(&pixels) {
            Some((palette, indices)) => PixelData::Indexed { palette, indices },
            None => PixelData::Rgba(pixels),
        }
    }

    fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelData::Indexed { .. } => 1,
            PixelData::Rgba(_) => 4,
        }
    }

    fn raw(&self) -> &[u8] {
        match self {
            PixelData::Indexed { indices, .. } => indices,
            PixelData::Rgba(pixels) => pixels,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Header,
    Rows,
    Trailer,
    Done,
}

/// Lazily encoded PNG byte stream.
///
/// Single pass and not restartable: once a chunk has been yielded it is gone,
/// and a new stream must be built from the pixels to encode again.
pub struct PngStream {
    width: usize,
    height: usize,
    data: PixelData,
    rows_per_chunk: usize,
    next_row: usize,
    encoder: Option<ZlibEncoder<Vec<u8>>>,
    stage: Stage,
}

impl PngStream {
    /// Build a stream over RGBA pixels, choosing indexed or RGBA encoding.
    pub fn from_rgba(pixels: Vec<u8>, width: usize, height: usize) -> io::Result<Self> {
        if pixels.len() != width * height * 4 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "pixel buffer has {} bytes, expected {} for {}x{}",
                    pixels.len(),
                    width * height * 4,
                    width,
                    height
                ),
            ));
        }
        Ok(Self::new(PixelData::from_rgba(pixels), width, height))
    }

    pub fn new(data: PixelData, width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data,
            rows_per_chunk: DEFAULT_ROWS_PER_CHUNK,
            next_row: 0,
            encoder: Some(ZlibEncoder::new(Vec::new(), Compression::fast())),
            stage: Stage::Header,
        }
    }

    /// Change how many rows go into each IDAT chunk.
    pub fn with_rows_per_chunk(mut self, rows: usize) -> Self {
        self.rows_per_chunk = rows.max(1);
        self
    }

    pub fn is_indexed(&self) -> bool {
        matches!(self.data, PixelData::Indexed { .. })
    }

    /// Drain the whole stream into one buffer.
    pub fn into_vec(self) -> io::Result<Vec<u8>> {
        let mut png = Vec::new();
        for chunk in self {
            png.extend_from_slice(&chunk?);
        }
        Ok(png)
    }

    fn header(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(1024);
        out.extend_from_slice(&PNG_SIGNATURE);

        let color_type = match self.data {
            PixelData::Indexed { .. } => 3,
            PixelData::Rgba(_) => 6,
        };
        let mut ihdr = Vec::with_capacity(13);
        ihdr.extend_from_slice(&(self.width as u32).to_be_bytes());
        ihdr.extend_from_slice(&(self.height as u32).to_be_bytes());
        ihdr.push(8); // bit depth
        ihdr.push(color_type);
        ihdr.push(0); // compression method
        ihdr.push(0); // filter method
        ihdr.push(0); // interlace method
        write_chunk(&mut out, b"IHDR", &ihdr);

        if let PixelData::Indexed { palette, .. } = &self.data {
            let plte: Vec<u8> = palette.iter().flat_map(|&(r, g, b, _)| [r, g, b]).collect();
            write_chunk(&mut out, b"PLTE", &plte);

            // tRNS only if some entry is not fully opaque
            if palette.iter().any(|&(_, _, _, a)| a < 255) {
                let trns: Vec<u8> = palette.iter().map(|&(_, _, _, a)| a).collect();
                write_chunk(&mut out, b"tRNS", &trns);
            }
        }

        out
    }

    /// Compress the next batch of rows into an IDAT chunk.
    fn next_rows(&mut self) -> io::Result<Option<Vec<u8>>> {
        let stride = self.width * self.data.bytes_per_pixel();
        let end = (self.next_row + self.rows_per_chunk).min(self.height);

        let encoder = self
            .encoder
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "encoder already finished"))?;

        let raw = self.data.raw();
        for row in self.next_row..end {
            encoder.write_all(&[0])?; // filter type: none
            encoder.write_all(&raw[row * stride..(row + 1) * stride])?;
        }
        self.next_row = end;

        let compressed = if self.next_row >= self.height {
            match self.encoder.take() {
                Some(encoder) => encoder.finish()?,
                None => Vec::new(),
            }
        } else {
            encoder.flush()?;
            std::mem::take(encoder.get_mut())
        };

        if compressed.is_empty() {
            return Ok(None);
        }
        let mut out = Vec::with_capacity(compressed.len() + 12);
        write_chunk(&mut out, b"IDAT", &compressed);
        Ok(Some(out))
    }
}

impl Iterator for PngStream {
    type Item = io::Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.stage {
                Stage::Header => {
                    self.stage = Stage::Rows;
                    return Some(Ok(self.header()));
                }
                Stage::Rows => {
                    if self.encoder.is_none() {
                        self.stage = Stage::Trailer;
                        continue;
                    }
                    match self.next_rows() {
                        Ok(Some(chunk)) => return Some(Ok(chunk)),
                        Ok(None) => continue,
                        Err(e) => {
                            self.stage = Stage::Done;
                            return Some(Err(e));
                        }
                    }
                }
                Stage::Trailer => {
                    self.stage = Stage::Done;
                    let mut out = Vec::with_capacity(12);
                    write_chunk(&mut out, b"IEND", &[]);
                    return Some(Ok(out));
                }
                Stage::Done => return None,
            }
        }
    }
}

/// Encode RGBA pixels into a complete PNG buffer.
pub fn create_png_auto(pixels: &[u8], width: usize, height: usize) -> Result<Vec<u8>, String> {
    PngStream::from_rgba(pixels.to_vec(), width, height)
        .and_then(PngStream::into_vec)
        .map_err(|e| format!("PNG encoding failed: {}", e))
}

/// Pack RGBA bytes into a u32 for faster hashing and comparison
#[inline(always)]
fn pack_color(r: u8, g: u8, b: u8, a: u8) -> u32 {
    (r as u32) | ((g as u32) << 8) | ((b as u32) << 16) | ((a as u32) << 24)
}

/// Collect the palette and per-pixel indices, or `None` past 256 colors.
fn extract_palette(pixels: &[u8]) -> Option<(Vec<(u8, u8, u8, u8)>, Vec<u8>)> {
    let mut color_to_index: HashMap<u32, u8> = HashMap::with_capacity(MAX_PALETTE_SIZE);
    let mut palette: Vec<(u8, u8, u8, u8)> = Vec::with_capacity(MAX_PALETTE_SIZE);

    for chunk in pixels.chunks_exact(4) {
        let packed = pack_color(chunk[0], chunk[1], chunk[2], chunk[3]);
        if !color_to_index.contains_key(&packed) {
            if palette.len() >= MAX_PALETTE_SIZE {
                return None;
            }
            color_to_index.insert(packed, palette.len() as u8);
            palette.push((chunk[0], chunk[1], chunk[2], chunk[3]));
        }
    }

    let lookup = |chunk: &[u8]| -> u8 {
        color_to_index
            .get(&pack_color(chunk[0], chunk[1], chunk[2], chunk[3]))
            .copied()
            .unwrap_or(0)
    };

    let indices: Vec<u8> = if pixels.len() / 4 >= PARALLEL_THRESHOLD {
        pixels.par_chunks_exact(4).map(lookup).collect()
    } else {
        pixels.chunks_exact(4).map(lookup).collect()
    };

    Some((palette, indices))
}

/// Write a PNG chunk
fn write_chunk(png: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    png.extend_from_slice(&(data.len() as u32).to_be_bytes());
    png.extend_from_slice(chunk_type);
    png.extend_from_slice(data);

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(chunk_type);
    hasher.update(data);
    png.extend_from_slice(&hasher.finalize().to_be_bytes());
}

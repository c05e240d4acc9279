//! Color palette for parcel map rendering.

use serde::{Deserialize, Serialize};

/// Colors used by the grid renderer, as `#RRGGBB` or `#RRGGBBAA` strings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MapStyle {
    /// Canvas fill behind the cells; also shows through as grid lines.
    pub background: String,
    pub unowned: String,
    pub owned: String,
    pub district: String,
    pub publication: String,
    pub selected: String,
    /// Minimum cell size in pixels before a 1px grid line is left between cells.
    pub grid_line_min_size: u32,
}

impl Default for MapStyle {
    fn default() -> Self {
        Self {
            background: "#09080A".to_string(),
            unowned: "#3D3A46".to_string(),
            owned: "#8E8B94".to_string(),
            district: "#6F2DE8".to_string(),
            publication: "#1FBCFF".to_string(),
            selected: "#FF4130".to_string(),
            grid_line_min_size: 8,
        }
    }
}

impl MapStyle {
    /// Load a style from JSON string
    pub fn from_json(json_str: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json_str)
    }

    /// Load a style from file
    pub fn from_file(path: &str) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_json(&content)?)
    }

    /// Resolve every color, failing on the first unparseable entry.
    pub fn palette(&self) -> Result<Palette, String> {
        let parse = |name: &str, value: &str| {
            hex_to_rgba(value).ok_or_else(|| format!("invalid color for '{}': {}", name, value))
        };

        Ok(Palette {
            background: parse("background", &self.background)?,
            unowned: parse("unowned", &self.unowned)?,
            owned: parse("owned", &self.owned)?,
            district: parse("district", &self.district)?,
            publication: parse("publication", &self.publication)?,
            selected: parse("selected", &self.selected)?,
            grid_line_min_size: self.grid_line_min_size,
        })
    }
}

/// A [`MapStyle`] with colors resolved to RGBA.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background: [u8; 4],
    pub unowned: [u8; 4],
    pub owned: [u8; 4],
    pub district: [u8; 4],
    pub publication: [u8; 4],
    pub selected: [u8; 4],
    pub grid_line_min_size: u32,
}

impl Default for Palette {
    fn default() -> Self {
        // Default hex strings are well formed
        MapStyle::default()
            .palette()
            .unwrap_or(Palette {
                background: [9, 8, 10, 255],
                unowned: [61, 58, 70, 255],
                owned: [142, 139, 148, 255],
                district: [111, 45, 232, 255],
                publication: [31, 188, 255, 255],
                selected: [255, 65, 48, 255],
                grid_line_min_size: 8,
            })
    }
}

/// Parse hex color string to RGBA. Six digits imply full opacity.
pub fn hex_to_rgba(hex: &str) -> Option<[u8; 4]> {
    let hex = hex.trim_start_matches('#');
    if (hex.len() != 6 && hex.len() != 8) || !hex.is_ascii() {
        return None;
    }

    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    let r = channel(0)?;
    let g = channel(2)?;
    let b = channel(4)?;
    let a = if hex.len() == 8 { channel(6)? } else { 255 };

    Some([r, g, b, a])
}

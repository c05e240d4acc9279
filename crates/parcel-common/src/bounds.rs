//! Grid limits and inclusive coordinate rectangles.

use crate::Coordinate;
use serde::{Deserialize, Serialize};

/// The fixed valid coordinate range of the whole grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridBounds {
    pub min_x: i32,
    pub max_x: i32,
    pub min_y: i32,
    pub max_y: i32,
}

impl Default for GridBounds {
    /// Genesis City layout: 301 x 301 parcels centered on the origin.
    fn default() -> Self {
        Self {
            min_x: -150,
            max_x: 150,
            min_y: -150,
            max_y: 150,
        }
    }
}

impl GridBounds {
    pub fn new(min_x: i32, max_x: i32, min_y: i32, max_y: i32) -> Self {
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }

    pub fn clamp_x(&self, x: i64) -> i32 {
        x.clamp(self.min_x as i64, self.max_x as i64) as i32
    }

    pub fn clamp_y(&self, y: i64) -> i32 {
        y.clamp(self.min_y as i64, self.max_y as i64) as i32
    }

    /// Clamp a coordinate into the grid.
    pub fn clamp(&self, coord: Coordinate) -> Coordinate {
        Coordinate::new(self.clamp_x(coord.x as i64), self.clamp_y(coord.y as i64))
    }

    pub fn contains(&self, coord: Coordinate) -> bool {
        coord.x >= self.min_x && coord.x <= self.max_x && coord.y >= self.min_y && coord.y <= self.max_y
    }

    /// Check that min does not exceed max on either axis.
    pub fn is_valid(&self) -> bool {
        self.min_x <= self.max_x && self.min_y <= self.max_y
    }
}

/// An inclusive rectangle of grid cells.
///
/// `northwest` is the (min x, min y) corner and `southeast` the
/// (max x, max y) corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundsRect {
    pub northwest: Coordinate,
    pub southeast: Coordinate,
}

impl BoundsRect {
    /// Build a rectangle from any two opposite corners.
    pub fn new(a: Coordinate, b: Coordinate) -> Self {
        Self {
            northwest: Coordinate::new(a.x.min(b.x), a.y.min(b.y)),
            southeast: Coordinate::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    /// Number of columns.
    pub fn width(&self) -> i64 {
        self.southeast.x as i64 - self.northwest.x as i64 + 1
    }

    /// Number of rows.
    pub fn height(&self) -> i64 {
        self.southeast.y as i64 - self.northwest.y as i64 + 1
    }

    /// Number of cells.
    pub fn area(&self) -> i64 {
        self.width() * self.height()
    }

    pub fn contains(&self, coord: Coordinate) -> bool {
        coord.x >= self.northwest.x
            && coord.x <= self.southeast.x
            && coord.y >= self.northwest.y
            && coord.y <= self.southeast.y
    }

    /// Iterate every cell row by row, starting at the northwest corner.
    pub fn cells(&self) -> impl Iterator<Item = Coordinate> + '_ {
        (self.northwest.y..=self.southeast.y)
            .flat_map(move |y| (self.northwest.x..=self.southeast.x).map(move |x| Coordinate::new(x, y)))
    }
}

//! Tile values and the rectangle geometry they live in

use serde::{Deserialize, Serialize};

/// Index of a tile within a tileset.
///
/// Indexes start at 1 and are never reused once assigned, so a tileset
/// that has seen removals keeps gaps in its index sequence.
pub type TileIndex = u32;

/// An axis-aligned rectangle in tileset image pixel space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Check if the rectangle has zero area
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Check if a point lies inside the rectangle (half-open on the far edges)
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x
            && y >= self.y
            && x < self.x + self.width as i32
            && y < self.y + self.height as i32
    }

    /// Check if two rectangles overlap with strictly positive area.
    ///
    /// Rectangles that merely share an edge or a corner do not
    /// intersect, and empty rectangles intersect nothing.
    pub fn intersects(&self, other: &Rect) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        self.x < other.x + other.width as i32
            && other.x < self.x + self.width as i32
            && self.y < other.y + other.height as i32
            && other.y < self.y + self.height as i32
    }
}

/// The map layer a tile is drawn on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TileLayer {
    /// Below the game characters (ground, floors)
    #[default]
    Below,
    /// Same level as the game characters
    Intermediate,
    /// Above the game characters (tree tops, roofs)
    Above,
}

/// Obstacle classification of a tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Obstacle {
    /// Walkable tile
    #[default]
    None,
    /// Fully blocking tile
    Solid,
    /// Only the top-right half triangle blocks
    TopRight,
    /// Only the top-left half triangle blocks
    TopLeft,
    /// Only the bottom-left half triangle blocks
    BottomLeft,
    /// Only the bottom-right half triangle blocks
    BottomRight,
}

/// A tile definition: a rectangle of the tileset image plus its
/// layer and obstacle classification. Immutable once created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub rect: Rect,
    pub layer: TileLayer,
    pub obstacle: Obstacle,
}

impl Tile {
    pub fn new(rect: Rect, layer: TileLayer, obstacle: Obstacle) -> Self {
        Self {
            rect,
            layer,
            obstacle,
        }
    }
}

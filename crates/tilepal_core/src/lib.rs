//! Core data structures for tilepal
//!
//! This crate provides the observable tileset palette at the heart of
//! the editor:
//! - `Tileset` - A sparse index -> tile map with selection state,
//!   overlap detection and synchronous change notification
//! - `Tile` - A rectangle of the tileset image with layer and
//!   obstacle classification
//! - `TilesetEvent` - Typed notification payloads for observers
//! - `Selection` - What the user currently has selected
//!
//! All operations are synchronous and single-threaded; observers run
//! inline within the mutating call.

mod error;
mod event;
mod tile;
mod tileset;

pub use error::TilesetError;
pub use event::{ObserverId, TilesetEvent};
pub use tile::{Obstacle, Rect, Tile, TileIndex, TileLayer};
pub use tileset::{Selection, Tileset};

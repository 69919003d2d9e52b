//! Error types for tileset lookups

use thiserror::Error;

use crate::tile::TileIndex;

/// Error type for tileset lookup failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TilesetError {
    #[error("no tile with index {index} in the tileset")]
    NoSuchTile { index: TileIndex },
    #[error("no tile with rank {rank} in the tileset")]
    NoSuchRank { rank: usize },
}

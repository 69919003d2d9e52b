//! Tileset persistence and asset loading for tilepal
//!
//! This crate owns everything that touches the filesystem:
//! - `save_tileset` / `load_tileset` - The versioned, checksummed
//!   binary tileset file format
//! - `AssetPaths` - Path conventions under an injected project root
//! - `reload_image` / `create_tileset` - Best-effort tileset image
//!   loading

mod assets;
mod tileset_file;

pub use assets::{create_tileset, reload_image, AssetPaths, TILESET_EXTENSION};
pub use tileset_file::{load_tileset, save_tileset, TilesetFileError, FORMAT_VERSION};

//! Asset path conventions and tileset image loading
//!
//! The asset root is supplied by the caller (typically from editor
//! configuration) and injected wherever a path is derived; this crate
//! never consults global state for it.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use tilepal_core::Tileset;

/// File extension of tileset data files
pub const TILESET_EXTENSION: &str = "tpal";

/// Derives asset file paths from a project root directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetPaths {
    root: PathBuf,
}

impl AssetPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The project root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the image of a tileset:
    /// `<root>/images/tilesets/<name>.png`
    pub fn tileset_image_path(&self, name: &str) -> PathBuf {
        self.root
            .join("images")
            .join("tilesets")
            .join(format!("{name}.png"))
    }

    /// Path of the data file of a tileset:
    /// `<root>/tilesets/<name>.tpal`
    pub fn tileset_data_path(&self, name: &str) -> PathBuf {
        self.root
            .join("tilesets")
            .join(format!("{name}.{TILESET_EXTENSION}"))
    }
}

/// Reload the image of a tileset from its conventional path.
///
/// This is best effort: a missing or undecodable file clears the
/// tileset's image pair instead of surfacing an error, and the
/// tileset still notifies its observers either way so views can fall
/// back to a placeholder.
pub fn reload_image(tileset: &mut Tileset, paths: &AssetPaths) {
    let path = paths.tileset_image_path(tileset.name());
    match image::open(&path) {
        Ok(loaded) => {
            debug!(path = %path.display(), "tileset image loaded");
            tileset.set_image(Some(loaded.to_rgba8()));
        }
        Err(err) => {
            warn!(path = %path.display(), %err, "failed to load tileset image");
            tileset.set_image(None);
        }
    }
}

/// Create a new, empty tileset and attempt its initial image load
pub fn create_tileset(name: impl Into<String>, paths: &AssetPaths) -> Tileset {
    let mut tileset = Tileset::new(name);
    reload_image(&mut tileset, paths);
    tileset
}

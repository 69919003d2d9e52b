//! Binary tileset file format
//!
//! A tileset is stored as a single blob:
//!
//! ```text
//! magic    b"TPAL"      4 bytes
//! version  u16 le       format version, currently 1
//! length   u32 le       payload byte length
//! payload               bincode-encoded tileset data
//! checksum u32 le       CRC32 of the payload
//! ```
//!
//! Only the persistent part of the tileset is encoded (name, tile map,
//! index counter); selection, dirty flag and image handles are rebuilt
//! after loading.

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::Path;

use thiserror::Error;
use tracing::debug;

use tilepal_core::Tileset;

use crate::assets::{reload_image, AssetPaths};

/// Magic number of tileset files
const MAGIC_NUMBER: [u8; 4] = *b"TPAL";

/// Current tileset file format version
pub const FORMAT_VERSION: u16 = 1;

/// Error type for tileset file operations.
///
/// Every variant except `Io`-on-save means the file cannot be
/// trusted; loading never yields a partially reconstructed tileset.
#[derive(Debug, Error)]
pub enum TilesetFileError {
    #[error("failed to access tileset file: {0}")]
    Io(#[from] io::Error),
    #[error("not a tileset file (bad magic number)")]
    BadMagic,
    #[error("unsupported tileset format version {0}")]
    UnsupportedVersion(u16),
    #[error("tileset data checksum mismatch")]
    ChecksumMismatch,
    #[error("malformed tileset data: {0}")]
    Decode(#[from] bincode::Error),
}

/// Save a tileset to disk and clear its dirty flag
pub fn save_tileset<P: AsRef<Path>>(
    tileset: &mut Tileset,
    path: P,
) -> Result<(), TilesetFileError> {
    if let Some(parent) = path.as_ref().parent() {
        fs::create_dir_all(parent)?;
    }

    let payload = bincode::serialize(tileset)?;

    let mut file = File::create(&path)?;
    file.write_all(&MAGIC_NUMBER)?;
    file.write_all(&FORMAT_VERSION.to_le_bytes())?;
    file.write_all(&(payload.len() as u32).to_le_bytes())?;
    file.write_all(&payload)?;
    file.write_all(&crc32fast::hash(&payload).to_le_bytes())?;
    file.sync_all()?;

    tileset.mark_saved();
    debug!(name = tileset.name(), path = %path.as_ref().display(), "tileset saved");
    Ok(())
}

/// Load a tileset from disk.
///
/// On success the tileset is fully ready to use: not dirty, nothing
/// selected, and its image reloaded (best effort) from `paths`.
pub fn load_tileset<P: AsRef<Path>>(
    path: P,
    paths: &AssetPaths,
) -> Result<Tileset, TilesetFileError> {
    let mut file = File::open(&path)?;

    let mut magic = [0u8; 4];
    file.read_exact(&mut magic)?;
    if magic != MAGIC_NUMBER {
        return Err(TilesetFileError::BadMagic);
    }

    let mut version_bytes = [0u8; 2];
    file.read_exact(&mut version_bytes)?;
    let version = u16::from_le_bytes(version_bytes);
    if version != FORMAT_VERSION {
        return Err(TilesetFileError::UnsupportedVersion(version));
    }

    let mut length_bytes = [0u8; 4];
    file.read_exact(&mut length_bytes)?;
    let length = u32::from_le_bytes(length_bytes) as usize;

    let mut payload = vec![0u8; length];
    file.read_exact(&mut payload)?;

    let mut checksum_bytes = [0u8; 4];
    file.read_exact(&mut checksum_bytes)?;
    if crc32fast::hash(&payload) != u32::from_le_bytes(checksum_bytes) {
        return Err(TilesetFileError::ChecksumMismatch);
    }

    let mut tileset: Tileset = bincode::deserialize(&payload)?;

    // Post-load fixup, in this order
    tileset.mark_saved();
    tileset.deselect();
    reload_image(&mut tileset, paths);

    debug!(name = tileset.name(), path = %path.as_ref().display(), "tileset loaded");
    Ok(tileset)
}

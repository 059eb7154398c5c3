//! On-disk chunk and world metadata files.
//!
//! Chunk file layout, all little-endian:
//! `i32 chunk_x, i32 chunk_z`, then per cell `u16 type, u8 metadata` in
//! storage order, then one sky light byte per cell, one block light byte per
//! cell, and one `i16` per column of the height map.
use crate::utils::error::StorageError;
use crate::world::block::{BlockType, MAX_LIGHT};
use crate::world::chunk::{Chunk, CHUNK_COLUMNS, CHUNK_VOLUME};
use crate::world::chunk_coord::ChunkPosition;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const META_FILE: &str = "world.meta";

const HEADER_LEN: usize = 8;

/// Exact size of every chunk file.
pub const fn encoded_len() -> usize {
    HEADER_LEN + CHUNK_VOLUME * 3 + CHUNK_VOLUME * 2 + CHUNK_COLUMNS * 2
}

pub fn encode_chunk(chunk: &Chunk) -> Vec<u8> {
    let mut out = Vec::with_capacity(encoded_len());
    out.extend_from_slice(&chunk.position().x().to_le_bytes());
    out.extend_from_slice(&chunk.position().z().to_le_bytes());
    for (ordinal, metadata) in chunk.types().iter().zip(chunk.metadata()) {
        out.extend_from_slice(&ordinal.to_le_bytes());
        out.push(*metadata);
    }
    out.extend_from_slice(chunk.sky_light_data());
    out.extend_from_slice(chunk.block_light_data());
    for height in chunk.height_map() {
        out.extend_from_slice(&height.to_le_bytes());
    }
    out
}

/// Parses a chunk file image. `path` is only used for error context.
pub fn decode_chunk(
    expected: ChunkPosition,
    bytes: &[u8],
    path: &Path,
) -> Result<Chunk, StorageError> {
    if bytes.len() != encoded_len() {
        return Err(StorageError::Corrupt {
            path: path.to_path_buf(),
            expected: encoded_len(),
            actual: bytes.len(),
        });
    }

    let read_i32 = |at: usize| i32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]);
    let found = ChunkPosition::new(read_i32(0), read_i32(4));
    if found != expected {
        return Err(StorageError::PositionMismatch {
            path: path.to_path_buf(),
            expected,
            found,
        });
    }

    let cells = &bytes[HEADER_LEN..HEADER_LEN + CHUNK_VOLUME * 3];
    let mut types = Vec::with_capacity(CHUNK_VOLUME);
    let mut metadata = Vec::with_capacity(CHUNK_VOLUME);
    for cell in cells.chunks_exact(3) {
        let ordinal = u16::from_le_bytes([cell[0], cell[1]]);
        if BlockType::from_u16(ordinal).is_none() {
            return Err(StorageError::UnknownBlockType {
                path: path.to_path_buf(),
                ordinal,
            });
        }
        types.push(ordinal);
        metadata.push(cell[2]);
    }

    let light = |range: &[u8]| range.iter().map(|level| (*level).min(MAX_LIGHT)).collect::<Vec<_>>();
    let mut offset = HEADER_LEN + CHUNK_VOLUME * 3;
    let sky_light = light(&bytes[offset..offset + CHUNK_VOLUME]);
    offset += CHUNK_VOLUME;
    let block_light = light(&bytes[offset..offset + CHUNK_VOLUME]);
    offset += CHUNK_VOLUME;
    let height_map: Vec<i16> = bytes[offset..]
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect();

    let mut chunk = Chunk::from_raw_parts(
        expected,
        types,
        metadata,
        sky_light,
        block_light,
        height_map.clone(),
    );
    // The cells are authoritative.
    chunk.recalculate_height_map();
    if chunk.height_map() != height_map.as_slice() {
        warn!("Height map in {:?} disagrees with its cells, rebuilt", path);
    }
    Ok(chunk)
}

pub fn save_chunk(chunk: &Chunk, path: &Path) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, encode_chunk(chunk))?;
    debug!("Saved chunk {} to {:?}", chunk.position(), path);
    Ok(())
}

pub fn load_chunk(position: ChunkPosition, path: &Path) -> Result<Chunk, StorageError> {
    let bytes = fs::read(path)?;
    let chunk = decode_chunk(position, &bytes, path)?;
    debug!("Loaded chunk {} from {:?}", position, path);
    Ok(chunk)
}

/// Positions of every chunk file in `dir`. Unrelated files are skipped.
pub fn saved_chunks(dir: &Path) -> Result<Vec<ChunkPosition>, StorageError> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut positions = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if let Some(position) = ChunkPosition::from_path(&path) {
            positions.push(position);
        }
    }
    positions.sort();
    Ok(positions)
}

/// World-level state persisted next to the chunk files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldMeta {
    pub seed: i64,
    pub time_of_day: f64,
    pub is_raining: bool,
    pub is_thundering: bool,
}

pub fn meta_path(dir: &Path) -> PathBuf {
    dir.join(META_FILE)
}

pub fn save_meta(dir: &Path, meta: &WorldMeta) -> Result<(), StorageError> {
    fs::create_dir_all(dir)?;
    let bytes = bincode::serialize(meta)?;
    fs::write(meta_path(dir), bytes)?;
    Ok(())
}

/// `Ok(None)` when no metadata has been saved yet.
pub fn load_meta(dir: &Path) -> Result<Option<WorldMeta>, StorageError> {
    let path = meta_path(dir);
    if !path.exists() {
        return Ok(None);
    }
    let bytes = fs::read(&path)?;
    match bincode::deserialize(&bytes) {
        Ok(meta) => Ok(Some(meta)),
        Err(e) => {
            warn!("Unreadable world metadata {:?}: {}", path, e);
            Err(StorageError::Metadata(e))
        }
    }
}

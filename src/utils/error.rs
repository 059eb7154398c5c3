use crate::world::chunk_coord::ChunkPosition;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt chunk file {path:?}: expected {expected} bytes, found {actual}")]
    Corrupt {
        path: PathBuf,
        expected: usize,
        actual: usize,
    },

    #[error("Unknown block type {ordinal} in chunk file {path:?}")]
    UnknownBlockType { path: PathBuf, ordinal: u16 },

    #[error("Chunk file {path:?} holds chunk {found}, expected {expected}")]
    PositionMismatch {
        path: PathBuf,
        expected: ChunkPosition,
        found: ChunkPosition,
    },

    #[error("World metadata error: {0}")]
    Metadata(#[from] bincode::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum WorldError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Threading error: {0}")]
    ThreadPool(String),
}

pub type Result<T> = std::result::Result<T, WorldError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corrupt_message() {
        let err = StorageError::Corrupt {
            path: PathBuf::from("chunk_0_0.bin"),
            expected: 10,
            actual: 4,
        };
        let text = err.to_string();
        assert!(text.contains("expected 10 bytes"));
        assert!(text.contains("found 4"));
    }

    #[test]
    fn test_storage_converts_into_world_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: WorldError = StorageError::from(io).into();
        assert!(matches!(err, WorldError::Storage(StorageError::Io(_))));
    }
}

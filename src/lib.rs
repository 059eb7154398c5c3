pub mod config;
pub mod core;
pub mod utils;
pub mod world;

// Re-export commonly used types
pub use crate::config::chunksys::ChunkSysConfig;
pub use crate::config::core::EngineConfig;
pub use crate::config::worldgen::WorldGenConfig;
pub use crate::core::world::{World, WorldStatistics};
pub use crate::utils::error::{ConfigError, Result, StorageError, WorldError};
pub use crate::utils::math::{Plane, ViewFrustum, AABB};
pub use crate::world::block::{Block, BlockFace, BlockType, Cell};
pub use crate::world::chunk::Chunk;
pub use crate::world::chunk_coord::ChunkPosition;
pub use crate::world::generator::{NoiseGenerator, TerrainGenerator};
pub use crate::world::light::LightEngine;
pub use crate::world::mesh::ChunkMesh;

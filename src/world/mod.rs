pub mod block;
pub mod block_flags;
pub mod blocks_data;
pub mod chunk;
pub mod chunk_coord;
pub mod generator;
pub mod light;
pub mod mesh;
pub mod pool;
pub mod storage;

// Re-export commonly used types
pub use block::{Block, BlockFace, BlockType, Cell, MAX_LIGHT};
pub use block_flags::{BlockFlags, ChunkFlags};
pub use chunk::{Chunk, ChunkStatistics, CHUNK_DEPTH, CHUNK_HEIGHT, CHUNK_WIDTH};
pub use chunk_coord::ChunkPosition;
pub use generator::{Biome, NoiseGenerator, TerrainGenerator};
pub use light::LightEngine;
pub use mesh::{ChunkMesh, Quad};
pub use pool::{ChunkEvent, ChunkLoader, ChunkSource, SharedChunk};
pub use storage::WorldMeta;

use crate::config::WorldGenConfig;
use crate::world::block::{Block, BlockType};
use crate::world::chunk::{Chunk, CHUNK_DEPTH, CHUNK_HEIGHT, CHUNK_WIDTH};
use crate::world::chunk_coord::ChunkPosition;
use crate::world::generator::noise::NoiseGenerator;
use log::trace;

const BEDROCK_LAYERS: i32 = 5;
const SOIL_DEPTH: i32 = 4;
const SNOW_LINE: i32 = 180;
const ROCK_LINE: i32 = 140;
const SAND_LINE: i32 = 100;
const DIRT_POCKET_THRESHOLD: f64 = 0.4;

/// Fills chunks from the seeded noise fields. Deterministic per seed and
/// shareable between generation workers.
pub struct TerrainGenerator {
    config: WorldGenConfig,
    noise: NoiseGenerator,
}

impl TerrainGenerator {
    pub fn new(config: WorldGenConfig) -> Self {
        Self {
            noise: NoiseGenerator::new(config.seed),
            config,
        }
    }

    pub fn seed(&self) -> i64 {
        self.config.seed
    }

    pub fn config(&self) -> &WorldGenConfig {
        &self.config
    }

    pub fn noise(&self) -> &NoiseGenerator {
        &self.noise
    }

    /// Surface y of a world column, clamped into the chunk's vertical range.
    pub fn surface_height(&self, wx: i32, wz: i32) -> i32 {
        self.noise
            .get_height(wx, wz)
            .clamp(0, CHUNK_HEIGHT as i32 - 1)
    }

    /// Block type the terrain rule places at a world position.
    pub fn block_at(&self, wx: i32, y: i32, wz: i32, surface: i32) -> BlockType {
        if y < BEDROCK_LAYERS {
            return BlockType::Bedrock;
        }
        if y > surface {
            return BlockType::Air;
        }
        if y == surface {
            return surface_block(surface);
        }
        if y < surface - SOIL_DEPTH {
            if self.config.carve_caves
                && self.noise.get_cave_noise(wx, y, wz) > self.config.cave_threshold
            {
                return BlockType::Air;
            }
            if self.noise.fast_noise(wx, y, wz) > DIRT_POCKET_THRESHOLD {
                return BlockType::Dirt;
            }
            return BlockType::Stone;
        }
        BlockType::Dirt
    }

    /// Overwrites the chunk with generated terrain and resets its flags to
    /// loaded-but-unmodified.
    pub fn generate(&self, chunk: &mut Chunk) {
        let position = chunk.position();
        trace!("Generating terrain for chunk {}", position);

        for z in 0..CHUNK_DEPTH as i32 {
            for x in 0..CHUNK_WIDTH as i32 {
                let wx = position.to_world_x(x);
                let wz = position.to_world_z(z);
                let surface = self.surface_height(wx, wz);
                let top = surface.max(BEDROCK_LAYERS - 1);

                for y in 0..CHUNK_HEIGHT as i32 {
                    let block_type = if y > top {
                        BlockType::Air
                    } else {
                        self.block_at(wx, y, wz, surface)
                    };
                    chunk.set_block(x, y, z, Block::new(block_type));
                }
            }
        }

        chunk.finish_generation();
    }

    /// Convenience wrapper producing a fresh generated chunk.
    pub fn generate_chunk(&self, position: ChunkPosition) -> Chunk {
        let mut chunk = Chunk::new(position);
        self.generate(&mut chunk);
        chunk
    }
}

fn surface_block(height: i32) -> BlockType {
    if height > SNOW_LINE {
        BlockType::Snow
    } else if height > ROCK_LINE {
        BlockType::Stone
    } else if height > SAND_LINE {
        BlockType::Sand
    } else {
        BlockType::Grass
    }
}

use crate::utils::error::StorageError;
use crate::utils::math::ViewFrustum;
use crate::world::block::{Block, BlockType, Cell, MAX_LIGHT};
use crate::world::block_flags::ChunkFlags;
use crate::world::chunk_coord::ChunkPosition;
use crate::world::generator::TerrainGenerator;
use crate::world::mesh::{self, ChunkMesh, VoxelSource};
use crate::world::storage;
use glam::{IVec3, Mat4, Vec3};
use rand::Rng;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::Arc;

pub const CHUNK_WIDTH: usize = 16;
pub const CHUNK_HEIGHT: usize = 256;
pub const CHUNK_DEPTH: usize = 16;
pub const CHUNK_VOLUME: usize = CHUNK_WIDTH * CHUNK_HEIGHT * CHUNK_DEPTH;
pub const CHUNK_COLUMNS: usize = CHUNK_WIDTH * CHUNK_DEPTH;

/// Marker for an empty column in the height map.
pub const EMPTY_COLUMN: i16 = -1;

/// Columns scanned below the top block when collecting visible blocks.
const VISIBLE_COLUMN_DEPTH: i32 = 10;
const GRASS_SPREAD_LIGHT: u8 = 9;

#[derive(Debug, Clone, Serialize)]
pub struct ChunkStatistics {
    pub position: ChunkPosition,
    pub block_count: usize,
    pub block_types: BTreeMap<String, usize>,
    pub is_modified: bool,
    pub is_dirty: bool,
}

/// Dense 16x256x16 column of cells. Types, metadata and both light channels
/// are parallel arrays in `(y * DEPTH + z) * WIDTH + x` order.
#[derive(Debug, Clone)]
pub struct Chunk {
    position: ChunkPosition,
    types: Box<[u16]>,
    metadata: Box<[u8]>,
    sky_light: Box<[u8]>,
    block_light: Box<[u8]>,
    height_map: Box<[i16]>,
    flags: ChunkFlags,
    revision: u64,
    mesh: Option<Arc<ChunkMesh>>,
}

impl Chunk {
    pub fn new(position: ChunkPosition) -> Self {
        Self {
            position,
            types: vec![BlockType::Air.ordinal(); CHUNK_VOLUME].into_boxed_slice(),
            metadata: vec![0; CHUNK_VOLUME].into_boxed_slice(),
            sky_light: vec![0; CHUNK_VOLUME].into_boxed_slice(),
            block_light: vec![0; CHUNK_VOLUME].into_boxed_slice(),
            height_map: vec![EMPTY_COLUMN; CHUNK_COLUMNS].into_boxed_slice(),
            flags: ChunkFlags::empty(),
            revision: 0,
            mesh: None,
        }
    }

    /// Rebuilds a chunk from its raw arrays. Lengths are checked by the caller.
    pub(crate) fn from_raw_parts(
        position: ChunkPosition,
        types: Vec<u16>,
        metadata: Vec<u8>,
        sky_light: Vec<u8>,
        block_light: Vec<u8>,
        height_map: Vec<i16>,
    ) -> Self {
        Self {
            position,
            types: types.into_boxed_slice(),
            metadata: metadata.into_boxed_slice(),
            sky_light: sky_light.into_boxed_slice(),
            block_light: block_light.into_boxed_slice(),
            height_map: height_map.into_boxed_slice(),
            flags: ChunkFlags::LOADED | ChunkFlags::DIRTY,
            revision: 0,
            mesh: None,
        }
    }

    pub(crate) fn types(&self) -> &[u16] {
        &self.types
    }

    pub(crate) fn metadata(&self) -> &[u8] {
        &self.metadata
    }

    pub(crate) fn sky_light_data(&self) -> &[u8] {
        &self.sky_light
    }

    pub(crate) fn block_light_data(&self) -> &[u8] {
        &self.block_light
    }

    pub(crate) fn height_map(&self) -> &[i16] {
        &self.height_map
    }

    pub fn position(&self) -> ChunkPosition {
        self.position
    }

    #[inline]
    pub fn in_bounds(x: i32, y: i32, z: i32) -> bool {
        x >= 0
            && x < CHUNK_WIDTH as i32
            && y >= 0
            && y < CHUNK_HEIGHT as i32
            && z >= 0
            && z < CHUNK_DEPTH as i32
    }

    /// Linear index of an in-bounds cell.
    #[inline]
    pub fn index(x: i32, y: i32, z: i32) -> usize {
        (y as usize * CHUNK_DEPTH + z as usize) * CHUNK_WIDTH + x as usize
    }

    #[inline]
    fn column(x: i32, z: i32) -> usize {
        z as usize * CHUNK_WIDTH + x as usize
    }

    /// `None` when out of bounds; in-bounds empty cells are `Cell::Air`.
    pub fn cell(&self, x: i32, y: i32, z: i32) -> Option<Cell> {
        if !Self::in_bounds(x, y, z) {
            return None;
        }
        let idx = Self::index(x, y, z);
        let block_type = BlockType::from_u16(self.types[idx]).unwrap_or(BlockType::Air);
        if block_type.is_air() {
            return Some(Cell::Air);
        }
        Some(Cell::Occupied(Block {
            block_type,
            metadata: self.metadata[idx],
            light_level: self.block_light[idx],
            sky_light: self.sky_light[idx],
        }))
    }

    /// Occupied cell snapshot. Air and out-of-range both give `None`.
    pub fn get_block(&self, x: i32, y: i32, z: i32) -> Option<Block> {
        self.cell(x, y, z).and_then(Cell::block)
    }

    /// Type at a position, treating out-of-range as air.
    #[inline]
    pub fn block_type(&self, x: i32, y: i32, z: i32) -> BlockType {
        if !Self::in_bounds(x, y, z) {
            return BlockType::Air;
        }
        BlockType::from_u16(self.types[Self::index(x, y, z)]).unwrap_or(BlockType::Air)
    }

    /// Writes a block (an air block clears the cell). Returns `false` and
    /// leaves the chunk untouched when the position is out of range.
    pub fn set_block(&mut self, x: i32, y: i32, z: i32, block: Block) -> bool {
        if !Self::in_bounds(x, y, z) {
            return false;
        }

        let idx = Self::index(x, y, z);
        match Cell::from(block) {
            Cell::Air => {
                self.types[idx] = BlockType::Air.ordinal();
                self.metadata[idx] = 0;
            }
            Cell::Occupied(block) => {
                self.types[idx] = block.block_type.ordinal();
                self.metadata[idx] = block.metadata;
                self.block_light[idx] = block.light_level.min(MAX_LIGHT);
                self.sky_light[idx] = block.sky_light.min(MAX_LIGHT);
            }
        }

        self.flags |= ChunkFlags::MODIFIED | ChunkFlags::DIRTY;
        self.revision += 1;

        // Update heightmap
        let col = Self::column(x, z);
        let top = self.height_map[col] as i32;
        if !block.block_type.is_air() {
            if y > top {
                self.height_map[col] = y as i16;
            }
        } else if y == top {
            self.recalculate_height_column(x, z, y - 1);
        }

        true
    }

    /// Clears a cell, returning what was there.
    pub fn remove_block(&mut self, x: i32, y: i32, z: i32) -> Option<Block> {
        let previous = self.get_block(x, y, z)?;
        self.set_block(x, y, z, Block::new(BlockType::Air));
        Some(previous)
    }

    fn recalculate_height_column(&mut self, x: i32, z: i32, start_y: i32) {
        let mut top = EMPTY_COLUMN;
        for y in (0..=start_y.min(CHUNK_HEIGHT as i32 - 1)).rev() {
            if self.types[Self::index(x, y, z)] != BlockType::Air.ordinal() {
                top = y as i16;
                break;
            }
        }
        self.height_map[Self::column(x, z)] = top;
    }

    /// Rebuilds every column of the height map from the cell array.
    pub fn recalculate_height_map(&mut self) {
        for z in 0..CHUNK_DEPTH as i32 {
            for x in 0..CHUNK_WIDTH as i32 {
                self.recalculate_height_column(x, z, CHUNK_HEIGHT as i32 - 1);
            }
        }
    }

    /// Topmost occupied y of a local column, or -1 when empty or out of range.
    pub fn get_height_at(&self, x: i32, z: i32) -> i32 {
        if x < 0 || x >= CHUNK_WIDTH as i32 || z < 0 || z >= CHUNK_DEPTH as i32 {
            return EMPTY_COLUMN as i32;
        }
        self.height_map[Self::column(x, z)] as i32
    }

    pub fn sky_light(&self, x: i32, y: i32, z: i32) -> u8 {
        if !Self::in_bounds(x, y, z) {
            return 0;
        }
        self.sky_light[Self::index(x, y, z)]
    }

    pub fn block_light(&self, x: i32, y: i32, z: i32) -> u8 {
        if !Self::in_bounds(x, y, z) {
            return 0;
        }
        self.block_light[Self::index(x, y, z)]
    }

    pub fn set_sky_light(&mut self, x: i32, y: i32, z: i32, value: u8) {
        if Self::in_bounds(x, y, z) {
            self.sky_light[Self::index(x, y, z)] = value.min(MAX_LIGHT);
        }
    }

    pub fn set_block_light(&mut self, x: i32, y: i32, z: i32, value: u8) {
        if Self::in_bounds(x, y, z) {
            self.block_light[Self::index(x, y, z)] = value.min(MAX_LIGHT);
        }
    }

    /// Brightest of the two light channels.
    pub fn combined_light(&self, x: i32, y: i32, z: i32) -> u8 {
        self.sky_light(x, y, z).max(self.block_light(x, y, z))
    }

    pub(crate) fn clear_block_light(&mut self) {
        self.block_light.fill(0);
    }

    pub fn is_loaded(&self) -> bool {
        self.flags.contains(ChunkFlags::LOADED)
    }

    pub fn is_modified(&self) -> bool {
        self.flags.contains(ChunkFlags::MODIFIED)
    }

    pub fn is_dirty(&self) -> bool {
        self.flags.contains(ChunkFlags::DIRTY)
    }

    pub fn flags(&self) -> ChunkFlags {
        self.flags
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn mark_dirty(&mut self) {
        self.flags |= ChunkFlags::DIRTY;
    }

    pub fn mark_saved(&mut self) {
        self.flags &= !ChunkFlags::MODIFIED;
    }

    /// Freshly generated content matches what the seed reproduces, so it
    /// does not count as modified.
    pub fn finish_generation(&mut self) {
        self.flags = ChunkFlags::LOADED | ChunkFlags::DIRTY;
        self.mesh = None;
    }

    pub fn cached_mesh(&self) -> Option<Arc<ChunkMesh>> {
        if self.is_dirty() {
            None
        } else {
            self.mesh.clone()
        }
    }

    /// Stores a mesh built at `revision`. Ignored if the chunk changed since.
    pub fn store_mesh(&mut self, mesh: Arc<ChunkMesh>, revision: u64) -> bool {
        if revision != self.revision {
            return false;
        }
        self.mesh = Some(mesh);
        self.flags &= !ChunkFlags::DIRTY;
        true
    }

    pub fn is_empty(&self) -> bool {
        self.height_map.iter().all(|h| *h == EMPTY_COLUMN)
    }

    pub fn block_count(&self) -> usize {
        self.types
            .iter()
            .filter(|t| **t != BlockType::Air.ordinal())
            .count()
    }

    pub fn statistics(&self) -> ChunkStatistics {
        let mut block_types = BTreeMap::new();
        for ordinal in self.types.iter() {
            match BlockType::from_u16(*ordinal) {
                Some(BlockType::Air) | None => {}
                Some(ty) => *block_types.entry(ty.name().to_string()).or_insert(0) += 1,
            }
        }
        ChunkStatistics {
            position: self.position,
            block_count: block_types.values().sum(),
            block_types,
            is_modified: self.is_modified(),
            is_dirty: self.is_dirty(),
        }
    }

    /// SHA-256 over the cell types and metadata.
    pub fn content_hash(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        for ordinal in self.types.iter() {
            hasher.update(ordinal.to_le_bytes());
        }
        hasher.update(&self.metadata);
        hasher.finalize().into()
    }

    /// Model matrix placing local coordinates at the chunk's world origin.
    pub fn transform(&self) -> Mat4 {
        Mat4::from_translation(Vec3::new(
            self.position.to_world_x(0) as f32,
            0.0,
            self.position.to_world_z(0) as f32,
        ))
    }

    pub fn generate(&mut self, terrain: &TerrainGenerator) {
        terrain.generate(self);
    }

    /// Random block ticks: grass spreads onto lit dirt and dies under opaque
    /// cover. Returns how many cells changed.
    pub fn tick<R: Rng>(&mut self, rng: &mut R, count: usize) -> usize {
        let mut changed = 0;
        for _ in 0..count {
            let x = rng.gen_range(0..CHUNK_WIDTH as i32);
            let z = rng.gen_range(0..CHUNK_DEPTH as i32);
            let top = self.get_height_at(x, z);
            if top < 0 {
                continue;
            }
            let y = rng.gen_range((top - 3).max(0)..=top);
            let above = self.block_type(x, y + 1, z);

            let replacement = match self.block_type(x, y, z) {
                BlockType::Grass if above.is_opaque() => Some(BlockType::Dirt),
                BlockType::Dirt
                    if !above.is_opaque()
                        && self.sky_light(x, y + 1, z) >= GRASS_SPREAD_LIGHT
                        && self.has_grass_nearby(x, y, z) =>
                {
                    Some(BlockType::Grass)
                }
                _ => None,
            };

            if let Some(block_type) = replacement {
                let metadata = self.metadata[Self::index(x, y, z)];
                self.set_block(x, y, z, Block::new(block_type).with_metadata(metadata));
                changed += 1;
            }
        }
        changed
    }

    fn has_grass_nearby(&self, x: i32, y: i32, z: i32) -> bool {
        for dy in -1..=1 {
            for dz in -1..=1 {
                for dx in -1..=1 {
                    if (dx, dy, dz) != (0, 0, 0)
                        && self.block_type(x + dx, y + dy, z + dz) == BlockType::Grass
                    {
                        return true;
                    }
                }
            }
        }
        false
    }

    /// World positions of the upper blocks of every column whose top block
    /// lies inside the frustum.
    pub fn get_visible_blocks(&self, frustum: &ViewFrustum) -> HashSet<IVec3> {
        let mut visible = HashSet::new();
        for z in 0..CHUNK_DEPTH as i32 {
            for x in 0..CHUNK_WIDTH as i32 {
                let top = self.get_height_at(x, z);
                if top < 0 {
                    continue;
                }
                let world = self.position.to_world(IVec3::new(x, top, z));
                if !frustum.contains_point(world.as_vec3() + Vec3::splat(0.5)) {
                    continue;
                }
                for y in (top - VISIBLE_COLUMN_DEPTH).max(0)..=top {
                    if !self.block_type(x, y, z).is_air() {
                        visible.insert(self.position.to_world(IVec3::new(x, y, z)));
                    }
                }
            }
        }
        visible
    }

    /// Greedy mesh of this chunk alone; cells beyond the border count as air.
    /// With `visible`, only faces of blocks whose world position is in the set
    /// are emitted.
    pub fn build_mesh(&self, visible: Option<&HashSet<IVec3>>) -> ChunkMesh {
        let position = self.position;
        let quads = mesh::greedy_quads(self, |local| match visible {
            Some(set) => set.contains(&position.to_world(local)),
            None => true,
        });
        ChunkMesh::from_quads(&quads)
    }

    /// Per-face vertices for one block, for patching a single edit without a
    /// full greedy sweep.
    pub fn build_block_mesh(&self, x: i32, y: i32, z: i32) -> Vec<f32> {
        mesh::block_face_vertices(self, IVec3::new(x, y, z))
    }

    pub fn save(&self, path: &Path) -> Result<(), StorageError> {
        storage::save_chunk(self, path)
    }

    pub fn load(position: ChunkPosition, path: &Path) -> Result<Self, StorageError> {
        storage::load_chunk(position, path)
    }
}

impl VoxelSource for Chunk {
    fn block_type_at(&self, pos: IVec3) -> BlockType {
        self.block_type(pos.x, pos.y, pos.z)
    }

    fn light_at(&self, pos: IVec3) -> u8 {
        if Self::in_bounds(pos.x, pos.y, pos.z) {
            self.combined_light(pos.x, pos.y, pos.z)
        } else {
            MAX_LIGHT
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorldGenConfig;
    use rand::SeedableRng;
    use rand_chacha::ChaCha12Rng;

    fn stone() -> Block {
        Block::new(BlockType::Stone)
    }

    #[test]
    fn test_chunk_operations() {
        let mut chunk = Chunk::new(ChunkPosition::new(0, 0));
        assert!(chunk.is_empty());

        assert!(chunk.set_block(0, 0, 0, stone().with_metadata(4)));
        let block = chunk.get_block(0, 0, 0).unwrap();
        assert_eq!(block.block_type, BlockType::Stone);
        assert_eq!(block.metadata, 4);
        assert_eq!(chunk.block_count(), 1);
        assert!(chunk.is_modified());
        assert!(chunk.is_dirty());

        assert_eq!(chunk.remove_block(0, 0, 0).map(|b| b.block_type), Some(BlockType::Stone));
        assert!(chunk.get_block(0, 0, 0).is_none());
        assert_eq!(chunk.cell(0, 0, 0), Some(Cell::Air));
        assert_eq!(chunk.block_count(), 0);
    }

    #[test]
    fn test_out_of_range_is_air_and_noop() {
        let mut chunk = Chunk::new(ChunkPosition::new(0, 0));
        chunk.set_block(0, 10, 0, stone());
        let before = chunk.content_hash();

        for (x, y, z) in [(-1, 10, 0), (16, 10, 0), (0, -1, 0), (0, 256, 0), (0, 10, 16)] {
            assert!(chunk.get_block(x, y, z).is_none());
            assert!(chunk.cell(x, y, z).is_none());
            assert!(!chunk.set_block(x, y, z, stone()));
        }
        assert_eq!(chunk.content_hash(), before);
        assert_eq!(chunk.block_count(), 1);
    }

    #[test]
    fn test_heightmap() {
        let mut chunk = Chunk::new(ChunkPosition::new(0, 0));
        assert_eq!(chunk.get_height_at(5, 5), -1);

        chunk.set_block(5, 10, 5, stone());
        chunk.set_block(5, 3, 5, stone());
        assert_eq!(chunk.get_height_at(5, 5), 10);

        chunk.set_block(5, 3, 5, Block::new(BlockType::Air));
        assert_eq!(chunk.get_height_at(5, 5), 10);

        chunk.set_block(5, 7, 5, stone());
        chunk.remove_block(5, 10, 5);
        assert_eq!(chunk.get_height_at(5, 5), 7);

        chunk.remove_block(5, 7, 5);
        assert_eq!(chunk.get_height_at(5, 5), -1);
    }

    #[test]
    fn test_heightmap_matches_rescan() {
        let terrain = TerrainGenerator::new(WorldGenConfig::with_seed(3));
        let mut chunk = Chunk::new(ChunkPosition::new(1, -2));
        chunk.generate(&terrain);
        chunk.remove_block(2, chunk.get_height_at(2, 2), 2);
        chunk.set_block(9, 200, 9, stone());

        let cached: Vec<i32> = (0..16)
            .flat_map(|z| (0..16).map(move |x| (x, z)))
            .map(|(x, z)| chunk.get_height_at(x, z))
            .collect();
        chunk.recalculate_height_map();
        let rescanned: Vec<i32> = (0..16)
            .flat_map(|z| (0..16).map(move |x| (x, z)))
            .map(|(x, z)| chunk.get_height_at(x, z))
            .collect();
        assert_eq!(cached, rescanned);
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let terrain = TerrainGenerator::new(WorldGenConfig::with_seed(11));
        let position = ChunkPosition::new(-1, 3);
        let mut chunk = Chunk::new(position);
        chunk.generate(&terrain);
        chunk.set_block(4, 120, 4, Block::new(BlockType::Torch).with_metadata(2));
        chunk.remove_block(0, chunk.get_height_at(0, 0), 0);
        chunk.set_sky_light(1, 1, 1, 9);

        let path = position.to_path(dir.path());
        chunk.save(&path).unwrap();
        let loaded = Chunk::load(position, &path).unwrap();

        for y in 0..CHUNK_HEIGHT as i32 {
            for z in 0..CHUNK_DEPTH as i32 {
                for x in 0..CHUNK_WIDTH as i32 {
                    assert_eq!(loaded.get_block(x, y, z), chunk.get_block(x, y, z));
                }
            }
        }
        assert_eq!(loaded.height_map(), chunk.height_map());
        assert_eq!(loaded.sky_light(1, 1, 1), 9);
        assert!(loaded.is_loaded());
        assert!(!loaded.is_modified());
    }

    #[test]
    fn test_generated_chunk_is_unmodified() {
        let terrain = TerrainGenerator::new(WorldGenConfig::with_seed(4));
        let mut chunk = Chunk::new(ChunkPosition::new(0, 0));
        chunk.generate(&terrain);
        assert!(chunk.is_loaded());
        assert!(chunk.is_dirty());
        assert!(!chunk.is_modified());
        assert!(!chunk.is_empty());
    }

    #[test]
    fn test_statistics() {
        let mut chunk = Chunk::new(ChunkPosition::new(2, 2));
        chunk.set_block(0, 0, 0, stone());
        chunk.set_block(1, 0, 0, stone());
        chunk.set_block(2, 0, 0, Block::new(BlockType::Glass));
        let stats = chunk.statistics();
        assert_eq!(stats.block_count, 3);
        assert_eq!(stats.block_types.get("stone"), Some(&2));
        assert_eq!(stats.block_types.get("glass"), Some(&1));
        assert!(stats.is_modified);
    }

    #[test]
    fn test_mesh_cache_respects_revision() {
        let mut chunk = Chunk::new(ChunkPosition::new(0, 0));
        chunk.set_block(3, 3, 3, stone());
        let revision = chunk.revision();
        let mesh = Arc::new(chunk.build_mesh(None));

        chunk.set_block(4, 3, 3, stone());
        assert!(!chunk.store_mesh(mesh.clone(), revision));
        assert!(chunk.cached_mesh().is_none());

        let mesh = Arc::new(chunk.build_mesh(None));
        assert!(chunk.store_mesh(mesh, chunk.revision()));
        assert!(!chunk.is_dirty());
        assert!(chunk.cached_mesh().is_some());
    }

    #[test]
    fn test_tick_kills_covered_grass() {
        let mut chunk = Chunk::new(ChunkPosition::new(0, 0));
        for z in 0..16 {
            for x in 0..16 {
                chunk.set_block(x, 0, z, Block::new(BlockType::Grass));
                chunk.set_block(x, 1, z, stone());
            }
        }
        let mut rng = ChaCha12Rng::seed_from_u64(1);
        let mut changed = 0;
        for _ in 0..200 {
            changed += chunk.tick(&mut rng, 3);
        }
        assert!(changed > 0);
        assert!(chunk.statistics().block_types.get("dirt").is_some());
    }

    #[test]
    fn test_tick_spreads_grass_in_light() {
        let mut chunk = Chunk::new(ChunkPosition::new(0, 0));
        for z in 0..16 {
            for x in 0..16 {
                let ty = if x == 0 { BlockType::Grass } else { BlockType::Dirt };
                chunk.set_block(x, 0, z, Block::new(ty));
                chunk.set_sky_light(x, 1, z, 15);
            }
        }
        let mut rng = ChaCha12Rng::seed_from_u64(8);
        for _ in 0..2000 {
            chunk.tick(&mut rng, 3);
        }
        assert_eq!(chunk.block_type(1, 0, 0), BlockType::Grass);
    }

    #[test]
    fn test_transform_offsets_by_chunk() {
        let chunk = Chunk::new(ChunkPosition::new(2, -1));
        let origin = chunk.transform().transform_point3(Vec3::ZERO);
        assert_eq!(origin, Vec3::new(32.0, 0.0, -16.0));
    }
}

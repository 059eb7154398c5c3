use crate::config::{ChunkSysConfig, EngineConfig};
use crate::utils::error::{Result, StorageError};
use crate::utils::math::ViewFrustum;
use crate::world::block::{Block, BlockType};
use crate::world::chunk::{Chunk, CHUNK_DEPTH, CHUNK_HEIGHT, CHUNK_WIDTH};
use crate::world::chunk_coord::ChunkPosition;
use crate::world::generator::TerrainGenerator;
use crate::world::light::LightEngine;
use crate::world::mesh::{greedy_quads, ChunkMesh, ChunkNeighborhood};
use crate::world::pool::{ChunkEvent, ChunkLoader, ChunkProducer, SharedChunk};
use crate::world::storage::{self, WorldMeta};
use glam::{IVec2, IVec3};
use log::{debug, info, warn};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha12Rng;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const DAY_LENGTH: f64 = 24000.0;
/// Game ticks per real second.
pub const TICKS_PER_SECOND: f64 = 20.0;
pub const WEATHER_RAMP_PER_SECOND: f32 = 0.1;
const DAWN_TIME: f64 = 6000.0;
const SPAWN_RANGE: i32 = 1000;

pub type UpdateCallback = Box<dyn FnMut(f64) + Send>;

/// Handle returned by [`World::add_update_callback`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallbackId(u64);

#[derive(Debug, Clone, Serialize)]
pub struct WorldStatistics {
    pub seed: i64,
    pub chunk_count: usize,
    pub time_of_day: f64,
    pub is_day: bool,
    pub is_raining: bool,
    pub is_thundering: bool,
    pub rain_intensity: f32,
    pub thunder_intensity: f32,
    pub block_counts: BTreeMap<String, usize>,
}

/// Spawn column for a seed: two draws in [-1000, 1000] from a ChaCha stream.
pub fn spawn_position_for_seed(seed: i64) -> IVec2 {
    let mut rng = ChaCha12Rng::seed_from_u64(seed as u64);
    let x = rng.gen_range(-SPAWN_RANGE..=SPAWN_RANGE);
    let z = rng.gen_range(-SPAWN_RANGE..=SPAWN_RANGE);
    IVec2::new(x, z)
}

/// Owns every loaded chunk and the global clock/weather state. Chunks are
/// materialized on first access, either from disk or from the seed.
pub struct World {
    seed: i64,
    save_dir: PathBuf,
    chunksys: ChunkSysConfig,
    terrain: Arc<TerrainGenerator>,
    light: LightEngine,
    loader: ChunkLoader,
    spawn: IVec2,
    time_of_day: f64,
    is_raining: bool,
    is_thundering: bool,
    rain_intensity: f32,
    thunder_intensity: f32,
    tick_rng: ChaCha12Rng,
    tick_cursor: usize,
    update_callbacks: Vec<(CallbackId, UpdateCallback)>,
    next_callback_id: u64,
}

impl World {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        fs::create_dir_all(&config.save_dir).map_err(StorageError::from)?;

        let seed = config.worldgen.seed;
        let terrain = Arc::new(TerrainGenerator::new(config.worldgen.clone()));
        let light = LightEngine::new();
        let producer = ChunkProducer::new(terrain.clone(), light, config.save_dir.clone());
        let loader = ChunkLoader::new(producer, config.chunksys.worker_threads)?;

        let mut world = Self {
            seed,
            save_dir: config.save_dir,
            chunksys: config.chunksys,
            terrain,
            light,
            loader,
            spawn: spawn_position_for_seed(seed),
            time_of_day: DAWN_TIME,
            is_raining: false,
            is_thundering: false,
            rain_intensity: 0.0,
            thunder_intensity: 0.0,
            tick_rng: ChaCha12Rng::seed_from_u64((seed as u64).rotate_left(17)),
            tick_cursor: 0,
            update_callbacks: Vec::new(),
            next_callback_id: 0,
        };
        world.restore_meta();

        info!("Opened world with seed {} at {:?}", seed, world.save_dir);
        Ok(world)
    }

    pub fn with_seed(seed: i64, save_dir: impl Into<PathBuf>) -> Result<Self> {
        Self::new(EngineConfig::new(seed, save_dir))
    }

    fn restore_meta(&mut self) {
        match storage::load_meta(&self.save_dir) {
            Ok(Some(meta)) if meta.seed == self.seed => {
                self.time_of_day = meta.time_of_day.rem_euclid(DAY_LENGTH);
                self.is_raining = meta.is_raining;
                self.is_thundering = meta.is_thundering;
                debug!("Restored world metadata from {:?}", self.save_dir);
            }
            Ok(Some(meta)) => warn!(
                "Ignoring world metadata for seed {} (world seed is {})",
                meta.seed, self.seed
            ),
            Ok(None) => {}
            Err(e) => warn!("Could not read world metadata: {}", e),
        }
    }

    pub fn seed(&self) -> i64 {
        self.seed
    }

    pub fn save_dir(&self) -> &Path {
        &self.save_dir
    }

    pub fn terrain(&self) -> &TerrainGenerator {
        &self.terrain
    }

    /// Spawn column `(x, z)`; a pure function of the seed.
    pub fn spawn_position(&self) -> IVec2 {
        self.spawn
    }

    /// First air cell above the generated surface at the spawn column.
    pub fn spawn_point(&self) -> IVec3 {
        let y = self.terrain.surface_height(self.spawn.x, self.spawn.y) + 1;
        IVec3::new(self.spawn.x, y, self.spawn.y)
    }

    /// Loads the square of chunks around spawn on the worker pool and waits
    /// for all of them.
    pub fn generate_spawn_area(&self) -> usize {
        let center = ChunkPosition::from_world(self.spawn.x, self.spawn.y);
        let area = center.square(self.chunksys.spawn_radius);
        for position in &area {
            self.loader.request(*position);
        }
        self.loader.wait_idle();
        info!("Spawn area ready: {} chunks around {}", area.len(), center);
        area.len()
    }

    /// Non-blocking load request. Returns `false` if already loaded or queued.
    pub fn request_chunk(&self, position: ChunkPosition) -> bool {
        self.loader.request(position)
    }

    /// Chunks finished since the last call. Loaded neighbours are dirtied so
    /// their border faces get re-culled.
    pub fn poll_ready(&self) -> Vec<ChunkEvent> {
        let events = self.loader.poll_ready();
        for event in &events {
            self.dirty_neighbors(event.position);
        }
        events
    }

    /// The chunk at `position`, generated or loaded on demand. A chunk
    /// produced here dirties its loaded neighbours like `poll_ready` does.
    pub fn chunk(&self, position: ChunkPosition) -> SharedChunk {
        if let Some(chunk) = self.loader.get(position) {
            return chunk;
        }
        let chunk = self.loader.get_or_produce(position);
        self.dirty_neighbors(position);
        chunk
    }

    fn dirty_neighbors(&self, position: ChunkPosition) {
        for neighbor in position.neighbors() {
            if let Some(chunk) = self.loader.get(neighbor) {
                chunk.write().mark_dirty();
            }
        }
    }

    /// The chunk at `position` only if already loaded.
    pub fn get_chunk(&self, position: ChunkPosition) -> Option<SharedChunk> {
        self.loader.get(position)
    }

    fn in_height_range(y: i32) -> bool {
        (0..CHUNK_HEIGHT as i32).contains(&y)
    }

    pub fn get_block(&self, x: i32, y: i32, z: i32) -> Option<Block> {
        if !Self::in_height_range(y) {
            return None;
        }
        let (position, local) = ChunkPosition::split_world(IVec3::new(x, y, z));
        let block = self.chunk(position).read().get_block(local.x, local.y, local.z);
        block
    }

    /// Writes a block and relights its chunk. Edits on a chunk edge also
    /// materialize and dirty the chunk across that edge.
    pub fn set_block(&self, x: i32, y: i32, z: i32, block: Block) -> bool {
        if !Self::in_height_range(y) {
            return false;
        }
        let (position, local) = ChunkPosition::split_world(IVec3::new(x, y, z));
        let shared = self.chunk(position);
        {
            let mut chunk = shared.write();
            let old_light = chunk.block_light(local.x, local.y, local.z);
            if !chunk.set_block(local.x, local.y, local.z, block) {
                return false;
            }
            self.light
                .update_block(&mut chunk, local.x, local.y, local.z, old_light);
        }

        for neighbor in Self::edge_neighbors(position, local) {
            self.chunk(neighbor).write().mark_dirty();
        }
        true
    }

    fn edge_neighbors(position: ChunkPosition, local: IVec3) -> Vec<ChunkPosition> {
        let mut out = Vec::new();
        if local.x == 0 {
            out.push(position.offset(-1, 0));
        }
        if local.x == CHUNK_WIDTH as i32 - 1 {
            out.push(position.offset(1, 0));
        }
        if local.z == 0 {
            out.push(position.offset(0, -1));
        }
        if local.z == CHUNK_DEPTH as i32 - 1 {
            out.push(position.offset(0, 1));
        }
        out
    }

    /// Clears a cell, returning what was there.
    pub fn remove_block(&self, x: i32, y: i32, z: i32) -> Option<Block> {
        let previous = self.get_block(x, y, z)?;
        self.set_block(x, y, z, Block::new(BlockType::Air));
        Some(previous)
    }

    pub fn get_height_at(&self, x: i32, z: i32) -> i32 {
        let (position, local) = ChunkPosition::split_world(IVec3::new(x, 0, z));
        let height = self.chunk(position).read().get_height_at(local.x, local.z);
        height
    }

    /// No opaque block anywhere above the cell.
    pub fn is_sky_visible(&self, x: i32, y: i32, z: i32) -> bool {
        let (position, local) = ChunkPosition::split_world(IVec3::new(x, y, z));
        let shared = self.chunk(position);
        let chunk = shared.read();
        ((y + 1).max(0)..CHUNK_HEIGHT as i32)
            .all(|cy| !chunk.block_type(local.x, cy, local.z).is_opaque())
    }

    pub fn get_sky_light(&self, x: i32, y: i32, z: i32) -> u8 {
        let (position, local) = ChunkPosition::split_world(IVec3::new(x, y, z));
        let light = self.chunk(position).read().sky_light(local.x, local.y, local.z);
        light
    }

    pub fn get_block_light(&self, x: i32, y: i32, z: i32) -> u8 {
        let (position, local) = ChunkPosition::split_world(IVec3::new(x, y, z));
        let light = self.chunk(position).read().block_light(local.x, local.y, local.z);
        light
    }

    pub fn get_combined_light(&self, x: i32, y: i32, z: i32) -> u8 {
        let (position, local) = ChunkPosition::split_world(IVec3::new(x, y, z));
        let light = self
            .chunk(position)
            .read()
            .combined_light(local.x, local.y, local.z);
        light
    }

    /// Every occupied cell in the cube of half-width `radius` around `center`.
    pub fn get_blocks_in_radius(&self, center: IVec3, radius: i32) -> HashMap<IVec3, Block> {
        let mut blocks = HashMap::new();
        let y_min = (center.y - radius).max(0);
        let y_max = (center.y + radius).min(CHUNK_HEIGHT as i32 - 1);
        for x in center.x - radius..=center.x + radius {
            for z in center.z - radius..=center.z + radius {
                let (position, local) = ChunkPosition::split_world(IVec3::new(x, 0, z));
                let shared = self.chunk(position);
                let chunk = shared.read();
                for y in y_min..=y_max {
                    if let Some(block) = chunk.get_block(local.x, y, local.z) {
                        blocks.insert(IVec3::new(x, y, z), block);
                    }
                }
            }
        }
        blocks
    }

    /// Visible block positions across all loaded chunks.
    pub fn get_all_visible_blocks(&self, frustum: &ViewFrustum) -> HashSet<IVec3> {
        let mut visible = HashSet::new();
        for (_, chunk) in self.loader.loaded() {
            visible.extend(chunk.read().get_visible_blocks(frustum));
        }
        visible
    }

    /// Greedy mesh of a chunk with border faces culled against loaded
    /// neighbours. Cached until the chunk is dirtied.
    pub fn chunk_mesh(&self, position: ChunkPosition) -> Arc<ChunkMesh> {
        let shared = self.chunk(position);
        if let Some(mesh) = shared.read().cached_mesh() {
            return mesh;
        }

        let neighbors = position.neighbors().map(|n| self.loader.get(n));
        let (mesh, revision) = {
            let center = shared.read();
            let guards: Vec<_> = neighbors
                .iter()
                .map(|n| n.as_ref().map(|chunk| chunk.read()))
                .collect();
            let refs: [Option<&Chunk>; 4] = std::array::from_fn(|i| guards[i].as_deref());
            let hood = ChunkNeighborhood::new(&center, refs);
            let quads = greedy_quads(&hood, |_| true);
            (Arc::new(ChunkMesh::from_quads(&quads)), center.revision())
        };

        if shared.write().store_mesh(mesh.clone(), revision) {
            debug!("Meshed chunk {}: {} quads", position, mesh.quad_count);
        }
        mesh
    }

    /// Advances the clock, ramps weather, random-ticks a bounded set of
    /// chunks and runs update callbacks.
    pub fn update(&mut self, dt: f64) {
        self.time_of_day = (self.time_of_day + dt * TICKS_PER_SECOND).rem_euclid(DAY_LENGTH);

        let step = WEATHER_RAMP_PER_SECOND * dt as f32;
        self.rain_intensity = ramp(self.rain_intensity, self.is_raining, step);
        self.thunder_intensity = ramp(self.thunder_intensity, self.is_thundering, step);

        self.tick_chunks();

        for (_, callback) in self.update_callbacks.iter_mut() {
            callback(dt);
        }
    }

    fn tick_chunks(&mut self) {
        let loaded = self.loader.loaded();
        if loaded.is_empty() {
            return;
        }
        let count = self.chunksys.ticked_chunks_per_update.min(loaded.len());
        for i in 0..count {
            let (_, chunk) = &loaded[(self.tick_cursor + i) % loaded.len()];
            chunk
                .write()
                .tick(&mut self.tick_rng, self.chunksys.random_ticks_per_chunk);
        }
        self.tick_cursor = (self.tick_cursor + count) % loaded.len();
    }

    pub fn time_of_day(&self) -> f64 {
        self.time_of_day
    }

    pub fn set_time_of_day(&mut self, time: f64) {
        self.time_of_day = time.rem_euclid(DAY_LENGTH);
    }

    pub fn is_day(&self) -> bool {
        self.time_of_day < 12000.0
    }

    pub fn set_weather(&mut self, raining: bool, thundering: bool) {
        self.is_raining = raining;
        self.is_thundering = thundering;
    }

    pub fn is_raining(&self) -> bool {
        self.is_raining
    }

    pub fn is_thundering(&self) -> bool {
        self.is_thundering
    }

    pub fn rain_intensity(&self) -> f32 {
        self.rain_intensity
    }

    pub fn thunder_intensity(&self) -> f32 {
        self.thunder_intensity
    }

    /// Sky/fog RGBA for the current time of day.
    pub fn time_of_day_color(&self) -> [f32; 4] {
        let time = self.time_of_day as f32;
        if time < 5000.0 {
            let t = time / 5000.0;
            [0.5 + 0.3 * t, 0.7 + 0.2 * t, 0.9 + 0.1 * t, 1.0]
        } else if time < 12000.0 {
            let t = (time - 5000.0) / 7000.0;
            [0.8 - 0.1 * t, 0.9 - 0.1 * t, 1.0, 1.0]
        } else if time < 14000.0 {
            let t = (time - 12000.0) / 2000.0;
            [0.7 - 0.5 * t, 0.8 - 0.6 * t, 0.9 - 0.7 * t, 1.0]
        } else {
            [0.1, 0.1, 0.2, 1.0]
        }
    }

    /// Fog start and end distances.
    pub fn fog_distance(&self) -> (f32, f32) {
        if self.is_raining {
            (20.0, 80.0)
        } else {
            (50.0, 200.0)
        }
    }

    pub fn add_update_callback<F>(&mut self, callback: F) -> CallbackId
    where
        F: FnMut(f64) + Send + 'static,
    {
        let id = CallbackId(self.next_callback_id);
        self.next_callback_id += 1;
        self.update_callbacks.push((id, Box::new(callback)));
        id
    }

    /// Returns `false` if the callback was already removed.
    pub fn remove_update_callback(&mut self, id: CallbackId) -> bool {
        let before = self.update_callbacks.len();
        self.update_callbacks.retain(|(existing, _)| *existing != id);
        self.update_callbacks.len() != before
    }

    pub fn clear_update_callbacks(&mut self) {
        self.update_callbacks.clear();
    }

    /// Writes the chunk if it is loaded and modified. Returns whether a file
    /// was written.
    pub fn save_chunk(&self, position: ChunkPosition) -> Result<bool> {
        let Some(shared) = self.loader.get(position) else {
            return Ok(false);
        };
        let mut chunk = shared.write();
        if !chunk.is_modified() {
            return Ok(false);
        }
        chunk.save(&position.to_path(&self.save_dir))?;
        chunk.mark_saved();
        Ok(true)
    }

    /// Saves every modified chunk plus the world metadata file.
    pub fn save_all(&self) -> Result<usize> {
        let mut saved = 0;
        for position in self.loader.positions() {
            if self.save_chunk(position)? {
                saved += 1;
            }
        }
        storage::save_meta(&self.save_dir, &self.meta())?;
        info!("Saved {} modified chunks to {:?}", saved, self.save_dir);
        Ok(saved)
    }

    fn meta(&self) -> WorldMeta {
        WorldMeta {
            seed: self.seed,
            time_of_day: self.time_of_day,
            is_raining: self.is_raining,
            is_thundering: self.is_thundering,
        }
    }

    /// Saves the chunk if modified, then evicts it. A failed save keeps the
    /// chunk loaded.
    pub fn unload_chunk(&self, position: ChunkPosition) -> Result<bool> {
        self.save_chunk(position)?;
        let removed = self.loader.remove(position).is_some();
        if removed {
            self.terrain.noise().evict_region(
                position.to_world_x(0),
                position.to_world_z(0),
                CHUNK_WIDTH,
                CHUNK_DEPTH,
            );
            debug!("Unloaded chunk {}", position);
        }
        Ok(removed)
    }

    pub fn loaded_chunks(&self) -> Vec<ChunkPosition> {
        self.loader.positions()
    }

    pub fn chunk_count(&self) -> usize {
        self.loader.len()
    }

    pub fn statistics(&self) -> WorldStatistics {
        let mut block_counts = BTreeMap::new();
        for (_, chunk) in self.loader.loaded() {
            for (name, count) in chunk.read().statistics().block_types {
                *block_counts.entry(name).or_insert(0) += count;
            }
        }
        WorldStatistics {
            seed: self.seed,
            chunk_count: self.chunk_count(),
            time_of_day: self.time_of_day,
            is_day: self.is_day(),
            is_raining: self.is_raining,
            is_thundering: self.is_thundering,
            rain_intensity: self.rain_intensity,
            thunder_intensity: self.thunder_intensity,
            block_counts,
        }
    }

    /// Drains in-flight loads, then saves.
    pub fn shutdown(self) -> Result<()> {
        self.loader.wait_idle();
        self.save_all()?;
        info!("World {} shut down", self.seed);
        Ok(())
    }
}

fn ramp(value: f32, rising: bool, step: f32) -> f32 {
    if rising {
        (value + step).min(1.0)
    } else {
        (value - step).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorldGenConfig;
    use glam::{Mat4, Vec3};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn test_world(seed: i64) -> (tempfile::TempDir, World) {
        let dir = tempfile::tempdir().unwrap();
        let world = World::with_seed(seed, dir.path()).unwrap();
        (dir, world)
    }

    #[test]
    fn test_same_seed_same_spawn_and_terrain() {
        let (_a_dir, a) = test_world(7);
        let (_b_dir, b) = test_world(7);
        assert_eq!(a.spawn_position(), b.spawn_position());
        assert_eq!(a.spawn_point(), b.spawn_point());

        let spawn = a.spawn_position();
        let position = ChunkPosition::from_world(spawn.x, spawn.y);
        let hash_a = a.chunk(position).read().content_hash();
        let hash_b = b.chunk(position).read().content_hash();
        assert_eq!(hash_a, hash_b);
    }

    #[test]
    fn test_spawn_in_range() {
        for seed in [0, 1, -5, i64::MAX] {
            let spawn = spawn_position_for_seed(seed);
            assert!((-1000..=1000).contains(&spawn.x));
            assert!((-1000..=1000).contains(&spawn.y));
        }
    }

    #[test]
    fn test_spawn_area() {
        let (_dir, world) = test_world(11);
        assert_eq!(world.generate_spawn_area(), 9);
        assert_eq!(world.chunk_count(), 9);
        assert_eq!(world.poll_ready().len(), 9);

        let spawn = world.spawn_point();
        assert!(world.get_block(spawn.x, spawn.y, spawn.z).is_none());
        assert!(world.get_block(spawn.x, spawn.y - 1, spawn.z).is_some());
        assert!(world.is_sky_visible(spawn.x, spawn.y, spawn.z));
        assert!(!world.is_sky_visible(spawn.x, spawn.y - 3, spawn.z));
        assert_eq!(world.get_sky_light(spawn.x, spawn.y, spawn.z), 15);
    }

    #[test]
    fn test_set_and_get_negative_coordinates() {
        let (_dir, world) = test_world(3);
        assert!(world.set_block(-20, 200, -33, Block::new(BlockType::Glass)));
        assert_eq!(
            world.get_block(-20, 200, -33).map(|b| b.block_type),
            Some(BlockType::Glass)
        );
        assert!(world.get_chunk(ChunkPosition::new(-2, -3)).is_some());

        assert!(world.get_block(0, -1, 0).is_none());
        assert!(world.get_block(0, 256, 0).is_none());
        assert!(!world.set_block(0, 256, 0, Block::new(BlockType::Stone)));

        let removed = world.remove_block(-20, 200, -33).unwrap();
        assert_eq!(removed.block_type, BlockType::Glass);
        assert!(world.get_block(-20, 200, -33).is_none());
    }

    #[test]
    fn test_edge_edit_materializes_neighbor() {
        let (_dir, world) = test_world(5);
        assert!(world.get_chunk(ChunkPosition::new(-1, 0)).is_none());
        world.set_block(0, 150, 5, Block::new(BlockType::Stone));
        let neighbor = world.get_chunk(ChunkPosition::new(-1, 0)).unwrap();
        assert!(neighbor.read().is_dirty());
        assert!(!neighbor.read().is_modified());

        world.set_block(5, 150, 5, Block::new(BlockType::Stone));
        assert_eq!(world.chunk_count(), 2);
    }

    #[test]
    fn test_torch_lights_surroundings() {
        let (_dir, world) = test_world(9);
        world.set_block(5, 200, 5, Block::new(BlockType::Torch));
        assert_eq!(world.get_block_light(5, 200, 5), 14);
        assert_eq!(world.get_block_light(6, 200, 5), 13);
        assert_eq!(world.get_combined_light(6, 200, 5), 15);

        world.remove_block(5, 200, 5);
        assert_eq!(world.get_block_light(6, 200, 5), 0);
    }

    #[test]
    fn test_save_only_modified_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut world = World::with_seed(21, dir.path()).unwrap();
            world.generate_spawn_area();
            assert_eq!(world.save_all().unwrap(), 0);
            assert!(storage::saved_chunks(dir.path()).unwrap().is_empty());

            world.set_block(5, 220, 5, Block::new(BlockType::Bookshelf).with_metadata(3));
            world.set_time_of_day(9000.0);
            world.set_weather(true, false);
            assert_eq!(world.save_all().unwrap(), 1);
            assert_eq!(world.save_all().unwrap(), 0);
            world.shutdown().unwrap();
        }

        assert_eq!(
            storage::saved_chunks(dir.path()).unwrap(),
            vec![ChunkPosition::new(0, 0)]
        );

        let world = World::with_seed(21, dir.path()).unwrap();
        let block = world.get_block(5, 220, 5).unwrap();
        assert_eq!(block.block_type, BlockType::Bookshelf);
        assert_eq!(block.metadata, 3);
        assert_eq!(world.time_of_day(), 9000.0);
        assert!(world.is_raining());
    }

    #[test]
    fn test_corrupt_chunk_is_regenerated() {
        let dir = tempfile::tempdir().unwrap();
        let position = ChunkPosition::new(1, 1);
        fs::write(position.to_path(dir.path()), [1u8, 2, 3]).unwrap();

        let world = World::with_seed(13, dir.path()).unwrap();
        let hash = world.chunk(position).read().content_hash();
        let fresh = TerrainGenerator::new(WorldGenConfig::with_seed(13)).generate_chunk(position);
        assert_eq!(hash, fresh.content_hash());
    }

    #[test]
    fn test_meta_ignored_for_other_seed() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut world = World::with_seed(1, dir.path()).unwrap();
            world.set_time_of_day(100.0);
            world.save_all().unwrap();
        }
        let world = World::with_seed(2, dir.path()).unwrap();
        assert_eq!(world.time_of_day(), DAWN_TIME);
    }

    #[test]
    fn test_update_clock_and_weather() {
        let (_dir, mut world) = test_world(1);
        world.set_time_of_day(23990.0);
        world.update(1.0);
        assert!((world.time_of_day() - 10.0).abs() < 1e-9);
        assert!(world.is_day());

        world.set_weather(true, false);
        world.update(5.0);
        assert!((world.rain_intensity() - 0.5).abs() < 1e-6);
        assert_eq!(world.thunder_intensity(), 0.0);
        world.update(10.0);
        assert_eq!(world.rain_intensity(), 1.0);
        assert_eq!(world.fog_distance(), (20.0, 80.0));

        world.set_weather(false, false);
        world.update(20.0);
        assert_eq!(world.rain_intensity(), 0.0);
        assert_eq!(world.fog_distance(), (50.0, 200.0));
    }

    #[test]
    fn test_time_of_day_color() {
        let (_dir, mut world) = test_world(1);
        world.set_time_of_day(0.0);
        assert_eq!(world.time_of_day_color(), [0.5, 0.7, 0.9, 1.0]);
        world.set_time_of_day(20000.0);
        assert_eq!(world.time_of_day_color(), [0.1, 0.1, 0.2, 1.0]);
        assert!(!world.is_day());
    }

    #[test]
    fn test_update_callbacks() {
        let (_dir, mut world) = test_world(1);
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        world.add_update_callback(move |dt| {
            assert_eq!(dt, 0.5);
            counter.fetch_add(1, Ordering::SeqCst);
        });
        world.update(0.5);
        world.update(0.5);
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        world.clear_update_callbacks();
        world.update(0.5);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_remove_single_callback() {
        let (_dir, mut world) = test_world(1);
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let (a, b) = (first.clone(), second.clone());
        let first_id = world.add_update_callback(move |_| {
            a.fetch_add(1, Ordering::SeqCst);
        });
        let second_id = world.add_update_callback(move |_| {
            b.fetch_add(1, Ordering::SeqCst);
        });
        assert_ne!(first_id, second_id);

        world.update(0.1);
        assert!(world.remove_update_callback(first_id));
        assert!(!world.remove_update_callback(first_id));
        world.update(0.1);

        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_chunk_mesh_cache() {
        let (_dir, world) = test_world(2);
        let position = ChunkPosition::new(0, 0);
        let first = world.chunk_mesh(position);
        assert!(!first.is_empty());
        assert!(Arc::ptr_eq(&first, &world.chunk_mesh(position)));

        world.set_block(5, 230, 5, Block::new(BlockType::Stone));
        let second = world.chunk_mesh(position);
        assert!(!Arc::ptr_eq(&first, &second));
        assert!(second.quad_count > first.quad_count);
    }

    #[test]
    fn test_visible_blocks_respect_frustum() {
        let (_dir, world) = test_world(4);
        world.chunk(ChunkPosition::new(0, -1));
        world.chunk(ChunkPosition::new(0, 1));

        let proj = Mat4::orthographic_rh_gl(-1000.0, 1000.0, -1.0, 300.0, 0.1, 100.0);
        let frustum = ViewFrustum::from_matrix(proj);
        let visible = world.get_all_visible_blocks(&frustum);

        assert!(!visible.is_empty());
        assert!(visible.iter().all(|p| (-16..0).contains(&p.z)));
        assert!(frustum.contains_point(Vec3::new(0.5, 64.5, -8.5)));
    }

    #[test]
    fn test_blocks_in_radius() {
        let (_dir, world) = test_world(6);
        world.set_block(2, 240, 2, Block::new(BlockType::Stone));
        world.set_block(3, 241, 2, Block::new(BlockType::Dirt));
        let blocks = world.get_blocks_in_radius(IVec3::new(2, 240, 2), 1);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[&IVec3::new(3, 241, 2)].block_type, BlockType::Dirt);
    }

    #[test]
    fn test_unload_saves_modified() {
        let (dir, world) = test_world(8);
        let position = ChunkPosition::new(3, 3);
        world.set_block(50, 200, 50, Block::new(BlockType::Stone));
        assert!(world.unload_chunk(position).unwrap());
        assert!(world.get_chunk(position).is_none());
        assert!(position.to_path(dir.path()).exists());
        assert!(!world.unload_chunk(position).unwrap());
    }

    #[test]
    fn test_unload_evicts_noise_columns() {
        let (_dir, world) = test_world(8);
        let position = ChunkPosition::new(-2, 4);
        world.chunk(position);
        let before = world.terrain().noise().cached_columns();
        assert!(world.unload_chunk(position).unwrap());
        let after = world.terrain().noise().cached_columns();
        assert_eq!(before - after, CHUNK_WIDTH * CHUNK_DEPTH);
    }

    #[test]
    fn test_inline_load_dirties_meshed_neighbor() {
        let (_dir, world) = test_world(12);
        let position = ChunkPosition::new(0, 0);
        let first = world.chunk_mesh(position);
        assert!(!world.chunk(position).read().is_dirty());

        world.get_block(CHUNK_WIDTH as i32, 10, 0);
        assert!(world.get_chunk(ChunkPosition::new(1, 0)).is_some());
        assert!(world.chunk(position).read().is_dirty());
        assert!(!Arc::ptr_eq(&first, &world.chunk_mesh(position)));

        let meshed = world.chunk_mesh(position);
        world.get_height_at(0, 0);
        assert!(Arc::ptr_eq(&meshed, &world.chunk_mesh(position)));
    }

    #[test]
    fn test_statistics_serialize() {
        let (_dir, mut world) = test_world(10);
        world.chunk(ChunkPosition::new(0, 0));
        world.update(1.0);
        let stats = world.statistics();
        assert_eq!(stats.seed, 10);
        assert_eq!(stats.chunk_count, 1);
        assert!(stats.block_counts.get("bedrock").copied().unwrap_or(0) >= 16 * 16 * 5);

        let json = serde_json::to_string(&stats).unwrap();
        assert!(json.contains("\"block_counts\""));
    }
}

use crate::world::block::MAX_LIGHT;
use crate::world::chunk::{Chunk, CHUNK_DEPTH, CHUNK_HEIGHT, CHUNK_WIDTH};
use glam::IVec3;
use log::trace;
use std::collections::{HashMap, VecDeque};

const NEIGHBOR_OFFSETS: [IVec3; 6] = [
    IVec3::X,
    IVec3::NEG_X,
    IVec3::Y,
    IVec3::NEG_Y,
    IVec3::Z,
    IVec3::NEG_Z,
];

/// The two stored light values of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Channel {
    Sky,
    Block,
}

impl Channel {
    fn get(self, chunk: &Chunk, pos: IVec3) -> u8 {
        match self {
            Channel::Sky => chunk.sky_light(pos.x, pos.y, pos.z),
            Channel::Block => chunk.block_light(pos.x, pos.y, pos.z),
        }
    }

    fn set(self, chunk: &mut Chunk, pos: IVec3, value: u8) {
        match self {
            Channel::Sky => chunk.set_sky_light(pos.x, pos.y, pos.z, value),
            Channel::Block => chunk.set_block_light(pos.x, pos.y, pos.z, value),
        }
    }
}

/// Straight-down sky light of one column: full strength at the top, minus
/// each block's attenuation, zero from the first opaque block down.
fn column_light(chunk: &Chunk, x: i32, z: i32) -> [u8; CHUNK_HEIGHT] {
    let mut column = [0; CHUNK_HEIGHT];
    let mut light = MAX_LIGHT;
    for y in (0..CHUNK_HEIGHT).rev() {
        let block_type = chunk.block_type(x, y as i32, z);
        if block_type.is_opaque() {
            light = 0;
        } else {
            light = light.saturating_sub(block_type.sky_attenuation());
        }
        column[y] = light;
    }
    column
}

/// Sky and block light propagation within a single chunk. Light does not
/// cross chunk borders.
///
/// Both channels flood sideways and downward through transparent cells,
/// losing one level per step. Sky light is seeded from the straight-down
/// column value of every cell, block light from every emitter.
#[derive(Debug, Clone, Copy, Default)]
pub struct LightEngine;

impl LightEngine {
    pub fn new() -> Self {
        Self
    }

    /// Full recompute of both channels.
    pub fn update_chunk(&self, chunk: &mut Chunk) {
        trace!("Relighting chunk {}", chunk.position());
        let mut sky = VecDeque::new();
        for z in 0..CHUNK_DEPTH as i32 {
            for x in 0..CHUNK_WIDTH as i32 {
                self.compute_sky_column(chunk, x, z);
                for y in 0..CHUNK_HEIGHT as i32 {
                    if chunk.sky_light(x, y, z) > 1 {
                        sky.push_back(IVec3::new(x, y, z));
                    }
                }
            }
        }
        self.propagate(chunk, Channel::Sky, sky);

        chunk.clear_block_light();
        let mut queue = VecDeque::new();
        for y in 0..CHUNK_HEIGHT as i32 {
            for z in 0..CHUNK_DEPTH as i32 {
                for x in 0..CHUNK_WIDTH as i32 {
                    let emission = chunk.block_type(x, y, z).light_emission();
                    if emission > 0 {
                        chunk.set_block_light(x, y, z, emission);
                        queue.push_back(IVec3::new(x, y, z));
                    }
                }
            }
        }
        self.propagate(chunk, Channel::Block, queue);
    }

    /// Writes the straight-down sky light of one column, without any
    /// sideways spread.
    pub fn compute_sky_column(&self, chunk: &mut Chunk, x: i32, z: i32) {
        for (y, light) in column_light(chunk, x, z).into_iter().enumerate() {
            chunk.set_sky_light(x, y as i32, z, light);
        }
    }

    /// Incremental relight after the cell at `(x, y, z)` changed.
    /// `old_block_light` is the block light the cell held before the change.
    pub fn update_block(&self, chunk: &mut Chunk, x: i32, y: i32, z: i32, old_block_light: u8) {
        if !Chunk::in_bounds(x, y, z) {
            return;
        }
        self.relight_sky(chunk, x, y, z);
        self.relight_block(chunk, x, y, z, old_block_light);
    }

    /// The edited cell's column may have gained or lost sky access, so the
    /// whole column is darkened and re-seeded.
    fn relight_sky(&self, chunk: &mut Chunk, x: i32, y: i32, z: i32) {
        let mut columns: HashMap<(i32, i32), [u8; CHUNK_HEIGHT]> = HashMap::new();
        columns.insert((x, z), column_light(chunk, x, z));

        let mut removal = VecDeque::new();
        let mut reseed = Vec::with_capacity(CHUNK_HEIGHT);
        for cy in 0..CHUNK_HEIGHT as i32 {
            let pos = IVec3::new(x, cy, z);
            let old = chunk.sky_light(x, cy, z);
            if old > 0 {
                chunk.set_sky_light(x, cy, z, 0);
                removal.push_back((pos, old));
            }
            reseed.push(pos);
        }

        let (mut relight, removed) = self.unlight(chunk, Channel::Sky, removal);
        for pos in reseed.into_iter().chain(removed) {
            let base = columns
                .entry((pos.x, pos.z))
                .or_insert_with(|| column_light(chunk, pos.x, pos.z))[pos.y as usize];
            if base > chunk.sky_light(pos.x, pos.y, pos.z) {
                chunk.set_sky_light(pos.x, pos.y, pos.z, base);
                relight.push_back(pos);
            }
        }
        self.push_lit_neighbors(chunk, Channel::Sky, IVec3::new(x, y, z), &mut relight);

        self.propagate(chunk, Channel::Sky, relight);
    }

    fn relight_block(&self, chunk: &mut Chunk, x: i32, y: i32, z: i32, old_block_light: u8) {
        let origin = IVec3::new(x, y, z);
        chunk.set_block_light(x, y, z, 0);
        let removal = VecDeque::from([(origin, old_block_light)]);
        let (mut relight, removed) = self.unlight(chunk, Channel::Block, removal);

        for pos in removed.into_iter().chain([origin]) {
            let emission = chunk.block_type(pos.x, pos.y, pos.z).light_emission();
            if emission > 0 {
                chunk.set_block_light(pos.x, pos.y, pos.z, emission);
                relight.push_back(pos);
            }
        }
        self.push_lit_neighbors(chunk, Channel::Block, origin, &mut relight);

        self.propagate(chunk, Channel::Block, relight);
    }

    /// Darkens everything the removal seeds could have lit. Returns the
    /// brighter cells bordering the darkened region, which re-spread into it,
    /// and every cell that was darkened.
    fn unlight(
        &self,
        chunk: &mut Chunk,
        channel: Channel,
        mut removal: VecDeque<(IVec3, u8)>,
    ) -> (VecDeque<IVec3>, Vec<IVec3>) {
        let mut relight = VecDeque::new();
        let mut removed = Vec::new();
        while let Some((pos, level)) = removal.pop_front() {
            for offset in NEIGHBOR_OFFSETS {
                let n = pos + offset;
                if !Chunk::in_bounds(n.x, n.y, n.z) {
                    continue;
                }
                let neighbor_level = channel.get(chunk, n);
                if neighbor_level != 0 && neighbor_level < level {
                    channel.set(chunk, n, 0);
                    removal.push_back((n, neighbor_level));
                    removed.push(n);
                } else if neighbor_level >= level && neighbor_level > 0 {
                    relight.push_back(n);
                }
            }
        }
        (relight, removed)
    }

    fn push_lit_neighbors(
        &self,
        chunk: &Chunk,
        channel: Channel,
        origin: IVec3,
        queue: &mut VecDeque<IVec3>,
    ) {
        for offset in NEIGHBOR_OFFSETS {
            let n = origin + offset;
            if Chunk::in_bounds(n.x, n.y, n.z) && channel.get(chunk, n) > 0 {
                queue.push_back(n);
            }
        }
    }

    /// Breadth-first flood. A neighbor is raised to `level - 1` when it lets
    /// light through and is currently darker than that.
    fn propagate(&self, chunk: &mut Chunk, channel: Channel, mut queue: VecDeque<IVec3>) {
        while let Some(pos) = queue.pop_front() {
            let level = channel.get(chunk, pos);
            if level <= 1 {
                continue;
            }
            for offset in NEIGHBOR_OFFSETS {
                let n = pos + offset;
                if !Chunk::in_bounds(n.x, n.y, n.z) {
                    continue;
                }
                if !chunk.block_type(n.x, n.y, n.z).is_transparent() {
                    continue;
                }
                if channel.get(chunk, n) < level - 1 {
                    channel.set(chunk, n, level - 1);
                    queue.push_back(n);
                }
            }
        }
    }
}

use crate::utils::error::WorldError;
use crate::world::chunk::Chunk;
use crate::world::chunk_coord::ChunkPosition;
use crate::world::generator::TerrainGenerator;
use crate::world::light::LightEngine;
use crossbeam_channel::{unbounded, Receiver, Sender};
use log::{debug, trace, warn};
use parking_lot::{Condvar, Mutex, RwLock};
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

pub type SharedChunk = Arc<RwLock<Chunk>>;

/// Where a produced chunk came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkSource {
    Generated,
    Loaded,
    /// A save file existed but could not be read.
    Regenerated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkEvent {
    pub position: ChunkPosition,
    pub source: ChunkSource,
}

/// Loads a chunk from disk or generates and lights a fresh one.
pub struct ChunkProducer {
    terrain: Arc<TerrainGenerator>,
    light: LightEngine,
    save_dir: PathBuf,
}

impl ChunkProducer {
    pub fn new(terrain: Arc<TerrainGenerator>, light: LightEngine, save_dir: PathBuf) -> Self {
        Self {
            terrain,
            light,
            save_dir,
        }
    }

    pub fn terrain(&self) -> &Arc<TerrainGenerator> {
        &self.terrain
    }

    pub fn produce(&self, position: ChunkPosition) -> (Chunk, ChunkSource) {
        let path = position.to_path(&self.save_dir);
        if path.exists() {
            match Chunk::load(position, &path) {
                Ok(chunk) => return (chunk, ChunkSource::Loaded),
                Err(e) => {
                    warn!("Failed to load chunk {} from {:?}, regenerating: {}", position, path, e);
                    return (self.generate(position), ChunkSource::Regenerated);
                }
            }
        }
        (self.generate(position), ChunkSource::Generated)
    }

    fn generate(&self, position: ChunkPosition) -> Chunk {
        let mut chunk = self.terrain.generate_chunk(position);
        self.light.update_chunk(&mut chunk);
        chunk
    }
}

enum Slot {
    Pending,
    Ready(SharedChunk),
}

enum Lookup {
    Ready(SharedChunk),
    Pending,
    Absent,
}

/// Chunk slots plus a condvar signalled whenever a pending slot resolves.
#[derive(Default)]
struct ChunkMap {
    slots: Mutex<HashMap<ChunkPosition, Slot>>,
    resolved: Condvar,
}

impl ChunkMap {
    fn lookup(slots: &HashMap<ChunkPosition, Slot>, position: &ChunkPosition) -> Lookup {
        match slots.get(position) {
            Some(Slot::Ready(chunk)) => Lookup::Ready(chunk.clone()),
            Some(Slot::Pending) => Lookup::Pending,
            None => Lookup::Absent,
        }
    }

    /// Resolves a pending slot and runs `on_ready` before waiters wake. A slot
    /// dropped while pending stays dropped.
    fn publish<F: FnOnce()>(&self, position: ChunkPosition, chunk: Chunk, on_ready: F) {
        let mut slots = self.slots.lock();
        if let Lookup::Pending = Self::lookup(&slots, &position) {
            Self::fill(&mut slots, position, chunk);
            on_ready();
        }
        drop(slots);
        self.resolved.notify_all();
    }

    /// Fills the slot unless it is already ready, even if it was dropped
    /// while this chunk was being produced.
    fn store(&self, position: ChunkPosition, chunk: Chunk) -> SharedChunk {
        let mut slots = self.slots.lock();
        let result = match Self::lookup(&slots, &position) {
            Lookup::Ready(existing) => existing,
            Lookup::Pending | Lookup::Absent => Self::fill(&mut slots, position, chunk),
        };
        drop(slots);
        self.resolved.notify_all();
        result
    }

    fn fill(
        slots: &mut HashMap<ChunkPosition, Slot>,
        position: ChunkPosition,
        chunk: Chunk,
    ) -> SharedChunk {
        let shared = Arc::new(RwLock::new(chunk));
        slots.insert(position, Slot::Ready(shared.clone()));
        shared
    }
}

/// Produces chunks on a worker pool. Every position is produced at most once
/// while it stays in the map; concurrent requests for the same position share
/// the result.
pub struct ChunkLoader {
    pool: ThreadPool,
    producer: Arc<ChunkProducer>,
    map: Arc<ChunkMap>,
    events_tx: Sender<ChunkEvent>,
    events_rx: Receiver<ChunkEvent>,
}

impl ChunkLoader {
    pub fn new(producer: ChunkProducer, worker_threads: usize) -> Result<Self, WorldError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(worker_threads)
            .thread_name(|i| format!("chunk-worker-{}", i))
            .build()
            .map_err(|e| WorldError::ThreadPool(e.to_string()))?;
        let (events_tx, events_rx) = unbounded();

        Ok(Self {
            pool,
            producer: Arc::new(producer),
            map: Arc::new(ChunkMap::default()),
            events_tx,
            events_rx,
        })
    }

    pub fn producer(&self) -> &ChunkProducer {
        &self.producer
    }

    /// Queues a position for background production. Returns `false` when it
    /// is already loaded or in flight.
    pub fn request(&self, position: ChunkPosition) -> bool {
        {
            let mut slots = self.map.slots.lock();
            if slots.contains_key(&position) {
                return false;
            }
            slots.insert(position, Slot::Pending);
        }

        trace!("Queued chunk {}", position);
        let producer = self.producer.clone();
        let map = self.map.clone();
        let events = self.events_tx.clone();
        self.pool.spawn(move || {
            let (chunk, source) = producer.produce(position);
            map.publish(position, chunk, || {
                // Receiver lives as long as the loader.
                let _ = events.send(ChunkEvent { position, source });
            });
        });
        true
    }

    /// Returns the chunk, producing it on the calling thread if nobody has
    /// started it yet, or waiting for the worker that has.
    pub fn get_or_produce(&self, position: ChunkPosition) -> SharedChunk {
        let mut slots = self.map.slots.lock();
        loop {
            match ChunkMap::lookup(&slots, &position) {
                Lookup::Ready(chunk) => return chunk,
                Lookup::Pending => self.map.resolved.wait(&mut slots),
                Lookup::Absent => break,
            }
        }
        slots.insert(position, Slot::Pending);
        drop(slots);

        let (chunk, source) = self.producer.produce(position);
        debug!("Produced chunk {} inline ({:?})", position, source);
        self.map.store(position, chunk)
    }

    /// Blocks until no request is in flight.
    pub fn wait_idle(&self) {
        let mut slots = self.map.slots.lock();
        while slots.values().any(|slot| matches!(slot, Slot::Pending)) {
            self.map.resolved.wait(&mut slots);
        }
    }

    /// Drains completion events for requests finished since the last call.
    pub fn poll_ready(&self) -> Vec<ChunkEvent> {
        self.events_rx.try_iter().collect()
    }

    pub fn get(&self, position: ChunkPosition) -> Option<SharedChunk> {
        match ChunkMap::lookup(&self.map.slots.lock(), &position) {
            Lookup::Ready(chunk) => Some(chunk),
            _ => None,
        }
    }

    pub fn is_pending(&self, position: ChunkPosition) -> bool {
        matches!(self.map.slots.lock().get(&position), Some(Slot::Pending))
    }

    /// Places a chunk directly, replacing whatever was there.
    pub fn insert(&self, position: ChunkPosition, chunk: Chunk) -> SharedChunk {
        let shared = Arc::new(RwLock::new(chunk));
        self.map
            .slots
            .lock()
            .insert(position, Slot::Ready(shared.clone()));
        self.map.resolved.notify_all();
        shared
    }

    /// Drops a position. A pending request is abandoned and its result
    /// discarded.
    pub fn remove(&self, position: ChunkPosition) -> Option<SharedChunk> {
        let removed = self.map.slots.lock().remove(&position);
        self.map.resolved.notify_all();
        match removed {
            Some(Slot::Ready(chunk)) => Some(chunk),
            _ => None,
        }
    }

    /// Loaded positions in sorted order.
    pub fn positions(&self) -> Vec<ChunkPosition> {
        let mut positions: Vec<_> = self
            .map
            .slots
            .lock()
            .iter()
            .filter(|(_, slot)| matches!(slot, Slot::Ready(_)))
            .map(|(position, _)| *position)
            .collect();
        positions.sort();
        positions
    }

    /// Snapshot of every loaded chunk handle, sorted by position.
    pub fn loaded(&self) -> Vec<(ChunkPosition, SharedChunk)> {
        let mut chunks: Vec<_> = self
            .map
            .slots
            .lock()
            .iter()
            .filter_map(|(position, slot)| match slot {
                Slot::Ready(chunk) => Some((*position, chunk.clone())),
                Slot::Pending => None,
            })
            .collect();
        chunks.sort_by_key(|(position, _)| *position);
        chunks
    }

    pub fn len(&self) -> usize {
        self.map
            .slots
            .lock()
            .values()
            .filter(|slot| matches!(slot, Slot::Ready(_)))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn pending_count(&self) -> usize {
        self.map
            .slots
            .lock()
            .values()
            .filter(|slot| matches!(slot, Slot::Pending))
            .count()
    }
}

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkSysConfig {
    pub worker_threads: usize,
    pub ticked_chunks_per_update: usize,
    pub random_ticks_per_chunk: usize,
    pub spawn_radius: i32,
}

impl Default for ChunkSysConfig {
    fn default() -> Self {
        Self {
            worker_threads: 4,
            ticked_chunks_per_update: 10,
            random_ticks_per_chunk: 3,
            spawn_radius: 1,
        }
    }
}

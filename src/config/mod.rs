pub mod chunksys;
pub mod core;
pub mod worldgen;

pub use self::chunksys::ChunkSysConfig;
pub use self::core::{default_save_dir, EngineConfig};
pub use self::worldgen::WorldGenConfig;

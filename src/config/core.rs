use crate::config::chunksys::ChunkSysConfig;
use crate::config::worldgen::WorldGenConfig;
use crate::utils::error::ConfigError;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub save_dir: PathBuf,
    pub worldgen: WorldGenConfig,
    pub chunksys: ChunkSysConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            save_dir: default_save_dir(),
            worldgen: WorldGenConfig::default(),
            chunksys: ChunkSysConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn new(seed: i64, save_dir: impl Into<PathBuf>) -> Self {
        Self {
            save_dir: save_dir.into(),
            worldgen: WorldGenConfig::with_seed(seed),
            chunksys: ChunkSysConfig::default(),
        }
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunksys.worker_threads == 0 {
            return Err(ConfigError::Invalid("worker_threads must be at least 1".into()));
        }
        if self.chunksys.spawn_radius < 0 {
            return Err(ConfigError::Invalid("spawn_radius must not be negative".into()));
        }
        if !(0.0..=1.0).contains(&self.worldgen.cave_threshold) {
            return Err(ConfigError::Invalid("cave_threshold must lie in [0, 1]".into()));
        }
        Ok(())
    }
}

/// Per-user data directory, or `./world` when the platform has none.
pub fn default_save_dir() -> PathBuf {
    ProjectDirs::from("com", "bloksel", "Bloksel")
        .map(|dirs| dirs.data_dir().join("world"))
        .unwrap_or_else(|| PathBuf::from("world"))
}

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldGenConfig {
    // World Generation
    pub seed: i64,
    pub carve_caves: bool,
    pub cave_threshold: f64,
}

impl Default for WorldGenConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            carve_caves: false,
            cave_threshold: 0.7,
        }
    }
}

impl WorldGenConfig {
    pub fn with_seed(seed: i64) -> Self {
        Self {
            seed,
            ..Default::default()
        }
    }
}

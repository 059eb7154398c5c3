pub mod noise;
pub mod terrain;

pub use self::noise::{Biome, NoiseGenerator};
pub use self::terrain::TerrainGenerator;

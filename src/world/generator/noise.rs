use noise::{Fbm, MultiFractal, NoiseFn, Perlin};
use parking_lot::RwLock;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const BASE_HEIGHT: f64 = 64.0;
const HEIGHT_AMPLITUDE: f64 = 32.0;
const HEIGHT_SCALE: f64 = 200.0;
const BIOME_SCALE: f64 = 400.0;
const CAVE_SCALE: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Biome {
    Snow,
    Taiga,
    Plains,
    Desert,
    Jungle,
    Forest,
}

/// Classic 3-D gradient noise over a seeded, duplicated 256-entry permutation table.
#[derive(Clone)]
pub struct GradientNoise {
    perm: [u8; 512],
}

impl GradientNoise {
    pub fn new(seed: i64) -> Self {
        let mut table: Vec<u8> = (0..=255).collect();
        let mut rng = ChaCha12Rng::seed_from_u64(seed as u64);
        table.shuffle(&mut rng);

        let mut perm = [0u8; 512];
        for (i, slot) in perm.iter_mut().enumerate() {
            *slot = table[i & 255];
        }
        Self { perm }
    }

    #[inline]
    fn p(&self, i: usize) -> usize {
        self.perm[i] as usize
    }

    /// Value in [-1, 1].
    pub fn noise3(&self, x: f64, y: f64, z: f64) -> f64 {
        let (xf, yf, zf) = (x.floor(), y.floor(), z.floor());
        let xi = (xf as i64 & 255) as usize;
        let yi = (yf as i64 & 255) as usize;
        let zi = (zf as i64 & 255) as usize;

        let (x, y, z) = (x - xf, y - yf, z - zf);
        let (u, v, w) = (fade(x), fade(y), fade(z));

        let a = self.p(xi) + yi;
        let aa = self.p(a) + zi;
        let ab = self.p(a + 1) + zi;
        let b = self.p(xi + 1) + yi;
        let ba = self.p(b) + zi;
        let bb = self.p(b + 1) + zi;

        let value = lerp(
            lerp(
                lerp(grad(self.p(aa), x, y, z), grad(self.p(ba), x - 1.0, y, z), u),
                lerp(
                    grad(self.p(ab), x, y - 1.0, z),
                    grad(self.p(bb), x - 1.0, y - 1.0, z),
                    u,
                ),
                v,
            ),
            lerp(
                lerp(
                    grad(self.p(aa + 1), x, y, z - 1.0),
                    grad(self.p(ba + 1), x - 1.0, y, z - 1.0),
                    u,
                ),
                lerp(
                    grad(self.p(ab + 1), x, y - 1.0, z - 1.0),
                    grad(self.p(bb + 1), x - 1.0, y - 1.0, z - 1.0),
                    u,
                ),
                v,
            ),
            w,
        );
        value.clamp(-1.0, 1.0)
    }
}

impl NoiseFn<f64, 3> for GradientNoise {
    fn get(&self, point: [f64; 3]) -> f64 {
        self.noise3(point[0], point[1], point[2])
    }
}

impl NoiseFn<f64, 2> for GradientNoise {
    fn get(&self, point: [f64; 2]) -> f64 {
        self.noise3(point[0], point[1], 0.0)
    }
}

#[inline]
fn fade(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + t * (b - a)
}

#[inline]
fn grad(hash: usize, x: f64, y: f64, z: f64) -> f64 {
    let h = hash & 15;
    let u = if h < 8 { x } else { y };
    let v = if h < 4 {
        y
    } else if h == 12 || h == 14 {
        x
    } else {
        z
    };
    (if h & 1 == 0 { u } else { -u }) + (if h & 2 == 0 { v } else { -v })
}

/// Amplitude-normalized multi-octave sum over any `noise` source.
pub fn fbm<N: NoiseFn<f64, 3>>(
    source: &N,
    point: [f64; 3],
    octaves: u32,
    lacunarity: f64,
    persistence: f64,
) -> f64 {
    let mut total = 0.0;
    let mut amplitude = 1.0;
    let mut frequency = 1.0;
    let mut max_value = 0.0;

    for _ in 0..octaves {
        total += source.get([
            point[0] * frequency,
            point[1] * frequency,
            point[2] * frequency,
        ]) * amplitude;
        max_value += amplitude;
        amplitude *= persistence;
        frequency *= lacunarity;
    }

    if max_value == 0.0 {
        0.0
    } else {
        total / max_value
    }
}

/// Multi-octave ridged noise, each octave shaped as `(1 - |n|)^2`.
pub fn ridge<N: NoiseFn<f64, 3>>(
    source: &N,
    point: [f64; 3],
    octaves: u32,
    lacunarity: f64,
    persistence: f64,
) -> f64 {
    let mut total = 0.0;
    let mut amplitude = 1.0;
    let mut frequency = 1.0;
    let mut max_value = 0.0;

    for _ in 0..octaves {
        let n = source.get([
            point[0] * frequency,
            point[1] * frequency,
            point[2] * frequency,
        ]);
        let shaped = 1.0 - n.abs();
        total += shaped * shaped * amplitude;
        max_value += amplitude;
        amplitude *= persistence;
        frequency *= lacunarity;
    }

    if max_value == 0.0 {
        0.0
    } else {
        total / max_value
    }
}

/// Seeded terrain fields. Height and biome lookups are memoized per column and
/// the caches are safe to share between generation workers.
pub struct NoiseGenerator {
    seed: i64,
    gradient: GradientNoise,
    caves: Fbm<Perlin>,
    height_cache: RwLock<HashMap<(i32, i32), i32>>,
    biome_cache: RwLock<HashMap<(i32, i32), Biome>>,
}

impl NoiseGenerator {
    pub fn new(seed: i64) -> Self {
        let folded = (seed as u64 ^ (seed as u64 >> 32)) as u32;
        Self {
            seed,
            gradient: GradientNoise::new(seed),
            caves: Fbm::<Perlin>::new(folded)
                .set_octaves(3)
                .set_frequency(1.0)
                .set_persistence(0.5)
                .set_lacunarity(2.0),
            height_cache: RwLock::new(HashMap::new()),
            biome_cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn seed(&self) -> i64 {
        self.seed
    }

    pub fn noise3(&self, x: f64, y: f64, z: f64) -> f64 {
        self.gradient.noise3(x, y, z)
    }

    pub fn fbm(
        &self,
        x: f64,
        y: f64,
        z: f64,
        octaves: u32,
        lacunarity: f64,
        persistence: f64,
    ) -> f64 {
        fbm(&self.gradient, [x, y, z], octaves, lacunarity, persistence)
    }

    pub fn ridge_noise(
        &self,
        x: f64,
        y: f64,
        z: f64,
        octaves: u32,
        lacunarity: f64,
        persistence: f64,
    ) -> f64 {
        ridge(&self.gradient, [x, y, z], octaves, lacunarity, persistence)
    }

    /// Surface elevation of world column `(x, z)`.
    pub fn get_height(&self, x: i32, z: i32) -> i32 {
        if let Some(height) = self.height_cache.read().get(&(x, z)) {
            return *height;
        }

        let nx = x as f64 / HEIGHT_SCALE;
        let nz = z as f64 / HEIGHT_SCALE;

        let mut h = self.fbm(nx, nz, 0.0, 4, 2.0, 0.5);
        h += 0.5 * self.fbm(nx * 4.0, nz * 4.0, 0.0, 3, 2.0, 0.5);
        h += self.ridge_noise(nx * 2.0, nz * 2.0, 0.0, 2, 2.0, 0.5) * 0.3;

        let height = (BASE_HEIGHT + h * HEIGHT_AMPLITUDE) as i32;
        self.height_cache.write().insert((x, z), height);
        height
    }

    pub fn get_biome(&self, x: i32, z: i32) -> Biome {
        if let Some(biome) = self.biome_cache.read().get(&(x, z)) {
            return *biome;
        }

        let nx = x as f64 / BIOME_SCALE;
        let nz = z as f64 / BIOME_SCALE;
        let temperature = self.fbm(nx, nz, 0.0, 2, 2.0, 0.5);
        let humidity = self.fbm(nx + 100.0, nz + 100.0, 0.0, 2, 2.0, 0.5);

        let biome = classify_biome(temperature, humidity);
        self.biome_cache.write().insert((x, z), biome);
        biome
    }

    /// Cheap integer hash noise in [-0.5, 0.5].
    pub fn fast_noise(&self, x: i32, y: i32, z: i32) -> f64 {
        let mut n = (x as i64)
            .wrapping_mul(374_761_393)
            .wrapping_add((y as i64).wrapping_mul(668_265_263))
            .wrapping_add((z as i64).wrapping_mul(1_274_126_177))
            .wrapping_add(self.seed.wrapping_mul(1_013_904_223));
        n = (n ^ (n >> 13)).wrapping_mul(1_274_126_177);
        (n & 0x7FFF_FFFF) as f64 / 0x7FFF_FFFF as f64 - 0.5
    }

    pub fn get_cave_noise(&self, x: i32, y: i32, z: i32) -> f64 {
        self.caves.get([
            x as f64 / CAVE_SCALE,
            y as f64 / CAVE_SCALE,
            z as f64 / CAVE_SCALE,
        ])
    }

    /// Heights for a `width x depth` region, row-major by x then z.
    pub fn generate_height_map(&self, start_x: i32, start_z: i32, width: usize, depth: usize) -> Vec<i32> {
        let mut out = Vec::with_capacity(width * depth);
        for dx in 0..width as i32 {
            for dz in 0..depth as i32 {
                out.push(self.get_height(start_x + dx, start_z + dz));
            }
        }
        out
    }

    pub fn generate_biome_map(&self, start_x: i32, start_z: i32, width: usize, depth: usize) -> Vec<Biome> {
        let mut out = Vec::with_capacity(width * depth);
        for dx in 0..width as i32 {
            for dz in 0..depth as i32 {
                out.push(self.get_biome(start_x + dx, start_z + dz));
            }
        }
        out
    }

    pub fn cached_columns(&self) -> usize {
        self.height_cache.read().len()
    }

    /// Forgets the cached columns of a `width x depth` region, typically a
    /// chunk that was unloaded.
    pub fn evict_region(&self, start_x: i32, start_z: i32, width: usize, depth: usize) {
        let inside = |&(x, z): &(i32, i32)| {
            (start_x..start_x + width as i32).contains(&x)
                && (start_z..start_z + depth as i32).contains(&z)
        };
        self.height_cache.write().retain(|column, _| !inside(column));
        self.biome_cache.write().retain(|column, _| !inside(column));
    }

    pub fn clear_cache(&self) {
        self.height_cache.write().clear();
        self.biome_cache.write().clear();
    }
}

fn classify_biome(temperature: f64, humidity: f64) -> Biome {
    if temperature < -0.3 {
        Biome::Snow
    } else if temperature < 0.1 {
        if humidity < -0.2 {
            Biome::Taiga
        } else {
            Biome::Plains
        }
    } else if temperature < 0.4 {
        if humidity < -0.3 {
            Biome::Desert
        } else if humidity > 0.3 {
            Biome::Jungle
        } else {
            Biome::Forest
        }
    } else {
        Biome::Desert
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noise_range_and_determinism() {
        let a = GradientNoise::new(1234);
        let b = GradientNoise::new(1234);
        for i in 0..200 {
            let (x, y, z) = (i as f64 * 0.37 - 20.0, i as f64 * 0.11, -(i as f64) * 0.53);
            let v = a.noise3(x, y, z);
            assert!((-1.0..=1.0).contains(&v));
            assert_eq!(v.to_bits(), b.noise3(x, y, z).to_bits());
        }
    }

    #[test]
    fn test_noise_zero_on_lattice() {
        let n = GradientNoise::new(9);
        assert_eq!(n.noise3(3.0, -7.0, 11.0), 0.0);
    }

    #[test]
    fn test_height_deterministic() {
        let gen = NoiseGenerator::new(42);
        for (x, z) in [(0, 0), (8, 8), (-300, 17), (1000, -1000)] {
            let first = gen.get_height(x, z);
            assert_eq!(first, gen.get_height(x, z));
            assert_eq!(first, NoiseGenerator::new(42).get_height(x, z));
        }
    }

    #[test]
    fn test_height_cached() {
        let gen = NoiseGenerator::new(5);
        gen.get_height(1, 2);
        gen.get_height(1, 2);
        gen.get_height(3, 4);
        assert_eq!(gen.cached_columns(), 2);
        gen.clear_cache();
        assert_eq!(gen.cached_columns(), 0);
    }

    #[test]
    fn test_evict_region() {
        let gen = NoiseGenerator::new(5);
        gen.generate_height_map(0, 0, 4, 4);
        gen.generate_biome_map(0, 0, 4, 4);
        gen.get_height(10, 10);
        assert_eq!(gen.cached_columns(), 17);

        gen.evict_region(0, 0, 2, 4);
        assert_eq!(gen.cached_columns(), 9);
        assert_eq!(gen.biome_cache.read().len(), 8);
        let height = gen.get_height(0, 0);
        assert_eq!(height, NoiseGenerator::new(5).get_height(0, 0));
    }

    #[test]
    fn test_different_seeds_differ() {
        let a = NoiseGenerator::new(1);
        let b = NoiseGenerator::new(2);
        let differing = (0..64)
            .filter(|i| {
                let (x, z) = (i * 37 - 1000, i * 53 + 200);
                a.get_height(x, z) != b.get_height(x, z)
            })
            .count();
        assert!(differing > 16, "only {} of 64 columns differ", differing);
    }

    #[test]
    fn test_fbm_normalized() {
        let gen = NoiseGenerator::new(77);
        for i in 0..100 {
            let v = gen.fbm(i as f64 * 0.7, i as f64 * 0.3, 0.0, 5, 2.0, 0.5);
            assert!((-1.0..=1.0).contains(&v));
            let r = gen.ridge_noise(i as f64 * 0.7, i as f64 * 0.3, 0.0, 2, 2.0, 0.5);
            assert!((0.0..=1.0).contains(&r));
        }
        assert_eq!(gen.fbm(0.5, 0.5, 0.5, 0, 2.0, 0.5), 0.0);
    }

    #[test]
    fn test_biome_thresholds() {
        assert_eq!(classify_biome(-0.5, 0.0), Biome::Snow);
        assert_eq!(classify_biome(0.0, -0.5), Biome::Taiga);
        assert_eq!(classify_biome(0.0, 0.0), Biome::Plains);
        assert_eq!(classify_biome(0.2, -0.4), Biome::Desert);
        assert_eq!(classify_biome(0.2, 0.4), Biome::Jungle);
        assert_eq!(classify_biome(0.2, 0.0), Biome::Forest);
        assert_eq!(classify_biome(0.9, 0.9), Biome::Desert);
    }

    #[test]
    fn test_fast_noise_range() {
        let gen = NoiseGenerator::new(3);
        for i in -50..50 {
            let v = gen.fast_noise(i, i * 7, -i * 3);
            assert!((-0.5..=0.5).contains(&v));
        }
        assert_eq!(gen.fast_noise(4, 5, 6), NoiseGenerator::new(3).fast_noise(4, 5, 6));
    }

    #[test]
    fn test_region_maps() {
        let gen = NoiseGenerator::new(11);
        let heights = gen.generate_height_map(-4, 4, 3, 2);
        assert_eq!(heights.len(), 6);
        assert_eq!(heights[0], gen.get_height(-4, 4));
        assert_eq!(heights[5], gen.get_height(-2, 5));
        assert_eq!(gen.generate_biome_map(0, 0, 2, 2).len(), 4);
    }
}

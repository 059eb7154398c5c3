use crate::world::chunk::{CHUNK_DEPTH, CHUNK_WIDTH};
use glam::{IVec2, IVec3};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::path::{Path, PathBuf};

/// Column coordinate of a chunk in the horizontal chunk grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ChunkPosition(pub IVec2);

impl Serialize for ChunkPosition {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (self.0.x, self.0.y).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ChunkPosition {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (x, z) = <(i32, i32)>::deserialize(deserializer)?;
        Ok(ChunkPosition::new(x, z))
    }
}

impl PartialOrd for ChunkPosition {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ChunkPosition {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.0.x.cmp(&other.0.x) {
            Ordering::Equal => self.0.y.cmp(&other.0.y),
            ord => ord,
        }
    }
}

impl fmt::Display for ChunkPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x(), self.z())
    }
}

impl ChunkPosition {
    pub fn new(x: i32, z: i32) -> Self {
        Self(IVec2::new(x, z))
    }

    /// Chunk containing world column `(wx, wz)`. Floors toward negative infinity.
    pub fn from_world(wx: i32, wz: i32) -> Self {
        Self::new(
            wx.div_euclid(CHUNK_WIDTH as i32),
            wz.div_euclid(CHUNK_DEPTH as i32),
        )
    }

    /// Splits a world position into its chunk and the chunk-local position.
    pub fn split_world(pos: IVec3) -> (Self, IVec3) {
        let chunk = Self::from_world(pos.x, pos.z);
        let local = IVec3::new(
            pos.x.rem_euclid(CHUNK_WIDTH as i32),
            pos.y,
            pos.z.rem_euclid(CHUNK_DEPTH as i32),
        );
        (chunk, local)
    }

    pub fn x(&self) -> i32 {
        self.0.x
    }

    pub fn z(&self) -> i32 {
        self.0.y
    }

    pub fn to_world_x(&self, local_x: i32) -> i32 {
        self.0.x * CHUNK_WIDTH as i32 + local_x
    }

    pub fn to_world_z(&self, local_z: i32) -> i32 {
        self.0.y * CHUNK_DEPTH as i32 + local_z
    }

    pub fn to_world(&self, local: IVec3) -> IVec3 {
        IVec3::new(self.to_world_x(local.x), local.y, self.to_world_z(local.z))
    }

    pub fn offset(&self, dx: i32, dz: i32) -> Self {
        Self(self.0 + IVec2::new(dx, dz))
    }

    pub fn file_name(&self) -> String {
        format!("chunk_{}_{}.bin", self.0.x, self.0.y)
    }

    pub fn to_path(&self, dir: &Path) -> PathBuf {
        dir.join(self.file_name())
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        let file_name = path.file_name()?.to_str()?;
        let coords = file_name.strip_prefix("chunk_")?.strip_suffix(".bin")?;
        let (x, z) = coords.split_once('_')?;
        Some(Self::new(x.parse().ok()?, z.parse().ok()?))
    }

    /// The four edge-sharing neighbours: +x, -x, +z, -z.
    pub fn neighbors(&self) -> [Self; 4] {
        [
            self.offset(1, 0),
            self.offset(-1, 0),
            self.offset(0, 1),
            self.offset(0, -1),
        ]
    }

    /// Every position in the square of half-width `radius` around this one.
    pub fn square(&self, radius: i32) -> Vec<Self> {
        let side = (2 * radius + 1).max(0) as usize;
        let mut out = Vec::with_capacity(side * side);
        for dx in -radius..=radius {
            for dz in -radius..=radius {
                out.push(self.offset(dx, dz));
            }
        }
        out
    }

    pub fn manhattan_distance(&self, other: &Self) -> i32 {
        (self.0.x - other.0.x).abs() + (self.0.y - other.0.y).abs()
    }
}

impl From<IVec2> for ChunkPosition {
    fn from(vec: IVec2) -> Self {
        Self(vec)
    }
}

impl From<ChunkPosition> for IVec2 {
    fn from(pos: ChunkPosition) -> Self {
        pos.0
    }
}

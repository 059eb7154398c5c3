//! Chunk meshing: greedy quad merging plus a per-face path for single blocks.
//!
//! Vertices are 7 floats, `[x, y, z, u, v, texture_id, light]`, six per quad
//! (two counter-clockwise triangles seen from outside). UVs count whole
//! blocks so a merged quad repeats its tile; the shader wraps them inside the
//! atlas tile at [`atlas_offset`].
use crate::world::block::{BlockFace, BlockType, MAX_LIGHT};
use crate::world::chunk::{Chunk, CHUNK_DEPTH, CHUNK_HEIGHT, CHUNK_WIDTH};
use glam::{IVec3, Vec3};

pub const FLOATS_PER_VERTEX: usize = 7;
pub const VERTICES_PER_QUAD: usize = 6;
pub const ATLAS_TILES_PER_ROW: u16 = 16;

const DIMS: [i32; 3] = [CHUNK_WIDTH as i32, CHUNK_HEIGHT as i32, CHUNK_DEPTH as i32];

/// Read access to voxels around a chunk. Coordinates are chunk-local and may
/// fall outside the chunk.
pub trait VoxelSource {
    fn block_type_at(&self, pos: IVec3) -> BlockType;
    fn light_at(&self, pos: IVec3) -> u8;
}

/// A chunk together with whichever of its four edge neighbours are loaded.
/// Missing neighbours read as air at full light.
pub struct ChunkNeighborhood<'a> {
    center: &'a Chunk,
    /// Ordered +x, -x, +z, -z.
    neighbors: [Option<&'a Chunk>; 4],
}

impl<'a> ChunkNeighborhood<'a> {
    pub fn new(center: &'a Chunk, neighbors: [Option<&'a Chunk>; 4]) -> Self {
        Self { center, neighbors }
    }

    fn resolve(&self, pos: IVec3) -> Option<(&'a Chunk, IVec3)> {
        if pos.y < 0 || pos.y >= DIMS[1] {
            return None;
        }
        let (w, d) = (DIMS[0], DIMS[2]);
        match (pos.x, pos.z) {
            (x, z) if (0..w).contains(&x) && (0..d).contains(&z) => Some((self.center, pos)),
            (x, z) if x >= w && (0..d).contains(&z) => {
                self.neighbors[0].map(|c| (c, pos - IVec3::new(w, 0, 0)))
            }
            (x, z) if x < 0 && (0..d).contains(&z) => {
                self.neighbors[1].map(|c| (c, pos + IVec3::new(w, 0, 0)))
            }
            (x, z) if z >= d && (0..w).contains(&x) => {
                self.neighbors[2].map(|c| (c, pos - IVec3::new(0, 0, d)))
            }
            (x, z) if z < 0 && (0..w).contains(&x) => {
                self.neighbors[3].map(|c| (c, pos + IVec3::new(0, 0, d)))
            }
            _ => None,
        }
    }
}

impl VoxelSource for ChunkNeighborhood<'_> {
    fn block_type_at(&self, pos: IVec3) -> BlockType {
        match self.resolve(pos) {
            Some((chunk, local)) => chunk.block_type(local.x, local.y, local.z),
            None => BlockType::Air,
        }
    }

    fn light_at(&self, pos: IVec3) -> u8 {
        match self.resolve(pos) {
            Some((chunk, local)) => chunk.combined_light(local.x, local.y, local.z),
            None => MAX_LIGHT,
        }
    }
}

/// `owner` shows a face toward `other`: it is not air, and the other side is
/// air or a see-through block next to an opaque one.
#[inline]
pub fn face_between(owner: BlockType, other: BlockType) -> bool {
    !owner.is_air() && (other.is_air() || (owner.is_opaque() && !other.is_opaque()))
}

/// Top-left UV of a texture's tile in a 16x16 atlas.
pub fn atlas_offset(texture_id: u16) -> [f32; 2] {
    let tile = 1.0 / ATLAS_TILES_PER_ROW as f32;
    [
        (texture_id % ATLAS_TILES_PER_ROW) as f32 * tile,
        (texture_id / ATLAS_TILES_PER_ROW) as f32 * tile,
    ]
}

/// One rectangle of coplanar faces sharing type and light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quad {
    /// 0 = x, 1 = y, 2 = z.
    pub axis: usize,
    pub positive: bool,
    /// Lowest corner, lying on the face plane.
    pub origin: IVec3,
    /// Extent along `(axis + 1) % 3`.
    pub width: i32,
    /// Extent along `(axis + 2) % 3`.
    pub height: i32,
    pub block_type: BlockType,
    /// Light of the cells the face looks into.
    pub light: u8,
}

impl Quad {
    pub fn face(&self) -> BlockFace {
        BlockFace::from_axis(self.axis, self.positive)
    }

    pub fn texture(&self) -> u16 {
        self.block_type.texture(self.face())
    }

    /// Corners counter-clockwise as seen from the side the face points to.
    pub fn corners(&self) -> [Vec3; 4] {
        let mut du = [0; 3];
        let mut dv = [0; 3];
        du[(self.axis + 1) % 3] = self.width;
        dv[(self.axis + 2) % 3] = self.height;
        let (du, dv) = (IVec3::from_array(du), IVec3::from_array(dv));

        let p0 = self.origin;
        let corners = [p0, p0 + du, p0 + du + dv, p0 + dv].map(|p| p.as_vec3());
        if self.positive {
            corners
        } else {
            [corners[0], corners[3], corners[2], corners[1]]
        }
    }

    /// Repeating UVs in block units. With `atlas` set the face is mapped
    /// into its tile of the texture atlas instead.
    fn push_vertices(&self, out: &mut Vec<f32>, atlas: bool) {
        let corners = self.corners();
        let (w, h) = (self.width as f32, self.height as f32);
        let mut uvs = if self.positive {
            [[0.0, 0.0], [w, 0.0], [w, h], [0.0, h]]
        } else {
            [[0.0, 0.0], [0.0, h], [w, h], [w, 0.0]]
        };
        if atlas {
            let [ou, ov] = atlas_offset(self.texture());
            let tile = 1.0 / ATLAS_TILES_PER_ROW as f32;
            for uv in uvs.iter_mut() {
                *uv = [ou + uv[0] / w * tile, ov + uv[1] / h * tile];
            }
        }
        let texture = self.texture() as f32;
        let light = self.face().shade() * self.light as f32 / MAX_LIGHT as f32;

        for i in [0, 1, 2, 0, 2, 3] {
            let p = corners[i];
            out.extend_from_slice(&[p.x, p.y, p.z, uvs[i][0], uvs[i][1], texture, light]);
        }
    }
}

/// Merged quads of every visible face owned by a cell of the chunk. `include`
/// filters by owning cell.
pub fn greedy_quads<S, F>(source: &S, include: F) -> Vec<Quad>
where
    S: VoxelSource + ?Sized,
    F: Fn(IVec3) -> bool,
{
    let mut quads = Vec::new();

    for d in 0..3 {
        let u = (d + 1) % 3;
        let v = (d + 2) % 3;
        let mut q = [0; 3];
        q[d] = 1;
        let q = IVec3::from_array(q);

        let mut mask: Vec<Option<(BlockType, bool, u8)>> =
            vec![None; (DIMS[u] * DIMS[v]) as usize];
        let mut x = [0i32; 3];

        x[d] = -1;
        while x[d] < DIMS[d] {
            let mut n = 0;
            for xv in 0..DIMS[v] {
                x[v] = xv;
                for xu in 0..DIMS[u] {
                    x[u] = xu;
                    let a = IVec3::from_array(x);
                    let b = a + q;
                    let ta = source.block_type_at(a);
                    let tb = source.block_type_at(b);

                    mask[n] = if x[d] >= 0 && face_between(ta, tb) && include(a) {
                        Some((ta, true, source.light_at(b)))
                    } else if x[d] < DIMS[d] - 1 && face_between(tb, ta) && include(b) {
                        Some((tb, false, source.light_at(a)))
                    } else {
                        None
                    };
                    n += 1;
                }
            }

            x[d] += 1;

            // Sweep the mask, growing each run along u then v.
            let mut n = 0;
            for j in 0..DIMS[v] {
                let mut i = 0;
                while i < DIMS[u] {
                    let Some(entry) = mask[n] else {
                        i += 1;
                        n += 1;
                        continue;
                    };

                    let mut w = 1;
                    while i + w < DIMS[u] && mask[n + w as usize] == Some(entry) {
                        w += 1;
                    }

                    let mut h = 1;
                    'grow: while j + h < DIMS[v] {
                        for k in 0..w {
                            if mask[n + (k + h * DIMS[u]) as usize] != Some(entry) {
                                break 'grow;
                            }
                        }
                        h += 1;
                    }

                    let mut origin = x;
                    origin[u] = i;
                    origin[v] = j;
                    let (block_type, positive, light) = entry;
                    quads.push(Quad {
                        axis: d,
                        positive,
                        origin: IVec3::from_array(origin),
                        width: w,
                        height: h,
                        block_type,
                        light,
                    });

                    for l in 0..h {
                        for k in 0..w {
                            mask[n + (k + l * DIMS[u]) as usize] = None;
                        }
                    }

                    i += w;
                    n += w as usize;
                }
            }
        }
    }

    quads
}

/// Vertices of every visible face of the single block at `pos`.
pub fn block_face_vertices<S: VoxelSource + ?Sized>(source: &S, pos: IVec3) -> Vec<f32> {
    let owner = source.block_type_at(pos);
    let mut vertices = Vec::new();
    if owner.is_air() {
        return vertices;
    }

    for face in BlockFace::ALL {
        let normal = face.normal();
        let other = pos + normal;
        if !face_between(owner, source.block_type_at(other)) {
            continue;
        }
        let axis = if normal.x != 0 {
            0
        } else if normal.y != 0 {
            1
        } else {
            2
        };
        let positive = normal.cmpgt(IVec3::ZERO).any();
        let origin = if positive { pos + normal } else { pos };
        Quad {
            axis,
            positive,
            origin,
            width: 1,
            height: 1,
            block_type: owner,
            light: source.light_at(other),
        }
        .push_vertices(&mut vertices, true);
    }
    vertices
}

/// GPU-ready vertex data for one chunk.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChunkMesh {
    pub vertices: Vec<f32>,
    pub quad_count: usize,
}

impl ChunkMesh {
    pub fn from_quads(quads: &[Quad]) -> Self {
        let mut vertices =
            Vec::with_capacity(quads.len() * VERTICES_PER_QUAD * FLOATS_PER_VERTEX);
        for quad in quads {
            quad.push_vertices(&mut vertices, false);
        }
        Self {
            vertices,
            quad_count: quads.len(),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / FLOATS_PER_VERTEX
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Raw bytes for a vertex buffer upload.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::block::Block;
    use crate::world::chunk_coord::ChunkPosition;
    use std::collections::HashSet;

    fn chunk_with(blocks: &[(i32, i32, i32, BlockType)]) -> Chunk {
        let mut chunk = Chunk::new(ChunkPosition::new(0, 0));
        for (x, y, z, ty) in blocks {
            chunk.set_block(*x, *y, *z, Block::new(*ty));
        }
        chunk
    }

    fn normal_of(vertices: &[f32]) -> Vec3 {
        let p = |i: usize| {
            let o = i * FLOATS_PER_VERTEX;
            Vec3::new(vertices[o], vertices[o + 1], vertices[o + 2])
        };
        (p(1) - p(0)).cross(p(2) - p(0)).normalize()
    }

    #[test]
    fn test_empty_chunk_has_no_vertices() {
        let chunk = Chunk::new(ChunkPosition::new(0, 0));
        let mesh = chunk.build_mesh(None);
        assert!(mesh.is_empty());
        assert_eq!(mesh.quad_count, 0);
    }

    #[test]
    fn test_single_block_has_six_quads() {
        let chunk = chunk_with(&[(3, 3, 3, BlockType::Stone)]);
        let mesh = chunk.build_mesh(None);
        assert_eq!(mesh.quad_count, 6);
        assert_eq!(mesh.vertex_count(), 36);
        assert_eq!(mesh.as_bytes().len(), 36 * FLOATS_PER_VERTEX * 4);
    }

    #[test]
    fn test_slab_top_merges_into_one_quad() {
        let mut blocks = Vec::new();
        for x in 0..4 {
            for z in 0..3 {
                blocks.push((x, 10, z, BlockType::Stone));
            }
        }
        let chunk = chunk_with(&blocks);
        let quads = greedy_quads(&chunk, |_| true);

        let tops: Vec<_> = quads.iter().filter(|q| q.axis == 1 && q.positive).collect();
        assert_eq!(tops.len(), 1);
        assert_eq!(tops[0].width, 3);
        assert_eq!(tops[0].height, 4);
        assert_eq!(tops[0].origin, IVec3::new(0, 11, 0));
        assert_eq!(quads.len(), 6);
    }

    #[test]
    fn test_different_types_do_not_merge() {
        let chunk = chunk_with(&[
            (0, 5, 0, BlockType::Stone),
            (1, 5, 0, BlockType::Stone),
            (2, 5, 0, BlockType::Dirt),
        ]);
        let quads = greedy_quads(&chunk, |_| true);
        let tops = quads.iter().filter(|q| q.axis == 1 && q.positive).count();
        assert_eq!(tops, 2);
    }

    #[test]
    fn test_face_rules() {
        assert!(face_between(BlockType::Stone, BlockType::Air));
        assert!(face_between(BlockType::Stone, BlockType::Glass));
        assert!(!face_between(BlockType::Glass, BlockType::Stone));
        assert!(!face_between(BlockType::Glass, BlockType::Glass));
        assert!(face_between(BlockType::Water, BlockType::Air));
        assert!(!face_between(BlockType::Air, BlockType::Stone));
        assert!(!face_between(BlockType::Stone, BlockType::Dirt));
    }

    #[test]
    fn test_winding_faces_outward() {
        let chunk = chunk_with(&[(3, 3, 3, BlockType::Stone)]);
        let quads = greedy_quads(&chunk, |_| true);
        for quad in &quads {
            let mut vertices = Vec::new();
            quad.push_vertices(&mut vertices, false);
            let expected = quad.face().normal().as_vec3();
            assert!(normal_of(&vertices).abs_diff_eq(expected, 1e-5), "{:?}", quad);
        }
    }

    #[test]
    fn test_block_face_path_matches_greedy_for_lone_block() {
        let chunk = chunk_with(&[(8, 20, 8, BlockType::Grass)]);
        let vertices = chunk.build_block_mesh(8, 20, 8);
        assert_eq!(vertices.len(), 6 * VERTICES_PER_QUAD * FLOATS_PER_VERTEX);

        let buried = {
            let mut blocks = vec![(8, 20, 8, BlockType::Stone)];
            for face in BlockFace::ALL {
                let n = IVec3::new(8, 20, 8) + face.normal();
                blocks.push((n.x, n.y, n.z, BlockType::Dirt));
            }
            chunk_with(&blocks)
        };
        assert!(buried.build_block_mesh(8, 20, 8).is_empty());
    }

    #[test]
    fn test_neighbor_chunk_hides_border_face() {
        let center = chunk_with(&[(15, 10, 4, BlockType::Stone)]);
        let east = chunk_with(&[(0, 10, 4, BlockType::Stone)]);

        let alone = ChunkNeighborhood::new(&center, [None; 4]);
        let joined = ChunkNeighborhood::new(&center, [Some(&east), None, None, None]);

        let east_faces = |quads: Vec<Quad>| {
            quads.iter().filter(|q| q.axis == 0 && q.positive).count()
        };
        assert_eq!(east_faces(greedy_quads(&alone, |_| true)), 1);
        assert_eq!(east_faces(greedy_quads(&joined, |_| true)), 0);
    }

    #[test]
    fn test_visible_filter() {
        let chunk = chunk_with(&[(1, 1, 1, BlockType::Stone), (5, 1, 5, BlockType::Stone)]);
        let visible: HashSet<IVec3> = [IVec3::new(1, 1, 1)].into_iter().collect();
        let mesh = chunk.build_mesh(Some(&visible));
        assert_eq!(mesh.quad_count, 6);
    }

    #[test]
    fn test_block_face_uvs_stay_in_atlas_tile() {
        let chunk = chunk_with(&[(3, 3, 3, BlockType::Bedrock)]);
        let vertices = chunk.build_block_mesh(3, 3, 3);
        assert!(!vertices.is_empty());

        let tile = 1.0 / 16.0;
        for vertex in vertices.chunks_exact(FLOATS_PER_VERTEX) {
            let texture = vertex[5] as u16;
            let [ou, ov] = atlas_offset(texture);
            assert!(vertex[3] >= ou && vertex[3] <= ou + tile, "u {} for {}", vertex[3], texture);
            assert!(vertex[4] >= ov && vertex[4] <= ov + tile, "v {} for {}", vertex[4], texture);
        }
        let first = &vertices[..FLOATS_PER_VERTEX];
        assert_eq!(first[5] as u16, BlockType::Bedrock.texture(BlockFace::Top));
        assert_ne!(atlas_offset(first[5] as u16), [0.0, 0.0]);
    }

    #[test]
    fn test_atlas_offset() {
        assert_eq!(atlas_offset(0), [0.0, 0.0]);
        assert_eq!(atlas_offset(17), [1.0 / 16.0, 1.0 / 16.0]);
    }
}

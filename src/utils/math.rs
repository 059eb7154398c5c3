//! src/utils/math.rs
//! View frustum used to cull block columns for the renderer
use glam::{Mat4, Vec3, Vec4};

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AABB {
    pub min: Vec3,
    pub max: Vec3,
}

impl AABB {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Unit cube occupied by the block at integer position `pos`.
    pub fn block(pos: glam::IVec3) -> Self {
        let min = pos.as_vec3();
        Self::new(min, min + Vec3::ONE)
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }
}

/// Geometric plane; points with non-negative signed distance are inside.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Plane {
    pub normal: Vec3,
    pub distance: f32,
}

impl Plane {
    pub fn new(normal: Vec3, distance: f32) -> Self {
        Self { normal, distance }
    }

    fn from_vec4(v: Vec4) -> Self {
        let mut plane = Self::new(v.truncate(), v.w);
        plane.normalize();
        plane
    }

    pub fn normalize(&mut self) {
        let length = self.normal.length();
        if length > 0.0 {
            self.normal /= length;
            self.distance /= length;
        }
    }

    pub fn signed_distance(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.distance
    }
}

/// View frustum for culling
#[derive(Debug, Clone)]
pub struct ViewFrustum {
    pub planes: [Plane; 6],
}

impl ViewFrustum {
    /// Extracts the six clip planes from a combined view-projection matrix
    /// with an OpenGL style [-1, 1] depth range.
    pub fn from_matrix(view_proj: Mat4) -> Self {
        let r0 = view_proj.row(0);
        let r1 = view_proj.row(1);
        let r2 = view_proj.row(2);
        let r3 = view_proj.row(3);

        Self {
            planes: [
                Plane::from_vec4(r3 + r0),
                Plane::from_vec4(r3 - r0),
                Plane::from_vec4(r3 + r1),
                Plane::from_vec4(r3 - r1),
                Plane::from_vec4(r3 + r2),
                Plane::from_vec4(r3 - r2),
            ],
        }
    }

    pub fn contains_point(&self, point: Vec3) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.signed_distance(point) >= 0.0)
    }

    pub fn intersects_aabb(&self, aabb: &AABB) -> bool {
        for plane in &self.planes {
            let p = Vec3::new(
                if plane.normal.x >= 0.0 {
                    aabb.max.x
                } else {
                    aabb.min.x
                },
                if plane.normal.y >= 0.0 {
                    aabb.max.y
                } else {
                    aabb.min.y
                },
                if plane.normal.z >= 0.0 {
                    aabb.max.z
                } else {
                    aabb.min.z
                },
            );

            if plane.signed_distance(p) < 0.0 {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> ViewFrustum {
        let proj = Mat4::perspective_rh_gl(70f32.to_radians(), 16.0 / 9.0, 0.1, 200.0);
        let view = Mat4::look_at_rh(Vec3::new(0.0, 80.0, 0.0), Vec3::new(0.0, 80.0, -10.0), Vec3::Y);
        ViewFrustum::from_matrix(proj * view)
    }

    #[test]
    fn test_point_in_front_is_inside() {
        let frustum = camera();
        assert!(frustum.contains_point(Vec3::new(0.0, 80.0, -20.0)));
        assert!(!frustum.contains_point(Vec3::new(0.0, 80.0, 20.0)));
        assert!(!frustum.contains_point(Vec3::new(0.0, 80.0, -500.0)));
    }

    #[test]
    fn test_aabb_culling() {
        let frustum = camera();
        let visible = AABB::new(Vec3::new(-1.0, 79.0, -31.0), Vec3::new(1.0, 81.0, -29.0));
        let hidden = AABB::new(Vec3::new(-1.0, 79.0, 29.0), Vec3::new(1.0, 81.0, 31.0));
        assert!(frustum.intersects_aabb(&visible));
        assert!(!frustum.intersects_aabb(&hidden));
    }

    #[test]
    fn test_block_aabb() {
        let aabb = AABB::block(glam::IVec3::new(2, 3, -4));
        assert_eq!(aabb.center(), Vec3::new(2.5, 3.5, -3.5));
        assert!(aabb.contains(Vec3::new(2.0, 4.0, -4.0)));
    }
}

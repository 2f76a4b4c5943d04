//! Triangle mesh queries for the final support point projection.
//!
//! Generated points sit on slice planes; the last step snaps each one onto
//! the actual mesh surface by casting rays straight up and down and falling
//! back to the closest surface point when both rays miss (a point can sit
//! over the gap between triangles).

use rayon::prelude::*;

use crate::generator::{LayerSupportPoint, SupportPoint};
use crate::{CancelFn, CoordF, Error, Result};

/// A 3D vector with f64 components.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec3 {
    pub x: CoordF,
    pub y: CoordF,
    pub z: CoordF,
}

impl Vec3 {
    pub const fn new(x: CoordF, y: CoordF, z: CoordF) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub fn dot(&self, other: &Vec3) -> CoordF {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    #[inline]
    pub fn cross(&self, other: &Vec3) -> Vec3 {
        Vec3::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    #[inline]
    pub fn sub(&self, other: &Vec3) -> Vec3 {
        Vec3::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    #[inline]
    pub fn add(&self, other: &Vec3) -> Vec3 {
        Vec3::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }

    #[inline]
    pub fn scaled(&self, f: CoordF) -> Vec3 {
        Vec3::new(self.x * f, self.y * f, self.z * f)
    }

    #[inline]
    pub fn norm_squared(&self) -> CoordF {
        self.dot(self)
    }

    #[inline]
    pub fn min_with(&self, other: &Vec3) -> Vec3 {
        Vec3::new(self.x.min(other.x), self.y.min(other.y), self.z.min(other.z))
    }

    #[inline]
    pub fn max_with(&self, other: &Vec3) -> Vec3 {
        Vec3::new(self.x.max(other.x), self.y.max(other.y), self.z.max(other.z))
    }
}

/// An indexed triangle mesh (mm coordinates).
#[derive(Clone, Debug, Default)]
pub struct TriangleMesh {
    pub vertices: Vec<Vec3>,
    pub faces: Vec<[usize; 3]>,
}

impl TriangleMesh {
    pub fn new(vertices: Vec<Vec3>, faces: Vec<[usize; 3]>) -> Self {
        Self { vertices, faces }
    }

    fn triangle(&self, face: usize) -> (Vec3, Vec3, Vec3) {
        let [a, b, c] = self.faces[face];
        (self.vertices[a], self.vertices[b], self.vertices[c])
    }
}

/// Ray-triangle intersection distance along the ray direction.
fn ray_triangle_intersect(
    origin: &Vec3,
    direction: &Vec3,
    a: &Vec3,
    b: &Vec3,
    c: &Vec3,
) -> Option<CoordF> {
    const EPSILON: CoordF = 1e-12;
    let edge1 = b.sub(a);
    let edge2 = c.sub(a);
    let h = direction.cross(&edge2);
    let det = edge1.dot(&h);
    if det.abs() < EPSILON {
        return None; // parallel
    }
    let inv_det = 1.0 / det;
    let s = origin.sub(a);
    let u = inv_det * s.dot(&h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = s.cross(&edge1);
    let v = inv_det * direction.dot(&q);
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = inv_det * edge2.dot(&q);
    (t >= 0.0).then_some(t)
}

/// Closest point on a triangle to `p`.
fn closest_point_on_triangle(p: &Vec3, a: &Vec3, b: &Vec3, c: &Vec3) -> Vec3 {
    let ab = b.sub(a);
    let ac = c.sub(a);
    let ap = p.sub(a);

    let d1 = ab.dot(&ap);
    let d2 = ac.dot(&ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return *a;
    }

    let bp = p.sub(b);
    let d3 = ab.dot(&bp);
    let d4 = ac.dot(&bp);
    if d3 >= 0.0 && d4 <= d3 {
        return *b;
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return a.add(&ab.scaled(v));
    }

    let cp = p.sub(c);
    let d5 = ab.dot(&cp);
    let d6 = ac.dot(&cp);
    if d6 >= 0.0 && d5 <= d6 {
        return *c;
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return a.add(&ac.scaled(w));
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return b.add(&c.sub(b).scaled(w));
    }

    let denom = 1.0 / (va + vb + vc);
    let v = vb * denom;
    let w = vc * denom;
    a.add(&ab.scaled(v)).add(&ac.scaled(w))
}

#[derive(Clone, Debug)]
enum AabbNode {
    Leaf {
        faces: Vec<usize>,
    },
    Inner {
        left: usize,
        right: usize,
    },
}

/// A flat AABB tree over mesh faces for ray and distance queries.
#[derive(Clone, Debug)]
pub struct AabbTree<'a> {
    mesh: &'a TriangleMesh,
    nodes: Vec<(Vec3, Vec3, AabbNode)>,
    root: usize,
}

const LEAF_SIZE: usize = 4;

impl<'a> AabbTree<'a> {
    pub fn new(mesh: &'a TriangleMesh) -> Self {
        let mut tree = Self {
            mesh,
            nodes: Vec::new(),
            root: 0,
        };
        let faces: Vec<usize> = (0..mesh.faces.len()).collect();
        if !faces.is_empty() {
            tree.root = tree.build(faces);
        }
        tree
    }

    fn face_bounds(&self, face: usize) -> (Vec3, Vec3) {
        let (a, b, c) = self.mesh.triangle(face);
        (a.min_with(&b).min_with(&c), a.max_with(&b).max_with(&c))
    }

    fn build(&mut self, mut faces: Vec<usize>) -> usize {
        let mut lo = Vec3::new(f64::MAX, f64::MAX, f64::MAX);
        let mut hi = Vec3::new(f64::MIN, f64::MIN, f64::MIN);
        for &face in &faces {
            let (flo, fhi) = self.face_bounds(face);
            lo = lo.min_with(&flo);
            hi = hi.max_with(&fhi);
        }

        if faces.len() <= LEAF_SIZE {
            self.nodes.push((lo, hi, AabbNode::Leaf { faces }));
            return self.nodes.len() - 1;
        }

        // split at the median along the widest axis
        let size = hi.sub(&lo);
        let centroid = |face: usize| -> CoordF {
            let (a, b, c) = self.mesh.triangle(face);
            if size.x >= size.y && size.x >= size.z {
                a.x + b.x + c.x
            } else if size.y >= size.z {
                a.y + b.y + c.y
            } else {
                a.z + b.z + c.z
            }
        };
        faces.sort_by(|&f1, &f2| {
            centroid(f1)
                .partial_cmp(&centroid(f2))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let right_faces = faces.split_off(faces.len() / 2);
        let left = self.build(faces);
        let right = self.build(right_faces);
        self.nodes.push((lo, hi, AabbNode::Inner { left, right }));
        self.nodes.len() - 1
    }

    fn ray_hits_box(origin: &Vec3, direction: &Vec3, lo: &Vec3, hi: &Vec3) -> bool {
        let mut t_min = 0.0_f64;
        let mut t_max = f64::MAX;
        for (o, d, l, h) in [
            (origin.x, direction.x, lo.x, hi.x),
            (origin.y, direction.y, lo.y, hi.y),
            (origin.z, direction.z, lo.z, hi.z),
        ] {
            if d.abs() < 1e-12 {
                if o < l || o > h {
                    return false;
                }
                continue;
            }
            let inv = 1.0 / d;
            let (mut t0, mut t1) = ((l - o) * inv, (h - o) * inv);
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_min > t_max {
                return false;
            }
        }
        true
    }

    /// Nearest hit distance of a ray with the mesh.
    pub fn ray_hit(&self, origin: &Vec3, direction: &Vec3) -> Option<CoordF> {
        if self.nodes.is_empty() {
            return None;
        }
        let mut best: Option<CoordF> = None;
        let mut stack = vec![self.root];
        while let Some(node) = stack.pop() {
            let (lo, hi, kind) = &self.nodes[node];
            if !Self::ray_hits_box(origin, direction, lo, hi) {
                continue;
            }
            match kind {
                AabbNode::Inner { left, right } => {
                    stack.push(*left);
                    stack.push(*right);
                }
                AabbNode::Leaf { faces } => {
                    for &face in faces {
                        let (a, b, c) = self.mesh.triangle(face);
                        if let Some(t) = ray_triangle_intersect(origin, direction, &a, &b, &c) {
                            if best.map_or(true, |d| t < d) {
                                best = Some(t);
                            }
                        }
                    }
                }
            }
        }
        best
    }

    fn box_distance_squared(p: &Vec3, lo: &Vec3, hi: &Vec3) -> CoordF {
        let dx = (lo.x - p.x).max(0.0).max(p.x - hi.x);
        let dy = (lo.y - p.y).max(0.0).max(p.y - hi.y);
        let dz = (lo.z - p.z).max(0.0).max(p.z - hi.z);
        dx * dx + dy * dy + dz * dz
    }

    /// Closest surface point and its squared distance.
    pub fn squared_distance(&self, p: &Vec3) -> Option<(CoordF, Vec3)> {
        if self.nodes.is_empty() {
            return None;
        }
        let mut best: Option<(CoordF, Vec3)> = None;
        let mut stack = vec![self.root];
        while let Some(node) = stack.pop() {
            let (lo, hi, kind) = &self.nodes[node];
            if let Some((best_d, _)) = best {
                if Self::box_distance_squared(p, lo, hi) > best_d {
                    continue;
                }
            }
            match kind {
                AabbNode::Inner { left, right } => {
                    stack.push(*left);
                    stack.push(*right);
                }
                AabbNode::Leaf { faces } => {
                    for &face in faces {
                        let (a, b, c) = self.mesh.triangle(face);
                        let closest = closest_point_on_triangle(p, &a, &b, &c);
                        let d = closest.sub(p).norm_squared();
                        if best.map_or(true, |(bd, _)| d < bd) {
                            best = Some((d, closest));
                        }
                    }
                }
            }
        }
        best
    }
}

/// Snap generated support points onto the mesh surface.
///
/// Each point is projected up and down; the nearer hit within
/// `allowed_move` moves the point along z, otherwise the point snaps to the
/// closest point on the surface.
pub fn move_on_mesh_surface(
    points: &[LayerSupportPoint],
    mesh: &TriangleMesh,
    allowed_move: CoordF,
    cancel: CancelFn,
) -> Result<Vec<SupportPoint>> {
    let tree = AabbTree::new(mesh);
    let up = Vec3::new(0.0, 0.0, 1.0);
    let down = Vec3::new(0.0, 0.0, -1.0);

    points
        .par_iter()
        .enumerate()
        .with_min_len(64)
        .map(|(index, point)| {
            if index % 16 == 0 && cancel() {
                return Err(Error::Cancelled);
            }
            let mut support = point.support;
            let p = Vec3::new(
                support.pos[0] as CoordF,
                support.pos[1] as CoordF,
                support.pos[2] as CoordF,
            );

            let hit_up = tree.ray_hit(&p, &up);
            let hit_down = tree.ray_hit(&p, &down);
            match (hit_up, hit_down) {
                // no hit means the point already lies on a triangle
                (None, None) => return Ok(support),
                _ => {}
            }
            let (distance, z_direction) = match (hit_up, hit_down) {
                (Some(u), Some(d)) if u < d => (u, 1.0),
                (Some(u), None) => (u, 1.0),
                (_, Some(d)) => (d, -1.0),
                _ => unreachable!(),
            };
            if distance <= allowed_move {
                support.pos[2] += (distance * z_direction) as f32;
                return Ok(support);
            }

            // the ray flew through a gap between triangles
            if let Some((distance_sq, closest)) = tree.squared_distance(&p) {
                if distance_sq > (f32::EPSILON as CoordF).powi(2) {
                    support.pos = [closest.x as f32, closest.y as f32, closest.z as f32];
                }
            }
            Ok(support)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::{SupportPointGeneratorConfig, SupportPointKind};
    use crate::geometry::Point;

    /// Unit square plate at z = 1, two triangles.
    fn plate() -> TriangleMesh {
        TriangleMesh::new(
            vec![
                Vec3::new(0.0, 0.0, 1.0),
                Vec3::new(10.0, 0.0, 1.0),
                Vec3::new(10.0, 10.0, 1.0),
                Vec3::new(0.0, 10.0, 1.0),
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        )
    }

    fn support_at(x: f64, y: f64, z: f32) -> LayerSupportPoint {
        let config = SupportPointGeneratorConfig::default();
        let curve = vec![(1.0, 0.0), (1.0, 1.0)];
        LayerSupportPoint::new(
            Point::new_scale(x, y),
            z,
            SupportPointKind::Island,
            Point::new(0, 0),
            &config,
            &curve,
        )
    }

    #[test]
    fn test_ray_hit() {
        let mesh = plate();
        let tree = AabbTree::new(&mesh);
        let t = tree
            .ray_hit(&Vec3::new(5.0, 5.0, 0.0), &Vec3::new(0.0, 0.0, 1.0))
            .unwrap();
        assert!((t - 1.0).abs() < 1e-9);
        assert!(tree
            .ray_hit(&Vec3::new(50.0, 5.0, 0.0), &Vec3::new(0.0, 0.0, 1.0))
            .is_none());
    }

    #[test]
    fn test_closest_point() {
        let mesh = plate();
        let tree = AabbTree::new(&mesh);
        let (d2, closest) = tree.squared_distance(&Vec3::new(5.0, 5.0, 3.0)).unwrap();
        assert!((d2 - 4.0).abs() < 1e-9);
        assert!((closest.z - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_points_projected_up() {
        let mesh = plate();
        let points = vec![support_at(5.0, 5.0, 0.5)];
        let moved = move_on_mesh_surface(&points, &mesh, 1.0, &|| false).unwrap();
        assert!((moved[0].pos[2] - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_far_point_snaps_to_surface() {
        let mesh = plate();
        // outside the plate in x/y, raycast misses entirely
        let points = vec![support_at(12.0, 5.0, 1.0)];
        let moved = move_on_mesh_surface(&points, &mesh, 0.1, &|| false).unwrap();
        assert!((moved[0].pos[0] - 10.0).abs() < 1e-5);
        assert!((moved[0].pos[2] - 1.0).abs() < 1e-5);
    }
}

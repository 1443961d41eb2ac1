//! Boundary facets of a triangulation.
//!
//! A facet owned by exactly one simplex lies on the outer boundary. Each
//! hull face carries its outward unit normal and plane offset so that
//! `normal · x + offset` is zero on the face and negative inside.

use std::collections::HashMap;

use super::delaunay::NONE;
use super::{Point3, Tolerance, Vec3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HullFace {
    dim: usize,
    vertices: [usize; 3],
    corners: [Point3; 3],
    /// Simplex this face bounds.
    pub simplex: usize,
    pub normal: Vec3,
    pub offset: f64,
}

impl HullFace {
    /// Vertex indices of the face (`dim` of them).
    #[must_use]
    pub fn vertex_indices(&self) -> &[usize] {
        &self.vertices[..self.dim]
    }

    /// Vertex positions of the face (`dim` of them).
    #[must_use]
    pub fn corners(&self) -> &[Point3] {
        &self.corners[..self.dim]
    }

    #[must_use]
    pub fn centroid(&self) -> Point3 {
        let sum = self
            .corners()
            .iter()
            .fold(Vec3::ZERO, |acc, p| acc + p.to_vec3());
        Point3::from(sum / self.dim as f64)
    }

    /// Signed distance of `p` to the face plane, positive outside.
    #[must_use]
    pub fn signed_distance(&self, p: Point3) -> f64 {
        self.normal.dot(p.to_vec3()) + self.offset
    }

    /// Parameter `α` at which `origin + α·direction` meets the face plane.
    /// `None` when the ray is parallel to the plane or the result is not finite.
    #[must_use]
    pub fn ray_parameter(&self, origin: Point3, direction: Vec3) -> Option<f64> {
        let denom = self.normal.dot(direction);
        if denom == 0.0 {
            return None;
        }
        let alpha = -self.signed_distance(origin) / denom;
        alpha.is_finite().then_some(alpha)
    }

    /// Whether the plane of this face passes through `p`.
    #[must_use]
    pub fn passes_through(&self, p: Point3, tol: Tolerance) -> bool {
        self.signed_distance(p).abs() <= tol.relative_to(self.size())
    }

    /// Longest edge of the face.
    #[must_use]
    pub fn size(&self) -> f64 {
        let corners = self.corners();
        let mut size = 0.0_f64;
        for (i, a) in corners.iter().enumerate() {
            for b in &corners[i + 1..] {
                size = size.max(a.distance_to(*b));
            }
        }
        size
    }

    /// Whether `p`, assumed to lie on the face plane, falls inside the face.
    ///
    /// Triangles use the edge sign test: `(b - a) × (p - a)` projected on the
    /// normal must keep one sign over all three edges. Segments check the
    /// projection parameter against `[0, 1]`.
    #[must_use]
    pub fn contains(&self, p: Point3, tol: Tolerance) -> bool {
        if self.dim == 2 {
            let [a, b, _] = self.corners;
            let edge = b - a;
            let len2 = edge.length_squared();
            if len2 <= 0.0 {
                return false;
            }
            let t = (p - a).dot(edge) / len2;
            return t >= -tol.eps && t <= 1.0 + tol.eps;
        }

        let slack = tol.eps * self.size().powi(2);
        let [a, b, c] = self.corners;
        let signs = [(a, b), (b, c), (c, a)].map(|(from, to)| (to - from).cross(p - from).dot(self.normal));
        signs.iter().all(|&s| s >= -slack) || signs.iter().all(|&s| s <= slack)
    }
}

/// Collect the boundary facets of `simplices`.
pub(crate) fn extract_hull_faces(
    points: &[Point3],
    simplices: &[[usize; 4]],
    dim: usize,
) -> Vec<HullFace> {
    let mut owners: HashMap<[usize; 3], (usize, usize, u32)> = HashMap::new();
    for (s, simplex) in simplices.iter().enumerate() {
        for opposite in 0..=dim {
            let key = facet_key(simplex, opposite, dim);
            owners
                .entry(key)
                .and_modify(|entry| entry.2 += 1)
                .or_insert((s, opposite, 1));
        }
    }

    let mut faces: Vec<HullFace> = owners
        .into_values()
        .filter(|&(_, _, count)| count == 1)
        .filter_map(|(s, opposite, _)| build_face(points, &simplices[s], s, opposite, dim))
        .collect();
    faces.sort_by_key(|face| (face.simplex, face.vertices));
    faces
}

fn facet_key(simplex: &[usize; 4], opposite: usize, dim: usize) -> [usize; 3] {
    let mut key = [NONE; 3];
    let mut k = 0;
    for (i, &v) in simplex.iter().take(dim + 1).enumerate() {
        if i != opposite {
            key[k] = v;
            k += 1;
        }
    }
    key[..dim].sort_unstable();
    key
}

fn build_face(
    points: &[Point3],
    simplex: &[usize; 4],
    s: usize,
    opposite: usize,
    dim: usize,
) -> Option<HullFace> {
    let vertices = facet_key(simplex, opposite, dim);
    let corners = vertices.map(|v| if v == NONE { Point3::ORIGIN } else { points[v] });
    let apex = points[simplex[opposite]];

    let raw = if dim == 2 {
        let edge = corners[1] - corners[0];
        Vec3::new(edge.y, -edge.x, 0.0)
    } else {
        let e1 = (corners[1] - corners[0]).normalized()?;
        let e2 = (corners[2] - corners[0]).normalized()?;
        e1.cross(e2)
    };
    let Some(mut normal) = raw.normalized() else {
        log::debug!("hull: skipping degenerate face of simplex {s}");
        return None;
    };
    if normal.dot(apex - corners[0]) > 0.0 {
        normal = -normal;
    }
    let offset = -normal.dot(corners[0].to_vec3());

    Some(HullFace {
        dim,
        vertices,
        corners,
        simplex: s,
        normal,
        offset,
    })
}

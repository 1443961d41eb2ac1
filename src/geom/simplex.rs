//! Per-simplex predicates: orientation, circumspheres, barycentric transforms
//! and minimum enclosing circles.

use super::{Point3, Tolerance, Vec3};

/// Twice the signed area of `(a, b, c)` in the xy plane.
#[must_use]
pub fn orient2d(a: Point3, b: Point3, c: Point3) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

/// Six times the signed volume of the tetrahedron `(a, b, c, d)`.
#[must_use]
pub fn orient3d(a: Point3, b: Point3, c: Point3, d: Point3) -> f64 {
    (b - a).dot((c - a).cross(d - a))
}

/// Circumsphere of a tetrahedron as `(center, radius²)`.
#[must_use]
pub fn circumsphere(a: Point3, b: Point3, c: Point3, d: Point3) -> Option<(Point3, f64)> {
    let u = b - a;
    let v = c - a;
    let w = d - a;
    let denom = 2.0 * u.dot(v.cross(w));
    if !denom.is_finite() || denom.abs() <= Tolerance::ZERO_LENGTH.eps_squared() {
        return None;
    }

    let offset = (v.cross(w) * u.length_squared()
        + w.cross(u) * v.length_squared()
        + u.cross(v) * w.length_squared())
        / denom;
    if !offset.is_finite() {
        return None;
    }
    Some((a + offset, offset.length_squared()))
}

/// Maps a position to barycentric weights inside one simplex.
///
/// Stores the inverse of the edge matrix `[v1 - v0, .., vd - v0]` as rows so
/// that `b = rows · (p - v0)` and `w0 = 1 - Σb`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimplexTransform {
    dim: usize,
    origin: Point3,
    rows: [Vec3; 3],
}

impl SimplexTransform {
    /// Returns `None` for a flat (numerically degenerate) simplex.
    #[must_use]
    pub fn new(vertices: &[Point3], dim: usize) -> Option<Self> {
        if vertices.len() != dim + 1 {
            return None;
        }
        let origin = vertices[0];
        let scale = vertices
            .iter()
            .skip(1)
            .map(|v| v.distance_to(origin))
            .fold(0.0_f64, f64::max);
        if !scale.is_finite() || scale <= 0.0 {
            return None;
        }
        let min_det = Tolerance::ZERO_LENGTH.eps * scale.powi(dim as i32);

        match dim {
            2 => {
                let e1 = vertices[1] - origin;
                let e2 = vertices[2] - origin;
                let det = orient2d(origin, vertices[1], vertices[2]);
                if !det.is_finite() || det.abs() <= min_det {
                    return None;
                }
                let rows = [
                    Vec3::new(e2.y / det, -e2.x / det, 0.0),
                    Vec3::new(-e1.y / det, e1.x / det, 0.0),
                    Vec3::ZERO,
                ];
                Some(Self { dim, origin, rows })
            }
            3 => {
                let e1 = vertices[1] - origin;
                let e2 = vertices[2] - origin;
                let e3 = vertices[3] - origin;
                let det = orient3d(origin, vertices[1], vertices[2], vertices[3]);
                if !det.is_finite() || det.abs() <= min_det {
                    return None;
                }
                let rows = [
                    e2.cross(e3) / det,
                    e3.cross(e1) / det,
                    e1.cross(e2) / det,
                ];
                Some(Self { dim, origin, rows })
            }
            _ => None,
        }
    }

    #[must_use]
    pub const fn dim(&self) -> usize {
        self.dim
    }

    /// Barycentric weights of `p`; the first `dim + 1` entries are used.
    #[must_use]
    pub fn weights(&self, p: Point3) -> [f64; 4] {
        let rel = p - self.origin;
        let mut weights = [0.0; 4];
        let mut sum = 0.0;
        for (k, row) in self.rows.iter().take(self.dim).enumerate() {
            let b = row.dot(rel);
            weights[k + 1] = b;
            sum += b;
        }
        weights[0] = 1.0 - sum;
        weights
    }
}

/// Circle in a two-dimensional plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub center: (f64, f64),
    pub radius: f64,
}

impl Circle {
    #[must_use]
    pub fn distance_to_center(&self, p: (f64, f64)) -> f64 {
        (p.0 - self.center.0).hypot(p.1 - self.center.1)
    }

    #[must_use]
    pub fn contains(&self, p: (f64, f64), tol: Tolerance) -> bool {
        self.distance_to_center(p) <= self.radius + tol.relative_to(self.radius)
    }
}

/// Smallest circle enclosing one to three points.
///
/// Tries every diametral circle first, then the circumcircle, which covers
/// acute, obtuse and collinear triples.
#[must_use]
pub fn min_enclosing_circle(points: &[(f64, f64)]) -> Option<Circle> {
    let tol = Tolerance::DEFAULT;
    match points {
        [] => None,
        [p] => Some(Circle { center: *p, radius: 0.0 }),
        [a, b] => Some(diametral_circle(*a, *b)),
        [a, b, c] => {
            let mut best: Option<Circle> = None;
            for (p, q) in [(*a, *b), (*b, *c), (*a, *c)] {
                let circle = diametral_circle(p, q);
                if points.iter().all(|&x| circle.contains(x, tol))
                    && best.is_none_or(|current| circle.radius < current.radius)
                {
                    best = Some(circle);
                }
            }
            best.or_else(|| circumcircle(*a, *b, *c))
        }
        _ => None,
    }
}

fn diametral_circle(a: (f64, f64), b: (f64, f64)) -> Circle {
    Circle {
        center: (0.5 * (a.0 + b.0), 0.5 * (a.1 + b.1)),
        radius: 0.5 * (a.0 - b.0).hypot(a.1 - b.1),
    }
}

fn circumcircle(a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> Option<Circle> {
    let (bx, by) = (b.0 - a.0, b.1 - a.1);
    let (cx, cy) = (c.0 - a.0, c.1 - a.1);
    let d = 2.0 * (bx * cy - by * cx);
    if !d.is_finite() || d.abs() <= Tolerance::ZERO_LENGTH.eps_squared() {
        return None;
    }
    let b2 = bx * bx + by * by;
    let c2 = cx * cx + cy * cy;
    let ux = (cy * b2 - by * c2) / d;
    let uy = (bx * c2 - cx * b2) / d;
    Some(Circle {
        center: (a.0 + ux, a.1 + uy),
        radius: ux.hypot(uy),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circumsphere_of_unit_corner_tetrahedron() {
        let (center, r2) = circumsphere(
            Point3::ORIGIN,
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        )
        .unwrap();
        assert!(center.distance_to(Point3::new(0.5, 0.5, 0.5)) < 1e-12);
        assert!((r2 - 0.75).abs() < 1e-12);
    }

    #[test]
    fn transform_weights_reproduce_vertices() {
        let vertices = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(0.0, 3.0, 0.0),
            Point3::new(0.0, 0.0, 4.0),
        ];
        let transform = SimplexTransform::new(&vertices, 3).unwrap();
        for (i, v) in vertices.iter().enumerate() {
            let w = transform.weights(*v);
            for (k, wk) in w.iter().enumerate() {
                let expected = if k == i { 1.0 } else { 0.0 };
                assert!((wk - expected).abs() < 1e-12, "vertex {i} weight {k} = {wk}");
            }
        }
    }

    #[test]
    fn triangle_weights_follow_orientation_areas() {
        let (a, b, c) = (
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(4.0, 0.0, 0.0),
            Point3::new(0.0, 2.0, 0.0),
        );
        let transform = SimplexTransform::new(&[a, b, c], 2).unwrap();
        let p = Point3::new(1.0, 0.5, 0.0);
        let w = transform.weights(p);
        let area = orient2d(a, b, c);
        assert!((w[0] - orient2d(p, b, c) / area).abs() < 1e-12);
        assert!((w[1] - orient2d(a, p, c) / area).abs() < 1e-12);
        assert!((w[2] - orient2d(a, b, p) / area).abs() < 1e-12);

        let clockwise = SimplexTransform::new(&[a, c, b], 2).unwrap();
        assert!((clockwise.weights(p)[1] - w[2]).abs() < 1e-12);
    }

    #[test]
    fn flat_triangle_has_no_transform() {
        let vertices = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(2.0, 2.0, 0.0),
        ];
        assert!(SimplexTransform::new(&vertices, 2).is_none());
    }

    #[test]
    fn enclosing_circle_of_obtuse_triangle_uses_long_edge() {
        let circle = min_enclosing_circle(&[(0.0, 0.0), (4.0, 0.0), (2.0, 0.5)]).unwrap();
        assert!((circle.radius - 2.0).abs() < 1e-12);
        assert!((circle.center.0 - 2.0).abs() < 1e-12);
    }

    #[test]
    fn enclosing_circle_of_equilateral_triangle_is_circumcircle() {
        let h = 3.0_f64.sqrt();
        let circle = min_enclosing_circle(&[(-1.0, 0.0), (1.0, 0.0), (0.0, h)]).unwrap();
        assert!((circle.radius - 2.0 / h).abs() < 1e-12);
    }
}

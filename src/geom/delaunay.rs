//! Delaunay construction for two- and three-dimensional point sets.
//!
//! 2-D input goes through `delaunator`. 3-D input uses Bowyer-Watson
//! insertion with ghost tetrahedra: every hull facet is closed off by a
//! tetrahedron whose fourth vertex sits at infinity, so a point outside the
//! current hull conflicts with the ghosts of the facets it can see and the
//! mesh always covers the convex hull of the inserted points. Location walks
//! the mesh, and cavity repair keeps every new tetrahedron positively
//! oriented.

use std::collections::{HashMap, HashSet};

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use super::simplex::{circumsphere, orient3d};
use super::triangulation::TriangulationError;
use super::{BBox, Point3, Tolerance, Vec3};

pub(crate) const NONE: usize = usize::MAX;

/// Seed for the insertion shuffle; fixed so builds are reproducible.
const INSERTION_SEED: u64 = 0x5eed_1a7e;

/// Orientation threshold for new tetrahedra in the normalised frame.
const MIN_ORIENTATION: f64 = 1e-12;

/// Sine of the angle below which a point counts as lying on a facet plane.
const COPLANAR_SINE: f64 = 1e-12;

/// Validate `points` and return Delaunay simplices as vertex index arrays.
/// Only the first `dim + 1` entries of each array are meaningful.
pub(crate) fn delaunay_simplices(
    points: &[Point3],
    dim: usize,
) -> Result<Vec<[usize; 4]>, TriangulationError> {
    if !(2..=3).contains(&dim) {
        return Err(TriangulationError::UnsupportedDimension { dim });
    }
    if points.len() < dim + 1 {
        return Err(TriangulationError::NotEnoughPoints {
            min: dim + 1,
            count: points.len(),
        });
    }
    if let Some(index) = points.iter().position(|p| !p.is_finite()) {
        return Err(TriangulationError::NonFinitePoint { index });
    }
    check_coincident(points)?;

    let normalized = normalize(points);
    let rank = affine_rank(&normalized, dim);
    if rank < dim {
        return Err(TriangulationError::Degenerate { rank, dim });
    }

    let simplices = if dim == 2 {
        triangulate_2d(&normalized)
    } else {
        let mut mesher = TetMesher::new(&normalized)?;
        mesher.insert_all()?;
        mesher.finish()
    };

    if simplices.is_empty() {
        return Err(TriangulationError::Empty);
    }
    log::debug!(
        "delaunay: {} points in {}-D -> {} simplices",
        points.len(),
        dim,
        simplices.len()
    );
    Ok(simplices)
}

fn check_coincident(points: &[Point3]) -> Result<(), TriangulationError> {
    let mut seen: HashMap<[u64; 3], usize> = HashMap::with_capacity(points.len());
    for (index, p) in points.iter().enumerate() {
        if let Some(&first) = seen.get(&p.bit_key()) {
            return Err(TriangulationError::CoincidentPoints { first, second: index });
        }
        seen.insert(p.bit_key(), index);
    }
    Ok(())
}

/// Translate to the box centre and scale the largest side to one.
fn normalize(points: &[Point3]) -> Vec<Point3> {
    let Some(bbox) = BBox::from_points(points) else {
        return Vec::new();
    };
    let center = bbox.center();
    let scale = bbox.max_extent();
    let inv = if scale > 0.0 { 1.0 / scale } else { 1.0 };
    points
        .iter()
        .map(|p| Point3::from((*p - center) * inv))
        .collect()
}

/// Number of independent directions spanned by `points`, capped at `dim`.
pub(crate) fn affine_rank(points: &[Point3], dim: usize) -> usize {
    let Some((&base, rest)) = points.split_first() else {
        return 0;
    };
    let tol = Tolerance::DEFAULT.eps;
    let mut basis: Vec<Vec3> = Vec::with_capacity(dim);
    for p in rest {
        let mut v = *p - base;
        for b in &basis {
            v = v - *b * v.dot(*b);
        }
        if v.length() > tol {
            if let Some(unit) = v.normalized() {
                basis.push(unit);
            }
            if basis.len() == dim {
                break;
            }
        }
    }
    basis.len()
}

fn triangulate_2d(points: &[Point3]) -> Vec<[usize; 4]> {
    let input: Vec<delaunator::Point> = points
        .iter()
        .map(|p| delaunator::Point { x: p.x, y: p.y })
        .collect();
    let triangulation = delaunator::triangulate(&input);
    triangulation
        .triangles
        .chunks_exact(3)
        .map(|tri| [tri[0], tri[1], tri[2], NONE])
        .collect()
}

/// Four points spanning a tetrahedron of near-maximal volume, ordered so
/// that it is positively oriented.
fn initial_simplex(points: &[Point3]) -> Option<[usize; 4]> {
    let a = 0;
    let pa = *points.first()?;
    let b = argmax(points, |p| pa.distance_squared_to(p))?;
    let pb = points[b];
    let c = argmax(points, |p| (pb - pa).cross(p - pa).length_squared())?;
    let pc = points[c];
    let d = argmax(points, |p| orient3d(pa, pb, pc, p).abs())?;
    if orient3d(pa, pb, pc, points[d]) > 0.0 {
        Some([a, b, c, d])
    } else {
        Some([a, c, b, d])
    }
}

fn argmax(points: &[Point3], score: impl Fn(Point3) -> f64) -> Option<usize> {
    points
        .iter()
        .enumerate()
        .map(|(i, &p)| (i, score(p)))
        .filter(|(_, s)| *s > 0.0 && s.is_finite())
        .max_by(|x, y| x.1.total_cmp(&y.1))
        .map(|(i, _)| i)
}

#[derive(Debug, Clone, Copy)]
struct Tet {
    v: [usize; 4],
    /// Neighbour across the face opposite `v[i]`.
    n: [usize; 4],
    center: Point3,
    radius2: f64,
    alive: bool,
}

impl Tet {
    fn in_circumsphere(&self, p: Point3) -> bool {
        self.center.distance_squared_to(p) < self.radius2
    }

    fn slot_of(&self, vertex: usize) -> Option<usize> {
        self.v.iter().position(|&v| v == vertex)
    }
}

/// Incremental tetrahedralisation over ghost-closed hulls.
///
/// Ghost tetrahedra keep the finite tetrahedra's orientation convention
/// with the infinite vertex treated as a point far outside their facet:
/// replacing it by a point `x` gives a positive orientation exactly when
/// `x` lies beyond the facet.
struct TetMesher {
    points: Vec<Point3>,
    input_count: usize,
    /// Index of the vertex at infinity; its coordinates are never read.
    infinite: usize,
    /// Centroid of the first tetrahedron, strictly inside every later hull.
    interior: Point3,
    seed: [usize; 4],
    tets: Vec<Tet>,
    last: usize,
    stamp: Vec<u32>,
    generation: u32,
}

impl TetMesher {
    fn new(normalized: &[Point3]) -> Result<Self, TriangulationError> {
        let seed =
            initial_simplex(normalized).ok_or(TriangulationError::Degenerate { rank: 2, dim: 3 })?;
        let input_count = normalized.len();
        let mut points = normalized.to_vec();
        points.push(Point3::new(f64::NAN, f64::NAN, f64::NAN));
        let interior = Point3::from(
            seed.iter()
                .fold(Vec3::ZERO, |acc, &i| acc + normalized[i].to_vec3())
                / 4.0,
        );

        let mut mesher = Self {
            points,
            input_count,
            infinite: input_count,
            interior,
            seed,
            tets: Vec::with_capacity(input_count.saturating_mul(8)),
            last: 0,
            stamp: Vec::new(),
            generation: 0,
        };
        let root = mesher.push_tet(seed, [NONE; 4]);
        let mut created = vec![root];
        for slot in 0..4 {
            let mut v = seed;
            v[slot] = input_count;
            v.swap((slot + 1) % 4, (slot + 2) % 4);
            created.push(mesher.push_tet(v, [NONE; 4]));
        }
        mesher.link(&created);
        mesher.last = root;
        Ok(mesher)
    }

    fn push_tet(&mut self, v: [usize; 4], n: [usize; 4]) -> usize {
        let (center, radius2) = if v.contains(&self.infinite) {
            (Point3::ORIGIN, f64::NAN)
        } else {
            let [a, b, c, d] = v.map(|i| self.points[i]);
            circumsphere(a, b, c, d).unwrap_or((a, f64::INFINITY))
        };
        self.tets.push(Tet {
            v,
            n,
            center,
            radius2,
            alive: true,
        });
        self.stamp.push(0);
        self.tets.len() - 1
    }

    /// Connect the tetrahedra in `ids` across the facets they share.
    fn link(&mut self, ids: &[usize]) {
        let mut open: HashMap<[usize; 3], (usize, usize)> = HashMap::new();
        for &id in ids {
            for slot in 0..4 {
                let v = self.tets[id].v;
                let mut key = [0; 3];
                for (k, i) in (0..4).filter(|&i| i != slot).enumerate() {
                    key[k] = v[i];
                }
                key.sort_unstable();
                if let Some((other, other_slot)) = open.remove(&key) {
                    self.tets[id].n[slot] = other;
                    self.tets[other].n[other_slot] = id;
                } else {
                    open.insert(key, (id, slot));
                }
            }
        }
    }

    fn insert_all(&mut self) -> Result<(), TriangulationError> {
        let seed = self.seed;
        let mut order: Vec<usize> = (0..self.input_count)
            .filter(|i| !seed.contains(i))
            .collect();
        order.shuffle(&mut StdRng::seed_from_u64(INSERTION_SEED));
        for index in order {
            self.insert(index)?;
        }
        Ok(())
    }

    /// Orientation of `v` with `v[slot]` replaced by `x`.
    fn orient_at(&self, v: [usize; 4], slot: usize, x: Point3) -> f64 {
        let mut corners = v.map(|i| self.points[i]);
        corners[slot] = x;
        let [a, b, c, d] = corners;
        orient3d(a, b, c, d)
    }

    /// Orientation of `tet` with `v[slot]` replaced by `point`.
    fn orientation_with(&self, tet: &Tet, slot: usize, point: usize) -> f64 {
        self.orient_at(tet.v, slot, self.points[point])
    }

    /// Corners of the facet of `v` opposite `slot`.
    fn facet_corners(&self, v: [usize; 4], slot: usize) -> [Point3; 3] {
        let mut corners = [Point3::ORIGIN; 3];
        for (corner, i) in corners.iter_mut().zip((0..4).filter(|&i| i != slot)) {
            *corner = self.points[v[i]];
        }
        corners
    }

    /// Orientation magnitude below which `x` lies on the facet opposite `slot`.
    fn coplanar_slack(&self, v: [usize; 4], slot: usize, x: Point3) -> f64 {
        let [a, b, c] = self.facet_corners(v, slot);
        COPLANAR_SINE * (b - a).cross(c - a).length() * (x - a).length()
    }

    /// Whether `p` falls inside the open circumsphere of `tet`.
    ///
    /// A ghost's circumsphere is the open half-space beyond its facet. On
    /// the facet plane itself the finite neighbour's circumsphere decides,
    /// which is where that sphere meets the plane.
    fn conflicts(&self, tet: &Tet, p: Point3) -> bool {
        let Some(k) = tet.slot_of(self.infinite) else {
            return tet.in_circumsphere(p);
        };
        let side = self.orient_at(tet.v, k, p);
        let slack = self.coplanar_slack(tet.v, k, p);
        if side > slack {
            true
        } else if side < -slack {
            false
        } else {
            let inner = tet.n[k];
            inner != NONE && self.tets[inner].in_circumsphere(p)
        }
    }

    /// Whether a tetrahedron with vertices `v` may join the mesh.
    fn is_valid(&self, v: [usize; 4]) -> bool {
        match v.iter().position(|&i| i == self.infinite) {
            Some(k) => {
                let [a, b, c] = self.facet_corners(v, k);
                let slack = COPLANAR_SINE
                    * (b - a).cross(c - a).length()
                    * (self.interior - a).length();
                self.orient_at(v, k, self.interior) < -slack
            }
            None => {
                let [a, b, c, d] = v.map(|i| self.points[i]);
                orient3d(a, b, c, d) > MIN_ORIENTATION
            }
        }
    }

    fn locate(&self, point: usize) -> Option<usize> {
        let p = self.points[point];
        let mut current = self.last;
        let max_steps = self.tets.len();
        'walk: for _ in 0..max_steps {
            let tet = &self.tets[current];
            if !tet.alive {
                break;
            }
            if let Some(k) = tet.slot_of(self.infinite) {
                if self.conflicts(tet, p) {
                    return Some(current);
                }
                current = tet.n[k];
                if current == NONE {
                    break;
                }
                continue;
            }
            for slot in 0..4 {
                if self.orientation_with(tet, slot, point) < 0.0 {
                    let next = tet.n[slot];
                    if next == NONE {
                        break 'walk;
                    }
                    current = next;
                    continue 'walk;
                }
            }
            if self.conflicts(tet, p) {
                return Some(current);
            }
            break;
        }

        log::trace!("delaunay: walk failed for point {point}, scanning");
        self.tets
            .iter()
            .enumerate()
            .rev()
            .find(|(_, tet)| tet.alive && self.conflicts(tet, p))
            .map(|(i, _)| i)
    }

    fn next_generation(&mut self) -> u32 {
        self.generation = self.generation.wrapping_add(1);
        if self.generation == 0 {
            self.stamp.iter_mut().for_each(|s| *s = 0);
            self.generation = 1;
        }
        self.generation
    }

    fn insert(&mut self, point: usize) -> Result<(), TriangulationError> {
        let p = self.points[point];
        let seed = self
            .locate(point)
            .ok_or(TriangulationError::CavityFailure { index: point })?;

        let mark = self.next_generation();
        self.stamp[seed] = mark;
        let mut cavity = vec![seed];
        let mut stack = vec![seed];
        while let Some(t) = stack.pop() {
            for nb in self.tets[t].n {
                if nb != NONE
                    && self.stamp[nb] != mark
                    && self.tets[nb].alive
                    && self.conflicts(&self.tets[nb], p)
                {
                    self.stamp[nb] = mark;
                    cavity.push(nb);
                    stack.push(nb);
                }
            }
        }

        let boundary = self.repair_cavity(point, &mut cavity, mark)?;
        let kept: HashSet<usize> = boundary
            .iter()
            .flat_map(|&(t, slot)| {
                let v = self.tets[t].v;
                (0..4).filter(move |&i| i != slot).map(move |i| v[i])
            })
            .collect();
        if cavity
            .iter()
            .flat_map(|&t| self.tets[t].v)
            .any(|v| !kept.contains(&v))
        {
            return Err(TriangulationError::CavityFailure { index: point });
        }

        let mut open_edges: HashMap<(usize, usize), (usize, usize)> = HashMap::new();
        let mut created = Vec::with_capacity(boundary.len());
        for (t, slot) in boundary {
            let old = self.tets[t];
            let mut v = old.v;
            v[slot] = point;
            let mut n = [NONE; 4];
            n[slot] = old.n[slot];
            let id = self.push_tet(v, n);
            created.push(id);

            let outer = old.n[slot];
            if outer != NONE {
                if let Some(back) = self.tets[outer].n.iter().position(|&x| x == t) {
                    self.tets[outer].n[back] = id;
                }
            }

            for j in (0..4).filter(|&j| j != slot) {
                let mut rest = (0..4).filter(|&k| k != slot && k != j).map(|k| v[k]);
                let (Some(e0), Some(e1)) = (rest.next(), rest.next()) else {
                    continue;
                };
                let key = (e0.min(e1), e0.max(e1));
                if let Some((other, other_slot)) = open_edges.remove(&key) {
                    self.tets[id].n[j] = other;
                    self.tets[other].n[other_slot] = id;
                } else {
                    open_edges.insert(key, (id, j));
                }
            }
        }

        for t in cavity {
            self.tets[t].alive = false;
        }
        if let Some(&last) = created.last() {
            self.last = last;
        }
        Ok(())
    }

    /// Grow the cavity until every boundary face sees `point` strictly on
    /// its inner side, then return those faces as `(tet, slot)` pairs.
    fn repair_cavity(
        &mut self,
        point: usize,
        cavity: &mut Vec<usize>,
        mark: u32,
    ) -> Result<Vec<(usize, usize)>, TriangulationError> {
        loop {
            let mut boundary = Vec::with_capacity(cavity.len() * 2);
            let mut grow = None;
            'scan: for &t in cavity.iter() {
                let tet = self.tets[t];
                for slot in 0..4 {
                    let outer = tet.n[slot];
                    if outer != NONE && self.stamp[outer] == mark {
                        continue;
                    }
                    let mut v = tet.v;
                    v[slot] = point;
                    if self.is_valid(v) {
                        boundary.push((t, slot));
                    } else if outer != NONE {
                        grow = Some(outer);
                        break 'scan;
                    } else {
                        return Err(TriangulationError::CavityFailure { index: point });
                    }
                }
            }

            match grow {
                Some(outer) => {
                    self.stamp[outer] = mark;
                    cavity.push(outer);
                }
                None if boundary.is_empty() => {
                    return Err(TriangulationError::CavityFailure { index: point });
                }
                None => return Ok(boundary),
            }
        }
    }

    fn finish(self) -> Vec<[usize; 4]> {
        let n = self.input_count;
        self.tets
            .iter()
            .filter(|tet| tet.alive && tet.v.iter().all(|&v| v < n))
            .map(|tet| tet.v)
            .collect()
    }
}

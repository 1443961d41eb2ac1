use super::bvh::Bvh;
use super::delaunay::delaunay_simplices;
use super::hull::{HullFace, extract_hull_faces};
use super::simplex::SimplexTransform;
use super::{BBox, Point3, Tolerance};

#[derive(Debug, thiserror::Error)]
pub enum TriangulationError {
    #[error("triangulation supports 2 or 3 dimensions, got {dim}")]
    UnsupportedDimension { dim: usize },
    #[error("point {index} has non-finite coordinates")]
    NonFinitePoint { index: usize },
    #[error("points {first} and {second} coincide")]
    CoincidentPoints { first: usize, second: usize },
    #[error("need at least {min} points, got {count}")]
    NotEnoughPoints { min: usize, count: usize },
    #[error("points span {rank} independent direction(s), need {dim}")]
    Degenerate { rank: usize, dim: usize },
    #[error("failed to insert point {index} into the triangulation")]
    CavityFailure { index: usize },
    #[error("triangulation produced no simplices")]
    Empty,
}

/// Containing simplex of a located point and its barycentric weights.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    pub simplex: usize,
    /// First `dim + 1` entries are used, in simplex vertex order.
    pub weights: [f64; 4],
}

/// Simplicial decomposition of a static point set.
///
/// Everything derived from the points (barycentric transforms, hull faces,
/// the location hierarchy) is computed once in [`Triangulation::build`];
/// afterwards the structure is read-only and safe to share across threads.
#[derive(Debug, Clone)]
pub struct Triangulation {
    dim: usize,
    points: Vec<Point3>,
    simplices: Vec<[usize; 4]>,
    transforms: Vec<Option<SimplexTransform>>,
    hull: Vec<HullFace>,
    bvh: Option<Bvh>,
    extent: f64,
}

impl Triangulation {
    /// Triangulate `points` in `dim` dimensions (2 or 3).
    ///
    /// For `dim == 2` the `z` coordinate is ignored and forced to zero.
    ///
    /// # Errors
    /// Returns an error for unsupported dimensions, non-finite or coincident
    /// points, too few points, or points that do not span `dim` dimensions.
    pub fn build(points: Vec<Point3>, dim: usize) -> Result<Self, TriangulationError> {
        let points: Vec<Point3> = if dim == 2 {
            points.into_iter().map(|p| Point3::new(p.x, p.y, 0.0)).collect()
        } else {
            points
        };
        let simplices = delaunay_simplices(&points, dim)?;

        let transforms: Vec<Option<SimplexTransform>> = simplices
            .iter()
            .map(|s| {
                let vertices: Vec<Point3> = s[..=dim].iter().map(|&i| points[i]).collect();
                SimplexTransform::new(&vertices, dim)
            })
            .collect();
        let degenerate = transforms.iter().filter(|t| t.is_none()).count();
        if degenerate > 0 {
            log::debug!("triangulation: {degenerate} numerically flat simplices");
        }

        let extent = BBox::from_points(&points).map_or(0.0, BBox::max_extent);
        let pad = Tolerance::DEFAULT.relative_to(extent);
        let boxes: Vec<BBox> = simplices
            .iter()
            .map(|s| {
                s[1..=dim]
                    .iter()
                    .fold(BBox::from_point(points[s[0]]), |b, &i| b.expand_point(points[i]))
                    .expand_by(pad)
            })
            .collect();
        let bvh = Bvh::build(&boxes);

        let hull = extract_hull_faces(&points, &simplices, dim);
        log::debug!(
            "triangulation: {} simplices, {} hull faces",
            simplices.len(),
            hull.len()
        );

        Ok(Self {
            dim,
            points,
            simplices,
            transforms,
            hull,
            bvh,
            extent,
        })
    }

    #[must_use]
    pub const fn dim(&self) -> usize {
        self.dim
    }

    #[must_use]
    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    #[must_use]
    pub fn simplex_count(&self) -> usize {
        self.simplices.len()
    }

    /// Vertex indices of simplex `index` (`dim + 1` of them).
    #[must_use]
    pub fn simplex(&self, index: usize) -> &[usize] {
        &self.simplices[index][..=self.dim]
    }

    #[must_use]
    pub fn hull_faces(&self) -> &[HullFace] {
        &self.hull
    }

    /// Largest side of the point set's bounding box.
    #[must_use]
    pub const fn extent(&self) -> f64 {
        self.extent
    }

    /// Find the simplex containing `p`.
    ///
    /// Weights down to `-Tolerance::BARYCENTRIC` are accepted so points on
    /// shared faces resolve. Never fails loudly: anything that cannot be
    /// located, including non-finite input, yields `None`.
    #[must_use]
    pub fn locate(&self, p: Point3) -> Option<Location> {
        let p = if self.dim == 2 { Point3::new(p.x, p.y, 0.0) } else { p };
        if !p.is_finite() {
            return None;
        }
        let bvh = self.bvh.as_ref()?;
        let slack = Tolerance::BARYCENTRIC.eps;

        let mut best: Option<(Location, f64)> = None;
        bvh.query_point(p, |simplex| {
            let Some(transform) = self.transforms[simplex] else {
                return true;
            };
            let weights = transform.weights(p);
            let min_weight = weights[..=self.dim]
                .iter()
                .copied()
                .fold(f64::INFINITY, f64::min);
            if !min_weight.is_finite() || min_weight < -slack {
                return true;
            }
            if best.is_none_or(|(_, current)| min_weight > current) {
                best = Some((Location { simplex, weights }, min_weight));
            }
            min_weight < 0.0
        });
        best.map(|(location, _)| location)
    }
}

//! Maps selected samples into the coordinate space that gets triangulated.
//!
//! The Euclidean adapter only guarantees a reference centre. The spherical
//! adapter switches to (radius, longitude°, latitude°), drops angular axes
//! the data does not span, and closes the domain towards radius zero with
//! synthetic points that carry the default value:
//!
//! 1. hull faces of the preliminary triangulation that face radius zero
//!    leave an anchor at their centroid projected onto `r = 0`;
//! 2. the outer edges of the `r = 0` point set are projected onto the
//!    data's own angular box;
//! 3. missing box corners are added.

use std::collections::HashSet;

use crate::geom::{Point3, Tolerance, Triangulation};

use super::error::{FieldError, FieldResult};
use super::samples::SelectedSamples;

/// Angular spans at or below this many degrees count as flat.
const FLAT_ANGULAR_SPAN: f64 = 1e-7;

/// Width in degrees of the bands batched angular queries are sorted into.
pub(crate) const ANGULAR_SORT_BAND: f64 = 5.0;

/// Degrees from the date-line within which longitudes snap onto `-180`.
pub const LONGITUDE_SEAM: f64 = 1e-9;

/// Point set ready for triangulation, with the values of every point.
#[derive(Debug, Clone)]
pub(crate) struct AdaptedDomain {
    pub dim: usize,
    pub points: Vec<Point3>,
    pub values: Vec<f64>,
    /// Reference centre in adapted coordinates.
    pub center: Point3,
    pub sample_count: usize,
    pub synthetic: SyntheticCounts,
}

/// Points added by an adapter, by origin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct SyntheticCounts {
    pub center: usize,
    pub anchors: usize,
    pub box_edges: usize,
    pub corners: usize,
}

/// Collects points while refusing synthetic duplicates.
struct PointSet {
    points: Vec<Point3>,
    values: Vec<f64>,
    keys: HashSet<[u64; 3]>,
}

impl PointSet {
    fn from_samples(points: Vec<Point3>, values: Vec<f64>) -> Self {
        let keys = points.iter().map(|p| p.bit_key()).collect();
        Self {
            points,
            values,
            keys,
        }
    }

    /// Add `p` unless an identical point is already present.
    fn push_synthetic(&mut self, p: Point3, value: f64) -> bool {
        if !self.keys.insert(p.bit_key()) {
            return false;
        }
        self.points.push(p);
        self.values.push(value);
        true
    }
}

pub(crate) fn adapt_euclidean(
    selected: SelectedSamples,
    default_value: f64,
) -> FieldResult<AdaptedDomain> {
    if selected.positions.is_empty() {
        return Err(FieldError::InvalidSamples(
            "no samples left after selection".to_string(),
        ));
    }
    let sample_count = selected.positions.len();
    let mut set = PointSet::from_samples(selected.positions, selected.values);
    let center = Point3::ORIGIN;
    let mut synthetic = SyntheticCounts::default();
    if set.push_synthetic(center, default_value) {
        synthetic.center = 1;
    }
    log::debug!(
        "adapter: euclidean, {} samples, centre {}",
        sample_count,
        if synthetic.center == 1 { "synthesized" } else { "sampled" }
    );

    Ok(AdaptedDomain {
        dim: selected.dim,
        points: set.points,
        values: set.values,
        center,
        sample_count,
        synthetic,
    })
}

/// Radius and angles of a position relative to the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphericalCoords {
    pub radius: f64,
    /// Degrees in `[-180, 180)`.
    pub lon: f64,
    /// Degrees in `[-90, 90]`.
    pub lat: f64,
}

impl SphericalCoords {
    #[must_use]
    pub fn from_cartesian(p: Point3) -> Self {
        let radius = p.to_vec3().length();
        if radius == 0.0 {
            return Self {
                radius,
                lon: 0.0,
                lat: 0.0,
            };
        }
        let lon = wrap_longitude(p.y.atan2(p.x).to_degrees());
        let lat = (p.z / radius).clamp(-1.0, 1.0).asin().to_degrees();
        Self { radius, lon, lat }
    }
}

/// Wrap a longitude in degrees into `[-180, 180)`.
///
/// Values within [`LONGITUDE_SEAM`] of the date-line land exactly on `-180`,
/// so both sides of it map to the same longitude.
#[must_use]
pub fn wrap_longitude(lon: f64) -> f64 {
    let wrapped = (lon + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped >= 180.0 - LONGITUDE_SEAM || wrapped < -180.0 + LONGITUDE_SEAM {
        -180.0
    } else {
        wrapped
    }
}

/// Active axes of the spherical representation and the data's angular box.
///
/// Reduced points are `(r, a, b)` where `a`, `b` are the active angular
/// axes in (longitude, latitude) order; unused trailing slots are zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct AngularFrame {
    use_lon: bool,
    use_lat: bool,
    /// `(min, max)` of each active angular axis, in slot order.
    ranges: [(f64, f64); 2],
}

impl AngularFrame {
    fn from_coords(coords: &[SphericalCoords]) -> Option<Self> {
        let lon = span(coords.iter().map(|c| c.lon));
        let lat = span(coords.iter().map(|c| c.lat));
        let use_lon = lon.1 - lon.0 > FLAT_ANGULAR_SPAN;
        let use_lat = lat.1 - lat.0 > FLAT_ANGULAR_SPAN;

        let ranges = match (use_lon, use_lat) {
            (true, true) => [lon, lat],
            (true, false) => [lon, (0.0, 0.0)],
            (false, true) => [lat, (0.0, 0.0)],
            (false, false) => return None,
        };
        Some(Self {
            use_lon,
            use_lat,
            ranges,
        })
    }

    pub(crate) fn dim(&self) -> usize {
        1 + usize::from(self.use_lon) + usize::from(self.use_lat)
    }

    fn angular_count(&self) -> usize {
        self.dim() - 1
    }

    pub(crate) fn reduce(&self, c: SphericalCoords) -> Point3 {
        match (self.use_lon, self.use_lat) {
            (true, true) => Point3::new(c.radius, c.lon, c.lat),
            (true, false) => Point3::new(c.radius, c.lon, 0.0),
            _ => Point3::new(c.radius, c.lat, 0.0),
        }
    }

    /// Centre of the angular box at radius zero.
    fn center(&self) -> Point3 {
        let mid = |(lo, hi): (f64, f64)| 0.5 * (lo + hi);
        Point3::new(0.0, mid(self.ranges[0]), mid(self.ranges[1]))
    }

    /// Corners of the angular box at radius zero.
    fn corners(&self) -> Vec<Point3> {
        let [(a0, a1), (b0, b1)] = self.ranges;
        if self.angular_count() == 1 {
            vec![Point3::new(0.0, a0, 0.0), Point3::new(0.0, a1, 0.0)]
        } else {
            vec![
                Point3::new(0.0, a0, b0),
                Point3::new(0.0, a1, b0),
                Point3::new(0.0, a0, b1),
                Point3::new(0.0, a1, b1),
            ]
        }
    }
}

fn span(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}

/// Angular position of a reduced point, as a planar coordinate pair.
pub(crate) fn angular_of(reduced: Point3) -> (f64, f64) {
    (reduced.y, reduced.z)
}

pub(crate) fn adapt_spherical(
    selected: SelectedSamples,
    default_value: f64,
) -> FieldResult<(AdaptedDomain, AngularFrame)> {
    if selected.dim != 3 {
        return Err(FieldError::InvalidSamples(
            "spherical mode needs 3-dimensional samples".to_string(),
        ));
    }
    if selected.positions.is_empty() {
        return Err(FieldError::InvalidSamples(
            "no samples left after selection".to_string(),
        ));
    }

    let coords: Vec<SphericalCoords> = selected
        .positions
        .iter()
        .copied()
        .map(SphericalCoords::from_cartesian)
        .collect();
    let frame = AngularFrame::from_coords(&coords).ok_or_else(|| {
        FieldError::InvalidSamples("samples span no angular extent".to_string())
    })?;
    let dim = frame.dim();
    let sample_count = coords.len();

    let reduced: Vec<Point3> = coords.iter().map(|c| frame.reduce(*c)).collect();
    let mut set = PointSet::from_samples(reduced, selected.values);
    let mut synthetic = SyntheticCounts::default();

    let center = frame.center();
    if set.push_synthetic(center, default_value) {
        synthetic.center = 1;
    }

    let preliminary = Triangulation::build(set.points.clone(), dim)?;
    for face in preliminary.hull_faces() {
        if faces_radius_zero(face.normal.to_array()) {
            let anchor = face.centroid();
            if set.push_synthetic(Point3::new(0.0, anchor.y, anchor.z), default_value) {
                synthetic.anchors += 1;
            }
        }
    }

    if frame.angular_count() == 2 {
        for p in project_to_box(&frame, &set.points) {
            if set.push_synthetic(p, default_value) {
                synthetic.box_edges += 1;
            }
        }
    }

    for corner in frame.corners() {
        if set.push_synthetic(corner, default_value) {
            synthetic.corners += 1;
        }
    }

    log::debug!(
        "adapter: spherical {dim}-D, {sample_count} samples, {} anchors, {} box edge points, {} corners",
        synthetic.anchors,
        synthetic.box_edges,
        synthetic.corners
    );

    Ok((
        AdaptedDomain {
            dim,
            points: set.points,
            values: set.values,
            center,
            sample_count,
            synthetic,
        },
        frame,
    ))
}

/// Whether an outward face normal `(n_r, n_a, n_b)` points towards `r = 0`
/// more than along any angular axis.
fn faces_radius_zero([n_r, n_a, n_b]: [f64; 3]) -> bool {
    n_r < 0.0 && -n_r > n_a.abs().max(n_b.abs())
}

/// Project the outer edges of the `r = 0` points onto the angular box.
///
/// Each hull edge of the zero-radius set goes to the box side its outward
/// normal points at most strongly.
fn project_to_box(frame: &AngularFrame, points: &[Point3]) -> Vec<Point3> {
    let zero: Vec<Point3> = points
        .iter()
        .filter(|p| p.x == 0.0)
        .map(|p| Point3::new(p.y, p.z, 0.0))
        .collect();
    let plane = match Triangulation::build(zero, 2) {
        Ok(plane) => plane,
        Err(err) => {
            log::debug!("adapter: no zero-radius outline ({err}), using box corners only");
            return Vec::new();
        }
    };

    let [(a0, a1), (b0, b1)] = frame.ranges;
    let tol = Tolerance::DEFAULT;
    let mut projected = Vec::new();
    for edge in plane.hull_faces() {
        let (na, nb) = (edge.normal.x, edge.normal.y);
        for corner in edge.corners() {
            let p = if na.abs() >= nb.abs() {
                Point3::new(0.0, if na > 0.0 { a1 } else { a0 }, corner.y)
            } else {
                Point3::new(0.0, corner.x, if nb > 0.0 { b1 } else { b0 })
            };
            if !projected.iter().any(|q: &Point3| q.distance_to(p) <= tol.eps) {
                projected.push(p);
            }
        }
    }
    projected
}

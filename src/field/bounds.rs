//! Conservative per-face bounding volumes used to prune hull faces before
//! ray intersection.
//!
//! A volume may admit faces the ray never reaches, but it must never reject
//! a face the ray does cross. Queries are grouped into batches summarised by
//! a [`Probe`]: a central key plus the spread of the batch around it.

use std::f64::consts::PI;

use crate::geom::{Circle, HullFace, Point3, Tolerance, Vec3, min_enclosing_circle};

use super::adapter::{ANGULAR_SORT_BAND, angular_of};

/// Elevation band of the direction sort used to batch cone queries.
const ELEVATION_SORT_BAND: f64 = PI / 16.0;

/// Central key of a query batch and how far the batch strays from it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Probe<K> {
    pub center: K,
    pub spread: f64,
}

impl<K> Probe<K> {
    #[must_use]
    pub const fn single(center: K) -> Self {
        Self {
            center,
            spread: 0.0,
        }
    }
}

/// A bounding volume around one hull face.
pub trait BoundingVolume: Send + Sync {
    /// Per-query key the volume is tested against.
    type Key: Copy + Send + Sync;

    /// Whether any query within `probe.spread` of `probe.center` could hit
    /// the face.
    fn admits(&self, probe: &Probe<Self::Key>) -> bool;

    /// Smallest probe covering every key, `None` for an empty slice.
    fn summarize(keys: &[Self::Key]) -> Option<Probe<Self::Key>>;

    /// Ordering that places nearby keys next to each other.
    fn sort_key(key: &Self::Key) -> (i64, f64);
}

/// Cone from the reference centre that contains every ray to a face.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingCone {
    pub axis: Vec3,
    /// Radians; `PI` admits every direction.
    pub half_angle: f64,
}

impl BoundingCone {
    pub const FULL: Self = Self {
        axis: Vec3::X,
        half_angle: PI,
    };

    /// Cone around the face normal, oriented to point from `center` towards
    /// the face. Faces whose plane passes through `center` get the full cone.
    #[must_use]
    pub fn for_face(face: &HullFace, center: Point3) -> Self {
        let mut axis = face.normal;
        let Some(first) = face.corners().first() else {
            return Self::FULL;
        };
        let mut height = axis.dot(*first - center);
        if height < 0.0 {
            axis = -axis;
            height = -height;
        }
        if height <= Tolerance::DEFAULT.relative_to(face.size()) {
            return Self::FULL;
        }

        let mut half_angle = 0.0_f64;
        for corner in face.corners() {
            match axis.angle_to(*corner - center) {
                Some(angle) => half_angle = half_angle.max(angle),
                None => return Self::FULL,
            }
        }
        Self { axis, half_angle }
    }

    #[must_use]
    pub fn contains_direction(&self, direction: Vec3) -> bool {
        self.admits(&Probe::single(direction))
    }
}

impl BoundingVolume for BoundingCone {
    type Key = Vec3;

    fn admits(&self, probe: &Probe<Vec3>) -> bool {
        if self.half_angle >= PI {
            return true;
        }
        probe.center.angle_to(self.axis).is_none_or(|angle| {
            angle <= self.half_angle + probe.spread + Tolerance::ANGLE.eps
        })
    }

    fn summarize(keys: &[Vec3]) -> Option<Probe<Vec3>> {
        if keys.is_empty() {
            return None;
        }
        let sum = keys.iter().fold(Vec3::ZERO, |acc, k| acc + *k);
        let Some(mean) = sum.normalized() else {
            return Some(Probe {
                center: Vec3::X,
                spread: PI,
            });
        };
        let spread = keys
            .iter()
            .map(|k| k.angle_to(mean).unwrap_or(PI))
            .fold(0.0_f64, f64::max);
        Some(Probe {
            center: mean,
            spread,
        })
    }

    fn sort_key(key: &Vec3) -> (i64, f64) {
        let elevation = key.z.clamp(-1.0, 1.0).asin();
        let band = (elevation / ELEVATION_SORT_BAND).floor() as i64;
        (band, key.y.atan2(key.x))
    }
}

/// Circle around a face's footprint in the angular plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingCircle {
    pub circle: Circle,
}

impl BoundingCircle {
    #[must_use]
    pub fn for_face(face: &HullFace) -> Self {
        let footprint: Vec<(f64, f64)> = face.corners().iter().map(|p| angular_of(*p)).collect();
        let circle = min_enclosing_circle(&footprint).unwrap_or(Circle {
            center: (0.0, 0.0),
            radius: f64::INFINITY,
        });
        Self { circle }
    }
}

impl BoundingVolume for BoundingCircle {
    type Key = (f64, f64);

    fn admits(&self, probe: &Probe<(f64, f64)>) -> bool {
        let reach = self.circle.radius + probe.spread;
        self.circle.distance_to_center(probe.center) <= reach + Tolerance::DEFAULT.relative_to(reach)
    }

    fn summarize(keys: &[(f64, f64)]) -> Option<Probe<(f64, f64)>> {
        if keys.is_empty() {
            return None;
        }
        let n = keys.len() as f64;
        let (sa, sb) = keys
            .iter()
            .fold((0.0, 0.0), |(sa, sb), (a, b)| (sa + a, sb + b));
        let center = (sa / n, sb / n);
        let spread = keys
            .iter()
            .map(|(a, b)| (a - center.0).hypot(b - center.1))
            .fold(0.0_f64, f64::max);
        Some(Probe { center, spread })
    }

    fn sort_key(key: &(f64, f64)) -> (i64, f64) {
        ((key.1 / ANGULAR_SORT_BAND).floor() as i64, key.0)
    }
}

/// Bounding volumes of all hull faces, in hull face order.
#[derive(Debug, Clone)]
pub struct BoundingVolumeIndex<V> {
    volumes: Vec<V>,
}

impl<V: BoundingVolume> BoundingVolumeIndex<V> {
    #[must_use]
    pub fn new(volumes: Vec<V>) -> Self {
        Self { volumes }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.volumes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.volumes.is_empty()
    }

    #[must_use]
    pub fn volumes(&self) -> &[V] {
        &self.volumes
    }

    /// Hull faces whose volume admits `probe`.
    #[must_use]
    pub fn candidates(&self, probe: &Probe<V::Key>) -> Vec<usize> {
        self.volumes
            .iter()
            .enumerate()
            .filter(|(_, v)| v.admits(probe))
            .map(|(i, _)| i)
            .collect()
    }

    /// Hull faces any of `keys` could reach.
    #[must_use]
    pub fn candidates_for(&self, keys: &[V::Key]) -> Vec<usize> {
        V::summarize(keys).map_or_else(Vec::new, |probe| self.candidates(&probe))
    }
}

impl BoundingVolumeIndex<BoundingCone> {
    #[must_use]
    pub fn cones(faces: &[HullFace], center: Point3) -> Self {
        Self::new(faces.iter().map(|f| BoundingCone::for_face(f, center)).collect())
    }
}

impl BoundingVolumeIndex<BoundingCircle> {
    #[must_use]
    pub fn circles(faces: &[HullFace]) -> Self {
        Self::new(faces.iter().map(BoundingCircle::for_face).collect())
    }
}

//! Coordinate-mode strategies behind one interface.
//!
//! Both modes share the same pipeline (interior lookup, bounding-volume
//! pruning, boundary extrapolation); they differ in how a query is mapped
//! into model coordinates and which ray and volume key it gets.

use std::cmp::Ordering;
use std::fmt;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::geom::{HullFace, Point3, Triangulation, Vec3};

use super::adapter::{AdaptedDomain, AngularFrame, SphericalCoords, angular_of};
use super::bounds::{BoundingCircle, BoundingCone, BoundingVolume, BoundingVolumeIndex, Probe};
use super::config::{CoordinateMode, FieldConfig};
use super::error::{FieldError, FieldResult};
use super::extrapolate::{BoundaryExtrapolator, Evaluation, Ray, Resolution};
use super::interior::InteriorInterpolator;

/// A built field for one coordinate mode.
///
/// Queries are positions relative to the configured origin, in Cartesian
/// coordinates for every mode.
pub trait FieldModel: Send + Sync + fmt::Debug {
    fn mode(&self) -> CoordinateMode;

    fn interior(&self) -> &InteriorInterpolator;

    /// Reference centre in model coordinates.
    fn center(&self) -> Point3;

    /// # Errors
    /// Returns [`FieldError::NudgeExhausted`] if a boundary crossing cannot
    /// be evaluated.
    fn evaluate(&self, query: Point3) -> FieldResult<Evaluation>;

    /// Evaluate many queries, sharing bounding-volume lookups between
    /// groups of at most `chunk_size` outside-hull queries.
    ///
    /// # Errors
    /// Stops at the first query that fails.
    fn evaluate_many(&self, queries: &[Point3], chunk_size: usize)
    -> FieldResult<Vec<Evaluation>>;
}

/// Query in model coordinates with its extrapolation ray and volume key.
#[derive(Debug, Clone, Copy)]
struct Projected<K> {
    position: Point3,
    ray: Option<(Ray, K)>,
}

/// Outside-hull query waiting for extrapolation.
#[derive(Debug, Clone, Copy)]
struct Pending<K> {
    index: usize,
    ray: Ray,
    key: K,
}

/// Mode-independent part of a model.
#[derive(Debug, Clone)]
struct Pipeline<V> {
    interior: InteriorInterpolator,
    index: BoundingVolumeIndex<V>,
    extrapolator: BoundaryExtrapolator,
    center: Point3,
}

impl<V: BoundingVolume> Pipeline<V> {
    fn build(
        domain: AdaptedDomain,
        config: &FieldConfig,
        volumes: impl FnOnce(&[HullFace], Point3) -> BoundingVolumeIndex<V>,
    ) -> FieldResult<Self> {
        let center = domain.center;
        let triangulation = Triangulation::build(domain.points, domain.dim)?;
        let interior = InteriorInterpolator::new(triangulation, domain.values)?;

        if interior.evaluate(center).is_none() {
            return Err(FieldError::CenterNotInterpolable {
                position: center.to_array(),
            });
        }

        let index = volumes(interior.triangulation().hull_faces(), center);
        log::debug!("model: {} bounding volumes", index.len());
        Ok(Self {
            interior,
            index,
            extrapolator: BoundaryExtrapolator::new(
                config.default_value,
                config.max_nudge_retries,
            ),
            center,
        })
    }

    fn evaluate(&self, projected: Option<Projected<V::Key>>) -> FieldResult<Evaluation> {
        let Some(projected) = projected else {
            return Ok(self.extrapolator.fallback(Resolution::Invalid));
        };
        if let Some(value) = self.interior.evaluate(projected.position) {
            return Ok(Evaluation {
                value,
                resolution: Resolution::Interior,
            });
        }
        let Some((ray, key)) = projected.ray else {
            return Ok(self.extrapolator.fallback(Resolution::Missed));
        };
        let candidates = self.index.candidates(&Probe::single(key));
        self.extrapolator
            .extrapolate(&self.interior, &ray, candidates)
    }

    /// Interior lookups for every query; `None` marks queries that still
    /// need a boundary crossing.
    fn interior_pass(&self, projected: &Projected<V::Key>) -> Option<Evaluation> {
        if let Some(value) = self.interior.evaluate(projected.position) {
            return Some(Evaluation {
                value,
                resolution: Resolution::Interior,
            });
        }
        match projected.ray {
            Some(_) => None,
            None => Some(self.extrapolator.fallback(Resolution::Missed)),
        }
    }

    fn extrapolate_chunk(&self, chunk: &[Pending<V::Key>]) -> FieldResult<Vec<(usize, Evaluation)>> {
        let keys: Vec<V::Key> = chunk.iter().map(|p| p.key).collect();
        let shared = self.index.candidates_for(&keys);
        let volumes = self.index.volumes();

        chunk
            .iter()
            .map(|pending| {
                let probe = Probe::single(pending.key);
                let own = shared
                    .iter()
                    .copied()
                    .filter(|&face| volumes[face].admits(&probe));
                self.extrapolator
                    .extrapolate(&self.interior, &pending.ray, own)
                    .map(|evaluation| (pending.index, evaluation))
            })
            .collect()
    }

    fn evaluate_many(
        &self,
        projected: &[Option<Projected<V::Key>>],
        chunk_size: usize,
    ) -> FieldResult<Vec<Evaluation>> {
        let first = self.interior_results(projected);

        let mut pending: Vec<Pending<V::Key>> = first
            .iter()
            .zip(projected)
            .enumerate()
            .filter_map(|(index, (done, projected))| match (done, projected) {
                (None, Some(Projected { ray: Some((ray, key)), .. })) => Some(Pending {
                    index,
                    ray: *ray,
                    key: *key,
                }),
                _ => None,
            })
            .collect();
        pending.sort_by(|a, b| compare_keys::<V>(&a.key, &b.key));
        log::debug!(
            "model: {} of {} queries outside the hull",
            pending.len(),
            projected.len()
        );

        let resolved = self.extrapolate_chunks(&pending, chunk_size.max(1))?;
        let mut results = first;
        for (index, evaluation) in resolved.into_iter().flatten() {
            results[index] = Some(evaluation);
        }
        Ok(results
            .into_iter()
            .map(|r| r.unwrap_or_else(|| self.extrapolator.fallback(Resolution::Missed)))
            .collect())
    }

    #[cfg(feature = "parallel")]
    fn interior_results(&self, projected: &[Option<Projected<V::Key>>]) -> Vec<Option<Evaluation>> {
        projected
            .par_iter()
            .map(|p| match p {
                Some(p) => self.interior_pass(p),
                None => Some(self.extrapolator.fallback(Resolution::Invalid)),
            })
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    fn interior_results(&self, projected: &[Option<Projected<V::Key>>]) -> Vec<Option<Evaluation>> {
        projected
            .iter()
            .map(|p| match p {
                Some(p) => self.interior_pass(p),
                None => Some(self.extrapolator.fallback(Resolution::Invalid)),
            })
            .collect()
    }

    #[cfg(feature = "parallel")]
    fn extrapolate_chunks(
        &self,
        pending: &[Pending<V::Key>],
        chunk_size: usize,
    ) -> FieldResult<Vec<Vec<(usize, Evaluation)>>> {
        pending
            .par_chunks(chunk_size)
            .map(|chunk| self.extrapolate_chunk(chunk))
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    fn extrapolate_chunks(
        &self,
        pending: &[Pending<V::Key>],
        chunk_size: usize,
    ) -> FieldResult<Vec<Vec<(usize, Evaluation)>>> {
        pending
            .chunks(chunk_size)
            .map(|chunk| self.extrapolate_chunk(chunk))
            .collect()
    }
}

fn compare_keys<V: BoundingVolume>(a: &V::Key, b: &V::Key) -> Ordering {
    let (band_a, along_a) = V::sort_key(a);
    let (band_b, along_b) = V::sort_key(b);
    band_a.cmp(&band_b).then(along_a.total_cmp(&along_b))
}

#[cfg(feature = "parallel")]
fn project_all<K: Send>(
    queries: &[Point3],
    project: impl Fn(Point3) -> Option<Projected<K>> + Sync,
) -> Vec<Option<Projected<K>>> {
    queries.par_iter().map(|q| project(*q)).collect()
}

#[cfg(not(feature = "parallel"))]
fn project_all<K: Send>(
    queries: &[Point3],
    project: impl Fn(Point3) -> Option<Projected<K>> + Sync,
) -> Vec<Option<Projected<K>>> {
    queries.iter().map(|q| project(*q)).collect()
}

/// Identity coordinates; rays leave the reference centre towards the query.
#[derive(Debug, Clone)]
pub struct EuclideanField {
    dim: usize,
    pipeline: Pipeline<BoundingCone>,
}

impl EuclideanField {
    pub(crate) fn build(domain: AdaptedDomain, config: &FieldConfig) -> FieldResult<Self> {
        let dim = domain.dim;
        let pipeline = Pipeline::build(domain, config, BoundingVolumeIndex::cones)?;
        Ok(Self { dim, pipeline })
    }

    #[must_use]
    pub fn bounding_volumes(&self) -> &BoundingVolumeIndex<BoundingCone> {
        &self.pipeline.index
    }

    fn project(&self, query: Point3) -> Option<Projected<Vec3>> {
        let position = if self.dim == 2 {
            Point3::new(query.x, query.y, 0.0)
        } else {
            query
        };
        if !position.is_finite() {
            return None;
        }
        let center = self.pipeline.center;
        let ray = (position - center).normalized().map(|direction| {
            (
                Ray {
                    origin: center,
                    direction,
                },
                direction,
            )
        });
        Some(Projected { position, ray })
    }
}

impl FieldModel for EuclideanField {
    fn mode(&self) -> CoordinateMode {
        CoordinateMode::Euclidean
    }

    fn interior(&self) -> &InteriorInterpolator {
        &self.pipeline.interior
    }

    fn center(&self) -> Point3 {
        self.pipeline.center
    }

    fn evaluate(&self, query: Point3) -> FieldResult<Evaluation> {
        self.pipeline.evaluate(self.project(query))
    }

    fn evaluate_many(
        &self,
        queries: &[Point3],
        chunk_size: usize,
    ) -> FieldResult<Vec<Evaluation>> {
        let projected = project_all(queries, |q| self.project(q));
        self.pipeline.evaluate_many(&projected, chunk_size)
    }
}

/// (radius, longitude, latitude) coordinates; rays run outwards in radius
/// at the query's own angular position.
#[derive(Debug, Clone)]
pub struct SphericalField {
    frame: AngularFrame,
    pipeline: Pipeline<BoundingCircle>,
}

impl SphericalField {
    pub(crate) fn build(
        domain: AdaptedDomain,
        frame: AngularFrame,
        config: &FieldConfig,
    ) -> FieldResult<Self> {
        let pipeline = Pipeline::build(domain, config, |faces, _| {
            BoundingVolumeIndex::circles(faces)
        })?;
        Ok(Self { frame, pipeline })
    }

    #[must_use]
    pub fn bounding_volumes(&self) -> &BoundingVolumeIndex<BoundingCircle> {
        &self.pipeline.index
    }

    /// Number of triangulated axes: radius plus each angular axis the
    /// samples span.
    #[must_use]
    pub fn dim(&self) -> usize {
        self.frame.dim()
    }

    fn project(&self, query: Point3) -> Option<Projected<(f64, f64)>> {
        if !query.is_finite() {
            return None;
        }
        let position = self.frame.reduce(SphericalCoords::from_cartesian(query));
        let ray = Ray {
            origin: Point3::new(0.0, position.y, position.z),
            direction: Vec3::X,
        };
        Some(Projected {
            position,
            ray: Some((ray, angular_of(position))),
        })
    }
}

impl FieldModel for SphericalField {
    fn mode(&self) -> CoordinateMode {
        CoordinateMode::Spherical
    }

    fn interior(&self) -> &InteriorInterpolator {
        &self.pipeline.interior
    }

    fn center(&self) -> Point3 {
        self.pipeline.center
    }

    fn evaluate(&self, query: Point3) -> FieldResult<Evaluation> {
        self.pipeline.evaluate(self.project(query))
    }

    fn evaluate_many(
        &self,
        queries: &[Point3],
        chunk_size: usize,
    ) -> FieldResult<Vec<Evaluation>> {
        let projected = project_all(queries, |q| self.project(q));
        self.pipeline.evaluate_many(&projected, chunk_size)
    }
}

use crate::geom::Point3;

use super::adapter::{AdaptedDomain, adapt_euclidean, adapt_spherical};
use super::config::{CoordinateMode, FieldConfig};
use super::diagnostics::{BatchReport, BuildDiagnostics};
use super::error::FieldResult;
use super::extrapolate::Evaluation;
use super::model::{EuclideanField, FieldModel, SphericalField};
use super::samples::{SampleSet, SelectedSamples};

/// Scalar field over scattered samples, defined everywhere.
///
/// Inside the samples' hull the field is piecewise linear; outside it takes
/// the value where the ray from the reference centre through the query
/// leaves the hull, or the configured default when there is no such
/// crossing. Built once, then read-only: every query method takes `&self`
/// and the interpolator can be shared across threads.
///
/// ```ignore
/// let samples = SampleSet::from_xyz(&positions, &values)?;
/// let field = FieldInterpolator::build(&samples, &FieldConfig::euclidean())?;
/// let values = field.evaluate_batch(&queries)?;
/// ```
#[derive(Debug)]
pub struct FieldInterpolator {
    model: Box<dyn FieldModel>,
    origin: Point3,
    sample_dim: usize,
    batch_chunk_size: usize,
    diagnostics: BuildDiagnostics,
}

impl FieldInterpolator {
    /// # Errors
    /// Fails for an invalid configuration, when no usable samples remain,
    /// when the adapted points cannot be triangulated, or when the reference
    /// centre does not interpolate.
    pub fn build(samples: &SampleSet, config: &FieldConfig) -> FieldResult<Self> {
        config.validate()?;
        let origin = samples.origin_point(config);
        let selected = samples.select(config);
        let mut diagnostics = selection_diagnostics(samples, &selected, config.mode);

        let model: Box<dyn FieldModel> = match config.mode {
            CoordinateMode::Euclidean => {
                let domain = adapt_euclidean(selected, config.default_value)?;
                record_domain(&mut diagnostics, &domain);
                Box::new(EuclideanField::build(domain, config)?)
            }
            CoordinateMode::Spherical => {
                let (domain, frame) = adapt_spherical(selected, config.default_value)?;
                record_domain(&mut diagnostics, &domain);
                Box::new(SphericalField::build(domain, frame, config)?)
            }
        };

        let triangulation = model.interior().triangulation();
        diagnostics.point_count = triangulation.points().len();
        diagnostics.simplex_count = triangulation.simplex_count();
        diagnostics.hull_face_count = triangulation.hull_faces().len();
        log::debug!(
            "field: built {:?} model, {} simplices, {} hull faces",
            config.mode,
            diagnostics.simplex_count,
            diagnostics.hull_face_count
        );

        Ok(Self {
            model,
            origin,
            sample_dim: samples.dim(),
            batch_chunk_size: config.batch_chunk_size,
            diagnostics,
        })
    }

    #[must_use]
    pub fn mode(&self) -> CoordinateMode {
        self.model.mode()
    }

    #[must_use]
    pub fn model(&self) -> &dyn FieldModel {
        self.model.as_ref()
    }

    #[must_use]
    pub fn diagnostics(&self) -> &BuildDiagnostics {
        &self.diagnostics
    }

    /// Field value at `point`.
    ///
    /// # Errors
    /// Returns [`FieldError::NudgeExhausted`](super::FieldError::NudgeExhausted)
    /// when a boundary crossing cannot be evaluated.
    pub fn evaluate(&self, point: impl Into<Point3>) -> FieldResult<f64> {
        self.evaluate_detailed(point).map(|e| e.value)
    }

    /// Field value at `point` and how it was obtained.
    ///
    /// # Errors
    /// See [`FieldInterpolator::evaluate`].
    pub fn evaluate_detailed(&self, point: impl Into<Point3>) -> FieldResult<Evaluation> {
        self.model.evaluate(self.relative(point.into()))
    }

    /// Field values at every point, in input order.
    ///
    /// # Errors
    /// Fails on the first query that fails; see
    /// [`FieldInterpolator::evaluate`].
    pub fn evaluate_batch(&self, points: &[Point3]) -> FieldResult<Vec<f64>> {
        self.evaluate_batch_with_report(points)
            .map(|(values, _)| values)
    }

    /// Like [`FieldInterpolator::evaluate_batch`], with a summary of how the
    /// queries were resolved.
    ///
    /// # Errors
    /// See [`FieldInterpolator::evaluate_batch`].
    pub fn evaluate_batch_with_report(
        &self,
        points: &[Point3],
    ) -> FieldResult<(Vec<f64>, BatchReport)> {
        let relative: Vec<Point3> = points.iter().map(|p| self.relative(*p)).collect();
        let evaluations = self
            .model
            .evaluate_many(&relative, self.batch_chunk_size)?;
        let report = BatchReport::from_evaluations(&evaluations);
        log::debug!(
            "field: batch of {} ({} interior, {} extrapolated, {} default)",
            report.query_count,
            report.interior_count,
            report.extrapolated_count,
            report.defaulted_count()
        );
        Ok((evaluations.iter().map(|e| e.value).collect(), report))
    }

    fn relative(&self, point: Point3) -> Point3 {
        let p = Point3::from(point - self.origin);
        if self.sample_dim == 2 {
            Point3::new(p.x, p.y, 0.0)
        } else {
            p
        }
    }
}

fn selection_diagnostics(
    samples: &SampleSet,
    selected: &SelectedSamples,
    mode: CoordinateMode,
) -> BuildDiagnostics {
    let mut diagnostics = BuildDiagnostics {
        mode,
        input_sample_count: samples.len(),
        dropped_non_finite_count: selected.dropped_non_finite,
        dropped_by_shell_count: selected.dropped_by_shell,
        ..BuildDiagnostics::default()
    };
    if selected.dropped_non_finite > 0 {
        diagnostics.add_warning(format!(
            "{} samples with non-finite values were ignored",
            selected.dropped_non_finite
        ));
    }
    diagnostics
}

fn record_domain(diagnostics: &mut BuildDiagnostics, domain: &AdaptedDomain) {
    diagnostics.dim = domain.dim;
    diagnostics.used_sample_count = domain.sample_count;
    diagnostics.synthetic_center = domain.synthetic.center > 0;
    diagnostics.synthetic_anchor_count = domain.synthetic.anchors;
    diagnostics.synthetic_box_edge_count = domain.synthetic.box_edges;
    diagnostics.synthetic_corner_count = domain.synthetic.corners;
}

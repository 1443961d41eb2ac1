use crate::geom::{Point3, Tolerance, Triangulation};

use super::error::{FieldError, FieldResult};

/// Weights of a usable simplex must sum to one within this tolerance.
const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

/// Piecewise-linear interpolation over a triangulation.
#[derive(Debug, Clone)]
pub struct InteriorInterpolator {
    triangulation: Triangulation,
    values: Vec<f64>,
}

impl InteriorInterpolator {
    /// # Errors
    /// Returns [`FieldError::InvalidSamples`] when `values` does not match
    /// the triangulation's point count.
    pub fn new(triangulation: Triangulation, values: Vec<f64>) -> FieldResult<Self> {
        if values.len() != triangulation.points().len() {
            return Err(FieldError::InvalidSamples(format!(
                "{} values for {} triangulated points",
                values.len(),
                triangulation.points().len()
            )));
        }
        Ok(Self {
            triangulation,
            values,
        })
    }

    #[must_use]
    pub fn triangulation(&self) -> &Triangulation {
        &self.triangulation
    }

    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Barycentric value at `p`, or `None` outside the hull or in a
    /// numerically degenerate simplex.
    #[must_use]
    pub fn evaluate(&self, p: Point3) -> Option<f64> {
        let location = self.triangulation.locate(p)?;
        let vertices = self.triangulation.simplex(location.simplex);
        let weights = &location.weights[..vertices.len()];

        let sum: f64 = weights.iter().sum();
        if !Tolerance::new(WEIGHT_SUM_TOLERANCE).approx_eq_f64(sum, 1.0) {
            return None;
        }
        let value: f64 = weights
            .iter()
            .zip(vertices)
            .map(|(w, &v)| w * self.values[v])
            .sum();
        value.is_finite().then_some(value)
    }
}

use crate::geom::Point3;

use super::config::FieldConfig;
use super::error::{FieldError, FieldResult};

/// Static scattered samples: positions with one scalar value each.
///
/// Two-dimensional sets carry `z = 0`. Positions must be finite; values
/// may be non-finite and are then skipped when a field is built.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleSet {
    dim: usize,
    positions: Vec<Point3>,
    values: Vec<f64>,
}

impl SampleSet {
    /// # Errors
    /// Returns [`FieldError::InvalidSamples`] for an unsupported dimension,
    /// empty input, mismatched lengths or non-finite positions.
    pub fn new(dim: usize, positions: Vec<Point3>, values: Vec<f64>) -> FieldResult<Self> {
        if !(2..=3).contains(&dim) {
            return Err(FieldError::InvalidSamples(format!(
                "samples must be 2- or 3-dimensional, got {dim}"
            )));
        }
        if positions.is_empty() {
            return Err(FieldError::InvalidSamples("no samples".to_string()));
        }
        if positions.len() != values.len() {
            return Err(FieldError::InvalidSamples(format!(
                "{} positions but {} values",
                positions.len(),
                values.len()
            )));
        }
        if let Some(index) = positions.iter().position(|p| !p.is_finite()) {
            return Err(FieldError::InvalidSamples(format!(
                "sample {index} has a non-finite position"
            )));
        }
        let positions = if dim == 2 {
            positions
                .into_iter()
                .map(|p| Point3::new(p.x, p.y, 0.0))
                .collect()
        } else {
            positions
        };
        Ok(Self {
            dim,
            positions,
            values,
        })
    }

    /// # Errors
    /// See [`SampleSet::new`].
    pub fn from_xyz(positions: &[[f64; 3]], values: &[f64]) -> FieldResult<Self> {
        Self::new(
            3,
            positions.iter().copied().map(Point3::from_array).collect(),
            values.to_vec(),
        )
    }

    /// # Errors
    /// See [`SampleSet::new`].
    pub fn from_xy(positions: &[[f64; 2]], values: &[f64]) -> FieldResult<Self> {
        Self::new(
            2,
            positions.iter().map(|p| Point3::new(p[0], p[1], 0.0)).collect(),
            values.to_vec(),
        )
    }

    #[must_use]
    pub const fn dim(&self) -> usize {
        self.dim
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    #[must_use]
    pub fn positions(&self) -> &[Point3] {
        &self.positions
    }

    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (Point3, f64)> + '_ {
        self.positions.iter().copied().zip(self.values.iter().copied())
    }

    /// Shift to the configured origin and drop samples that may not take
    /// part in construction.
    pub(crate) fn select(&self, config: &FieldConfig) -> SelectedSamples {
        let origin = self.origin_point(config);
        let mut selected = SelectedSamples {
            dim: self.dim,
            positions: Vec::with_capacity(self.len()),
            values: Vec::with_capacity(self.len()),
            dropped_non_finite: 0,
            dropped_by_shell: 0,
        };

        for (position, value) in self.iter() {
            if !value.is_finite() {
                selected.dropped_non_finite += 1;
                continue;
            }
            let relative = Point3::from(position - origin);
            let radius = relative.to_vec3().length();
            if config.shell.is_some_and(|shell| !shell.contains(radius)) {
                selected.dropped_by_shell += 1;
                continue;
            }
            selected.positions.push(relative);
            selected.values.push(value);
        }

        if selected.dropped_non_finite > 0 {
            log::warn!(
                "samples: dropped {} samples with non-finite values",
                selected.dropped_non_finite
            );
        }
        if selected.dropped_by_shell > 0 {
            log::debug!(
                "samples: {} samples outside the radius shell",
                selected.dropped_by_shell
            );
        }
        selected
    }

    /// Configured origin, flattened for 2-D sets.
    pub(crate) fn origin_point(&self, config: &FieldConfig) -> Point3 {
        let [x, y, z] = config.origin;
        if self.dim == 2 {
            Point3::new(x, y, 0.0)
        } else {
            Point3::new(x, y, z)
        }
    }
}

/// Samples relative to the origin that survived selection.
#[derive(Debug, Clone)]
pub(crate) struct SelectedSamples {
    pub dim: usize,
    pub positions: Vec<Point3>,
    pub values: Vec<f64>,
    pub dropped_non_finite: usize,
    pub dropped_by_shell: usize,
}

//! Construction parameters for a field interpolator.
//!
//! Everything that shapes a build is passed in explicitly through
//! [`FieldConfig`]; there is no process-wide state. The struct derives
//! `serde` traits so callers can keep it in whatever format they already
//! load settings from.

use serde::{Deserialize, Serialize};

use super::error::{FieldError, FieldResult};

/// How sample positions are interpreted before triangulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateMode {
    /// Positions are used as given.
    #[default]
    Euclidean,
    /// Positions are mapped to (radius, longitude°, latitude°) around the
    /// origin and extrapolation walks along the radius only.
    Spherical,
}

/// Radial selection applied to samples before construction.
///
/// A sample at distance `r` from the origin takes part when
/// `r_min * inner_margin < r < r_max * outer_margin`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RadiusShell {
    pub r_min: f64,
    pub r_max: f64,
    #[serde(default = "RadiusShell::default_inner_margin")]
    pub inner_margin: f64,
    #[serde(default = "RadiusShell::default_outer_margin")]
    pub outer_margin: f64,
}

impl RadiusShell {
    pub const DEFAULT_INNER_MARGIN: f64 = 0.9;
    pub const DEFAULT_OUTER_MARGIN: f64 = 1.1;

    #[must_use]
    pub const fn new(r_min: f64, r_max: f64) -> Self {
        Self {
            r_min,
            r_max,
            inner_margin: Self::DEFAULT_INNER_MARGIN,
            outer_margin: Self::DEFAULT_OUTER_MARGIN,
        }
    }

    #[must_use]
    pub const fn with_margins(mut self, inner: f64, outer: f64) -> Self {
        self.inner_margin = inner;
        self.outer_margin = outer;
        self
    }

    const fn default_inner_margin() -> f64 {
        Self::DEFAULT_INNER_MARGIN
    }

    const fn default_outer_margin() -> f64 {
        Self::DEFAULT_OUTER_MARGIN
    }

    /// Lower exclusive bound on the radius.
    #[must_use]
    pub fn lower(&self) -> f64 {
        self.r_min * self.inner_margin
    }

    /// Upper exclusive bound on the radius.
    #[must_use]
    pub fn upper(&self) -> f64 {
        self.r_max * self.outer_margin
    }

    #[must_use]
    pub fn contains(&self, radius: f64) -> bool {
        radius > self.lower() && radius < self.upper()
    }

    fn validate(&self) -> FieldResult<()> {
        let values = [self.r_min, self.r_max, self.inner_margin, self.outer_margin];
        if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(FieldError::InvalidConfig(format!(
                "radius shell values must be finite and non-negative: {self:?}"
            )));
        }
        if self.lower() >= self.upper() {
            return Err(FieldError::InvalidConfig(format!(
                "radius shell is empty: ({}, {})",
                self.lower(),
                self.upper()
            )));
        }
        Ok(())
    }
}

/// Options for building a [`FieldInterpolator`](super::FieldInterpolator).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    pub mode: CoordinateMode,
    /// Value of the synthesized reference centre and anchor points, and the
    /// answer for queries that miss every hull face.
    pub default_value: f64,
    /// Reference point subtracted from every sample and query position.
    pub origin: [f64; 3],
    /// Optional radial sample selection around `origin`.
    pub shell: Option<RadiusShell>,
    /// Upper bound on inward nudges of a boundary crossing.
    pub max_nudge_retries: u32,
    /// Number of outside-hull queries sharing one bounding-volume lookup.
    pub batch_chunk_size: usize,
}

impl FieldConfig {
    pub const DEFAULT_MAX_NUDGE_RETRIES: u32 = 64;
    pub const DEFAULT_BATCH_CHUNK_SIZE: usize = 256;

    #[must_use]
    pub fn euclidean() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn spherical() -> Self {
        Self {
            mode: CoordinateMode::Spherical,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_mode(mut self, mode: CoordinateMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_default_value(mut self, value: f64) -> Self {
        self.default_value = value;
        self
    }

    #[must_use]
    pub fn with_origin(mut self, origin: [f64; 3]) -> Self {
        self.origin = origin;
        self
    }

    #[must_use]
    pub fn with_shell(mut self, shell: RadiusShell) -> Self {
        self.shell = Some(shell);
        self
    }

    #[must_use]
    pub fn with_max_nudge_retries(mut self, retries: u32) -> Self {
        self.max_nudge_retries = retries;
        self
    }

    #[must_use]
    pub fn with_batch_chunk_size(mut self, size: usize) -> Self {
        self.batch_chunk_size = size;
        self
    }

    /// Check the configuration before any geometry is built.
    ///
    /// # Errors
    /// Returns [`FieldError::InvalidConfig`] for non-finite values, an empty
    /// radius shell or a zero chunk size.
    pub fn validate(&self) -> FieldResult<()> {
        if !self.default_value.is_finite() {
            return Err(FieldError::InvalidConfig(
                "default_value must be finite".to_string(),
            ));
        }
        if self.origin.iter().any(|c| !c.is_finite()) {
            return Err(FieldError::InvalidConfig(format!(
                "origin must be finite: {:?}",
                self.origin
            )));
        }
        if self.batch_chunk_size == 0 {
            return Err(FieldError::InvalidConfig(
                "batch_chunk_size must be at least 1".to_string(),
            ));
        }
        if let Some(shell) = &self.shell {
            shell.validate()?;
        }
        Ok(())
    }
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            mode: CoordinateMode::Euclidean,
            default_value: 0.0,
            origin: [0.0; 3],
            shell: None,
            max_nudge_retries: Self::DEFAULT_MAX_NUDGE_RETRIES,
            batch_chunk_size: Self::DEFAULT_BATCH_CHUNK_SIZE,
        }
    }
}

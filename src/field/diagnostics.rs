//! Build and query diagnostics returned alongside field results.

use std::fmt;

use serde::Serialize;

use super::config::CoordinateMode;
use super::extrapolate::{Evaluation, Resolution};

/// What went into a built field.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct BuildDiagnostics {
    pub mode: CoordinateMode,
    /// Number of triangulated axes.
    pub dim: usize,

    /// Samples handed to the build.
    pub input_sample_count: usize,
    /// Samples skipped because their value was not finite.
    pub dropped_non_finite_count: usize,
    /// Samples outside the configured radius shell.
    pub dropped_by_shell_count: usize,
    /// Samples that took part in the triangulation.
    pub used_sample_count: usize,

    pub synthetic_center: bool,
    /// Zero-radius anchors below inward-facing hull faces (spherical).
    pub synthetic_anchor_count: usize,
    /// Points projected onto the angular box (spherical).
    pub synthetic_box_edge_count: usize,
    /// Angular box corners (spherical).
    pub synthetic_corner_count: usize,

    pub point_count: usize,
    pub simplex_count: usize,
    pub hull_face_count: usize,

    pub warnings: Vec<String>,
}

impl BuildDiagnostics {
    #[must_use]
    pub fn synthetic_count(&self) -> usize {
        usize::from(self.synthetic_center)
            + self.synthetic_anchor_count
            + self.synthetic_box_edge_count
            + self.synthetic_corner_count
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }
}

impl fmt::Display for BuildDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Field Diagnostics ({:?}, {}-D):", self.mode, self.dim)?;
        writeln!(
            f,
            "  Samples: {} used of {}",
            self.used_sample_count, self.input_sample_count
        )?;
        if self.dropped_non_finite_count > 0 || self.dropped_by_shell_count > 0 {
            writeln!(f, "  Dropped:")?;
            if self.dropped_non_finite_count > 0 {
                writeln!(f, "    - Non-finite values: {}", self.dropped_non_finite_count)?;
            }
            if self.dropped_by_shell_count > 0 {
                writeln!(f, "    - Outside radius shell: {}", self.dropped_by_shell_count)?;
            }
        }
        if self.synthetic_count() > 0 {
            writeln!(f, "  Synthetic points: {}", self.synthetic_count())?;
        }
        writeln!(
            f,
            "  Triangulation: {} points, {} simplices, {} hull faces",
            self.point_count, self.simplex_count, self.hull_face_count
        )?;
        for warning in &self.warnings {
            writeln!(f, "  Warning: {warning}")?;
        }
        Ok(())
    }
}

/// How the queries of one batch were resolved.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub query_count: usize,
    pub interior_count: usize,
    /// Values taken from a boundary crossing.
    pub extrapolated_count: usize,
    /// Rays that crossed no candidate face.
    pub missed_count: usize,
    /// First crossings outside their face.
    pub outside_face_count: usize,
    /// Non-finite query positions.
    pub invalid_count: usize,
    pub total_nudges: u64,
    pub max_nudges: u32,
}

impl BatchReport {
    #[must_use]
    pub fn from_evaluations(evaluations: &[Evaluation]) -> Self {
        let mut report = Self {
            query_count: evaluations.len(),
            ..Self::default()
        };
        for evaluation in evaluations {
            match evaluation.resolution {
                Resolution::Interior => report.interior_count += 1,
                Resolution::Crossing { nudges, .. } => {
                    report.extrapolated_count += 1;
                    report.total_nudges += u64::from(nudges);
                    report.max_nudges = report.max_nudges.max(nudges);
                }
                Resolution::Missed => report.missed_count += 1,
                Resolution::OutsideFace { .. } => report.outside_face_count += 1,
                Resolution::Invalid => report.invalid_count += 1,
            }
        }
        report
    }

    /// Queries answered with the default value.
    #[must_use]
    pub const fn defaulted_count(&self) -> usize {
        self.missed_count + self.outside_face_count + self.invalid_count
    }
}

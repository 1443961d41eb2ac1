//! Scalar fields over scattered samples: domain adapters, barycentric
//! interpolation inside the hull and ray-based extrapolation outside it.

mod adapter;
mod bounds;
mod config;
mod diagnostics;
mod engine;
mod error;
mod extrapolate;
mod interior;
mod model;
mod samples;

pub use adapter::{LONGITUDE_SEAM, SphericalCoords, wrap_longitude};
pub use bounds::{
    BoundingCircle, BoundingCone, BoundingVolume, BoundingVolumeIndex, Probe,
};
pub use config::{CoordinateMode, FieldConfig, RadiusShell};
pub use diagnostics::{BatchReport, BuildDiagnostics};
pub use engine::FieldInterpolator;
pub use error::{FieldError, FieldResult};
pub use extrapolate::{BoundaryExtrapolator, Evaluation, Ray, Resolution};
pub use interior::InteriorInterpolator;
pub use model::{EuclideanField, FieldModel, SphericalField};
pub use samples::SampleSet;

#[cfg(test)]
mod tests;

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Scattered-data interpolation with well-defined values outside the
//! sampled region.
//!
//! [`geom`] holds the domain-agnostic kernel (Delaunay triangulation, hull
//! faces, point location); [`field`] builds scalar fields on top of it in
//! Euclidean or spherical coordinates.

pub mod field;
pub mod geom;

pub use field::{
    BatchReport, BuildDiagnostics, CoordinateMode, FieldConfig, FieldError, FieldInterpolator,
    FieldResult, RadiusShell, SampleSet,
};
pub use geom::{Point3, Vec3};

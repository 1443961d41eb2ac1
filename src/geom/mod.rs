//! Domain-agnostic computational geometry: value types, Delaunay
//! triangulation, hull faces, point location and small simplex predicates.

mod bvh;
mod core;
mod delaunay;
mod hull;
mod simplex;
mod triangulation;

pub use self::core::{BBox, Point3, Tolerance, Vec3};
pub use hull::HullFace;
pub use simplex::{
    Circle, SimplexTransform, circumsphere, min_enclosing_circle, orient2d, orient3d,
};
pub use triangulation::{Location, Triangulation, TriangulationError};

#[cfg(test)]
mod tests;

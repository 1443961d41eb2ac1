//! Values for queries outside the hull.
//!
//! A ray leaves the reference point through the query; the first hull face
//! it crosses supplies the value at the crossing. The crossing sits on a
//! simplex boundary, so the interior lookup is retried with the ray
//! parameter stepped back towards the origin by a growing number of ulps.

use crate::geom::{HullFace, Point3, Tolerance, Vec3};

use super::error::{FieldError, FieldResult};
use super::interior::InteriorInterpolator;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Point3,
    /// Unit direction.
    pub direction: Vec3,
}

impl Ray {
    #[must_use]
    pub fn at(&self, alpha: f64) -> Point3 {
        self.origin.add_vec(self.direction * alpha)
    }
}

/// How a query obtained its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Located inside the hull.
    Interior,
    /// Taken from the first hull crossing of the extrapolation ray.
    Crossing { face: usize, nudges: u32 },
    /// The ray crosses no candidate face.
    Missed,
    /// The first crossing lies outside its face.
    OutsideFace { face: usize },
    /// Non-finite query position.
    Invalid,
}

impl Resolution {
    #[must_use]
    pub const fn used_default(self) -> bool {
        matches!(self, Self::Missed | Self::OutsideFace { .. } | Self::Invalid)
    }
}

/// Value of one query together with how it was obtained.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub value: f64,
    pub resolution: Resolution,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundaryExtrapolator {
    default_value: f64,
    max_nudge_retries: u32,
}

impl BoundaryExtrapolator {
    #[must_use]
    pub const fn new(default_value: f64, max_nudge_retries: u32) -> Self {
        Self {
            default_value,
            max_nudge_retries,
        }
    }

    #[must_use]
    pub const fn default_value(&self) -> f64 {
        self.default_value
    }

    #[must_use]
    pub const fn fallback(&self, resolution: Resolution) -> Evaluation {
        Evaluation {
            value: self.default_value,
            resolution,
        }
    }

    /// Face with the smallest positive ray parameter among `candidates`.
    ///
    /// Faces whose plane contains the ray origin are skipped: the ray starts
    /// on them rather than crossing them.
    #[must_use]
    pub fn first_crossing(
        faces: &[HullFace],
        candidates: impl IntoIterator<Item = usize>,
        ray: &Ray,
    ) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for index in candidates {
            let face = &faces[index];
            if face.passes_through(ray.origin, Tolerance::DEFAULT) {
                continue;
            }
            let Some(alpha) = face.ray_parameter(ray.origin, ray.direction) else {
                continue;
            };
            if alpha > 0.0 && best.is_none_or(|(_, current)| alpha < current) {
                best = Some((index, alpha));
            }
        }
        best
    }

    /// Extrapolate along `ray`, testing only the `candidates` faces.
    ///
    /// # Errors
    /// Returns [`FieldError::NudgeExhausted`] when the crossing cannot be
    /// evaluated within the configured number of nudges.
    pub fn extrapolate(
        &self,
        interior: &InteriorInterpolator,
        ray: &Ray,
        candidates: impl IntoIterator<Item = usize>,
    ) -> FieldResult<Evaluation> {
        let faces = interior.triangulation().hull_faces();
        let Some((face, alpha)) = Self::first_crossing(faces, candidates, ray) else {
            return Ok(self.fallback(Resolution::Missed));
        };

        let hit = ray.at(alpha);
        if !faces[face].contains(hit, Tolerance::DEFAULT) {
            return Ok(self.fallback(Resolution::OutsideFace { face }));
        }

        for nudges in 0..=self.max_nudge_retries {
            let point = ray.at(nudge_toward_origin(alpha, nudges));
            if let Some(value) = interior.evaluate(point) {
                if nudges > 0 {
                    log::trace!("extrapolate: face {face} resolved after {nudges} nudges");
                }
                return Ok(Evaluation {
                    value,
                    resolution: Resolution::Crossing { face, nudges },
                });
            }
        }

        Err(FieldError::NudgeExhausted {
            position: hit.to_array(),
            retries: self.max_nudge_retries,
        })
    }
}

/// `alpha` reduced by `2^(step - 1)` ulps; `step == 0` leaves it unchanged.
fn nudge_toward_origin(alpha: f64, step: u32) -> f64 {
    if step == 0 || alpha <= 0.0 {
        return alpha;
    }
    let ulps = 1_u64.checked_shl(step - 1).unwrap_or(u64::MAX);
    f64::from_bits(alpha.to_bits().saturating_sub(ulps))
}

#[cfg(test)]
mod tests {
    use super::nudge_toward_origin;

    #[test]
    fn nudge_steps_down_by_growing_ulps() {
        let alpha = 1.0_f64;
        assert_eq!(nudge_toward_origin(alpha, 0), alpha);
        let one = nudge_toward_origin(alpha, 1);
        assert!(one < alpha);
        assert_eq!(one.to_bits(), alpha.to_bits() - 1);
        assert_eq!(nudge_toward_origin(alpha, 4).to_bits(), alpha.to_bits() - 8);
    }

    #[test]
    fn large_nudges_bottom_out_at_zero() {
        assert_eq!(nudge_toward_origin(0.5, 64), 0.0);
        assert_eq!(nudge_toward_origin(0.5, 200), 0.0);
    }
}

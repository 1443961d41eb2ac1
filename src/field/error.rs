use crate::geom::TriangulationError;

/// Result type for field construction and queries.
pub type FieldResult<T> = Result<T, FieldError>;

#[derive(Debug, thiserror::Error)]
pub enum FieldError {
    #[error("invalid sample set: {0}")]
    InvalidSamples(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("geometry error: {0}")]
    Geometry(#[from] TriangulationError),
    #[error("reference centre {position:?} does not interpolate to a finite value")]
    CenterNotInterpolable { position: [f64; 3] },
    #[error("boundary crossing for query {position:?} did not resolve after {retries} nudges")]
    NudgeExhausted { position: [f64; 3], retries: u32 },
}

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SamplingError {
    #[error("number of points must be positive")]
    InvalidPointCount,

    #[error("sphere dimension must be at least 2, got {dim}")]
    InvalidDimension { dim: usize },

    #[error("minimum angular distance must be positive, got {min_distance}")]
    InvalidMinDistance { min_distance: f64 },

    #[error("fixed timeout threshold must be positive")]
    InvalidTimeout,

    // Only reachable if the normal draws keep collapsing to a zero (or non-finite) vector.
    #[error("could not draw a non-degenerate gaussian vector after {attempts} attempts")]
    DegenerateSample { attempts: usize },
}

impl SamplingError {
    /// Whether the caller can fix this by passing different parameters.
    pub fn is_invalid_parameter(&self) -> bool {
        !matches!(self, SamplingError::DegenerateSample { .. })
    }
}

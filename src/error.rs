//! Error taxonomy for configuration and generation failures.

use thiserror::Error;

/// Errors raised while validating a [`MeshConfig`](crate::MeshConfig) or
/// while walking a symbol string.
///
/// Every variant is fatal for the generation call that produced it: no
/// partial [`MeshBuffer`](crate::MeshBuffer) is ever returned alongside one.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeneratorError {
    /// A real-valued parameter was NaN or infinite.
    #[error("Invalid configuration: `{field}` must be finite")]
    NonFinite { field: &'static str },

    /// A length or diameter was zero or negative.
    #[error("Invalid configuration: `{field}` must be positive (got {value})")]
    NonPositive { field: &'static str, value: f32 },

    /// The angle step was not strictly inside (-360, 360).
    #[error("Invalid configuration: angle per step {value} is outside (-360, 360)")]
    AngleOutOfRange { value: f32 },

    /// An angle step of exactly zero degrees.
    #[error("Invalid configuration: angle per step must be non-zero")]
    ZeroAngle,

    /// Iteration count outside `1..=max`.
    #[error("Invalid configuration: iterations {value} outside 1..={max}")]
    IterationsOutOfRange { value: u32, max: u32 },

    /// The heading could not be normalized.
    #[error("Degenerate heading at symbol {position}")]
    DegenerateHeading { position: usize },

    /// A close-branch symbol arrived with an empty branch stack.
    #[error("Unbalanced branch: `]` at symbol {position} has no matching `[`")]
    UnbalancedBranch { position: usize },
}

impl GeneratorError {
    /// Returns true for the configuration family of errors, including the
    /// degenerate heading fault.
    pub fn is_configuration(&self) -> bool {
        !matches!(self, Self::UnbalancedBranch { .. })
    }
}

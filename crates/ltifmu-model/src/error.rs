//! Errors raised while realizing a model.

use thiserror::Error;

/// Errors that can occur while turning a [`ModelSpec`](crate::ModelSpec) into an
/// [`LtiModel`](crate::LtiModel).
#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    /// A matrix or vector dimension disagrees with the rest of the model.
    #[error("shape mismatch: {what} expected {expected}, found {actual}")]
    ShapeMismatch {
        /// The offending dimension, e.g. "B rows".
        what: String,
        /// What the rest of the model requires.
        expected: String,
        /// What was supplied.
        actual: String,
    },

    /// Row-major input whose rows have differing lengths.
    #[error("invalid matrix {name}: row {row} has {len} columns, expected {expected}")]
    RaggedMatrix {
        name: &'static str,
        row: usize,
        len: usize,
        expected: usize,
    },

    /// None of A, B, C, D was supplied.
    #[error("state-space model needs at least one of A, B, C, D")]
    NoMatrices,

    /// Transfer-function denominator is empty or all zeros.
    #[error("transfer function denominator is empty or zero")]
    EmptyDenominator,

    /// Numerator degree exceeds denominator degree.
    #[error("improper transfer function: numerator degree {num_degree} exceeds denominator degree {den_degree}")]
    ImproperTransferFunction { num_degree: usize, den_degree: usize },

    /// All PID gains are zero.
    #[error("at least one of kp, ki, kd must be non-zero")]
    NoActiveGain,

    /// Derivative term requested without a positive filter time constant.
    #[error("derivative filter time constant must be greater than zero, found {value}")]
    TimeConstant { value: f64 },

    /// A coefficient is NaN or infinite.
    #[error("{what} contains a non-finite value")]
    NonFinite { what: String },
}

impl ModelError {
    pub(crate) fn shape(
        what: impl Into<String>,
        expected: impl std::fmt::Display,
        actual: impl std::fmt::Display,
    ) -> Self {
        ModelError::ShapeMismatch {
            what: what.into(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }
}

/// Result type for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;

//! Code generation errors.

use thiserror::Error;

/// Errors that can occur while rendering generated artifacts.
#[derive(Debug, Error, PartialEq)]
pub enum CodegenError {
    #[error("invalid model identifier '{identifier}': must be a C identifier")]
    InvalidIdentifier { identifier: String },

    /// The layout handed to a renderer was not computed from the model.
    #[error("layout ({layout_nx}, {layout_nu}, {layout_ny}) does not match model ({nx}, {nu}, {ny})")]
    LayoutMismatch {
        layout_nx: usize,
        layout_nu: usize,
        layout_ny: usize,
        nx: usize,
        nu: usize,
        ny: usize,
    },

    #[error("step size must be finite and positive, found {value}")]
    InvalidStepSize { value: f64 },
}

/// Result type for code generation.
pub type Result<T> = std::result::Result<T, CodegenError>;

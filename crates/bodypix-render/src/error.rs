//! Error types for the render crate.

use bodypix_core::CoreError;
use thiserror::Error;

/// Result type alias for render operations
pub type RenderResult<T> = Result<T, RenderError>;

/// Render errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    /// Image and mask sizes disagree
    #[error("Dimension mismatch: expected {expected:?}, got {actual:?}")]
    DimensionMismatch {
        /// Expected `(width, height)`
        expected: (u32, u32),
        /// Actual `(width, height)`
        actual: (u32, u32),
    },

    /// An argument is out of range
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Core type error
    #[error("Core error: {0}")]
    Core(#[from] CoreError),
}

impl RenderError {
    /// Create a dimension mismatch error
    pub fn dimension_mismatch(expected: (u32, u32), actual: (u32, u32)) -> Self {
        RenderError::DimensionMismatch { expected, actual }
    }

    /// Create an invalid argument error
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        RenderError::InvalidArgument(msg.into())
    }
}

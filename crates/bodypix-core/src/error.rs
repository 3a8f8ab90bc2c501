//! Error types for the BodyPix core crate.
//!
//! Errors are derived with [`thiserror`]. The decode and render crates wrap
//! [`CoreError`] in their own error enums.

use thiserror::Error;

/// A specialized `Result` type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised by the core types and geometric helpers.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum CoreError {
    /// A value failed validation
    #[error("Validation error: {message}")]
    Validation {
        /// Description of what validation failed
        message: String,
    },

    /// Two buffers that must agree in size do not
    #[error("Dimension mismatch: expected {expected} elements, got {actual}")]
    DimensionMismatch {
        /// Expected element count
        expected: usize,
        /// Actual element count
        actual: usize,
    },
}

impl CoreError {
    /// Creates a new validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates a new dimension mismatch error.
    #[must_use]
    pub fn dimension_mismatch(expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch { expected, actual }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::validation("score out of range");
        assert_eq!(err.to_string(), "Validation error: score out of range");

        let err = CoreError::dimension_mismatch(16, 12);
        assert_eq!(
            err.to_string(),
            "Dimension mismatch: expected 16 elements, got 12"
        );
    }
}

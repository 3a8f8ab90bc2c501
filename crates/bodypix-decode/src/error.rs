//! Error types for the decode crate.

use bodypix_core::CoreError;
use thiserror::Error;

/// Result type alias for decode operations
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Decode errors
#[derive(Error, Debug)]
pub enum DecodeError {
    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Shape mismatch error
    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        /// Expected shape
        expected: Vec<usize>,
        /// Actual shape
        actual: Vec<usize>,
    },

    /// Invalid input error
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An assignment engine failed or is not usable
    #[error("Engine error: {0}")]
    Engine(String),

    /// Core type error
    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DecodeError {
    /// Create a configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        DecodeError::Config(msg.into())
    }

    /// Create a shape mismatch error
    pub fn shape_mismatch(expected: Vec<usize>, actual: Vec<usize>) -> Self {
        DecodeError::ShapeMismatch { expected, actual }
    }

    /// Create an invalid input error
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        DecodeError::InvalidInput(msg.into())
    }

    /// Create an engine error
    pub fn engine<S: Into<String>>(msg: S) -> Self {
        DecodeError::Engine(msg.into())
    }
}

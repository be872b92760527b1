//! Error types for the test framework

use thiserror::Error;

/// Errors that can occur during regression testing
#[derive(Debug, Error)]
pub enum TestError {
    /// Failed to write a frame
    #[error("failed to write frame '{path}': {message}")]
    FrameWrite { path: String, message: String },

    /// Failed to read a frame
    #[error("failed to read frame '{path}': {message}")]
    FrameRead { path: String, message: String },

    /// Invalid generator parameters
    #[error("invalid generator parameters: {0}")]
    InvalidParameters(String),

    /// Core library error
    #[error("core error: {0}")]
    Core(#[from] inpaint_core::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for test operations
pub type TestResult<T> = Result<T, TestError>;

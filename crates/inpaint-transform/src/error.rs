//! Error types for inpaint-transform

use thiserror::Error;

/// Errors that can occur during downsampling and pyramid construction
#[derive(Debug, Error)]
pub enum TransformError {
    /// Core library error
    #[error("core error: {0}")]
    Core(#[from] inpaint_core::Error),

    /// Channel count outside the supported range
    #[error("unsupported channel count: expected 1 to 4, got {0}")]
    UnsupportedChannels(u32),

    /// Source too small to be halved
    #[error("source too small to halve: {width}x{height}")]
    SourceTooSmall { width: u32, height: u32 },

    /// Target layout does not match the halved source
    #[error("target mismatch: expected {expected:?}, got {actual:?}")]
    TargetMismatch {
        expected: (u32, u32, u32),
        actual: (u32, u32, u32),
    },

    /// Invalid parameters
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),
}

/// Result type for transform operations
pub type TransformResult<T> = Result<T, TransformError>;

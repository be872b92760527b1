//! Error types for inpaint-core

use thiserror::Error;

/// Inpaint core error type
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid frame dimensions: {width}x{height}")]
    InvalidDimension { width: u32, height: u32 },

    #[error("dimension mismatch: expected {expected:?}, got {actual:?}")]
    DimensionMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    #[error("channel mismatch: expected {expected}, got {actual}")]
    ChannelMismatch { expected: u32, actual: u32 },

    #[error("unsupported channel count: {0}")]
    UnsupportedChannels(u32),

    #[error("pixel origin mismatch")]
    OriginMismatch,

    #[error("invalid mask: {0}")]
    InvalidMask(String),

    #[error("buffer too small: need {required} elements, got {actual}")]
    BufferTooSmall { required: usize, actual: usize },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("memory allocation failed")]
    AllocationFailed,

    #[error("worker thread pool: {0}")]
    Worker(#[from] rayon::ThreadPoolBuildError),
}

/// Result type for inpaint-core operations
pub type Result<T> = std::result::Result<T, Error>;

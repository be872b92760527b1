//! Error types for inpaint-filter

use thiserror::Error;

/// Errors that can occur during filtering operations
#[derive(Debug, Error)]
pub enum FilterError {
    /// Core library error
    #[error("core error: {0}")]
    Core(#[from] inpaint_core::Error),

    /// Filter size not odd or zero
    #[error("invalid filter size: {0} (must be odd and positive)")]
    InvalidFilterSize(u32),

    /// Frame smaller than half the filter
    #[error("frame {width}x{height} too small for a {horizontal}x{vertical} filter")]
    FrameTooSmall {
        width: u32,
        height: u32,
        horizontal: u32,
        vertical: u32,
    },

    /// Channel count not supported by this operation
    #[error("unsupported channel count: {0}")]
    UnsupportedChannels(u32),

    /// Target layout does not fit the source
    #[error("target mismatch: expected {expected:?}, got {actual:?}")]
    TargetMismatch {
        expected: (u32, u32, u32),
        actual: (u32, u32, u32),
    },

    /// Accumulated values could exceed the accumulator type
    #[error("accumulator overflow: {0}")]
    Overflow(String),

    /// Invalid parameters
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// Caller requested cancellation
    #[error("operation aborted")]
    Aborted,

    /// A frame did not become available in time
    #[error("timed out waiting for frame {index}")]
    Timeout { index: usize },
}

/// Result type for filter operations
pub type FilterResult<T> = Result<T, FilterError>;

//! Error types for inpaint-synthesis

use thiserror::Error;

/// Errors that can occur while arranging a synthesis pyramid
#[derive(Debug, Error)]
pub enum SynthesisError {
    /// Core library error
    #[error("core error: {0}")]
    Core(#[from] inpaint_core::Error),

    /// Mask analysis error
    #[error("region error: {0}")]
    Region(#[from] inpaint_region::RegionError),

    /// Downsampling error
    #[error("transform error: {0}")]
    Transform(#[from] inpaint_transform::TransformError),

    /// Smoothing error
    #[error("filter error: {0}")]
    Filter(#[from] inpaint_filter::FilterError),

    /// The mask holds no masked pixel
    #[error("mask has no pixel to inpaint")]
    NothingToInpaint,

    /// The first halving removed every masked pixel
    #[error("mask vanishes in the first coarser layer")]
    MaskVanishesAtFirstLayer,

    /// The frame cannot be halved at least once
    #[error("frame {width}x{height} too small for a pyramid")]
    FrameTooSmall { width: u32, height: u32 },

    /// `arrange` called on an arranged pyramid
    #[error("pyramid already arranged")]
    AlreadyArranged,

    /// Option values out of range
    #[error("invalid options: {0}")]
    InvalidOptions(String),
}

/// Result type for synthesis operations
pub type SynthesisResult<T> = Result<T, SynthesisError>;

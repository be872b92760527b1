//! inpaint-transform - Resolution reduction for inpainting
//!
//! This crate halves frames and builds multi-resolution pyramids:
//!
//! - Mask-aware halving, averaging only valid source pixels
//! - Threshold-based halving of binary masks
//! - Plain 2x2 halving with 1-2-1 weighted odd borders
//! - 1-4-6-4-1 halving with mirrored borders, selected per pyramid through
//!   [`DownsamplingMode`]
//! - [`FramePyramid`] - Layered frames, each half the size of its predecessor

mod error;
pub mod pyramid;
pub mod shrinker;

pub use error::{TransformError, TransformResult};
pub use pyramid::FramePyramid;
pub use shrinker::{
    DEFAULT_BINARY_MASK_THRESHOLD, DownsamplingMode, divide_by_two, divide_by_two_frames,
    downsample_binary_mask_by_two, downsample_by_two_11, downsample_by_two_14641,
};

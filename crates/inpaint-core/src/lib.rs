//! Inpaint Core - Basic data structures for mask-aware image pyramids
//!
//! This crate provides the fundamental pieces shared by every other
//! inpaint crate:
//!
//! - [`Frame`] - Owned interleaved raster with row padding
//! - [`FrameView`] / [`FrameViewMut`] - Borrowed views into frame storage
//! - [`Mask`] - Single-channel 8-bit frame holding valid/invalid sentinels
//! - [`PixelBoundingBox`] - Inclusive pixel rectangle with an explicit empty state
//! - [`Worker`] - Row-partitioned fork-join executor
//! - [`mirrored_index`] - Border mirroring shared by unmasked kernels
//!
//! Kernels accept an optional worker (`Option<&Worker>`). Passing `None`
//! runs the kernel on the calling thread over the full row range.

pub mod border;
pub mod bounding_box;
pub mod error;
pub mod frame;
pub mod worker;

pub use border::mirrored_index;
pub use bounding_box::PixelBoundingBox;
pub use error::{Error, Result};
pub use frame::{
    DataType, Element, Frame, FrameView, FrameViewMut, MASK_INVALID, MASK_VALID, Mask,
    PixelOrigin, is_binary_mask, validate_frame_mask, validate_mask,
};
pub use worker::{Worker, execute, execute_rows_mut, execute_rows_mut_pair};

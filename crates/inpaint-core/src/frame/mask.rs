//! Binary masks
//!
//! A mask is a single-channel 8-bit frame whose pixels are either
//! [`MASK_VALID`] or [`MASK_INVALID`]. Kernels consuming a mask reject any
//! other byte value.

use super::{Frame, FrameView, PixelOrigin};
use crate::error::{Error, Result};
use crate::frame::Element;

/// Single-channel 8-bit frame holding mask sentinels
pub type Mask = Frame<u8>;

/// Pixel is part of the known image content.
pub const MASK_VALID: u8 = 0xFF;

/// Pixel is masked (a hole to be inpainted).
pub const MASK_INVALID: u8 = 0x00;

impl Frame<u8> {
    /// Create a mask where every pixel holds `value`.
    pub fn new_mask(width: u32, height: u32, value: u8, origin: PixelOrigin) -> Result<Mask> {
        let mut mask = Frame::new(width, height, 1, origin)?;
        if value != 0 {
            mask.fill(value);
        }
        Ok(mask)
    }
}

/// True if every pixel of a single-channel view is a mask sentinel.
pub fn is_binary_mask(mask: FrameView<'_, u8>) -> bool {
    mask.channels() == 1
        && (0..mask.height()).all(|y| {
            mask.row(y)
                .iter()
                .all(|&v| v == MASK_VALID || v == MASK_INVALID)
        })
}

/// Check that `mask` is a single-channel binary mask.
///
/// # Errors
///
/// Returns [`Error::ChannelMismatch`] for a multi-channel view and
/// [`Error::InvalidMask`] naming the first offending pixel.
pub fn validate_mask(mask: FrameView<'_, u8>) -> Result<()> {
    if mask.channels() != 1 {
        return Err(Error::ChannelMismatch {
            expected: 1,
            actual: mask.channels(),
        });
    }
    for y in 0..mask.height() {
        if let Some(x) = mask
            .row(y)
            .iter()
            .position(|&v| v != MASK_VALID && v != MASK_INVALID)
        {
            return Err(Error::InvalidMask(format!("value {} at ({}, {})", mask.row(y)[x], x, y)));
        }
    }
    Ok(())
}

/// Check that `mask` is a binary mask covering the pixel grid of `frame`.
pub fn validate_frame_mask<T: Element>(
    frame: FrameView<'_, T>,
    mask: FrameView<'_, u8>,
) -> Result<()> {
    if frame.width() != mask.width() || frame.height() != mask.height() {
        return Err(Error::DimensionMismatch {
            expected: (frame.width(), frame.height()),
            actual: (mask.width(), mask.height()),
        });
    }
    if frame.origin() != mask.origin() {
        return Err(Error::OriginMismatch);
    }
    validate_mask(mask)
}

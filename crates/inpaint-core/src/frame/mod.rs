//! Frame - Interleaved raster with row padding
//!
//! A [`Frame`] owns its storage. Each row holds `width * channels` pixel
//! elements followed by `padding_elements` unused elements, so the distance
//! between two rows (the stride) is `width * channels + padding_elements`.
//!
//! [`FrameView`] and [`FrameViewMut`] borrow the same layout from storage
//! owned elsewhere. Their lifetime is bounded by the borrowed buffer.

mod mask;
mod view;

pub use mask::{MASK_INVALID, MASK_VALID, Mask, is_binary_mask, validate_frame_mask, validate_mask};
pub use view::{FrameView, FrameViewMut};

use crate::error::{Error, Result};
use std::fmt::Debug;

/// Element type of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    UnsignedInteger8,
    SignedInteger16,
    SignedInteger32,
    UnsignedInteger32,
    SignedInteger64,
    SignedFloat32,
}

impl DataType {
    /// Size of one element in bytes.
    pub fn bytes(self) -> usize {
        match self {
            DataType::UnsignedInteger8 => 1,
            DataType::SignedInteger16 => 2,
            DataType::SignedInteger32 | DataType::UnsignedInteger32 | DataType::SignedFloat32 => 4,
            DataType::SignedInteger64 => 8,
        }
    }
}

/// Scalar type that can be stored in a [`Frame`].
pub trait Element: Copy + Default + PartialEq + Debug + Send + Sync + 'static {
    const DATA_TYPE: DataType;
}

impl Element for u8 {
    const DATA_TYPE: DataType = DataType::UnsignedInteger8;
}

impl Element for i16 {
    const DATA_TYPE: DataType = DataType::SignedInteger16;
}

impl Element for i32 {
    const DATA_TYPE: DataType = DataType::SignedInteger32;
}

impl Element for u32 {
    const DATA_TYPE: DataType = DataType::UnsignedInteger32;
}

impl Element for i64 {
    const DATA_TYPE: DataType = DataType::SignedInteger64;
}

impl Element for f32 {
    const DATA_TYPE: DataType = DataType::SignedFloat32;
}

/// Location of the first row in memory.
///
/// Filtering never looks at the origin; it is carried so that derived
/// frames keep the orientation of their source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PixelOrigin {
    #[default]
    UpperLeft,
    LowerLeft,
}

/// Allocate a zero-initialized buffer, reporting allocation failure.
pub(crate) fn allocate<T: Element>(len: usize) -> Result<Vec<T>> {
    let mut data = Vec::new();
    data.try_reserve_exact(len)
        .map_err(|_| Error::AllocationFailed)?;
    data.resize(len, T::default());
    Ok(data)
}

/// Compute `(stride, total)` element counts for a frame layout.
pub(crate) fn layout(
    width: u32,
    height: u32,
    channels: u32,
    padding_elements: u32,
) -> Result<(usize, usize)> {
    if width == 0 || height == 0 {
        return Err(Error::InvalidDimension { width, height });
    }
    if channels == 0 {
        return Err(Error::UnsupportedChannels(channels));
    }
    let stride = (width as usize)
        .checked_mul(channels as usize)
        .and_then(|v| v.checked_add(padding_elements as usize))
        .ok_or(Error::AllocationFailed)?;
    let total = stride
        .checked_mul(height as usize)
        .ok_or(Error::AllocationFailed)?;
    Ok((stride, total))
}

/// Owned interleaved raster
#[derive(Debug, Clone, PartialEq)]
pub struct Frame<T: Element> {
    width: u32,
    height: u32,
    channels: u32,
    padding_elements: u32,
    origin: PixelOrigin,
    data: Vec<T>,
}

impl<T: Element> Frame<T> {
    /// Create a zero-initialized frame without row padding.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimension`] for a zero width or height,
    /// [`Error::UnsupportedChannels`] for zero channels and
    /// [`Error::AllocationFailed`] if the storage cannot be reserved.
    pub fn new(width: u32, height: u32, channels: u32, origin: PixelOrigin) -> Result<Self> {
        Self::with_padding(width, height, channels, 0, origin)
    }

    /// Create a zero-initialized frame with `padding_elements` unused
    /// elements at the end of each row.
    pub fn with_padding(
        width: u32,
        height: u32,
        channels: u32,
        padding_elements: u32,
        origin: PixelOrigin,
    ) -> Result<Self> {
        let (_, total) = layout(width, height, channels, padding_elements)?;
        Ok(Self {
            width,
            height,
            channels,
            padding_elements,
            origin,
            data: allocate(total)?,
        })
    }

    /// Create a frame where every pixel holds `value`.
    ///
    /// `value` must contain one element per channel.
    pub fn filled(width: u32, height: u32, value: &[T], origin: PixelOrigin) -> Result<Self> {
        let mut frame = Self::new(width, height, value.len() as u32, origin)?;
        frame.fill_pixel(value)?;
        Ok(frame)
    }

    /// Take ownership of an existing buffer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BufferTooSmall`] unless `data.len()` equals
    /// `(width * channels + padding_elements) * height`.
    pub fn from_data(
        width: u32,
        height: u32,
        channels: u32,
        padding_elements: u32,
        origin: PixelOrigin,
        data: Vec<T>,
    ) -> Result<Self> {
        let (_, total) = layout(width, height, channels, padding_elements)?;
        if data.len() != total {
            return Err(Error::BufferTooSmall {
                required: total,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            channels,
            padding_elements,
            origin,
            data,
        })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn channels(&self) -> u32 {
        self.channels
    }

    #[inline]
    pub fn padding_elements(&self) -> u32 {
        self.padding_elements
    }

    #[inline]
    pub fn origin(&self) -> PixelOrigin {
        self.origin
    }

    #[inline]
    pub fn data_type(&self) -> DataType {
        T::DATA_TYPE
    }

    /// Number of elements between the starts of two consecutive rows.
    #[inline]
    pub fn stride_elements(&self) -> usize {
        self.width as usize * self.channels as usize + self.padding_elements as usize
    }

    /// Number of pixel elements in one row (padding excluded).
    #[inline]
    pub fn row_elements(&self) -> usize {
        self.width as usize * self.channels as usize
    }

    #[inline]
    pub fn pixels(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// True if rows are stored back to back without padding.
    #[inline]
    pub fn is_continuous(&self) -> bool {
        self.padding_elements == 0
    }

    /// Whole backing buffer, padding included.
    #[inline]
    pub fn data(&self) -> &[T] {
        &self.data
    }

    #[inline]
    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<T> {
        self.data
    }

    /// Pixel elements of row `y` (padding excluded).
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    #[inline]
    pub fn row(&self, y: u32) -> &[T] {
        let start = y as usize * self.stride_elements();
        &self.data[start..start + self.row_elements()]
    }

    #[inline]
    pub fn row_mut(&mut self, y: u32) -> &mut [T] {
        let start = y as usize * self.stride_elements();
        let len = self.row_elements();
        &mut self.data[start..start + len]
    }

    /// Channel values of pixel `(x, y)`.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> &[T] {
        let channels = self.channels as usize;
        let start = y as usize * self.stride_elements() + x as usize * channels;
        &self.data[start..start + channels]
    }

    #[inline]
    pub fn pixel_mut(&mut self, x: u32, y: u32) -> &mut [T] {
        let channels = self.channels as usize;
        let start = y as usize * self.stride_elements() + x as usize * channels;
        &mut self.data[start..start + channels]
    }

    /// Set every element of every pixel to `value`. Padding is untouched.
    pub fn fill(&mut self, value: T) {
        for y in 0..self.height {
            self.row_mut(y).fill(value);
        }
    }

    /// Set every pixel to the per-channel `value`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelMismatch`] if `value.len() != channels`.
    pub fn fill_pixel(&mut self, value: &[T]) -> Result<()> {
        if value.len() != self.channels as usize {
            return Err(Error::ChannelMismatch {
                expected: self.channels,
                actual: value.len() as u32,
            });
        }
        let channels = self.channels as usize;
        for y in 0..self.height {
            for pixel in self.row_mut(y).chunks_exact_mut(channels) {
                pixel.copy_from_slice(value);
            }
        }
        Ok(())
    }

    /// True if `other` has the same size, channel count and origin.
    pub fn has_layout_of<U: Element>(&self, other: &Frame<U>) -> bool {
        self.width == other.width
            && self.height == other.height
            && self.channels == other.channels
            && self.origin == other.origin
    }

    /// Reallocate unless the frame already has the requested layout.
    ///
    /// Returns `true` when new storage was allocated; the content is then
    /// zero. Existing content is kept otherwise.
    pub fn ensure_layout(
        &mut self,
        width: u32,
        height: u32,
        channels: u32,
        origin: PixelOrigin,
    ) -> Result<bool> {
        if self.width == width
            && self.height == height
            && self.channels == channels
            && self.origin == origin
        {
            return Ok(false);
        }
        *self = Self::new(width, height, channels, origin)?;
        Ok(true)
    }

    /// Copy pixel content from a view of identical size and channel count.
    pub fn copy_from(&mut self, source: FrameView<'_, T>) -> Result<()> {
        if source.width() != self.width || source.height() != self.height {
            return Err(Error::DimensionMismatch {
                expected: (self.width, self.height),
                actual: (source.width(), source.height()),
            });
        }
        if source.channels() != self.channels {
            return Err(Error::ChannelMismatch {
                expected: self.channels,
                actual: source.channels(),
            });
        }
        for y in 0..self.height {
            self.row_mut(y).copy_from_slice(source.row(y));
        }
        Ok(())
    }

    /// Borrow the frame as a read-only view.
    #[inline]
    pub fn as_view(&self) -> FrameView<'_, T> {
        FrameView::from_parts(
            self.width,
            self.height,
            self.channels,
            self.stride_elements(),
            self.origin,
            &self.data,
        )
    }

    /// Borrow the frame as a writable view.
    #[inline]
    pub fn as_view_mut(&mut self) -> FrameViewMut<'_, T> {
        let stride = self.stride_elements();
        FrameViewMut::from_parts(
            self.width,
            self.height,
            self.channels,
            stride,
            self.origin,
            &mut self.data,
        )
    }
}

//! Borrowed frame views

use super::{Element, Frame, PixelOrigin, layout};
use crate::error::{Error, Result};

/// Read-only view of an interleaved raster owned elsewhere
#[derive(Debug, Clone, Copy)]
pub struct FrameView<'a, T: Element> {
    width: u32,
    height: u32,
    channels: u32,
    stride: usize,
    origin: PixelOrigin,
    data: &'a [T],
}

/// Writable view of an interleaved raster owned elsewhere
#[derive(Debug)]
pub struct FrameViewMut<'a, T: Element> {
    width: u32,
    height: u32,
    channels: u32,
    stride: usize,
    origin: PixelOrigin,
    data: &'a mut [T],
}

fn checked_len(
    width: u32,
    height: u32,
    channels: u32,
    padding_elements: u32,
    available: usize,
) -> Result<(usize, usize)> {
    let (stride, total) = layout(width, height, channels, padding_elements)?;
    if available < total {
        return Err(Error::BufferTooSmall {
            required: total,
            actual: available,
        });
    }
    Ok((stride, total))
}

impl<'a, T: Element> FrameView<'a, T> {
    pub(crate) fn from_parts(
        width: u32,
        height: u32,
        channels: u32,
        stride: usize,
        origin: PixelOrigin,
        data: &'a [T],
    ) -> Self {
        Self {
            width,
            height,
            channels,
            stride,
            origin,
            data,
        }
    }

    /// Wrap a caller buffer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BufferTooSmall`] if `data` holds fewer than
    /// `(width * channels + padding_elements) * height` elements.
    pub fn from_slice(
        data: &'a [T],
        width: u32,
        height: u32,
        channels: u32,
        padding_elements: u32,
        origin: PixelOrigin,
    ) -> Result<Self> {
        let (stride, total) = checked_len(width, height, channels, padding_elements, data.len())?;
        Ok(Self::from_parts(width, height, channels, stride, origin, &data[..total]))
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
    pub fn origin(&self) -> PixelOrigin {
        self.origin
    }

    #[inline]
    pub fn stride_elements(&self) -> usize {
        self.stride
    }

    #[inline]
    pub fn padding_elements(&self) -> u32 {
        (self.stride - self.width as usize * self.channels as usize) as u32
    }

    #[inline]
    pub fn pixels(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Borrowed storage, `stride * height` elements.
    #[inline]
    pub fn data(&self) -> &'a [T] {
        self.data
    }

    /// Pixel elements of row `y` (padding excluded).
    #[inline]
    pub fn row(&self, y: u32) -> &'a [T] {
        let start = y as usize * self.stride;
        &self.data[start..start + self.width as usize * self.channels as usize]
    }

    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> &'a [T] {
        let channels = self.channels as usize;
        let start = y as usize * self.stride + x as usize * channels;
        &self.data[start..start + channels]
    }

    /// True if both views cover the same pixel grid with the same origin.
    pub fn same_grid<U: Element>(&self, other: &FrameView<'_, U>) -> bool {
        self.width == other.width && self.height == other.height && self.origin == other.origin
    }

    /// Copy the viewed pixels into a new, unpadded frame.
    pub fn to_frame(&self) -> Result<Frame<T>> {
        let mut frame = Frame::new(self.width, self.height, self.channels, self.origin)?;
        frame.copy_from(*self)?;
        Ok(frame)
    }
}

impl<'a, T: Element> FrameViewMut<'a, T> {
    pub(crate) fn from_parts(
        width: u32,
        height: u32,
        channels: u32,
        stride: usize,
        origin: PixelOrigin,
        data: &'a mut [T],
    ) -> Self {
        Self {
            width,
            height,
            channels,
            stride,
            origin,
            data,
        }
    }

    /// Wrap a writable caller buffer.
    pub fn from_slice(
        data: &'a mut [T],
        width: u32,
        height: u32,
        channels: u32,
        padding_elements: u32,
        origin: PixelOrigin,
    ) -> Result<Self> {
        let (stride, total) = checked_len(width, height, channels, padding_elements, data.len())?;
        Ok(Self::from_parts(width, height, channels, stride, origin, &mut data[..total]))
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
    pub fn origin(&self) -> PixelOrigin {
        self.origin
    }

    #[inline]
    pub fn stride_elements(&self) -> usize {
        self.stride
    }

    #[inline]
    pub fn data(&self) -> &[T] {
        &*self.data
    }

    /// Borrowed storage, `stride * height` elements.
    #[inline]
    pub fn data_mut(&mut self) -> &mut [T] {
        &mut *self.data
    }

    #[inline]
    pub fn row(&self, y: u32) -> &[T] {
        let start = y as usize * self.stride;
        &self.data[start..start + self.width as usize * self.channels as usize]
    }

    #[inline]
    pub fn row_mut(&mut self, y: u32) -> &mut [T] {
        let start = y as usize * self.stride;
        let len = self.width as usize * self.channels as usize;
        &mut self.data[start..start + len]
    }

    #[inline]
    pub fn pixel_mut(&mut self, x: u32, y: u32) -> &mut [T] {
        let channels = self.channels as usize;
        let start = y as usize * self.stride + x as usize * channels;
        &mut self.data[start..start + channels]
    }

    /// Read-only view of the same storage.
    #[inline]
    pub fn as_view(&self) -> FrameView<'_, T> {
        FrameView::from_parts(
            self.width,
            self.height,
            self.channels,
            self.stride,
            self.origin,
            &*self.data,
        )
    }

    /// Shorter-lived writable view of the same storage.
    #[inline]
    pub fn reborrow(&mut self) -> FrameViewMut<'_, T> {
        FrameViewMut::from_parts(
            self.width,
            self.height,
            self.channels,
            self.stride,
            self.origin,
            &mut *self.data,
        )
    }

    pub fn fill(&mut self, value: T) {
        for y in 0..self.height {
            self.row_mut(y).fill(value);
        }
    }
}

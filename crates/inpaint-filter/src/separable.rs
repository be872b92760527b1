//! Separable filtering
//!
//! Both filters run a horizontal pass into an intermediate accumulator
//! frame, then a vertical pass from that frame into the target. Factors
//! are computed once per invocation and shared by both passes.
//!
//! [`MaskedFilter`] accumulates `value * factor` only over taps that lie
//! inside the frame and (in the horizontal pass) whose source mask pixel
//! is not the mask value. The intermediate frame has one extra channel
//! accumulating the factors of those taps, which finally divides the color
//! sums. A target pixel whose accumulated factor sum is zero receives zero
//! color and the mask value; every other target pixel gets the
//! complementary mask value `0xFF - mask_value`.
//!
//! [`SeparableFilter`] ignores masks and reads taps outside the frame from
//! the mirrored location, see [`mirrored_index`].
//!
//! The passes are strictly sequential; within a pass rows are independent
//! and may be split across a [`Worker`].

use crate::error::{FilterError, FilterResult};
use crate::gaussian::{
    check_filter_size, filter_factors, filter_factors_integer, filter_factors_integer_with_sigma,
    filter_factors_with_sigma,
};
use inpaint_core::{
    Element, Frame, FrameView, FrameViewMut, MASK_INVALID, MASK_VALID, Mask, Worker,
    execute_rows_mut, execute_rows_mut_pair, mirrored_index, validate_frame_mask,
};
use std::ops::{Add, Mul};

/// Smallest row partition worth running on another thread.
const MIN_PARTITION_ROWS: u32 = 8;

/// Element type supported by [`MaskedFilter`] and [`SeparableFilter`]
pub trait SeparableElement: Element {
    /// Accumulator type, also the type of the filter factors
    type Sum: Element + Add<Output = Self::Sum> + Mul<Output = Self::Sum>;

    fn widen(self) -> Self::Sum;

    /// Divide a color sum by a non-zero factor sum.
    fn normalize(sum: Self::Sum, denominator: Self::Sum) -> Self;

    /// Filter factors for an odd size, sampled with `sigma` if given.
    fn factors(filter_size: u32, sigma: Option<f32>) -> FilterResult<Vec<Self::Sum>>;

    /// Check that no accumulation with these factors can overflow.
    fn check_factors(_horizontal: &[Self::Sum], _vertical: &[Self::Sum]) -> FilterResult<()> {
        Ok(())
    }
}

impl SeparableElement for u8 {
    type Sum = u32;

    #[inline]
    fn widen(self) -> u32 {
        self as u32
    }

    #[inline]
    fn normalize(sum: u32, denominator: u32) -> u8 {
        ((sum + denominator / 2) / denominator).min(255) as u8
    }

    fn factors(filter_size: u32, sigma: Option<f32>) -> FilterResult<Vec<u32>> {
        let (factors, _) = match sigma {
            Some(sigma) => filter_factors_integer_with_sigma(filter_size, sigma)?,
            None => filter_factors_integer(filter_size)?,
        };
        Ok(factors)
    }

    fn check_factors(horizontal: &[u32], vertical: &[u32]) -> FilterResult<()> {
        let horizontal: u64 = horizontal.iter().map(|&f| f as u64).sum();
        let vertical: u64 = vertical.iter().map(|&f| f as u64).sum();
        // The rounding offset of the final division adds half a denominator
        if 255 * horizontal * vertical + horizontal * vertical / 2 > u32::MAX as u64 {
            return Err(FilterError::Overflow(format!(
                "factor sums {} x {} exceed the 32 bit accumulator",
                horizontal, vertical
            )));
        }
        Ok(())
    }
}

impl SeparableElement for f32 {
    type Sum = f32;

    #[inline]
    fn widen(self) -> f32 {
        self
    }

    #[inline]
    fn normalize(sum: f32, denominator: f32) -> f32 {
        sum * (1.0 / denominator)
    }

    fn factors(filter_size: u32, sigma: Option<f32>) -> FilterResult<Vec<f32>> {
        match sigma {
            Some(sigma) => filter_factors_with_sigma(filter_size, sigma),
            None => filter_factors(filter_size),
        }
    }
}

/// Horizontal and vertical factors, checked against accumulator overflow.
fn factor_pair<T: SeparableElement>(
    horizontal_size: u32,
    vertical_size: u32,
    sigma: Option<f32>,
) -> FilterResult<(Vec<T::Sum>, Vec<T::Sum>)> {
    let horizontal = T::factors(horizontal_size, sigma)?;
    let vertical = T::factors(vertical_size, sigma)?;
    T::check_factors(&horizontal, &vertical)?;
    Ok((horizontal, vertical))
}

fn check_frame_size(
    width: u32,
    height: u32,
    horizontal_size: u32,
    vertical_size: u32,
) -> FilterResult<()> {
    check_filter_size(horizontal_size)?;
    check_filter_size(vertical_size)?;
    if width <= horizontal_size / 2 || height <= vertical_size / 2 {
        return Err(FilterError::FrameTooSmall {
            width,
            height,
            horizontal: horizontal_size,
            vertical: vertical_size,
        });
    }
    Ok(())
}

/// Separable filter skipping masked pixels
///
/// # Examples
///
/// ```
/// use inpaint_core::{Frame, MASK_VALID, Mask, PixelOrigin};
/// use inpaint_filter::MaskedFilter;
///
/// let mut frame = Frame::filled(8, 8, &[90u8], PixelOrigin::UpperLeft).unwrap();
/// let mut mask = Mask::new_mask(8, 8, MASK_VALID, PixelOrigin::UpperLeft).unwrap();
/// MaskedFilter::gaussian(3)
///     .apply_in_place(&mut frame, &mut mask, None)
///     .unwrap();
/// assert!(frame.data().iter().all(|&v| v == 90));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaskedFilter {
    /// Odd number of horizontal taps
    pub horizontal_size: u32,
    /// Odd number of vertical taps
    pub vertical_size: u32,
    /// Explicit Gaussian sigma, derived from the sizes when `None`
    pub sigma: Option<f32>,
    /// Mask pixels with this value are excluded, `0x00` or `0xFF`
    pub mask_value: u8,
}

impl MaskedFilter {
    /// Square Gaussian filter excluding `0x00` mask pixels.
    pub fn gaussian(filter_size: u32) -> Self {
        Self {
            horizontal_size: filter_size,
            vertical_size: filter_size,
            sigma: None,
            mask_value: MASK_INVALID,
        }
    }

    /// Gaussian filter with separate horizontal and vertical sizes.
    pub fn separable(horizontal_size: u32, vertical_size: u32) -> Self {
        Self {
            horizontal_size,
            vertical_size,
            ..Self::gaussian(1)
        }
    }

    pub fn with_sigma(mut self, sigma: f32) -> Self {
        self.sigma = Some(sigma);
        self
    }

    pub fn with_mask_value(mut self, mask_value: u8) -> Self {
        self.mask_value = mask_value;
        self
    }

    /// Filter `source` into `target` and `target_mask`.
    ///
    /// Both targets are reallocated unless they already match the layout
    /// of `source`. Nothing is written if a precondition fails.
    ///
    /// # Errors
    ///
    /// Fails for even or zero sizes, a frame not larger than half a filter
    /// in each direction, a mask value other than `0x00`/`0xFF`, a mask not
    /// binary or not matching the source, and accumulator overflow.
    pub fn apply<T: SeparableElement>(
        &self,
        source: FrameView<'_, T>,
        source_mask: FrameView<'_, u8>,
        target: &mut Frame<T>,
        target_mask: &mut Mask,
        worker: Option<&Worker>,
    ) -> FilterResult<()> {
        self.validate(&source, &source_mask)?;
        let (horizontal, vertical) = self.factors::<T>()?;
        let mask_value = self.mask_value;
        let intermediate =
            masked_horizontal_pass(source, source_mask, &horizontal, mask_value, worker)?;

        let (width, height, origin) = (source.width(), source.height(), source.origin());
        target.ensure_layout(width, height, source.channels(), origin)?;
        target_mask.ensure_layout(width, height, 1, origin)?;
        masked_vertical_pass(
            &intermediate,
            &vertical,
            mask_value,
            target.as_view_mut(),
            target_mask.as_view_mut(),
            worker,
        );
        Ok(())
    }

    /// Filter a frame and its mask in place.
    pub fn apply_in_place<T: SeparableElement>(
        &self,
        frame: &mut Frame<T>,
        mask: &mut Mask,
        worker: Option<&Worker>,
    ) -> FilterResult<()> {
        let (source, source_mask) = (frame.as_view(), mask.as_view());
        self.validate(&source, &source_mask)?;
        let (horizontal, vertical) = self.factors::<T>()?;
        let mask_value = self.mask_value;
        let intermediate =
            masked_horizontal_pass(source, source_mask, &horizontal, mask_value, worker)?;

        masked_vertical_pass(
            &intermediate,
            &vertical,
            mask_value,
            frame.as_view_mut(),
            mask.as_view_mut(),
            worker,
        );
        Ok(())
    }

    fn factors<T: SeparableElement>(&self) -> FilterResult<(Vec<T::Sum>, Vec<T::Sum>)> {
        factor_pair::<T>(self.horizontal_size, self.vertical_size, self.sigma)
    }

    fn validate<T: Element>(
        &self,
        source: &FrameView<'_, T>,
        source_mask: &FrameView<'_, u8>,
    ) -> FilterResult<()> {
        if !(1..=4).contains(&source.channels()) {
            return Err(FilterError::UnsupportedChannels(source.channels()));
        }
        if self.mask_value != MASK_INVALID && self.mask_value != MASK_VALID {
            return Err(FilterError::InvalidParameters(format!(
                "mask value must be 0x00 or 0xFF, got {:#04x}",
                self.mask_value
            )));
        }
        check_frame_size(
            source.width(),
            source.height(),
            self.horizontal_size,
            self.vertical_size,
        )?;
        validate_frame_mask(*source, *source_mask)?;
        Ok(())
    }
}

/// Horizontal pass into a frame with `channels + 1` accumulator channels.
fn masked_horizontal_pass<T: SeparableElement>(
    source: FrameView<'_, T>,
    source_mask: FrameView<'_, u8>,
    horizontal: &[T::Sum],
    mask_value: u8,
    worker: Option<&Worker>,
) -> FilterResult<Frame<T::Sum>> {
    let channels = source.channels() as usize;
    let width = source.width() as usize;
    let mut intermediate = Frame::<T::Sum>::new(
        source.width(),
        source.height(),
        source.channels() + 1,
        source.origin(),
    )?;
    let stride = intermediate.stride_elements();
    let rows = intermediate.height();
    let half = horizontal.len() / 2;

    execute_rows_mut(
        worker,
        intermediate.data_mut(),
        stride,
        rows,
        MIN_PARTITION_ROWS,
        |first_row, chunk| {
            for (i, target) in chunk.chunks_mut(stride).enumerate() {
                let y = first_row + i as u32;
                let pixels = source.row(y);
                let mask = source_mask.row(y);
                for (x, sums) in target[..width * (channels + 1)]
                    .chunks_exact_mut(channels + 1)
                    .enumerate()
                {
                    sums.fill(T::Sum::default());
                    let first_tap = half.saturating_sub(x);
                    let last_tap = horizontal.len().min(width + half - x);
                    let taps = &horizontal[first_tap..last_tap];
                    for (&factor, sx) in taps.iter().zip(x + first_tap - half..) {
                        if mask[sx] == mask_value {
                            continue;
                        }
                        let pixel = &pixels[sx * channels..(sx + 1) * channels];
                        for (sum, &value) in sums.iter_mut().zip(pixel) {
                            *sum = *sum + value.widen() * factor;
                        }
                        sums[channels] = sums[channels] + factor;
                    }
                }
            }
        },
    );

    Ok(intermediate)
}

/// Vertical pass from the accumulator frame into the target.
fn masked_vertical_pass<T: SeparableElement>(
    intermediate: &Frame<T::Sum>,
    vertical: &[T::Sum],
    mask_value: u8,
    mut target: FrameViewMut<'_, T>,
    mut target_mask: FrameViewMut<'_, u8>,
    worker: Option<&Worker>,
) {
    let channels = target.channels() as usize;
    let width = intermediate.width() as usize;
    let height = intermediate.height() as usize;
    let half = vertical.len() / 2;
    let zero = T::Sum::default();
    let valid_value = 0xFF - mask_value;
    let frame_stride = target.stride_elements();
    let mask_stride = target_mask.stride_elements();
    let rows = target.height();

    execute_rows_mut_pair(
        worker,
        (target.data_mut(), frame_stride),
        (target_mask.data_mut(), mask_stride),
        rows,
        MIN_PARTITION_ROWS,
        |first_row, frame_rows, mask_rows| {
            let mut sums = vec![zero; channels + 1];
            for (i, (frame_row, mask_row)) in frame_rows
                .chunks_mut(frame_stride)
                .zip(mask_rows.chunks_mut(mask_stride))
                .enumerate()
            {
                let y = first_row as usize + i;
                let first_tap = half.saturating_sub(y);
                let last_tap = vertical.len().min(height + half - y);
                let taps = &vertical[first_tap..last_tap];
                for (x, target_pixel) in frame_row[..width * channels]
                    .chunks_exact_mut(channels)
                    .enumerate()
                {
                    sums.fill(zero);
                    for (&factor, sy) in taps.iter().zip(y + first_tap - half..) {
                        let source = intermediate.pixel(x as u32, sy as u32);
                        for (sum, &value) in sums.iter_mut().zip(source) {
                            *sum = *sum + value * factor;
                        }
                    }

                    let denominator = sums[channels];
                    if denominator == zero {
                        target_pixel.fill(T::default());
                        mask_row[x] = mask_value;
                    } else {
                        for (value, &sum) in target_pixel.iter_mut().zip(&sums[..channels]) {
                            *value = T::normalize(sum, denominator);
                        }
                        mask_row[x] = valid_value;
                    }
                }
            }
        },
    );
}

/// Separable filter with mirrored borders
///
/// Every target pixel is the normalized weighted sum of its full filter
/// window; taps outside the frame read the mirrored pixel. Integer frames
/// round half up.
///
/// # Examples
///
/// ```
/// use inpaint_core::{Frame, PixelOrigin};
/// use inpaint_filter::SeparableFilter;
///
/// let mut frame = Frame::filled(6, 4, &[30u8, 60], PixelOrigin::UpperLeft).unwrap();
/// SeparableFilter::gaussian(5).apply_in_place(&mut frame, None).unwrap();
/// assert!(frame.data().chunks(2).all(|p| p == [30, 60]));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeparableFilter {
    /// Odd number of horizontal taps
    pub horizontal_size: u32,
    /// Odd number of vertical taps
    pub vertical_size: u32,
    /// Explicit Gaussian sigma, derived from the sizes when `None`
    pub sigma: Option<f32>,
}

impl SeparableFilter {
    /// Square Gaussian filter.
    pub fn gaussian(filter_size: u32) -> Self {
        Self::separable(filter_size, filter_size)
    }

    /// Gaussian filter with separate horizontal and vertical sizes.
    pub fn separable(horizontal_size: u32, vertical_size: u32) -> Self {
        Self {
            horizontal_size,
            vertical_size,
            sigma: None,
        }
    }

    pub fn with_sigma(mut self, sigma: f32) -> Self {
        self.sigma = Some(sigma);
        self
    }

    /// Filter `source` into `target`, reallocating `target` unless it
    /// already matches the layout of `source`.
    ///
    /// # Errors
    ///
    /// Fails for even or zero sizes, a frame not larger than half a filter
    /// in each direction, and accumulator overflow.
    pub fn apply<T: SeparableElement>(
        &self,
        source: FrameView<'_, T>,
        target: &mut Frame<T>,
        worker: Option<&Worker>,
    ) -> FilterResult<()> {
        let (horizontal, vertical) = self.prepare::<T>(&source)?;
        let intermediate = mirrored_horizontal_pass(source, &horizontal, worker)?;
        target.ensure_layout(
            source.width(),
            source.height(),
            source.channels(),
            source.origin(),
        )?;
        mirrored_vertical_pass(&intermediate, &horizontal, &vertical, target, worker);
        Ok(())
    }

    /// Filter a frame in place.
    pub fn apply_in_place<T: SeparableElement>(
        &self,
        frame: &mut Frame<T>,
        worker: Option<&Worker>,
    ) -> FilterResult<()> {
        let (horizontal, vertical) = self.prepare::<T>(&frame.as_view())?;
        let intermediate = mirrored_horizontal_pass(frame.as_view(), &horizontal, worker)?;
        mirrored_vertical_pass(&intermediate, &horizontal, &vertical, frame, worker);
        Ok(())
    }

    fn prepare<T: SeparableElement>(
        &self,
        source: &FrameView<'_, T>,
    ) -> FilterResult<(Vec<T::Sum>, Vec<T::Sum>)> {
        check_frame_size(
            source.width(),
            source.height(),
            self.horizontal_size,
            self.vertical_size,
        )?;
        factor_pair::<T>(self.horizontal_size, self.vertical_size, self.sigma)
    }
}

fn factor_sum<S: Element + Add<Output = S>>(factors: &[S]) -> S {
    factors
        .iter()
        .fold(S::default(), |sum, &factor| sum + factor)
}

/// Horizontal pass keeping the channel count, unnormalized.
fn mirrored_horizontal_pass<T: SeparableElement>(
    source: FrameView<'_, T>,
    horizontal: &[T::Sum],
    worker: Option<&Worker>,
) -> FilterResult<Frame<T::Sum>> {
    let channels = source.channels() as usize;
    let width = source.width() as usize;
    let mut intermediate = Frame::<T::Sum>::new(
        source.width(),
        source.height(),
        source.channels(),
        source.origin(),
    )?;
    let stride = intermediate.stride_elements();
    let rows = intermediate.height();
    let half = (horizontal.len() / 2) as isize;

    execute_rows_mut(
        worker,
        intermediate.data_mut(),
        stride,
        rows,
        MIN_PARTITION_ROWS,
        |first_row, chunk| {
            for (i, target) in chunk.chunks_mut(stride).enumerate() {
                let pixels = source.row(first_row + i as u32);
                for (x, sums) in target[..width * channels]
                    .chunks_exact_mut(channels)
                    .enumerate()
                {
                    sums.fill(T::Sum::default());
                    for (&factor, offset) in horizontal.iter().zip(-half..) {
                        let sx = mirrored_index(x as isize + offset, width);
                        let pixel = &pixels[sx * channels..(sx + 1) * channels];
                        for (sum, &value) in sums.iter_mut().zip(pixel) {
                            *sum = *sum + value.widen() * factor;
                        }
                    }
                }
            }
        },
    );

    Ok(intermediate)
}

/// Vertical pass dividing by the product of both factor sums.
fn mirrored_vertical_pass<T: SeparableElement>(
    intermediate: &Frame<T::Sum>,
    horizontal: &[T::Sum],
    vertical: &[T::Sum],
    target: &mut Frame<T>,
    worker: Option<&Worker>,
) {
    let elements = intermediate.row_elements();
    let height = intermediate.height() as usize;
    let half = (vertical.len() / 2) as isize;
    let zero = T::Sum::default();
    let denominator = factor_sum(horizontal) * factor_sum(vertical);
    let stride = target.stride_elements();
    let rows = target.height();

    execute_rows_mut(
        worker,
        target.data_mut(),
        stride,
        rows,
        MIN_PARTITION_ROWS,
        |first_row, chunk| {
            let mut sums = vec![zero; elements];
            for (i, row) in chunk.chunks_mut(stride).enumerate() {
                let y = first_row as isize + i as isize;
                sums.fill(zero);
                for (&factor, offset) in vertical.iter().zip(-half..) {
                    let sy = mirrored_index(y + offset, height);
                    let source = intermediate.row(sy as u32);
                    for (sum, &value) in sums.iter_mut().zip(source) {
                        *sum = *sum + value * factor;
                    }
                }
                for (value, &sum) in row[..elements].iter_mut().zip(&sums) {
                    *value = T::normalize(sum, denominator);
                }
            }
        },
    );
}

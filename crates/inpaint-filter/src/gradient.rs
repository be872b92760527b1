//! Gradient filters
//!
//! Central differences `[-1 0 1]` in both directions, interleaved as
//! `(horizontal, vertical)` per channel, plus lined integral images of
//! the forward differences `[-1 1]`.
//!
//! Border responses (first and last row and column) are exactly zero.

use crate::error::{FilterError, FilterResult};
use inpaint_core::{Element, Frame, FrameView, FrameViewMut, Worker, execute_rows_mut};
use std::ops::{Add, Mul};

const MIN_PARTITION_ROWS: u32 = 16;

/// Element type receiving gradient responses
pub trait GradientResponse: Element + Mul<Output = Self> {
    const ONE: Self;

    /// `next - previous`, halved when `normalize` is set.
    fn difference(next: u8, previous: u8, normalize: bool) -> Self;
}

impl GradientResponse for i16 {
    const ONE: Self = 1;

    #[inline]
    fn difference(next: u8, previous: u8, normalize: bool) -> Self {
        let d = next as i16 - previous as i16;
        if normalize { d / 2 } else { d }
    }
}

impl GradientResponse for i32 {
    const ONE: Self = 1;

    #[inline]
    fn difference(next: u8, previous: u8, normalize: bool) -> Self {
        let d = next as i32 - previous as i32;
        if normalize { d / 2 } else { d }
    }
}

impl GradientResponse for f32 {
    const ONE: Self = 1.0;

    #[inline]
    fn difference(next: u8, previous: u8, normalize: bool) -> Self {
        let d = next as f32 - previous as f32;
        if normalize { d * 0.5 } else { d }
    }
}

/// Responses wide enough to hold `h * h + v * v` of 8-bit differences
pub trait SquaredResponse: GradientResponse + Add<Output = Self> {}

impl SquaredResponse for i32 {}
impl SquaredResponse for f32 {}

fn check_source(source: &FrameView<'_, u8>) -> FilterResult<()> {
    if !(1..=4).contains(&source.channels()) {
        return Err(FilterError::UnsupportedChannels(source.channels()));
    }
    if source.width() < 3 || source.height() < 3 {
        return Err(FilterError::FrameTooSmall {
            width: source.width(),
            height: source.height(),
            horizontal: 3,
            vertical: 3,
        });
    }
    Ok(())
}

fn check_target<T: Element>(
    source: &FrameView<'_, u8>,
    target: &FrameViewMut<'_, T>,
    channels: u32,
) -> FilterResult<()> {
    let expected = (source.width(), source.height(), channels);
    let actual = (target.width(), target.height(), target.channels());
    if expected != actual {
        return Err(FilterError::TargetMismatch { expected, actual });
    }
    Ok(())
}

/// Horizontal and vertical central differences, each multiplied by `factor`.
///
/// `target` has twice the channels of `source`: channel `2c` holds the
/// horizontal and `2c + 1` the vertical response of source channel `c`.
///
/// # Errors
///
/// Fails for frames smaller than 3x3, more than 4 channels or a target
/// with the wrong layout.
pub fn horizontal_vertical<T: GradientResponse>(
    source: FrameView<'_, u8>,
    mut target: FrameViewMut<'_, T>,
    normalize: bool,
    factor: T,
    worker: Option<&Worker>,
) -> FilterResult<()> {
    check_source(&source)?;
    check_target(&source, &target, source.channels() * 2)?;

    let channels = source.channels() as usize;
    let width = source.width() as usize;
    let height = source.height();
    let stride = target.stride_elements();

    execute_rows_mut(
        worker,
        target.data_mut(),
        stride,
        height,
        MIN_PARTITION_ROWS,
        |first_row, chunk| {
            for (i, row) in chunk.chunks_mut(stride).enumerate() {
                let y = first_row + i as u32;
                let row = &mut row[..width * channels * 2];
                if y == 0 || y + 1 == height {
                    row.fill(T::default());
                    continue;
                }
                let top = source.row(y - 1);
                let center = source.row(y);
                let bottom = source.row(y + 1);

                row[..channels * 2].fill(T::default());
                row[(width - 1) * channels * 2..].fill(T::default());
                for x in 1..width - 1 {
                    let out = &mut row[x * channels * 2..(x + 1) * channels * 2];
                    for c in 0..channels {
                        let i = x * channels + c;
                        out[2 * c] =
                            T::difference(center[i + channels], center[i - channels], normalize)
                                * factor;
                        out[2 * c + 1] = T::difference(bottom[i], top[i], normalize) * factor;
                    }
                }
            }
        },
    );

    Ok(())
}

/// Allocate and fill a gradient frame, see [`horizontal_vertical`].
pub fn horizontal_vertical_frame<T: GradientResponse>(
    source: FrameView<'_, u8>,
    normalize: bool,
    worker: Option<&Worker>,
) -> FilterResult<Frame<T>> {
    check_source(&source)?;
    let mut target = Frame::new(
        source.width(),
        source.height(),
        source.channels() * 2,
        source.origin(),
    )?;
    horizontal_vertical(source, target.as_view_mut(), normalize, T::ONE, worker)?;
    Ok(target)
}

/// Squared gradient magnitude `h * h + v * v` per channel, times `factor`.
///
/// With `normalize` both differences are halved before squaring.
pub fn magnitude_squared<T: SquaredResponse>(
    source: FrameView<'_, u8>,
    mut target: FrameViewMut<'_, T>,
    normalize: bool,
    factor: T,
    worker: Option<&Worker>,
) -> FilterResult<()> {
    check_source(&source)?;
    check_target(&source, &target, source.channels())?;

    let channels = source.channels() as usize;
    let width = source.width() as usize;
    let height = source.height();
    let stride = target.stride_elements();

    execute_rows_mut(
        worker,
        target.data_mut(),
        stride,
        height,
        MIN_PARTITION_ROWS,
        |first_row, chunk| {
            for (i, row) in chunk.chunks_mut(stride).enumerate() {
                let y = first_row + i as u32;
                let row = &mut row[..width * channels];
                row.fill(T::default());
                if y == 0 || y + 1 == height {
                    continue;
                }
                let top = source.row(y - 1);
                let center = source.row(y);
                let bottom = source.row(y + 1);
                for i in channels..(width - 1) * channels {
                    let h = T::difference(center[i + channels], center[i - channels], normalize);
                    let v = T::difference(bottom[i], top[i], normalize);
                    row[i] = (h * h + v * v) * factor;
                }
            }
        },
    );

    Ok(())
}

fn check_single_channel(source: &FrameView<'_, u8>) -> FilterResult<()> {
    if source.channels() != 1 {
        return Err(FilterError::UnsupportedChannels(source.channels()));
    }
    Ok(())
}

/// Element type of lined integral images
///
/// An image of `n` absolute 8-bit differences reaches `255 * n`, which
/// must not exceed [`MAX_SUM`](IntegralElement::MAX_SUM).
pub trait IntegralElement: Element + Add<Output = Self> {
    const MAX_SUM: u64;

    fn from_difference(difference: i32) -> Self;
}

impl IntegralElement for i32 {
    const MAX_SUM: u64 = i32::MAX as u64;

    #[inline]
    fn from_difference(difference: i32) -> Self {
        difference
    }
}

impl IntegralElement for i64 {
    const MAX_SUM: u64 = i64::MAX as u64;

    #[inline]
    fn from_difference(difference: i32) -> Self {
        difference as i64
    }
}

/// Lined integral image of the horizontal differences `src[x+1] - src[x]`.
///
/// The result is `width x (height + 1)`; its first row and first column
/// are zero and entry `(x + 1, y + 1)` holds the sum of all differences at
/// columns `<= x` and rows `<= y`. Differences are taken absolute when
/// `absolute` is set.
///
/// # Errors
///
/// Fails for frames with more than one channel, narrower than 2 pixels,
/// or too large for `T` to hold every possible sum; `i64` covers any frame.
pub fn horizontal_1x2_lined_integral<T: IntegralElement>(
    source: FrameView<'_, u8>,
    absolute: bool,
) -> FilterResult<Frame<T>> {
    check_single_channel(&source)?;
    if source.width() < 2 {
        return Err(FilterError::FrameTooSmall {
            width: source.width(),
            height: source.height(),
            horizontal: 2,
            vertical: 1,
        });
    }
    lined_integral(
        source.width(),
        source.height() + 1,
        source.origin(),
        source.width() - 1,
        source.height(),
        |x, y| {
            let row = source.row(y);
            row[x as usize + 1] as i32 - row[x as usize] as i32
        },
        absolute,
    )
}

/// Lined integral image of the vertical differences `src[y+1] - src[y]`.
///
/// The result is `(width + 1) x height`, laid out like
/// [`horizontal_1x2_lined_integral`].
pub fn vertical_2x1_lined_integral<T: IntegralElement>(
    source: FrameView<'_, u8>,
    absolute: bool,
) -> FilterResult<Frame<T>> {
    check_single_channel(&source)?;
    if source.height() < 2 {
        return Err(FilterError::FrameTooSmall {
            width: source.width(),
            height: source.height(),
            horizontal: 1,
            vertical: 2,
        });
    }
    lined_integral(
        source.width() + 1,
        source.height(),
        source.origin(),
        source.width(),
        source.height() - 1,
        |x, y| source.row(y + 1)[x as usize] as i32 - source.row(y)[x as usize] as i32,
        absolute,
    )
}

fn lined_integral<T: IntegralElement>(
    integral_width: u32,
    integral_height: u32,
    origin: inpaint_core::PixelOrigin,
    columns: u32,
    rows: u32,
    difference: impl Fn(u32, u32) -> i32,
    absolute: bool,
) -> FilterResult<Frame<T>> {
    debug_assert_eq!(columns + 1, integral_width);
    debug_assert_eq!(rows + 1, integral_height);
    if columns as u64 * rows as u64 * 255 > T::MAX_SUM {
        return Err(FilterError::Overflow(format!(
            "lined integral of {} x {} differences exceeds {:?}",
            columns, rows, T::DATA_TYPE
        )));
    }
    let mut integral = Frame::<T>::new(integral_width, integral_height, 1, origin)?;

    for y in 0..rows {
        let mut row_sum = T::default();
        for x in 0..columns {
            let d = difference(x, y);
            row_sum = row_sum + T::from_difference(if absolute { d.abs() } else { d });
            let above = integral.pixel(x + 1, y)[0];
            integral.pixel_mut(x + 1, y + 1)[0] = above + row_sum;
        }
    }

    Ok(integral)
}

#[cfg(test)]
mod tests {
    use super::*;
    use inpaint_core::PixelOrigin;

    fn ramp(width: u32, height: u32) -> Frame<u8> {
        let data = (0..height)
            .flat_map(|y| (0..width).map(move |x| (x * 3 + y * 10) as u8))
            .collect();
        Frame::from_data(width, height, 1, 0, PixelOrigin::UpperLeft, data).unwrap()
    }

    #[test]
    fn test_horizontal_vertical_ramp() {
        let source = ramp(5, 4);
        let gradient = horizontal_vertical_frame::<i16>(source.as_view(), false, None).unwrap();
        assert_eq!(gradient.channels(), 2);
        for y in 0..4 {
            for x in 0..5 {
                let border = x == 0 || y == 0 || x == 4 || y == 3;
                let expected: [i16; 2] = if border { [0, 0] } else { [6, 20] };
                assert_eq!(gradient.pixel(x, y), &expected, "pixel ({x}, {y})");
            }
        }
    }

    #[test]
    fn test_normalized_with_factor() {
        let source = Frame::from_data(
            3,
            3,
            1,
            0,
            PixelOrigin::UpperLeft,
            vec![0u8, 9, 0, 200, 50, 0, 0, 1, 0],
        )
        .unwrap();
        let mut target = Frame::<i32>::new(3, 3, 2, PixelOrigin::UpperLeft).unwrap();
        horizontal_vertical(source.as_view(), target.as_view_mut(), true, 3, None).unwrap();
        // (0 - 200) / 2 * 3 and (1 - 9) / 2 * 3
        assert_eq!(target.pixel(1, 1), &[-300, -12]);
    }

    #[test]
    fn test_magnitude_squared() {
        let source = ramp(4, 4);
        let mut target = Frame::<f32>::new(4, 4, 1, PixelOrigin::UpperLeft).unwrap();
        magnitude_squared(source.as_view(), target.as_view_mut(), true, 1.0, None).unwrap();
        assert_eq!(target.pixel(1, 1), &[3.0 * 3.0 + 10.0 * 10.0]);
        assert_eq!(target.pixel(0, 1), &[0.0]);
    }

    #[test]
    fn test_gradient_preconditions() {
        let small = Frame::<u8>::new(2, 5, 1, PixelOrigin::UpperLeft).unwrap();
        let result = horizontal_vertical_frame::<i32>(small.as_view(), false, None);
        assert!(result.is_err());
        let source = ramp(4, 4);
        let mut wrong = Frame::<i32>::new(4, 4, 1, PixelOrigin::UpperLeft).unwrap();
        assert!(matches!(
            horizontal_vertical(source.as_view(), wrong.as_view_mut(), false, 1, None),
            Err(FilterError::TargetMismatch { .. })
        ));
    }

    #[test]
    fn test_lined_integrals() {
        let data = vec![1u8, 4, 2, 0, 0, 5];
        let source = Frame::from_data(3, 2, 1, 0, PixelOrigin::UpperLeft, data).unwrap();

        let horizontal = horizontal_1x2_lined_integral::<i32>(source.as_view(), false).unwrap();
        assert_eq!((horizontal.width(), horizontal.height()), (3, 3));
        // Differences: row 0 [3, -2], row 1 [0, 5]
        assert_eq!(horizontal.data(), &[0, 0, 0, 0, 3, 1, 0, 3, 6]);

        let absolute = horizontal_1x2_lined_integral::<i32>(source.as_view(), true).unwrap();
        assert_eq!(absolute.pixel(2, 2), &[10]);

        let vertical = vertical_2x1_lined_integral::<i64>(source.as_view(), false).unwrap();
        assert_eq!((vertical.width(), vertical.height()), (4, 2));
        // Differences: [-1, -4, 3]
        assert_eq!(vertical.data(), &[0, 0, 0, 0, 0, -1, -5, -2]);
    }

    fn alternating_columns(width: u32, height: u32) -> Frame<u8> {
        let row: Vec<u8> = (0..width).map(|x| (x % 2 * 255) as u8).collect();
        let data = row.repeat(height as usize);
        Frame::from_data(width, height, 1, 0, PixelOrigin::UpperLeft, data).unwrap()
    }

    #[test]
    fn test_lined_integral_range() {
        // 2048 differences of magnitude 255 per row
        let at_limit = alternating_columns(2049, 4112);
        let integral = horizontal_1x2_lined_integral::<i32>(at_limit.as_view(), true).unwrap();
        assert_eq!(integral.pixel(2048, 4112), &[2048 * 4112 * 255]);

        let beyond = alternating_columns(2049, 4113);
        assert!(matches!(
            horizontal_1x2_lined_integral::<i32>(beyond.as_view(), true),
            Err(FilterError::Overflow(_))
        ));
        let wide = horizontal_1x2_lined_integral::<i64>(beyond.as_view(), true).unwrap();
        assert_eq!(wide.pixel(2048, 4113), &[2048 * 4113 * 255]);
    }

    #[test]
    fn test_vertical_lined_integral_range() {
        let tall = Frame::<u8>::new(4113, 2049, 1, PixelOrigin::UpperLeft).unwrap();
        assert!(matches!(
            vertical_2x1_lined_integral::<i32>(tall.as_view(), false),
            Err(FilterError::Overflow(_))
        ));
        let narrow = Frame::<u8>::new(4112, 2049, 1, PixelOrigin::UpperLeft).unwrap();
        let integral = vertical_2x1_lined_integral::<i32>(narrow.as_view(), false).unwrap();
        assert_eq!(integral.pixel(4112, 2048), &[0]);
    }
}

//! Frame means and accumulation
//!
//! Per-channel mean values, accumulation of 8-bit frames into 32-bit sums
//! (optionally gated by a mask with per-pixel denominators) and the
//! normalization back to 8 bit. Integer results are rounded half up.

use crate::error::{FilterError, FilterResult};
use inpaint_core::{
    Element, Frame, FrameView, FrameViewMut, Worker, execute, execute_rows_mut,
    execute_rows_mut_pair, validate_frame_mask,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

const MIN_PARTITION_ROWS: u32 = 20;

/// Interval between two requests for a frame that is not available yet.
const POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Largest number of 8-bit frames whose sum fits into 32 bits.
pub const MAX_MEAN_FRAMES: usize = (u32::MAX / 255) as usize;

/// Element type supported by [`mean_value`]
pub trait MeanElement: Element {
    /// Accumulator wide enough for the sum of a whole frame
    type Sum: Copy + Default + Send + std::ops::AddAssign;

    fn widen(self) -> Self::Sum;

    fn mean(sum: Self::Sum, pixels: u64) -> Self;
}

impl MeanElement for u8 {
    type Sum = u64;

    #[inline]
    fn widen(self) -> u64 {
        self as u64
    }

    fn mean(sum: u64, pixels: u64) -> u8 {
        ((sum + pixels / 2) / pixels) as u8
    }
}

impl MeanElement for u32 {
    type Sum = u64;

    #[inline]
    fn widen(self) -> u64 {
        self as u64
    }

    fn mean(sum: u64, pixels: u64) -> u32 {
        ((sum + pixels / 2) / pixels) as u32
    }
}

impl MeanElement for f32 {
    type Sum = f64;

    #[inline]
    fn widen(self) -> f64 {
        self as f64
    }

    fn mean(sum: f64, pixels: u64) -> f32 {
        (sum / pixels as f64) as f32
    }
}

/// Mean value of every channel.
///
/// Row partitions sum locally and merge into the shared result under one
/// lock per partition.
pub fn mean_value<T: MeanElement>(frame: FrameView<'_, T>, worker: Option<&Worker>) -> Vec<T> {
    let channels = frame.channels() as usize;
    let sums = Mutex::new(vec![T::Sum::default(); channels]);

    execute(worker, 0, frame.height(), MIN_PARTITION_ROWS, |first_row, rows| {
        let mut local = vec![T::Sum::default(); channels];
        for y in first_row..first_row + rows {
            for pixel in frame.row(y).chunks_exact(channels) {
                for (sum, &value) in local.iter_mut().zip(pixel) {
                    *sum += value.widen();
                }
            }
        }
        let mut sums = sums.lock();
        for (sum, value) in sums.iter_mut().zip(local) {
            *sum += value;
        }
    });

    let pixels = frame.pixels() as u64;
    sums.into_inner()
        .into_iter()
        .map(|sum| T::mean(sum, pixels))
        .collect()
}

fn check_same_layout<S: Element, T: Element>(
    source: &FrameView<'_, S>,
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

/// Add every element of `source` to the matching 32-bit sum in `target`.
pub fn add_to_frame(
    source: FrameView<'_, u8>,
    mut target: FrameViewMut<'_, u32>,
    worker: Option<&Worker>,
) -> FilterResult<()> {
    check_same_layout(&source, &target, source.channels())?;

    let elements = source.width() as usize * source.channels() as usize;
    let stride = target.stride_elements();
    execute_rows_mut(
        worker,
        target.data_mut(),
        stride,
        source.height(),
        MIN_PARTITION_ROWS,
        |first_row, chunk| {
            for (i, row) in chunk.chunks_mut(stride).enumerate() {
                let source_row = source.row(first_row + i as u32);
                for (sum, &value) in row[..elements].iter_mut().zip(source_row) {
                    *sum += value as u32;
                }
            }
        },
    );
    Ok(())
}

/// Add `source` pixels whose mask value differs from `excluded_value` and
/// count them per pixel in `denominators`.
pub fn add_to_frame_individually(
    source: FrameView<'_, u8>,
    mask: FrameView<'_, u8>,
    mut target: FrameViewMut<'_, u32>,
    mut denominators: FrameViewMut<'_, u32>,
    excluded_value: u8,
    worker: Option<&Worker>,
) -> FilterResult<()> {
    validate_frame_mask(source, mask)?;
    check_same_layout(&source, &target, source.channels())?;
    check_same_layout(&source, &denominators, 1)?;

    let channels = source.channels() as usize;
    let width = source.width() as usize;
    let target_stride = target.stride_elements();
    let denominator_stride = denominators.stride_elements();
    execute_rows_mut_pair(
        worker,
        (target.data_mut(), target_stride),
        (denominators.data_mut(), denominator_stride),
        source.height(),
        MIN_PARTITION_ROWS,
        |first_row, sums, counts| {
            for (i, (sum_row, count_row)) in sums
                .chunks_mut(target_stride)
                .zip(counts.chunks_mut(denominator_stride))
                .enumerate()
            {
                let y = first_row + i as u32;
                let source_row = source.row(y);
                let mask_row = mask.row(y);
                for x in 0..width {
                    if mask_row[x] == excluded_value {
                        continue;
                    }
                    let pixel = &source_row[x * channels..(x + 1) * channels];
                    for (sum, &value) in sum_row[x * channels..(x + 1) * channels]
                        .iter_mut()
                        .zip(pixel)
                    {
                        *sum += value as u32;
                    }
                    count_row[x] += 1;
                }
            }
        },
    );
    Ok(())
}

/// Divide every 32-bit sum by `denominator`, rounding half up.
pub fn normalize_frame(
    source: FrameView<'_, u32>,
    mut target: FrameViewMut<'_, u8>,
    denominator: u32,
    worker: Option<&Worker>,
) -> FilterResult<()> {
    if denominator == 0 {
        return Err(FilterError::InvalidParameters("denominator must not be zero".to_string()));
    }
    check_same_layout(&source, &target, source.channels())?;

    let elements = source.width() as usize * source.channels() as usize;
    let stride = target.stride_elements();
    let half = denominator as u64 / 2;
    execute_rows_mut(
        worker,
        target.data_mut(),
        stride,
        source.height(),
        MIN_PARTITION_ROWS,
        |first_row, chunk| {
            for (i, row) in chunk.chunks_mut(stride).enumerate() {
                let source_row = source.row(first_row + i as u32);
                for (value, &sum) in row[..elements].iter_mut().zip(source_row) {
                    *value = ((sum as u64 + half) / denominator as u64).min(255) as u8;
                }
            }
        },
    );
    Ok(())
}

/// Divide sums by their per-pixel denominator, rounding half up.
///
/// Pixels with a zero denominator receive `zero_value`, or zero in every
/// channel when `None`.
pub fn normalize_frame_individually(
    source: FrameView<'_, u32>,
    denominators: FrameView<'_, u32>,
    mut target: FrameViewMut<'_, u8>,
    zero_value: Option<&[u8]>,
    worker: Option<&Worker>,
) -> FilterResult<()> {
    let channels = source.channels() as usize;
    let zero_pixel = match zero_value {
        Some(value) if value.len() != channels => {
            return Err(inpaint_core::Error::ChannelMismatch {
                expected: source.channels(),
                actual: value.len() as u32,
            }
            .into());
        }
        Some(value) => value.to_vec(),
        None => vec![0u8; channels],
    };
    if !source.same_grid(&denominators) || denominators.channels() != 1 {
        return Err(FilterError::TargetMismatch {
            expected: (source.width(), source.height(), 1),
            actual: (
                denominators.width(),
                denominators.height(),
                denominators.channels(),
            ),
        });
    }
    check_same_layout(&source, &target, source.channels())?;

    let width = source.width() as usize;
    let stride = target.stride_elements();
    execute_rows_mut(
        worker,
        target.data_mut(),
        stride,
        source.height(),
        MIN_PARTITION_ROWS,
        |first_row, chunk| {
            for (i, row) in chunk.chunks_mut(stride).enumerate() {
                let y = first_row + i as u32;
                let sums = source.row(y);
                let counts = denominators.row(y);
                for x in 0..width {
                    let pixel = &mut row[x * channels..(x + 1) * channels];
                    let count = counts[x];
                    if count == 0 {
                        pixel.copy_from_slice(&zero_pixel);
                        continue;
                    }
                    let half = count / 2;
                    for (value, &sum) in pixel.iter_mut().zip(&sums[x * channels..]) {
                        *value = ((sum as u64 + half as u64) / count as u64).min(255) as u8;
                    }
                }
            }
        },
    );
    Ok(())
}

/// Source of indexed frames that may become available over time
pub trait FrameProvider {
    /// Number of frames the provider can deliver.
    fn frame_count(&self) -> usize;

    /// Frame `index`, or `None` while it is not available yet.
    fn try_frame(&self, index: usize) -> Option<Frame<u8>>;
}

fn wait_for_frame<P: FrameProvider + ?Sized>(
    provider: &P,
    index: usize,
    timeout: Duration,
    abort: Option<&AtomicBool>,
) -> FilterResult<Frame<u8>> {
    let start = Instant::now();
    loop {
        if abort.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
            return Err(FilterError::Aborted);
        }
        if let Some(frame) = provider.try_frame(index) {
            return Ok(frame);
        }
        if start.elapsed() >= timeout {
            return Err(FilterError::Timeout { index });
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

/// Mean of the frames `first..=last` delivered by `provider`.
///
/// Every frame is requested until it arrives or `timeout` elapses. The
/// `abort` flag is checked before each request.
///
/// # Errors
///
/// Fails for an invalid index range, frames with differing layouts,
/// [`FilterError::Timeout`] and [`FilterError::Aborted`].
pub fn mean_frame<P: FrameProvider + ?Sized>(
    provider: &P,
    first: usize,
    last: usize,
    timeout: Duration,
    abort: Option<&AtomicBool>,
    worker: Option<&Worker>,
) -> FilterResult<Frame<u8>> {
    let count = last.checked_sub(first).map(|n| n + 1).unwrap_or(0);
    if count == 0 || last >= provider.frame_count() || count > MAX_MEAN_FRAMES {
        return Err(FilterError::InvalidParameters(format!(
            "frame range [{}, {}] invalid for {} frames",
            first,
            last,
            provider.frame_count()
        )));
    }

    let frame = wait_for_frame(provider, first, timeout, abort)?;
    let mut sums = Frame::<u32>::new(
        frame.width(),
        frame.height(),
        frame.channels(),
        frame.origin(),
    )?;
    add_to_frame(frame.as_view(), sums.as_view_mut(), worker)?;

    for index in first + 1..=last {
        let frame = wait_for_frame(provider, index, timeout, abort)?;
        if frame.origin() != sums.origin() {
            return Err(inpaint_core::Error::OriginMismatch.into());
        }
        add_to_frame(frame.as_view(), sums.as_view_mut(), worker)?;
    }
    log::debug!(
        "accumulated {} frames of {}x{}",
        count,
        sums.width(),
        sums.height()
    );

    let mut mean = Frame::new(sums.width(), sums.height(), sums.channels(), sums.origin())?;
    normalize_frame(sums.as_view(), mean.as_view_mut(), count as u32, worker)?;
    Ok(mean)
}

#[cfg(test)]
mod tests {
    use super::*;
    use inpaint_core::{MASK_INVALID, MASK_VALID, Mask, PixelOrigin};
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_mean_value() {
        let data = vec![1u8, 10, 2, 20, 2, 30, 2, 41];
        let frame = Frame::from_data(2, 2, 2, 0, PixelOrigin::UpperLeft, data).unwrap();
        // 7 / 4 rounds to 2, 101 / 4 rounds to 25
        assert_eq!(mean_value(frame.as_view(), None), vec![2, 25]);

        let float = Frame::filled(3, 5, &[0.5f32], PixelOrigin::UpperLeft).unwrap();
        assert_eq!(mean_value(float.as_view(), None), vec![0.5]);
    }

    #[test]
    fn test_accumulate_and_normalize() {
        let a = Frame::filled(3, 2, &[10u8, 0], PixelOrigin::UpperLeft).unwrap();
        let b = Frame::filled(3, 2, &[13u8, 1], PixelOrigin::UpperLeft).unwrap();
        let mut sums = Frame::<u32>::new(3, 2, 2, PixelOrigin::UpperLeft).unwrap();
        add_to_frame(a.as_view(), sums.as_view_mut(), None).unwrap();
        add_to_frame(b.as_view(), sums.as_view_mut(), None).unwrap();
        assert!(sums.data().chunks(2).all(|p| p == [23, 1]));

        let mut mean = Frame::<u8>::new(3, 2, 2, PixelOrigin::UpperLeft).unwrap();
        normalize_frame(sums.as_view(), mean.as_view_mut(), 2, None).unwrap();
        assert!(mean.data().chunks(2).all(|p| p == [12, 1]));
        assert!(normalize_frame(sums.as_view(), mean.as_view_mut(), 0, None).is_err());
    }

    #[test]
    fn test_individual_accumulation() {
        let source = Frame::filled(2, 1, &[100u8], PixelOrigin::UpperLeft).unwrap();
        let mut mask = Mask::new_mask(2, 1, MASK_VALID, PixelOrigin::UpperLeft).unwrap();
        mask.pixel_mut(1, 0)[0] = MASK_INVALID;

        let mut sums = Frame::<u32>::new(2, 1, 1, PixelOrigin::UpperLeft).unwrap();
        let mut counts = Frame::<u32>::new(2, 1, 1, PixelOrigin::UpperLeft).unwrap();
        for _ in 0..3 {
            add_to_frame_individually(
                source.as_view(),
                mask.as_view(),
                sums.as_view_mut(),
                counts.as_view_mut(),
                MASK_INVALID,
                None,
            )
            .unwrap();
        }
        assert_eq!(sums.data(), &[300, 0]);
        assert_eq!(counts.data(), &[3, 0]);

        let mut target = Frame::<u8>::new(2, 1, 1, PixelOrigin::UpperLeft).unwrap();
        normalize_frame_individually(
            sums.as_view(),
            counts.as_view(),
            target.as_view_mut(),
            Some(&[7]),
            None,
        )
        .unwrap();
        assert_eq!(target.data(), &[100, 7]);
        let result = normalize_frame_individually(
            sums.as_view(),
            counts.as_view(),
            target.as_view_mut(),
            Some(&[7, 7]),
            None,
        );
        assert!(result.is_err());
    }

    struct Delayed {
        frames: Vec<Frame<u8>>,
        requests: AtomicUsize,
    }

    impl FrameProvider for Delayed {
        fn frame_count(&self) -> usize {
            self.frames.len()
        }

        fn try_frame(&self, index: usize) -> Option<Frame<u8>> {
            // Every second request fails
            let request = self.requests.fetch_add(1, Ordering::SeqCst);
            if request.is_multiple_of(2) {
                return None;
            }
            self.frames.get(index).cloned()
        }
    }

    fn provider(values: &[u8]) -> Delayed {
        Delayed {
            frames: values
                .iter()
                .map(|&v| Frame::filled(4, 3, &[v], PixelOrigin::UpperLeft).unwrap())
                .collect(),
            requests: AtomicUsize::new(0),
        }
    }

    #[test]
    fn test_mean_frame() {
        let provider = provider(&[10, 20, 31, 90]);
        let mean = mean_frame(&provider, 0, 2, Duration::from_secs(5), None, None).unwrap();
        // (10 + 20 + 31 + 1) / 3
        assert!(mean.data().iter().all(|&v| v == 20));
        assert!(mean_frame(&provider, 2, 4, Duration::from_secs(1), None, None).is_err());
        assert!(mean_frame(&provider, 3, 2, Duration::from_secs(1), None, None).is_err());
    }

    #[test]
    fn test_mean_frame_abort_and_timeout() {
        let provider = provider(&[1, 2]);
        let abort = AtomicBool::new(true);
        assert!(matches!(
            mean_frame(&provider, 0, 1, Duration::from_secs(5), Some(&abort), None),
            Err(FilterError::Aborted)
        ));

        struct Never;
        impl FrameProvider for Never {
            fn frame_count(&self) -> usize {
                1
            }
            fn try_frame(&self, _index: usize) -> Option<Frame<u8>> {
                None
            }
        }
        assert!(matches!(
            mean_frame(&Never, 0, 0, Duration::from_millis(5), None, None),
            Err(FilterError::Timeout { index: 0 })
        ));
    }
}

//! Frame halving
//!
//! Four reductions by a factor of two:
//!
//! - [`divide_by_two`] averages the valid pixels of every source block and
//!   halves the mask alongside
//! - [`downsample_binary_mask_by_two`] thresholds the weighted block sum of
//!   a binary mask
//! - [`downsample_by_two_11`] averages every block, ignoring masks
//! - [`downsample_by_two_14641`] applies a `[1 4 6 4 1]` kernel centered on
//!   every even source pixel, mirroring the frame at its borders
//!
//! Except for the `[1 4 6 4 1]` kernel, target pixel `(x, y)` covers the
//! source block `[2x, 2x+1] x [2y, 2y+1]`.
//! For an odd source width the last target column also covers the extra
//! source column (blocks of 3x2 pixels), likewise for an odd height (2x3),
//! and the bottom-right target pixel of an odd-by-odd source covers 3x3
//! source pixels. No source pixel is dropped.
//!
//! All integer averages round half up: `(sum + divisor / 2) / divisor`.

use crate::error::{TransformError, TransformResult};
use inpaint_core::{
    Frame, FrameView, FrameViewMut, MASK_INVALID, MASK_VALID, Mask, Worker, execute_rows_mut,
    execute_rows_mut_pair, mirrored_index, validate_frame_mask, validate_mask,
};
use std::sync::atomic::{AtomicBool, Ordering};

/// Default block-sum threshold of [`downsample_binary_mask_by_two`].
///
/// With 766 all four pixels of a block must be `0xFF`.
pub const DEFAULT_BINARY_MASK_THRESHOLD: u32 = 766;

/// Smallest target row partition worth running on another thread.
const MIN_PARTITION_ROWS: u32 = 4;

/// Averaged pixels of a 2x2 block for one validity pattern
#[derive(Debug, Clone, Copy)]
struct BlockPattern {
    count: u32,
    pixels: [usize; 4],
}

/// Valid-pixel subsets of a 2x2 block, indexed by its 4-bit validity pattern.
///
/// Bit `i` is set when block pixel `i` is valid; pixels are numbered
/// top-left, top-right, bottom-left, bottom-right.
const BLOCK_PATTERNS: [BlockPattern; 16] = block_patterns();

const fn block_patterns() -> [BlockPattern; 16] {
    let mut table = [BlockPattern {
        count: 0,
        pixels: [0; 4],
    }; 16];
    let mut pattern = 0;
    while pattern < 16 {
        let mut bit = 0;
        while bit < 4 {
            if pattern & (1 << bit) != 0 {
                let count = table[pattern].count as usize;
                table[pattern].pixels[count] = bit;
                table[pattern].count += 1;
            }
            bit += 1;
        }
        pattern += 1;
    }
    table
}

/// Source block extent (columns, rows) of target pixel `(x, y)`.
#[inline]
fn block_span(source_width: u32, source_height: u32, x: u32, y: u32) -> (u32, u32) {
    let columns = if !source_width.is_multiple_of(2) && x + 1 == source_width / 2 {
        3
    } else {
        2
    };
    let rows = if !source_height.is_multiple_of(2) && y + 1 == source_height / 2 {
        3
    } else {
        2
    };
    (columns, rows)
}

static WEIGHTS_11: [u32; 2] = [1, 1];
static WEIGHTS_121: [u32; 3] = [1, 2, 1];
static WEIGHTS_14641: [u32; 5] = [1, 4, 6, 4, 1];

/// Tap weights along one block axis: `[1 1]` or `[1 2 1]`.
#[inline]
fn axis_weights(span: u32) -> &'static [u32] {
    if span == 3 {
        &WEIGHTS_121[..]
    } else {
        &WEIGHTS_11[..]
    }
}

fn check_halvable(width: u32, height: u32) -> TransformResult<()> {
    if width < 2 || height < 2 {
        return Err(TransformError::SourceTooSmall { width, height });
    }
    Ok(())
}

fn check_target(
    source_width: u32,
    source_height: u32,
    channels: u32,
    target: (u32, u32, u32),
) -> TransformResult<()> {
    let expected = (source_width / 2, source_height / 2, channels);
    if target != expected {
        return Err(TransformError::TargetMismatch {
            expected,
            actual: target,
        });
    }
    Ok(())
}

struct HalveJob<'a> {
    source: FrameView<'a, u8>,
    source_mask: FrameView<'a, u8>,
    handle_full_mask_pixel: bool,
}

/// Halve a frame and its mask, averaging valid source pixels only.
///
/// A target pixel is valid if at least one pixel of its source block is
/// valid; its channels are then the rounded average of the valid source
/// pixels. A target pixel whose whole block is masked becomes invalid and
/// keeps its previous content, unless `handle_full_mask_pixel` is set, in
/// which case it receives the average of the whole block.
///
/// # Arguments
///
/// * `source` - Frame with 1 to 4 channels, at least 2x2 pixels
/// * `source_mask` - Binary mask on the grid of `source`
/// * `target` - Frame of `(width / 2, height / 2)` with the source's channels
/// * `target_mask` - Single-channel frame on the grid of `target`
/// * `handle_full_mask_pixel` - Fill fully masked blocks with their plain average
/// * `worker` - Optional worker splitting the target rows
///
/// # Returns
///
/// `true` if the target mask holds at least one invalid pixel.
///
/// # Errors
///
/// Fails before writing anything if the channel count is outside `[1, 4]`,
/// the source is smaller than 2x2, the mask is not binary or does not
/// match the source, or a target does not have the halved layout.
pub fn divide_by_two(
    source: FrameView<'_, u8>,
    source_mask: FrameView<'_, u8>,
    mut target: FrameViewMut<'_, u8>,
    mut target_mask: FrameViewMut<'_, u8>,
    handle_full_mask_pixel: bool,
    worker: Option<&Worker>,
) -> TransformResult<bool> {
    let channels = source.channels();
    if !(1..=4).contains(&channels) {
        return Err(TransformError::UnsupportedChannels(channels));
    }
    check_halvable(source.width(), source.height())?;
    validate_frame_mask(source, source_mask)?;
    check_target(
        source.width(),
        source.height(),
        channels,
        (target.width(), target.height(), target.channels()),
    )?;
    check_target(
        source.width(),
        source.height(),
        1,
        (
            target_mask.width(),
            target_mask.height(),
            target_mask.channels(),
        ),
    )?;

    let job = HalveJob {
        source,
        source_mask,
        handle_full_mask_pixel,
    };
    let rows = target.height();
    let frame_stride = target.stride_elements();
    let mask_stride = target_mask.stride_elements();
    let found_invalid = AtomicBool::new(false);

    execute_rows_mut_pair(
        worker,
        (target.data_mut(), frame_stride),
        (target_mask.data_mut(), mask_stride),
        rows,
        MIN_PARTITION_ROWS,
        |first_row, frame_rows, mask_rows| {
            let rows = (frame_rows, frame_stride, mask_rows, mask_stride);
            let found = match channels {
                1 => halve_rows::<1>(&job, first_row, rows),
                2 => halve_rows::<2>(&job, first_row, rows),
                3 => halve_rows::<3>(&job, first_row, rows),
                _ => halve_rows::<4>(&job, first_row, rows),
            };
            if found {
                found_invalid.store(true, Ordering::Relaxed);
            }
        },
    );

    Ok(found_invalid.load(Ordering::Relaxed))
}

/// Allocate the halved frame and mask and run [`divide_by_two`].
///
/// Returns the target frame, the target mask and whether the target mask
/// holds an invalid pixel. Fully masked target pixels are zero unless
/// `handle_full_mask_pixel` is set.
pub fn divide_by_two_frames(
    source: &Frame<u8>,
    source_mask: &Mask,
    handle_full_mask_pixel: bool,
    worker: Option<&Worker>,
) -> TransformResult<(Frame<u8>, Mask, bool)> {
    check_halvable(source.width(), source.height())?;
    let width = source.width() / 2;
    let height = source.height() / 2;
    let mut target = Frame::new(width, height, source.channels(), source.origin())?;
    let mut target_mask = Mask::new(width, height, 1, source.origin())?;
    let has_invalid = divide_by_two(
        source.as_view(),
        source_mask.as_view(),
        target.as_view_mut(),
        target_mask.as_view_mut(),
        handle_full_mask_pixel,
        worker,
    )?;
    Ok((target, target_mask, has_invalid))
}

fn halve_rows<const CHANNELS: usize>(
    job: &HalveJob<'_>,
    first_row: u32,
    (frame_rows, frame_stride, mask_rows, mask_stride): (&mut [u8], usize, &mut [u8], usize),
) -> bool {
    let source_width = job.source.width();
    let source_height = job.source.height();
    let target_width = source_width / 2;
    let target_height = source_height / 2;

    let mut found_invalid = false;

    for (i, (frame_row, mask_row)) in frame_rows
        .chunks_mut(frame_stride)
        .zip(mask_rows.chunks_mut(mask_stride))
        .enumerate()
    {
        let y = first_row + i as u32;

        // Plain 2x2 blocks, the odd last row and column are handled below
        let core_columns = if !source_height.is_multiple_of(2) && y + 1 == target_height {
            0
        } else {
            source_width / 2 - source_width % 2
        };

        let pixels0 = job.source.row(2 * y);
        let pixels1 = job.source.row(2 * y + 1);
        let mask0 = job.source_mask.row(2 * y);
        let mask1 = job.source_mask.row(2 * y + 1);

        for x in 0..core_columns as usize {
            let left = 2 * x;
            let right = left + 1;
            let pattern = (mask0[left] == MASK_VALID) as usize
                | ((mask0[right] == MASK_VALID) as usize) << 1
                | ((mask1[left] == MASK_VALID) as usize) << 2
                | ((mask1[right] == MASK_VALID) as usize) << 3;

            let block = [
                &pixels0[left * CHANNELS..right * CHANNELS],
                &pixels0[right * CHANNELS..(right + 1) * CHANNELS],
                &pixels1[left * CHANNELS..right * CHANNELS],
                &pixels1[right * CHANNELS..(right + 1) * CHANNELS],
            ];
            let target = &mut frame_row[x * CHANNELS..(x + 1) * CHANNELS];
            let entry = BLOCK_PATTERNS[pattern];

            if entry.count == 0 {
                mask_row[x] = MASK_INVALID;
                found_invalid = true;
                if job.handle_full_mask_pixel {
                    for (c, value) in target.iter_mut().enumerate() {
                        let sum: u32 = block.iter().map(|p| p[c] as u32).sum();
                        *value = ((sum + 2) / 4) as u8;
                    }
                }
            } else {
                let valid = &entry.pixels[..entry.count as usize];
                for (c, value) in target.iter_mut().enumerate() {
                    let sum: u32 = valid.iter().map(|&p| block[p][c] as u32).sum();
                    *value = ((sum + entry.count / 2) / entry.count) as u8;
                }
                mask_row[x] = MASK_VALID;
            }
        }

        for x in core_columns..target_width {
            let (columns, rows) = block_span(source_width, source_height, x, y);
            let start = x as usize * CHANNELS;
            let target = &mut frame_row[start..start + CHANNELS];
            if !halve_border_block::<CHANNELS>(job, x, y, columns, rows, target) {
                mask_row[x as usize] = MASK_INVALID;
                found_invalid = true;
            } else {
                mask_row[x as usize] = MASK_VALID;
            }
        }
    }

    found_invalid
}

/// Average the valid pixels of a 2x3, 3x2 or 3x3 border block.
///
/// Returns `false` if the block holds no valid pixel.
fn halve_border_block<const CHANNELS: usize>(
    job: &HalveJob<'_>,
    x: u32,
    y: u32,
    columns: u32,
    rows: u32,
    target: &mut [u8],
) -> bool {
    let mut valid_sum = [0u32; CHANNELS];
    let mut total_sum = [0u32; CHANNELS];
    let mut valid = 0u32;

    for sy in 2 * y..2 * y + rows {
        let pixels = job.source.row(sy);
        let mask = job.source_mask.row(sy);
        for sx in (2 * x..2 * x + columns).map(|v| v as usize) {
            let pixel = &pixels[sx * CHANNELS..(sx + 1) * CHANNELS];
            let is_valid = mask[sx] == MASK_VALID;
            for (c, &value) in pixel.iter().enumerate() {
                total_sum[c] += value as u32;
                if is_valid {
                    valid_sum[c] += value as u32;
                }
            }
            valid += is_valid as u32;
        }
    }

    if valid == 0 {
        if job.handle_full_mask_pixel {
            let candidates = columns * rows;
            for (value, &sum) in target.iter_mut().zip(&total_sum) {
                *value = ((sum + candidates / 2) / candidates) as u8;
            }
        }
        return false;
    }

    for (value, &sum) in target.iter_mut().zip(&valid_sum) {
        *value = ((sum + valid / 2) / valid) as u8;
    }
    true
}

/// Weighted sum of one channel over the source block of target pixel `(x, y)`.
///
/// Weights are `[1 1]` or `[1 2 1]` per axis, see [`axis_weights`].
#[inline]
fn weighted_block_sum(
    source: &FrameView<'_, u8>,
    channel: usize,
    x: u32,
    y: u32,
    (columns, rows): (u32, u32),
) -> u32 {
    let channels = source.channels() as usize;
    let mut sum = 0u32;
    for (row_weight, sy) in axis_weights(rows).iter().zip(2 * y..) {
        let row = source.row(sy);
        for (column_weight, sx) in axis_weights(columns).iter().zip(2 * x as usize..) {
            sum += row_weight * column_weight * row[sx * channels + channel] as u32;
        }
    }
    sum
}

/// Halve a binary mask by thresholding block sums.
///
/// A target pixel becomes `0xFF` if the sum of its 2x2 source block is at
/// least `threshold`, `0x00` otherwise. Blocks at odd borders use `[1 2 1]`
/// weights along the longer axis and compare against the threshold scaled
/// by 2 (3x2, 2x3) or 4 (3x3).
///
/// # Errors
///
/// Fails if `threshold > 1020`, the source is not a binary mask of at
/// least 2x2 pixels, or the target does not have the halved layout.
pub fn downsample_binary_mask_by_two(
    source: FrameView<'_, u8>,
    mut target: FrameViewMut<'_, u8>,
    threshold: u32,
    worker: Option<&Worker>,
) -> TransformResult<()> {
    if threshold > 4 * 255 {
        return Err(TransformError::InvalidParameters(format!(
            "mask threshold must be in [0, 1020], got {}",
            threshold
        )));
    }
    check_halvable(source.width(), source.height())?;
    validate_mask(source)?;
    check_target(
        source.width(),
        source.height(),
        1,
        (target.width(), target.height(), target.channels()),
    )?;

    let width = source.width();
    let height = source.height();
    let stride = target.stride_elements();
    let rows = target.height();

    execute_rows_mut(
        worker,
        target.data_mut(),
        stride,
        rows,
        MIN_PARTITION_ROWS,
        |first_row, chunk| {
            for (i, row) in chunk.chunks_mut(stride).enumerate() {
                let y = first_row + i as u32;
                for x in 0..width / 2 {
                    let span = block_span(width, height, x, y);
                    let scale = (span.0 - 1) * (span.1 - 1);
                    let sum = weighted_block_sum(&source, 0, x, y, span);
                    row[x as usize] = if sum >= threshold * scale {
                        MASK_VALID
                    } else {
                        MASK_INVALID
                    };
                }
            }
        },
    );

    Ok(())
}

/// Halve a frame by averaging every source block.
///
/// 2x2 blocks use equal weights, odd borders `[1 2 1]` weights along the
/// longer axis; each sum is divided by its total weight (4, 8 or 16) with
/// rounding half up. Any channel count is supported.
pub fn downsample_by_two_11(
    source: FrameView<'_, u8>,
    mut target: FrameViewMut<'_, u8>,
    worker: Option<&Worker>,
) -> TransformResult<()> {
    check_halvable(source.width(), source.height())?;
    check_target(
        source.width(),
        source.height(),
        source.channels(),
        (target.width(), target.height(), target.channels()),
    )?;

    let width = source.width();
    let height = source.height();
    let channels = source.channels() as usize;
    let stride = target.stride_elements();
    let rows = target.height();

    execute_rows_mut(
        worker,
        target.data_mut(),
        stride,
        rows,
        MIN_PARTITION_ROWS,
        |first_row, chunk| {
            for (i, row) in chunk.chunks_mut(stride).enumerate() {
                let y = first_row + i as u32;
                for x in 0..width / 2 {
                    let span = block_span(width, height, x, y);
                    let divisor = 4 * (span.0 - 1) * (span.1 - 1);
                    let start = x as usize * channels;
                    let pixel = &mut row[start..start + channels];
                    for (c, value) in pixel.iter_mut().enumerate() {
                        let sum = weighted_block_sum(&source, c, x, y, span);
                        *value = ((sum + divisor / 2) / divisor) as u8;
                    }
                }
            }
        },
    );

    Ok(())
}

/// Halve a frame with the `[1 4 6 4 1]` kernel in both directions.
///
/// Target pixel `(x, y)` is centered on source pixel `(2x, 2y)`; source
/// locations outside the frame are mirrored, see [`mirrored_index`]. The
/// weighted sum is divided by 256 with rounding half up. Any channel count
/// is supported.
///
/// # Errors
///
/// Fails if the source is smaller than 2x2 or the target does not have the
/// halved layout.
pub fn downsample_by_two_14641(
    source: FrameView<'_, u8>,
    mut target: FrameViewMut<'_, u8>,
    worker: Option<&Worker>,
) -> TransformResult<()> {
    check_halvable(source.width(), source.height())?;
    check_target(
        source.width(),
        source.height(),
        source.channels(),
        (target.width(), target.height(), target.channels()),
    )?;

    let width = source.width() as usize;
    let height = source.height() as usize;
    let channels = source.channels() as usize;
    let stride = target.stride_elements();
    let rows = target.height();

    execute_rows_mut(
        worker,
        target.data_mut(),
        stride,
        rows,
        MIN_PARTITION_ROWS,
        |first_row, chunk| {
            // Vertically filtered source row
            let mut vertical = vec![0u32; width * channels];
            for (i, row) in chunk.chunks_mut(stride).enumerate() {
                let center = 2 * (first_row as isize + i as isize);
                vertical.fill(0);
                for (&weight, offset) in WEIGHTS_14641.iter().zip(-2isize..) {
                    let sy = mirrored_index(center + offset, height);
                    let pixels = &source.row(sy as u32)[..width * channels];
                    for (sum, &value) in vertical.iter_mut().zip(pixels) {
                        *sum += weight * value as u32;
                    }
                }

                for (x, pixel) in row[..width / 2 * channels]
                    .chunks_exact_mut(channels)
                    .enumerate()
                {
                    let center = 2 * x as isize;
                    for (c, value) in pixel.iter_mut().enumerate() {
                        let mut sum = 0u32;
                        for (&weight, offset) in WEIGHTS_14641.iter().zip(-2isize..) {
                            let sx = mirrored_index(center + offset, width);
                            sum += weight * vertical[sx * channels + c];
                        }
                        *value = ((sum + 128) / 256) as u8;
                    }
                }
            }
        },
    );

    Ok(())
}

/// Kernel halving frames without a mask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DownsamplingMode {
    /// Block average, see [`downsample_by_two_11`]
    #[default]
    Filter11,
    /// Mirrored `[1 4 6 4 1]` kernel, see [`downsample_by_two_14641`]
    Filter14641,
}

impl DownsamplingMode {
    /// Halve `source` into `target` with this kernel.
    pub fn downsample(
        self,
        source: FrameView<'_, u8>,
        target: FrameViewMut<'_, u8>,
        worker: Option<&Worker>,
    ) -> TransformResult<()> {
        match self {
            Self::Filter11 => downsample_by_two_11(source, target, worker),
            Self::Filter14641 => downsample_by_two_14641(source, target, worker),
        }
    }
}

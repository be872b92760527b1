//! Mask analysis
//!
//! Functions here treat every pixel different from a caller-given
//! `non_mask_value` as a mask pixel, except
//! [`determine_distances_to_border`] which needs a binary mask with
//! [`MASK_INVALID`] mask pixels and [`MASK_VALID`] background.

use crate::error::{RegionError, RegionResult};
use inpaint_core::{
    Error as CoreError, FrameView, FrameViewMut, MASK_INVALID, MASK_VALID, PixelBoundingBox,
    Worker, execute_rows_mut, validate_mask,
};

/// Largest supported number of distance iterations.
///
/// Labels range from 1 to the iteration count, 0xFF marks non-mask pixels.
pub const MAX_DISTANCE_ITERATIONS: u32 = 254;

/// Smallest row partition worth running on another thread.
const MIN_PARTITION_ROWS: u32 = 8;

/// Bounding box of all pixels different from `non_mask_value`.
///
/// Returns the empty box if the mask holds no mask pixel.
pub fn detect_bounding_box(mask: FrameView<'_, u8>, non_mask_value: u8) -> PixelBoundingBox {
    debug_assert_eq!(mask.channels(), 1);

    let mut bbox = PixelBoundingBox::empty();
    for y in 0..mask.height() {
        let row = mask.row(y);
        if let Some(first) = row.iter().position(|&v| v != non_mask_value) {
            let last = row
                .iter()
                .rposition(|&v| v != non_mask_value)
                .unwrap_or(first);
            bbox = bbox.union(&PixelBoundingBox::new(first as u32, y, last as u32, y));
        }
    }
    bbox
}

/// Bounding box of all mask pixels, given a box known to lie inside it.
///
/// `inner` must be contained in the bounding box of the mask, e.g. the
/// upscaled box of a coarser pyramid layer whose mask pixels stem from
/// mask pixels of this layer. Pixels inside `inner` are not visited.
/// An empty hint or one exceeding the frame falls back to a full scan.
pub fn detect_bounding_box_with_hint(
    mask: FrameView<'_, u8>,
    non_mask_value: u8,
    inner: &PixelBoundingBox,
) -> PixelBoundingBox {
    debug_assert_eq!(mask.channels(), 1);

    if !inner.is_valid() || inner.right_end() > mask.width() || inner.bottom_end() > mask.height()
    {
        log::warn!(
            "ignoring bounding box hint {} for {}x{} mask",
            inner,
            mask.width(),
            mask.height()
        );
        return detect_bounding_box(mask, non_mask_value);
    }

    let inner_left = inner.left() as usize;
    let inner_right_end = inner.right_end() as usize;

    let mut bbox = *inner;
    for y in 0..mask.height() {
        let row = mask.row(y);
        if y >= inner.top() && y < inner.bottom_end() {
            if let Some(first) = row[..inner_left].iter().position(|&v| v != non_mask_value) {
                bbox = bbox.union(&PixelBoundingBox::new(first as u32, y, first as u32, y));
            }
            if let Some(last) = row[inner_right_end..]
                .iter()
                .rposition(|&v| v != non_mask_value)
            {
                let x = (inner_right_end + last) as u32;
                bbox = bbox.union(&PixelBoundingBox::new(x, y, x, y));
            }
        } else if let Some(first) = row.iter().position(|&v| v != non_mask_value) {
            let last = row
                .iter()
                .rposition(|&v| v != non_mask_value)
                .unwrap_or(first);
            bbox = bbox.union(&PixelBoundingBox::new(first as u32, y, last as u32, y));
        }
    }
    bbox
}

/// Number of pixels different from `non_mask_value`, optionally restricted
/// to `region` (clipped to the frame).
pub fn count_mask_pixels(
    mask: FrameView<'_, u8>,
    non_mask_value: u8,
    region: Option<&PixelBoundingBox>,
) -> u64 {
    debug_assert_eq!(mask.channels(), 1);

    let full = PixelBoundingBox::from_size(0, 0, mask.width(), mask.height());
    let region = region.map_or(full, |r| r.clipped(mask.width(), mask.height()));
    if !region.is_valid() {
        return 0;
    }

    (region.top()..region.bottom_end())
        .map(|y| {
            mask.row(y)[region.left() as usize..region.right_end() as usize]
                .iter()
                .filter(|&&v| v != non_mask_value)
                .count() as u64
        })
        .sum()
}

/// True if at least one pixel differs from `non_mask_value`.
pub fn has_mask_pixel(mask: FrameView<'_, u8>, non_mask_value: u8) -> bool {
    (0..mask.height()).any(|y| mask.row(y).iter().any(|&v| v != non_mask_value))
}

/// Replace every mask pixel by its 8-neighbourhood distance to the closest
/// non-mask pixel.
///
/// Mask pixels (`0x00`) touching a non-mask pixel (`0xFF`) or the frame
/// border get 1, their still unlabelled neighbours get 2, and so on up to
/// `iterations`. Pixels farther away keep `0x00`, or receive `iterations`
/// when `assign_final` is set. Non-mask pixels keep `0xFF`.
///
/// `region` restricts the work to a box that must contain every mask
/// pixel (usually the mask's bounding box). `None` processes the whole
/// frame.
///
/// # Errors
///
/// Returns [`RegionError::InvalidParameters`] if `iterations` is outside
/// `[1, 254]` and a core error if the mask is not binary.
pub fn determine_distances_to_border(
    mut mask: FrameViewMut<'_, u8>,
    iterations: u32,
    assign_final: bool,
    region: Option<&PixelBoundingBox>,
    worker: Option<&Worker>,
) -> RegionResult<()> {
    if iterations == 0 || iterations > MAX_DISTANCE_ITERATIONS {
        return Err(RegionError::InvalidParameters(format!(
            "distance iterations must be in [1, {}], got {}",
            MAX_DISTANCE_ITERATIONS, iterations
        )));
    }
    validate_mask(mask.as_view())?;

    let width = mask.width();
    let height = mask.height();
    let stride = mask.stride_elements();
    let full = PixelBoundingBox::from_size(0, 0, width, height);
    let region = region.map_or(full, |r| r.clipped(width, height));
    if !region.is_valid() {
        return Ok(());
    }

    let mut snapshot: Vec<u8> = Vec::new();
    snapshot
        .try_reserve_exact(mask.data().len())
        .map_err(|_| CoreError::AllocationFailed)?;

    for n in 0..iterations {
        // A pixel with distance n + 1 lies at least n pixels inside the region
        let area = shrink(&region, n);
        if !area.is_valid() {
            break;
        }

        let search = if n == 0 { MASK_VALID } else { n as u8 };
        let label = (n + 1) as u8;

        snapshot.clear();
        snapshot.extend_from_slice(mask.data());
        let source = snapshot.as_slice();

        let rows = &mut mask.data_mut()
            [area.top() as usize * stride..area.bottom_end() as usize * stride];
        execute_rows_mut(
            worker,
            rows,
            stride,
            area.height(),
            MIN_PARTITION_ROWS,
            |first, chunk| {
                for (i, row) in chunk.chunks_mut(stride).enumerate() {
                    let y = area.top() + first + i as u32;
                    for x in area.left()..area.right_end() {
                        if row[x as usize] != MASK_INVALID {
                            continue;
                        }
                        if x == 0 || y == 0 || x + 1 == width || y + 1 == height {
                            if n == 0 {
                                row[x as usize] = label;
                            }
                        } else if has_neighbour(source, stride, x, y, search) {
                            row[x as usize] = label;
                        }
                    }
                }
            },
        );
    }

    if assign_final {
        let last = iterations as u8;
        for y in region.top()..region.bottom_end() {
            for value in &mut mask.row_mut(y)[region.left() as usize..region.right_end() as usize]
            {
                if *value == MASK_INVALID {
                    *value = last;
                }
            }
        }
    }

    Ok(())
}

fn shrink(region: &PixelBoundingBox, by: u32) -> PixelBoundingBox {
    if region.width() <= 2 * by || region.height() <= 2 * by {
        return PixelBoundingBox::empty();
    }
    PixelBoundingBox::from_size(
        region.left() + by,
        region.top() + by,
        region.width() - 2 * by,
        region.height() - 2 * by,
    )
}

/// True if one of the 8 neighbours of the interior pixel `(x, y)` equals `value`.
#[inline]
fn has_neighbour(source: &[u8], stride: usize, x: u32, y: u32, value: u8) -> bool {
    let x = x as usize;
    let y = y as usize;
    [y - 1, y, y + 1].into_iter().any(|row| {
        let start = row * stride + x - 1;
        source[start..start + 3].contains(&value)
    })
}

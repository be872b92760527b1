//! Seeded random frames and masks

use crate::error::{TestError, TestResult};
use inpaint_core::{Frame, MASK_INVALID, MASK_VALID, Mask, PixelOrigin};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Deterministic generator for reproducible tests
pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Frame with uniformly random elements and `padding` elements per row.
pub fn random_frame<R: Rng>(
    rng: &mut R,
    width: u32,
    height: u32,
    channels: u32,
    padding: u32,
    origin: PixelOrigin,
) -> TestResult<Frame<u8>> {
    let mut frame = Frame::with_padding(width, height, channels, padding, origin)?;
    for y in 0..height {
        rng.fill(frame.row_mut(y));
    }
    Ok(frame)
}

/// Mask where every pixel is masked with probability `masked_ratio`.
pub fn random_mask<R: Rng>(
    rng: &mut R,
    width: u32,
    height: u32,
    masked_ratio: f64,
    origin: PixelOrigin,
) -> TestResult<Mask> {
    if !(0.0..=1.0).contains(&masked_ratio) {
        return Err(TestError::InvalidParameters(format!(
            "masked ratio must be in [0, 1], got {}",
            masked_ratio
        )));
    }
    let mut mask = Mask::new_mask(width, height, MASK_VALID, origin)?;
    for y in 0..height {
        for value in mask.row_mut(y) {
            if rng.random_bool(masked_ratio) {
                *value = MASK_INVALID;
            }
        }
    }
    Ok(mask)
}

/// Mask with one random rectangular hole of at least 2x2 pixels.
pub fn random_hole_mask<R: Rng>(
    rng: &mut R,
    width: u32,
    height: u32,
    origin: PixelOrigin,
) -> TestResult<Mask> {
    if width < 2 || height < 2 {
        return Err(TestError::InvalidParameters(format!(
            "{}x{} too small for a hole",
            width, height
        )));
    }
    let hole_width = rng.random_range(2..=width.max(4) / 2);
    let hole_height = rng.random_range(2..=height.max(4) / 2);
    let left = rng.random_range(0..=width - hole_width);
    let top = rng.random_range(0..=height - hole_height);

    let mut mask = Mask::new_mask(width, height, MASK_VALID, origin)?;
    let columns = left as usize..(left + hole_width) as usize;
    for y in top..top + hole_height {
        mask.row_mut(y)[columns.clone()].fill(MASK_INVALID);
    }
    Ok(mask)
}

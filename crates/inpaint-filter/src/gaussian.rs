//! Gaussian filter factors
//!
//! Filter sizes 1, 3, 5 and 7 use fixed binomial-like kernels. Larger sizes
//! sample a Gaussian whose sigma is derived from the size, see
//! [`filter_size_to_sigma`]. Integer factors are scaled so that the
//! outermost factor is 1 and come with their sum as denominator.

use crate::error::{FilterError, FilterResult};
use crate::separable::{MaskedFilter, SeparableElement, SeparableFilter};
use inpaint_core::{Frame, FrameView, Mask, Worker};

const FACTORS_1: [u32; 1] = [1];
const FACTORS_3: [u32; 3] = [1, 2, 1];
const FACTORS_5: [u32; 5] = [1, 4, 6, 4, 1];
const FACTORS_7: [u32; 7] = [1, 4, 7, 9, 7, 4, 1];

const FLOAT_FACTORS_1: [f32; 1] = [1.0];
const FLOAT_FACTORS_3: [f32; 3] = [0.25, 0.5, 0.25];
const FLOAT_FACTORS_5: [f32; 5] = [0.0625, 0.25, 0.375, 0.25, 0.0625];
const FLOAT_FACTORS_7: [f32; 7] = [
    0.03125, 0.109375, 0.21875, 0.28125, 0.21875, 0.109375, 0.03125,
];

/// Check that `filter_size` is odd and positive.
pub fn check_filter_size(filter_size: u32) -> FilterResult<()> {
    if filter_size == 0 || filter_size.is_multiple_of(2) {
        return Err(FilterError::InvalidFilterSize(filter_size));
    }
    Ok(())
}

fn check_sigma(sigma: f32) -> FilterResult<()> {
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(FilterError::InvalidParameters(format!(
            "sigma must be positive, got {}",
            sigma
        )));
    }
    Ok(())
}

/// Sigma of the Gaussian matching an odd filter size.
///
/// `0.3 * (size / 2 - 1) + 0.8`, so 3 maps to 0.8 and 5 to 1.1.
pub fn filter_size_to_sigma(filter_size: u32) -> f32 {
    0.3 * ((filter_size / 2) as f32 - 1.0) + 0.8
}

/// Smallest odd filter size covering a Gaussian with `sigma`.
///
/// Inverse of [`filter_size_to_sigma`] for the sizes it produces.
pub fn sigma_to_filter_size(sigma: f32) -> u32 {
    let size = ((sigma as f64 - 0.8) * 6.666_666_666 + 2.999).ceil();
    (size.max(1.0) as u32) | 1
}

/// Normalized float factors for an odd filter size.
pub fn filter_factors(filter_size: u32) -> FilterResult<Vec<f32>> {
    check_filter_size(filter_size)?;
    Ok(match filter_size {
        1 => FLOAT_FACTORS_1.to_vec(),
        3 => FLOAT_FACTORS_3.to_vec(),
        5 => FLOAT_FACTORS_5.to_vec(),
        7 => FLOAT_FACTORS_7.to_vec(),
        _ => sampled_gaussian(filter_size, filter_size_to_sigma(filter_size)),
    })
}

/// Integer factors and their sum for an odd filter size.
pub fn filter_factors_integer(filter_size: u32) -> FilterResult<(Vec<u32>, u32)> {
    check_filter_size(filter_size)?;
    let factors = match filter_size {
        1 => FACTORS_1.to_vec(),
        3 => FACTORS_3.to_vec(),
        5 => FACTORS_5.to_vec(),
        7 => FACTORS_7.to_vec(),
        _ => integer_from_float(&sampled_gaussian(filter_size, filter_size_to_sigma(filter_size))),
    };
    let denominator = factors.iter().sum();
    Ok((factors, denominator))
}

/// Normalized float factors sampling a Gaussian with explicit `sigma`.
pub fn filter_factors_with_sigma(filter_size: u32, sigma: f32) -> FilterResult<Vec<f32>> {
    check_filter_size(filter_size)?;
    check_sigma(sigma)?;
    Ok(sampled_gaussian(filter_size, sigma))
}

/// Integer factors and their sum sampling a Gaussian with explicit `sigma`.
pub fn filter_factors_integer_with_sigma(
    filter_size: u32,
    sigma: f32,
) -> FilterResult<(Vec<u32>, u32)> {
    let factors = integer_from_float(&filter_factors_with_sigma(filter_size, sigma)?);
    let denominator = factors.iter().sum();
    Ok((factors, denominator))
}

fn sampled_gaussian(filter_size: u32, sigma: f32) -> Vec<f32> {
    let half = (filter_size / 2) as i32;
    let scale = -0.5 / (sigma as f64 * sigma as f64);
    let samples: Vec<f64> = (-half..=half)
        .map(|i| (scale * (i * i) as f64).exp())
        .collect();
    let sum: f64 = samples.iter().sum();
    samples.iter().map(|v| (v / sum) as f32).collect()
}

fn integer_from_float(factors: &[f32]) -> Vec<u32> {
    let outer = factors[0];
    factors.iter().map(|&f| (f / outer + 0.5) as u32).collect()
}

/// Smooth a frame in place with a masked Gaussian of odd `filter_size`.
///
/// Pixels of `mask` equal to `mask_value` do not contribute; see
/// [`MaskedFilter`] for the exact semantics.
pub fn gaussian_masked_in_place<T: SeparableElement>(
    frame: &mut Frame<T>,
    mask: &mut Mask,
    filter_size: u32,
    mask_value: u8,
    worker: Option<&Worker>,
) -> FilterResult<()> {
    MaskedFilter::gaussian(filter_size)
        .with_mask_value(mask_value)
        .apply_in_place(frame, mask, worker)
}

/// Smooth `source` into `target` with a Gaussian of odd `filter_size`,
/// mirroring the frame at its borders.
///
/// The frame must be larger than half the filter in both directions; see
/// [`SeparableFilter`].
pub fn gaussian_filter<T: SeparableElement>(
    source: FrameView<'_, T>,
    target: &mut Frame<T>,
    filter_size: u32,
    worker: Option<&Worker>,
) -> FilterResult<()> {
    SeparableFilter::gaussian(filter_size).apply(source, target, worker)
}

/// In-place version of [`gaussian_filter`].
pub fn gaussian_filter_in_place<T: SeparableElement>(
    frame: &mut Frame<T>,
    filter_size: u32,
    worker: Option<&Worker>,
) -> FilterResult<()> {
    SeparableFilter::gaussian(filter_size).apply_in_place(frame, worker)
}

#[cfg(test)]
mod tests {
    use super::*;
    use inpaint_core::{PixelOrigin, mirrored_index};

    #[test]
    fn test_size_sigma_mapping() {
        assert!((filter_size_to_sigma(3) - 0.8).abs() < 1e-6);
        assert!((filter_size_to_sigma(5) - 1.1).abs() < 1e-6);
        assert!((filter_size_to_sigma(1) - 0.5).abs() < 1e-6);
        for size in [3, 5, 7, 9, 11, 15, 21] {
            assert_eq!(sigma_to_filter_size(filter_size_to_sigma(size)), size);
        }
        assert_eq!(sigma_to_filter_size(0.1), 1);
    }

    #[test]
    fn test_predefined_factors() {
        assert_eq!(filter_factors_integer(3).unwrap(), (vec![1, 2, 1], 4));
        assert_eq!(filter_factors_integer(7).unwrap().1, 33);
        for size in [1, 3, 5, 7] {
            let sum: f32 = filter_factors(size).unwrap().iter().sum();
            assert!((sum - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_sampled_factors() {
        let (factors, denominator) = filter_factors_integer(9).unwrap();
        assert_eq!(factors, vec![1, 3, 8, 13, 16, 13, 8, 3, 1]);
        assert_eq!(denominator, 66);

        let float = filter_factors(9).unwrap();
        let sum: f32 = float.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert!(float[4] > float[3] && float[0] == float[8]);
    }

    #[test]
    fn test_explicit_sigma() {
        let factors = filter_factors_with_sigma(5, 1000.0).unwrap();
        for f in &factors {
            assert!((f - 0.2).abs() < 1e-3);
        }
        let (integer, denominator) = filter_factors_integer_with_sigma(3, 0.8).unwrap();
        assert_eq!(integer[0], 1);
        assert_eq!(denominator, integer.iter().sum::<u32>());
        assert!(filter_factors_with_sigma(5, 0.0).is_err());
    }

    #[test]
    fn test_invalid_sizes() {
        assert!(matches!(filter_factors(4), Err(FilterError::InvalidFilterSize(4))));
        assert!(filter_factors_integer(0).is_err());
    }

    #[test]
    fn test_gaussian_filter_matches_direct_convolution() {
        let (width, height) = (7usize, 5usize);
        let data: Vec<u8> = (0..width * height).map(|v| (v * 37 % 251) as u8).collect();
        let source = Frame::from_data(7, 5, 1, 0, PixelOrigin::UpperLeft, data).unwrap();
        let mut target = Frame::new(7, 5, 1, PixelOrigin::UpperLeft).unwrap();
        gaussian_filter(source.as_view(), &mut target, 5, None).unwrap();

        let (factors, denominator) = filter_factors_integer(5).unwrap();
        for y in 0..height {
            for x in 0..width {
                let mut sum = 0u32;
                for (j, &fy) in factors.iter().enumerate() {
                    let sy = mirrored_index(y as isize + j as isize - 2, height);
                    for (i, &fx) in factors.iter().enumerate() {
                        let sx = mirrored_index(x as isize + i as isize - 2, width);
                        sum += fx * fy * source.pixel(sx as u32, sy as u32)[0] as u32;
                    }
                }
                let expected = (sum + denominator * denominator / 2) / (denominator * denominator);
                let actual = target.pixel(x as u32, y as u32)[0];
                assert_eq!(actual as u32, expected, "({x}, {y})");
            }
        }

        let mut in_place = source.clone();
        gaussian_filter_in_place(&mut in_place, 5, None).unwrap();
        assert_eq!(in_place.data(), target.data());
    }
}

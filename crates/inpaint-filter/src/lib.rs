//! inpaint-filter - Filtering kernels for inpainting
//!
//! This crate provides the numeric kernels used around the pyramid:
//!
//! - **Gaussian factors** - Integer and float kernels for odd filter sizes
//! - **Masked separable filtering** - Blur that ignores masked pixels and
//!   invalidates pixels without any valid contribution
//! - **Separable filtering** - Unmasked blur with mirrored borders
//! - **Gradients** - Central differences, squared magnitudes and lined
//!   integral images of forward differences
//! - **Means** - Per-channel mean values, masked accumulation and mean
//!   frames over a [`FrameProvider`]
//!
//! # Examples
//!
//! ```
//! use inpaint_core::{Frame, MASK_INVALID, MASK_VALID, Mask, PixelOrigin};
//! use inpaint_filter::gaussian_masked_in_place;
//!
//! let mut frame = Frame::filled(6, 6, &[50u8, 120], PixelOrigin::UpperLeft).unwrap();
//! let mut mask = Mask::new_mask(6, 6, MASK_VALID, PixelOrigin::UpperLeft).unwrap();
//! mask.pixel_mut(2, 2)[0] = MASK_INVALID;
//!
//! gaussian_masked_in_place(&mut frame, &mut mask, 3, MASK_INVALID, None).unwrap();
//! assert_eq!(frame.pixel(2, 2), &[50, 120]);
//! assert_eq!(mask.pixel(2, 2), &[MASK_VALID]);
//! ```

mod error;
pub mod gaussian;
pub mod gradient;
pub mod mean;
pub mod separable;

pub use error::{FilterError, FilterResult};
pub use gaussian::{
    filter_factors, filter_factors_integer, filter_factors_integer_with_sigma,
    filter_factors_with_sigma, filter_size_to_sigma, gaussian_filter, gaussian_filter_in_place,
    gaussian_masked_in_place, sigma_to_filter_size,
};
pub use gradient::{
    GradientResponse, IntegralElement, SquaredResponse, horizontal_1x2_lined_integral,
    horizontal_vertical, horizontal_vertical_frame, magnitude_squared, vertical_2x1_lined_integral,
};
pub use mean::{
    FrameProvider, MAX_MEAN_FRAMES, MeanElement, add_to_frame, add_to_frame_individually,
    mean_frame, mean_value, normalize_frame, normalize_frame_individually,
};
pub use separable::{MaskedFilter, SeparableElement, SeparableFilter};

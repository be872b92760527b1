//! inpaint-region - Mask analysis for inpainting
//!
//! This crate inspects binary masks:
//!
//! - **Bounding boxes** - Extent of the masked pixels, optionally
//!   accelerated by a box known to lie inside the result
//! - **Pixel counts** - Number of masked pixels in a frame or a sub-region
//! - **Border distances** - 8-neighbourhood distance of every masked pixel
//!   to the closest unmasked pixel, written into the mask itself
//!
//! # Examples
//!
//! ```
//! use inpaint_core::{MASK_INVALID, MASK_VALID, Mask, PixelOrigin};
//! use inpaint_region::detect_bounding_box;
//!
//! let mut mask = Mask::new_mask(8, 8, MASK_VALID, PixelOrigin::UpperLeft).unwrap();
//! mask.pixel_mut(3, 5)[0] = MASK_INVALID;
//! mask.pixel_mut(6, 2)[0] = MASK_INVALID;
//!
//! let bbox = detect_bounding_box(mask.as_view(), MASK_VALID);
//! assert_eq!((bbox.left(), bbox.top(), bbox.right(), bbox.bottom()), (3, 2, 6, 5));
//! ```

pub mod error;
pub mod mask_analyzer;

pub use error::{RegionError, RegionResult};
pub use mask_analyzer::{
    MAX_DISTANCE_ITERATIONS, count_mask_pixels, detect_bounding_box, detect_bounding_box_with_hint,
    determine_distances_to_border, has_mask_pixel,
};

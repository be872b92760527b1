//! inpaint-synthesis - Pyramid arrangement for inpainting
//!
//! [`SynthesisPyramid`] combines the other inpaint crates into the layered
//! representation an inpainting search works on: halved frames whose
//! masked pixels are averaged only from valid pixels, the matching mask
//! layers relabelled with border distances, an optional filter mask
//! pyramid, and the bounding box of the hole in every layer.
//!
//! # Examples
//!
//! ```
//! use inpaint_core::{Frame, MASK_INVALID, MASK_VALID, Mask, PixelOrigin};
//! use inpaint_synthesis::{ArrangeOptions, SynthesisPyramid};
//!
//! let frame = Frame::filled(16, 16, &[90u8, 60, 30], PixelOrigin::UpperLeft).unwrap();
//! let mut mask = Mask::new_mask(16, 16, MASK_VALID, PixelOrigin::UpperLeft).unwrap();
//! for y in 4..12 {
//!     for x in 4..12 {
//!         mask.pixel_mut(x, y)[0] = MASK_INVALID;
//!     }
//! }
//!
//! let mut pyramid = SynthesisPyramid::new();
//! pyramid
//!     .arrange(&frame, &mask, None, &ArrangeOptions::default(), None)
//!     .unwrap();
//! assert_eq!(pyramid.valid_layers(), 3);
//! ```

mod error;
pub mod pyramid;

pub use error::{SynthesisError, SynthesisResult};
pub use pyramid::{ArrangeOptions, PyramidState, SynthesisPyramid};

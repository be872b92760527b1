//! Inpaint - Mask-aware image pyramids for Rust
//!
//! # Overview
//!
//! The crates re-exported here prepare an image with a hole for
//! exemplar-based inpainting:
//!
//! - Frames, masks, bounding boxes and the row-parallel worker
//! - Mask-aware halving and frame pyramids
//! - Masked Gaussian smoothing, gradients and frame means
//! - Bounding box and border distance analysis of masks
//! - The synthesis pyramid tying them together
//! - PNG I/O for inspecting layers
//!
//! # Example
//!
//! ```
//! use inpaint::synthesis::{ArrangeOptions, SynthesisPyramid};
//! use inpaint::{Frame, MASK_INVALID, MASK_VALID, Mask, PixelOrigin, Worker};
//!
//! let frame = Frame::filled(32, 24, &[128u8], PixelOrigin::UpperLeft).unwrap();
//! let mut mask = Mask::new_mask(32, 24, MASK_VALID, PixelOrigin::UpperLeft).unwrap();
//! for y in 8..16 {
//!     mask.row_mut(y)[10..20].fill(MASK_INVALID);
//! }
//!
//! let worker = Worker::with_threads(2).unwrap();
//! let mut pyramid = SynthesisPyramid::new();
//! pyramid
//!     .arrange(&frame, &mask, None, &ArrangeOptions::default(), Some(&worker))
//!     .unwrap();
//! assert!(pyramid.valid_layers() >= 2);
//! ```

// Re-export core types (primary data structures used everywhere)
pub use inpaint_core::*;

// Re-export domain crates as modules to avoid name conflicts
pub use inpaint_filter as filter;
pub use inpaint_io as io;
pub use inpaint_region as region;
pub use inpaint_synthesis as synthesis;
pub use inpaint_transform as transform;

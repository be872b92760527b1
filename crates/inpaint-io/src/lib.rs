//! inpaint-io - Frame I/O
//!
//! Reads and writes 8-bit frames and masks, mainly to inspect pyramid
//! layers. PNG support is enabled by the default `png-format` feature.
//!
//! # Examples
//!
//! ```
//! use inpaint_core::{Frame, PixelOrigin};
//! use inpaint_io::{read_png, write_png};
//! use std::io::Cursor;
//!
//! let frame = Frame::filled(4, 2, &[10u8, 20, 30], PixelOrigin::UpperLeft).unwrap();
//! let mut encoded = Vec::new();
//! write_png(frame.as_view(), &mut encoded).unwrap();
//! assert_eq!(read_png(Cursor::new(encoded)).unwrap(), frame);
//! ```

mod error;
#[cfg(feature = "png-format")]
mod png;

pub use error::{IoError, IoResult};
#[cfg(feature = "png-format")]
pub use self::png::{read_png, read_png_file, write_png, write_png_file};

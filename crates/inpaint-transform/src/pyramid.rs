//! FramePyramid - Multi-resolution frame layers
//!
//! Layer 0 is the finest layer; every further layer has half the width and
//! half the height (rounded down) of its predecessor. All layers are
//! allocated up front, while [`FramePyramid::valid_layers`] tells how many
//! of them hold meaningful content.

use crate::error::{TransformError, TransformResult};
use crate::shrinker::DownsamplingMode;
use inpaint_core::{Element, Frame, PixelOrigin, Worker};

/// Ordered frame layers, finest first
#[derive(Debug, Clone, PartialEq)]
pub struct FramePyramid<T: Element> {
    layers: Vec<Frame<T>>,
    valid_layers: usize,
}

impl<T: Element> FramePyramid<T> {
    /// Number of layers a `width x height` frame can be halved into while
    /// every layer keeps at least one pixel.
    ///
    /// Returns 0 for an empty frame.
    pub fn ideal_layers(width: u32, height: u32) -> usize {
        if width == 0 || height == 0 {
            return 0;
        }
        let mut layers = 1;
        let (mut width, mut height) = (width, height);
        while width >= 2 && height >= 2 {
            width /= 2;
            height /= 2;
            layers += 1;
        }
        layers
    }

    /// Allocate `layers` zeroed layers for a finest layer of
    /// `width x height`. No layer is valid yet.
    ///
    /// # Errors
    ///
    /// Fails if `layers` is zero or exceeds [`Self::ideal_layers`], or if
    /// allocation fails.
    pub fn new(
        width: u32,
        height: u32,
        channels: u32,
        layers: usize,
        origin: PixelOrigin,
    ) -> TransformResult<Self> {
        let ideal = Self::ideal_layers(width, height);
        if layers == 0 || layers > ideal {
            return Err(TransformError::InvalidParameters(format!(
                "{} layers requested for a {}x{} frame, at most {} possible",
                layers, width, height, ideal
            )));
        }

        let mut frames = Vec::new();
        frames
            .try_reserve_exact(layers)
            .map_err(|_| inpaint_core::Error::AllocationFailed)?;
        let (mut layer_width, mut layer_height) = (width, height);
        for _ in 0..layers {
            frames.push(Frame::new(layer_width, layer_height, channels, origin)?);
            layer_width /= 2;
            layer_height /= 2;
        }

        Ok(Self {
            layers: frames,
            valid_layers: 0,
        })
    }

    /// Number of allocated layers.
    #[inline]
    pub fn layers(&self) -> usize {
        self.layers.len()
    }

    /// Number of layers holding meaningful content.
    #[inline]
    pub fn valid_layers(&self) -> usize {
        self.valid_layers
    }

    /// Set the number of meaningful layers.
    ///
    /// # Errors
    ///
    /// Fails if `valid_layers` exceeds the allocated layers.
    pub fn set_valid_layers(&mut self, valid_layers: usize) -> TransformResult<()> {
        if valid_layers > self.layers.len() {
            return Err(TransformError::InvalidParameters(format!(
                "{} valid layers for a pyramid with {} layers",
                valid_layers,
                self.layers.len()
            )));
        }
        self.valid_layers = valid_layers;
        Ok(())
    }

    pub fn layer(&self, index: usize) -> Option<&Frame<T>> {
        self.layers.get(index)
    }

    pub fn layer_mut(&mut self, index: usize) -> Option<&mut Frame<T>> {
        self.layers.get_mut(index)
    }

    /// Finest layer.
    pub fn finest(&self) -> &Frame<T> {
        &self.layers[0]
    }

    /// Coarsest valid layer, if any layer is valid.
    pub fn coarsest_valid(&self) -> Option<&Frame<T>> {
        self.valid_layers
            .checked_sub(1)
            .and_then(|index| self.layers.get(index))
    }

    /// Borrow layer `index` for reading and layer `index + 1` for writing.
    pub fn finer_and_coarser_mut(&mut self, index: usize) -> Option<(&Frame<T>, &mut Frame<T>)> {
        if index + 1 >= self.layers.len() {
            return None;
        }
        let (finer, coarser) = self.layers.split_at_mut(index + 1);
        Some((&finer[index], &mut coarser[0]))
    }

    /// Valid layers, finest first.
    pub fn iter_valid(&self) -> impl Iterator<Item = &Frame<T>> {
        self.layers[..self.valid_layers].iter()
    }
}

impl FramePyramid<u8> {
    /// Build a pyramid from an 8-bit frame by repeated halving with `mode`.
    ///
    /// Creates `layers` layers, or as many as possible when `None`; all of
    /// them are valid.
    pub fn from_frame(
        frame: &Frame<u8>,
        layers: Option<usize>,
        mode: DownsamplingMode,
        worker: Option<&Worker>,
    ) -> TransformResult<Self> {
        let layers = layers.unwrap_or_else(|| Self::ideal_layers(frame.width(), frame.height()));
        let mut pyramid = Self::new(
            frame.width(),
            frame.height(),
            frame.channels(),
            layers,
            frame.origin(),
        )?;
        pyramid.layers[0].copy_from(frame.as_view())?;

        for index in 0..layers - 1 {
            if let Some((finer, coarser)) = pyramid.finer_and_coarser_mut(index) {
                mode.downsample(finer.as_view(), coarser.as_view_mut(), worker)?;
            }
        }

        pyramid.valid_layers = layers;
        Ok(pyramid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shrinker::{downsample_by_two_11, downsample_by_two_14641};

    #[test]
    fn test_ideal_layers() {
        assert_eq!(FramePyramid::<u8>::ideal_layers(1, 1), 1);
        assert_eq!(FramePyramid::<u8>::ideal_layers(2, 2), 2);
        assert_eq!(FramePyramid::<u8>::ideal_layers(8, 8), 4);
        assert_eq!(FramePyramid::<u8>::ideal_layers(640, 3), 2);
        assert_eq!(FramePyramid::<f32>::ideal_layers(0, 5), 0);
    }

    #[test]
    fn test_new_layer_sizes() {
        let pyramid = FramePyramid::<u8>::new(13, 9, 3, 4, PixelOrigin::UpperLeft).unwrap();
        assert_eq!(pyramid.layers(), 4);
        assert_eq!(pyramid.valid_layers(), 0);
        let sizes: Vec<(u32, u32)> = (0..4)
            .map(|i| {
                let layer = pyramid.layer(i).unwrap();
                (layer.width(), layer.height())
            })
            .collect();
        assert_eq!(sizes, vec![(13, 9), (6, 4), (3, 2), (1, 1)]);
        assert!(pyramid.coarsest_valid().is_none());
    }

    #[test]
    fn test_new_rejects_too_many_layers() {
        assert!(FramePyramid::<u8>::new(4, 4, 1, 4, PixelOrigin::UpperLeft).is_err());
        assert!(FramePyramid::<u8>::new(4, 4, 1, 0, PixelOrigin::UpperLeft).is_err());
    }

    #[test]
    fn test_set_valid_layers() {
        let mut pyramid = FramePyramid::<u8>::new(8, 8, 1, 3, PixelOrigin::UpperLeft).unwrap();
        pyramid.set_valid_layers(2).unwrap();
        assert_eq!(pyramid.coarsest_valid().unwrap().width(), 4);
        assert_eq!(pyramid.iter_valid().count(), 2);
        assert!(pyramid.set_valid_layers(4).is_err());
    }

    #[test]
    fn test_from_frame_constant() {
        let frame = Frame::filled(11, 7, &[40u8, 200], PixelOrigin::LowerLeft).unwrap();
        for mode in [DownsamplingMode::Filter11, DownsamplingMode::Filter14641] {
            let pyramid = FramePyramid::from_frame(&frame, None, mode, None).unwrap();
            assert_eq!(pyramid.layers(), 3);
            assert_eq!(pyramid.valid_layers(), 3);
            for layer in pyramid.iter_valid() {
                assert_eq!(layer.origin(), PixelOrigin::LowerLeft);
                assert!(layer.data().chunks(2).all(|p| p == [40, 200]));
            }
        }
    }

    #[test]
    fn test_from_frame_modes() {
        let data: Vec<u8> = (0..12 * 10).map(|v| (v * 53 % 256) as u8).collect();
        let frame = Frame::from_data(12, 10, 1, 0, PixelOrigin::UpperLeft, data).unwrap();
        let plain = FramePyramid::from_frame(&frame, Some(2), DownsamplingMode::Filter11, None);
        let smooth = FramePyramid::from_frame(&frame, Some(2), DownsamplingMode::Filter14641, None);
        let (plain, smooth) = (plain.unwrap(), smooth.unwrap());

        let mut expected = Frame::new(6, 5, 1, PixelOrigin::UpperLeft).unwrap();
        downsample_by_two_14641(frame.as_view(), expected.as_view_mut(), None).unwrap();
        assert_eq!(smooth.layer(1), Some(&expected));
        downsample_by_two_11(frame.as_view(), expected.as_view_mut(), None).unwrap();
        assert_eq!(plain.layer(1), Some(&expected));
        assert_ne!(plain.layer(1), smooth.layer(1));
    }
}

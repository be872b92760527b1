//! SynthesisPyramid - Frame, mask and filter layers prepared for inpainting
//!
//! [`SynthesisPyramid::arrange`] builds the layers in this order:
//!
//! 1. Validate frame, mask and optional filter mask
//! 2. Allocate the ideal number of layers and copy layer 0
//! 3. Halve frame and mask layer by layer (the filter mask in lockstep)
//!    until a layer holds no masked pixel
//! 4. Detect the mask bounding box of every valid layer, coarsest first,
//!    using the upscaled coarser box as hint
//! 5. Smooth the frame layers with a masked 3x3 Gaussian working on a
//!    copy of the mask
//! 6. Replace every valid mask layer by its border distance labels

use crate::error::{SynthesisError, SynthesisResult};
use inpaint_core::{
    Frame, MASK_INVALID, MASK_VALID, Mask, PixelBoundingBox, Worker, validate_frame_mask,
};
use inpaint_filter::gaussian_masked_in_place;
use inpaint_region::{
    MAX_DISTANCE_ITERATIONS, detect_bounding_box, detect_bounding_box_with_hint,
    determine_distances_to_border, has_mask_pixel,
};
use inpaint_transform::{
    DEFAULT_BINARY_MASK_THRESHOLD, FramePyramid, divide_by_two, downsample_binary_mask_by_two,
};

/// Filter size of the layer smoothing.
const SMOOTHING_FILTER_SIZE: u32 = 3;

/// Lifecycle of a [`SynthesisPyramid`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PyramidState {
    /// Nothing arranged, or the last arrangement failed
    #[default]
    Empty,
    /// `arrange` is running
    Arranging,
    /// Layers are ready to be read
    Arranged,
}

/// Options for [`SynthesisPyramid::arrange`]
#[derive(Debug, Clone, PartialEq)]
pub struct ArrangeOptions {
    /// Smooth every valid layer except the coarsest one
    pub smooth_layers: bool,
    /// Smooth the coarsest valid layer too
    pub smooth_coarsest_layer: bool,
    /// Fill fully masked 2x2 blocks with their plain average while halving
    pub handle_full_mask_pixel: bool,
    /// Border distance labels written into the mask layers, in `[1, 254]`
    pub border_distance_iterations: u32,
    /// Threshold for halving the filter mask, in `[0, 1020]`
    pub filter_threshold: u32,
    /// Accept a mask that vanishes in the first coarser layer, keeping
    /// only layer 0
    pub allow_single_layer: bool,
    /// Accelerate bounding box detection with the coarser layer's box
    pub use_bounding_box_hint: bool,
}

impl Default for ArrangeOptions {
    fn default() -> Self {
        Self {
            smooth_layers: true,
            smooth_coarsest_layer: false,
            handle_full_mask_pixel: false,
            border_distance_iterations: 3,
            filter_threshold: DEFAULT_BINARY_MASK_THRESHOLD,
            allow_single_layer: false,
            use_bounding_box_hint: true,
        }
    }
}

impl ArrangeOptions {
    /// Create options with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_smoothing(mut self, layers: bool, coarsest_layer: bool) -> Self {
        self.smooth_layers = layers;
        self.smooth_coarsest_layer = coarsest_layer;
        self
    }

    pub fn with_handle_full_mask_pixel(mut self, handle: bool) -> Self {
        self.handle_full_mask_pixel = handle;
        self
    }

    pub fn with_border_distance_iterations(mut self, iterations: u32) -> Self {
        self.border_distance_iterations = iterations;
        self
    }

    pub fn with_filter_threshold(mut self, threshold: u32) -> Self {
        self.filter_threshold = threshold;
        self
    }

    pub fn with_allow_single_layer(mut self, allow: bool) -> Self {
        self.allow_single_layer = allow;
        self
    }

    pub fn with_bounding_box_hint(mut self, use_hint: bool) -> Self {
        self.use_bounding_box_hint = use_hint;
        self
    }

    fn validate(&self) -> SynthesisResult<()> {
        if self.border_distance_iterations == 0
            || self.border_distance_iterations > MAX_DISTANCE_ITERATIONS
        {
            return Err(SynthesisError::InvalidOptions(format!(
                "border distance iterations must be in [1, {}], got {}",
                MAX_DISTANCE_ITERATIONS, self.border_distance_iterations
            )));
        }
        if self.filter_threshold > 4 * 255 {
            return Err(SynthesisError::InvalidOptions(format!(
                "filter threshold must be in [0, 1020], got {}",
                self.filter_threshold
            )));
        }
        Ok(())
    }
}

/// Frame, mask and optional filter pyramids sharing their valid layers
///
/// After a successful [`arrange`](Self::arrange) the mask layers hold
/// border distance labels instead of the binary mask: `0xFF` for pixels
/// outside the hole, `1..=iterations` for masked pixels within that
/// distance of the hole border and `0x00` for masked pixels farther
/// inside.
#[derive(Debug, Default)]
pub struct SynthesisPyramid {
    frames: Option<FramePyramid<u8>>,
    masks: Option<FramePyramid<u8>>,
    filters: Option<FramePyramid<u8>>,
    bounding_boxes: Vec<PixelBoundingBox>,
    state: PyramidState,
}

impl SynthesisPyramid {
    /// Create an empty pyramid
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PyramidState {
        self.state
    }

    pub fn is_arranged(&self) -> bool {
        self.state == PyramidState::Arranged
    }

    /// Number of arranged layers, 0 unless arranged.
    pub fn valid_layers(&self) -> usize {
        match (&self.frames, self.state) {
            (Some(frames), PyramidState::Arranged) => frames.valid_layers(),
            _ => 0,
        }
    }

    /// Number of allocated layers.
    pub fn layers(&self) -> usize {
        self.frames.as_ref().map_or(0, |frames| frames.layers())
    }

    /// Frame of valid layer `index`.
    pub fn frame_layer(&self, index: usize) -> Option<&Frame<u8>> {
        self.valid_layer(self.frames.as_ref(), index)
    }

    /// Border distance labels of valid layer `index`.
    pub fn mask_layer(&self, index: usize) -> Option<&Mask> {
        self.valid_layer(self.masks.as_ref(), index)
    }

    /// Filter mask of valid layer `index`, if a filter was arranged.
    pub fn filter_layer(&self, index: usize) -> Option<&Mask> {
        self.valid_layer(self.filters.as_ref(), index)
    }

    /// Bounding box of the masked pixels in valid layer `index`.
    pub fn bounding_box(&self, index: usize) -> Option<&PixelBoundingBox> {
        if !self.is_arranged() {
            return None;
        }
        self.bounding_boxes.get(index)
    }

    pub fn frame_pyramid(&self) -> Option<&FramePyramid<u8>> {
        self.frames.as_ref().filter(|_| self.is_arranged())
    }

    fn valid_layer<'a>(
        &self,
        pyramid: Option<&'a FramePyramid<u8>>,
        index: usize,
    ) -> Option<&'a Frame<u8>> {
        if index >= self.valid_layers() {
            return None;
        }
        pyramid.and_then(|pyramid| pyramid.layer(index))
    }

    /// Release all layers and return to [`PyramidState::Empty`].
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Build all layers from `frame` and its binary `mask`.
    ///
    /// `filter` is an optional binary mask on the same grid marking pixels
    /// eligible as inpainting sources; it is halved alongside the mask.
    ///
    /// # Errors
    ///
    /// - [`SynthesisError::AlreadyArranged`] if called twice without
    ///   [`reset`](Self::reset)
    /// - [`SynthesisError::NothingToInpaint`] if `mask` has no masked pixel
    /// - [`SynthesisError::MaskVanishesAtFirstLayer`] if the first halving
    ///   removes every masked pixel and single layers are not allowed
    /// - [`SynthesisError::FrameTooSmall`] for frames below 2x2 pixels
    /// - Any error of the validation or of the layer kernels
    ///
    /// The pyramid is [`PyramidState::Empty`] after every failure.
    pub fn arrange(
        &mut self,
        frame: &Frame<u8>,
        mask: &Mask,
        filter: Option<&Mask>,
        options: &ArrangeOptions,
        worker: Option<&Worker>,
    ) -> SynthesisResult<()> {
        if self.state == PyramidState::Arranged {
            return Err(SynthesisError::AlreadyArranged);
        }
        self.state = PyramidState::Arranging;

        match self.arrange_layers(frame, mask, filter, options, worker) {
            Ok(()) => {
                self.state = PyramidState::Arranged;
                log::debug!(
                    "arranged {} of {} layers for {}x{} frame",
                    self.valid_layers(),
                    self.layers(),
                    frame.width(),
                    frame.height()
                );
                Ok(())
            }
            Err(err) => {
                log::debug!("arrangement failed: {}", err);
                self.reset();
                Err(err)
            }
        }
    }

    fn arrange_layers(
        &mut self,
        frame: &Frame<u8>,
        mask: &Mask,
        filter: Option<&Mask>,
        options: &ArrangeOptions,
        worker: Option<&Worker>,
    ) -> SynthesisResult<()> {
        options.validate()?;
        validate_frame_mask(frame.as_view(), mask.as_view())?;
        if let Some(filter) = filter {
            validate_frame_mask(frame.as_view(), filter.as_view())?;
        }
        if !has_mask_pixel(mask.as_view(), MASK_VALID) {
            return Err(SynthesisError::NothingToInpaint);
        }

        let (width, height) = (frame.width(), frame.height());
        let layers = FramePyramid::<u8>::ideal_layers(width, height);
        if layers < 2 {
            return Err(SynthesisError::FrameTooSmall { width, height });
        }

        let (channels, origin) = (frame.channels(), frame.origin());
        let mut frames = FramePyramid::new(width, height, channels, layers, origin)?;
        let mut masks = FramePyramid::new(width, height, 1, layers, origin)?;
        let mut filters = match filter {
            Some(_) => Some(FramePyramid::new(width, height, 1, layers, origin)?),
            None => None,
        };

        copy_finest(&mut frames, frame)?;
        copy_finest(&mut masks, mask)?;
        if let (Some(filters), Some(filter)) = (filters.as_mut(), filter) {
            copy_finest(filters, filter)?;
        }

        let valid_layers =
            halve_layers(&mut frames, &mut masks, filters.as_mut(), options, worker)?;
        frames.set_valid_layers(valid_layers)?;
        masks.set_valid_layers(valid_layers)?;
        if let Some(filters) = filters.as_mut() {
            filters.set_valid_layers(valid_layers)?;
        }

        let bounding_boxes = detect_bounding_boxes(&masks, options.use_bounding_box_hint);
        smooth_layers(&mut frames, &masks, options, worker)?;

        for (index, bbox) in bounding_boxes.iter().enumerate() {
            if let Some(layer) = masks.layer_mut(index) {
                determine_distances_to_border(
                    layer.as_view_mut(),
                    options.border_distance_iterations,
                    false,
                    Some(bbox),
                    worker,
                )?;
            }
        }

        self.frames = Some(frames);
        self.masks = Some(masks);
        self.filters = filters;
        self.bounding_boxes = bounding_boxes;
        Ok(())
    }
}

fn copy_finest(pyramid: &mut FramePyramid<u8>, source: &Frame<u8>) -> SynthesisResult<()> {
    if let Some(layer) = pyramid.layer_mut(0) {
        layer.copy_from(source.as_view())?;
    }
    Ok(())
}

/// Halve until a mask layer is free of masked pixels; returns the number
/// of layers still holding masked pixels.
fn halve_layers(
    frames: &mut FramePyramid<u8>,
    masks: &mut FramePyramid<u8>,
    mut filters: Option<&mut FramePyramid<u8>>,
    options: &ArrangeOptions,
    worker: Option<&Worker>,
) -> SynthesisResult<usize> {
    let mut valid_layers = 1;

    for index in 0..frames.layers() - 1 {
        let (Some((finer, coarser)), Some((finer_mask, coarser_mask))) = (
            frames.finer_and_coarser_mut(index),
            masks.finer_and_coarser_mut(index),
        ) else {
            break;
        };

        let has_pixel = divide_by_two(
            finer.as_view(),
            finer_mask.as_view(),
            coarser.as_view_mut(),
            coarser_mask.as_view_mut(),
            options.handle_full_mask_pixel,
            worker,
        )?;
        log::trace!(
            "layer {}: {}x{}, masked pixels left: {}",
            index + 1,
            coarser.width(),
            coarser.height(),
            has_pixel
        );

        if !has_pixel {
            if index == 0 && !options.allow_single_layer {
                return Err(SynthesisError::MaskVanishesAtFirstLayer);
            }
            break;
        }

        if let Some((finer_filter, coarser_filter)) = filters
            .as_deref_mut()
            .and_then(|filters| filters.finer_and_coarser_mut(index))
        {
            downsample_binary_mask_by_two(
                finer_filter.as_view(),
                coarser_filter.as_view_mut(),
                options.filter_threshold,
                worker,
            )?;
        }

        valid_layers = index + 2;
    }

    Ok(valid_layers)
}

/// Bounding boxes of the masked pixels, coarsest layer first.
///
/// A masked coarser pixel requires its whole source block to be masked,
/// so the upscaled coarser box lies inside the finer one.
fn detect_bounding_boxes(masks: &FramePyramid<u8>, use_hint: bool) -> Vec<PixelBoundingBox> {
    let mut boxes = vec![PixelBoundingBox::empty(); masks.valid_layers()];
    let mut hint = PixelBoundingBox::empty();

    for (index, bbox) in boxes.iter_mut().enumerate().rev() {
        let Some(layer) = masks.layer(index) else {
            continue;
        };
        *bbox = if use_hint && hint.is_valid() {
            detect_bounding_box_with_hint(layer.as_view(), MASK_VALID, &hint)
        } else {
            detect_bounding_box(layer.as_view(), MASK_VALID)
        };
        log::trace!("layer {} bounding box {}", index, bbox);
        hint = bbox.upscaled_by_two();
    }

    boxes
}

fn smooth_layers(
    frames: &mut FramePyramid<u8>,
    masks: &FramePyramid<u8>,
    options: &ArrangeOptions,
    worker: Option<&Worker>,
) -> SynthesisResult<()> {
    let coarsest = frames.valid_layers().saturating_sub(1);

    for index in 0..frames.valid_layers() {
        let smooth = if index == coarsest {
            options.smooth_coarsest_layer
        } else {
            options.smooth_layers
        };
        let (Some(frame), Some(mask)) = (frames.layer_mut(index), masks.layer(index)) else {
            continue;
        };
        if !smooth {
            continue;
        }
        let half = SMOOTHING_FILTER_SIZE / 2;
        if frame.width() <= half || frame.height() <= half {
            log::trace!("layer {} too small for smoothing", index);
            continue;
        }

        let mut mask = mask.clone();
        gaussian_masked_in_place(
            frame,
            &mut mask,
            SMOOTHING_FILTER_SIZE,
            MASK_INVALID,
            worker,
        )?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use inpaint_core::PixelOrigin;

    /// 8x8 frame of 100 with the central 4x4 block masked.
    fn centered_hole() -> (Frame<u8>, Mask) {
        let frame = Frame::filled(8, 8, &[100u8], PixelOrigin::UpperLeft).unwrap();
        let mut mask = Mask::new_mask(8, 8, MASK_VALID, PixelOrigin::UpperLeft).unwrap();
        for y in 2..6 {
            for x in 2..6 {
                mask.pixel_mut(x, y)[0] = MASK_INVALID;
            }
        }
        (frame, mask)
    }

    #[test]
    fn test_arrange_centered_hole() {
        let (frame, mask) = centered_hole();
        let mut pyramid = SynthesisPyramid::new();
        pyramid
            .arrange(&frame, &mask, None, &ArrangeOptions::default(), None)
            .unwrap();

        assert_eq!(pyramid.state(), PyramidState::Arranged);
        assert_eq!(pyramid.layers(), 4);
        assert_eq!(pyramid.valid_layers(), 2);

        let bbox = pyramid.bounding_box(0).unwrap();
        assert_eq!(
            (bbox.left(), bbox.top(), bbox.right(), bbox.bottom()),
            (2, 2, 5, 5)
        );
        let bbox = pyramid.bounding_box(1).unwrap();
        assert_eq!(
            (bbox.left(), bbox.top(), bbox.right(), bbox.bottom()),
            (1, 1, 2, 2)
        );

        let labels = pyramid.mask_layer(0).unwrap();
        assert_eq!(labels.row(2), &[0xFF, 0xFF, 1, 1, 1, 1, 0xFF, 0xFF]);
        assert_eq!(labels.row(3), &[0xFF, 0xFF, 1, 2, 2, 1, 0xFF, 0xFF]);
        let labels = pyramid.mask_layer(1).unwrap();
        assert_eq!(labels.row(1), &[0xFF, 1, 1, 0xFF]);

        // Fully masked blocks keep the zeroed layer content
        let coarse = pyramid.frame_layer(1).unwrap();
        assert_eq!(coarse.pixel(1, 1), &[0]);
        assert_eq!(coarse.pixel(0, 0), &[100]);
        assert_eq!(pyramid.frame_layer(0).unwrap().pixel(0, 0), &[100]);

        assert!(pyramid.frame_layer(2).is_none());
        assert!(pyramid.filter_layer(0).is_none());
    }

    #[test]
    fn test_handle_full_mask_pixel() {
        let (frame, mask) = centered_hole();
        let mut pyramid = SynthesisPyramid::new();
        let options = ArrangeOptions::new()
            .with_handle_full_mask_pixel(true)
            .with_smoothing(false, false);
        pyramid
            .arrange(&frame, &mask, None, &options, None)
            .unwrap();
        assert_eq!(pyramid.frame_layer(1).unwrap().pixel(1, 1), &[100]);
        assert_eq!(pyramid.mask_layer(1).unwrap().pixel(1, 1), &[1]);
    }

    #[test]
    fn test_arrange_with_filter() {
        let (frame, mask) = centered_hole();
        let filter = Mask::new_mask(8, 8, MASK_VALID, PixelOrigin::UpperLeft).unwrap();
        let mut pyramid = SynthesisPyramid::new();
        pyramid
            .arrange(
                &frame,
                &mask,
                Some(&filter),
                &ArrangeOptions::default(),
                None,
            )
            .unwrap();
        let layer = pyramid.filter_layer(1).unwrap();
        assert_eq!((layer.width(), layer.height()), (4, 4));
        assert!(layer.data().iter().all(|&v| v == MASK_VALID));
    }

    #[test]
    fn test_nothing_to_inpaint() {
        let frame = Frame::filled(8, 8, &[1u8], PixelOrigin::UpperLeft).unwrap();
        let mask = Mask::new_mask(8, 8, MASK_VALID, PixelOrigin::UpperLeft).unwrap();
        let mut pyramid = SynthesisPyramid::new();
        assert!(matches!(
            pyramid.arrange(&frame, &mask, None, &ArrangeOptions::default(), None),
            Err(SynthesisError::NothingToInpaint)
        ));
        assert_eq!(pyramid.state(), PyramidState::Empty);
        assert_eq!(pyramid.valid_layers(), 0);
    }

    #[test]
    fn test_mask_vanishing_at_first_layer() {
        let frame = Frame::filled(8, 8, &[1u8], PixelOrigin::UpperLeft).unwrap();
        let mut mask = Mask::new_mask(8, 8, MASK_VALID, PixelOrigin::UpperLeft).unwrap();
        mask.pixel_mut(3, 4)[0] = MASK_INVALID;

        let mut pyramid = SynthesisPyramid::new();
        assert!(matches!(
            pyramid.arrange(&frame, &mask, None, &ArrangeOptions::default(), None),
            Err(SynthesisError::MaskVanishesAtFirstLayer)
        ));

        let options = ArrangeOptions::new().with_allow_single_layer(true);
        pyramid
            .arrange(&frame, &mask, None, &options, None)
            .unwrap();
        assert_eq!(pyramid.valid_layers(), 1);
        assert_eq!(pyramid.mask_layer(0).unwrap().pixel(3, 4), &[1]);
    }

    #[test]
    fn test_arrange_twice_and_reset() {
        let (frame, mask) = centered_hole();
        let mut pyramid = SynthesisPyramid::new();
        let options = ArrangeOptions::default();
        pyramid
            .arrange(&frame, &mask, None, &options, None)
            .unwrap();
        assert!(matches!(
            pyramid.arrange(&frame, &mask, None, &options, None),
            Err(SynthesisError::AlreadyArranged)
        ));
        assert!(pyramid.is_arranged());

        pyramid.reset();
        assert_eq!(pyramid.state(), PyramidState::Empty);
        assert_eq!(pyramid.layers(), 0);
        pyramid
            .arrange(&frame, &mask, None, &options, None)
            .unwrap();
        assert_eq!(pyramid.valid_layers(), 2);
    }

    #[test]
    fn test_invalid_inputs() {
        let (frame, mask) = centered_hole();
        let mut pyramid = SynthesisPyramid::new();

        let wrong = Mask::new_mask(8, 7, MASK_VALID, PixelOrigin::UpperLeft).unwrap();
        assert!(matches!(
            pyramid.arrange(&frame, &wrong, None, &ArrangeOptions::default(), None),
            Err(SynthesisError::Core(_))
        ));

        let options = ArrangeOptions::new().with_border_distance_iterations(0);
        assert!(matches!(
            pyramid.arrange(&frame, &mask, None, &options, None),
            Err(SynthesisError::InvalidOptions(_))
        ));

        let tiny = Frame::filled(1, 3, &[0u8], PixelOrigin::UpperLeft).unwrap();
        let tiny_mask = Mask::new_mask(1, 3, MASK_INVALID, PixelOrigin::UpperLeft).unwrap();
        assert!(matches!(
            pyramid.arrange(&tiny, &tiny_mask, None, &ArrangeOptions::default(), None),
            Err(SynthesisError::FrameTooSmall { .. })
        ));
    }
}

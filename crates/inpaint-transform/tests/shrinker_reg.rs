//! Shrinker regression test
//!
//! Compares the mask-aware, the plain and the 1-4-6-4-1 halving against
//! per-pixel reference computations over random frames, every supported
//! channel count and odd/even sizes, with and without a worker.

use inpaint_core::{Frame, FrameView, MASK_INVALID, MASK_VALID, Mask, PixelOrigin, Worker};
use inpaint_test::{RegParams, random_frame, random_mask, seeded_rng};
use inpaint_transform::{
    DEFAULT_BINARY_MASK_THRESHOLD, DownsamplingMode, FramePyramid, divide_by_two,
    downsample_binary_mask_by_two, downsample_by_two_11, downsample_by_two_14641,
};

const SIZES: [(u32, u32); 8] = [
    (2, 2),
    (3, 3),
    (5, 4),
    (4, 5),
    (7, 9),
    (16, 11),
    (33, 17),
    (64, 48),
];

const UNTOUCHED: u8 = 77;

const WEIGHTS_14641: [u32; 5] = [1, 4, 6, 4, 1];

/// Source columns (or rows) covered by target index `t` along an axis of
/// `size` source pixels.
fn block_range(size: u32, t: u32) -> std::ops::Range<u32> {
    let extent = if !size.is_multiple_of(2) && t == size / 2 - 1 {
        3
    } else {
        2
    };
    2 * t..2 * t + extent
}

/// Weight of a source pixel in a block with `[1 2 1]` borders.
fn weight(extent: u32, offset: u32) -> u32 {
    if extent == 3 && offset == 1 { 2 } else { 1 }
}

/// Location of `position` along an axis of `size` pixels, mirrored at both
/// borders.
fn mirror(position: i64, size: u32) -> u32 {
    let size = size as i64;
    let position = if position < 0 { -position - 1 } else { position };
    if position >= size {
        (2 * size - position - 1) as u32
    } else {
        position as u32
    }
}

/// Straightforward mask-aware halving of one target pixel.
fn reference_pixel(
    source: FrameView<'_, u8>,
    mask: FrameView<'_, u8>,
    x: u32,
    y: u32,
    handle_full_mask_pixel: bool,
) -> (Option<Vec<u8>>, u8) {
    let channels = source.channels() as usize;
    let mut sums = vec![0u32; channels];
    let mut all = vec![0u32; channels];
    let mut valid = 0u32;
    let mut candidates = 0u32;

    for sy in block_range(source.height(), y) {
        for sx in block_range(source.width(), x) {
            let pixel = source.pixel(sx, sy);
            candidates += 1;
            for c in 0..channels {
                all[c] += pixel[c] as u32;
            }
            if mask.pixel(sx, sy)[0] == MASK_VALID {
                valid += 1;
                for c in 0..channels {
                    sums[c] += pixel[c] as u32;
                }
            }
        }
    }

    if valid > 0 {
        let values = sums
            .iter()
            .map(|&s| ((s + valid / 2) / valid) as u8)
            .collect();
        (Some(values), MASK_VALID)
    } else if handle_full_mask_pixel {
        let values = all
            .iter()
            .map(|&s| ((s + candidates / 2) / candidates) as u8)
            .collect();
        (Some(values), MASK_INVALID)
    } else {
        (None, MASK_INVALID)
    }
}

fn reference_divide_by_two(
    source: &Frame<u8>,
    mask: &Mask,
    handle_full_mask_pixel: bool,
) -> (Frame<u8>, Mask) {
    let width = source.width() / 2;
    let height = source.height() / 2;
    let untouched = vec![UNTOUCHED; source.channels() as usize];
    let mut target = Frame::filled(width, height, &untouched, source.origin()).unwrap();
    let mut target_mask = Mask::new_mask(width, height, MASK_VALID, source.origin()).unwrap();
    let (source, mask) = (source.as_view(), mask.as_view());
    for y in 0..height {
        for x in 0..width {
            let (values, mask_value) = reference_pixel(source, mask, x, y, handle_full_mask_pixel);
            if let Some(values) = values {
                target.pixel_mut(x, y).copy_from_slice(&values);
            }
            target_mask.pixel_mut(x, y)[0] = mask_value;
        }
    }
    (target, target_mask)
}

fn run_divide_by_two(
    source: &Frame<u8>,
    mask: &Mask,
    handle_full_mask_pixel: bool,
    worker: Option<&Worker>,
) -> (Frame<u8>, Mask, bool) {
    let width = source.width() / 2;
    let height = source.height() / 2;
    let untouched = vec![UNTOUCHED; source.channels() as usize];
    let mut target = Frame::filled(width, height, &untouched, source.origin()).unwrap();
    let mut target_mask = Mask::new(width, height, 1, source.origin()).unwrap();
    let has_invalid = divide_by_two(
        source.as_view(),
        mask.as_view(),
        target.as_view_mut(),
        target_mask.as_view_mut(),
        handle_full_mask_pixel,
        worker,
    )
    .expect("divide_by_two");
    (target, target_mask, has_invalid)
}

#[test]
fn shrinker_reg() {
    let mut rp = RegParams::new("shrinker");
    let worker = Worker::with_threads(3).expect("worker");
    let mut rng = seeded_rng(2024);
    let origin = PixelOrigin::UpperLeft;

    // --- Test 1: Mask-aware halving matches the reference ---
    for &(width, height) in &SIZES {
        for channels in 1..=4 {
            for (ratio, padding) in [(0.3, 0), (0.8, 3)] {
                let source =
                    random_frame(&mut rng, width, height, channels, padding, origin).unwrap();
                let mask = random_mask(&mut rng, width, height, ratio, origin).unwrap();

                for handle in [false, true] {
                    let (expected, expected_mask) = reference_divide_by_two(&source, &mask, handle);
                    let expected_invalid = expected_mask.data().contains(&MASK_INVALID);

                    for worker in [None, Some(&worker)] {
                        let (target, target_mask, has_invalid) =
                            run_divide_by_two(&source, &mask, handle, worker);
                        rp.compare_frames(expected.as_view(), target.as_view());
                        rp.compare_frames(expected_mask.as_view(), target_mask.as_view());
                        rp.compare_values(
                            expected_invalid as u8 as f64,
                            has_invalid as u8 as f64,
                            0.0,
                        );
                    }
                }
            }
        }
    }

    // --- Test 2: A single valid pixel determines its block ---
    for channels in 1..=4u32 {
        let values: Vec<u8> = (0..channels).map(|c| 40 + 50 * c as u8).collect();
        let mut source =
            Frame::filled(2, 2, &[200; 4][..channels as usize], PixelOrigin::UpperLeft).unwrap();
        source.pixel_mut(1, 1).copy_from_slice(&values);
        let mut mask = Mask::new_mask(2, 2, MASK_INVALID, origin).unwrap();
        mask.pixel_mut(1, 1)[0] = MASK_VALID;

        let (target, target_mask, has_invalid) = run_divide_by_two(&source, &mask, false, None);
        rp.compare_data(&values, target.pixel(0, 0));
        rp.compare_values(MASK_VALID as f64, target_mask.pixel(0, 0)[0] as f64, 0.0);
        rp.compare_values(0.0, has_invalid as u8 as f64, 0.0);
    }

    // --- Test 3: Binary mask halving matches the weighted threshold ---
    for &(width, height) in &SIZES {
        let mask = random_mask(&mut rng, width, height, 0.5, origin).unwrap();
        for threshold in [0, 255, DEFAULT_BINARY_MASK_THRESHOLD, 1020] {
            let mut expected = Mask::new(width / 2, height / 2, 1, origin).unwrap();
            for y in 0..height / 2 {
                for x in 0..width / 2 {
                    let rows = block_range(height, y);
                    let cols = block_range(width, x);
                    let scale = (cols.len() as u32 - 1) * (rows.len() as u32 - 1);
                    let mut sum = 0;
                    for sy in rows.clone() {
                        for sx in cols.clone() {
                            sum += mask.pixel(sx, sy)[0] as u32
                                * weight(cols.len() as u32, sx - cols.start)
                                * weight(rows.len() as u32, sy - rows.start);
                        }
                    }
                    expected.pixel_mut(x, y)[0] = if sum >= threshold * scale {
                        MASK_VALID
                    } else {
                        MASK_INVALID
                    };
                }
            }

            for worker in [None, Some(&worker)] {
                let mut target = Mask::new(width / 2, height / 2, 1, origin).unwrap();
                let view = mask.as_view();
                downsample_binary_mask_by_two(view, target.as_view_mut(), threshold, worker)
                    .expect("downsample_binary_mask_by_two");
                rp.compare_frames(expected.as_view(), target.as_view());
            }
        }
    }

    // --- Test 4: Plain halving uses 1-2-1 weights at odd borders ---
    for &(width, height) in &SIZES {
        let channels = 1 + (width % 4);
        let source =
            random_frame(&mut rng, width, height, channels, 1, PixelOrigin::LowerLeft).unwrap();
        let mut expected =
            Frame::new(width / 2, height / 2, channels, PixelOrigin::LowerLeft).unwrap();
        for y in 0..height / 2 {
            for x in 0..width / 2 {
                let rows = block_range(height, y);
                let cols = block_range(width, x);
                for c in 0..channels as usize {
                    let mut sum = 0u32;
                    let mut total = 0u32;
                    for sy in rows.clone() {
                        for sx in cols.clone() {
                            let w = weight(cols.len() as u32, sx - cols.start)
                                * weight(rows.len() as u32, sy - rows.start);
                            sum += source.pixel(sx, sy)[c] as u32 * w;
                            total += w;
                        }
                    }
                    expected.pixel_mut(x, y)[c] = ((sum + total / 2) / total) as u8;
                }
            }
        }

        let mut target =
            Frame::new(width / 2, height / 2, channels, PixelOrigin::LowerLeft).unwrap();
        downsample_by_two_11(source.as_view(), target.as_view_mut(), Some(&worker))
            .expect("downsample_by_two_11");
        rp.compare_frames(expected.as_view(), target.as_view());
    }

    // --- Test 5: 1-4-6-4-1 halving mirrors the frame at its borders ---
    for &(width, height) in &SIZES {
        let channels = 1 + (height % 4);
        let source = random_frame(&mut rng, width, height, channels, 2, origin).unwrap();
        let mut expected = Frame::new(width / 2, height / 2, channels, origin).unwrap();
        for y in 0..height / 2 {
            for x in 0..width / 2 {
                for c in 0..channels as usize {
                    let mut sum = 0u32;
                    for (j, &wy) in WEIGHTS_14641.iter().enumerate() {
                        let sy = mirror(2 * y as i64 + j as i64 - 2, height);
                        for (i, &wx) in WEIGHTS_14641.iter().enumerate() {
                            let sx = mirror(2 * x as i64 + i as i64 - 2, width);
                            sum += wx * wy * source.pixel(sx, sy)[c] as u32;
                        }
                    }
                    expected.pixel_mut(x, y)[c] = ((sum + 128) / 256) as u8;
                }
            }
        }

        for worker in [None, Some(&worker)] {
            let mut target = Frame::new(width / 2, height / 2, channels, origin).unwrap();
            downsample_by_two_14641(source.as_view(), target.as_view_mut(), worker)
                .expect("downsample_by_two_14641");
            rp.compare_frames(expected.as_view(), target.as_view());
        }
    }

    // --- Test 6: Pyramid layers chain the selected halving ---
    let source = random_frame(&mut rng, 45, 30, 3, 0, origin).unwrap();
    for mode in [DownsamplingMode::Filter11, DownsamplingMode::Filter14641] {
        let pyramid =
            FramePyramid::from_frame(&source, None, mode, Some(&worker)).expect("from_frame");
        rp.compare_values(
            FramePyramid::<u8>::ideal_layers(45, 30) as f64,
            pyramid.layers() as f64,
            0.0,
        );
        rp.compare_values(pyramid.layers() as f64, pyramid.valid_layers() as f64, 0.0);
        rp.compare_frames(source.as_view(), pyramid.finest().as_view());
        for index in 1..pyramid.layers() {
            let finer = pyramid.layer(index - 1).unwrap();
            let coarser = pyramid.layer(index).unwrap();
            let mut expected =
                Frame::new(finer.width() / 2, finer.height() / 2, 3, origin).unwrap();
            mode.downsample(finer.as_view(), expected.as_view_mut(), None)
                .expect("halve layer");
            rp.compare_frames(expected.as_view(), coarser.as_view());
        }
        rp.write_frame_and_check(pyramid.layer(1).unwrap().as_view())
            .expect("write pyramid layer");
    }

    assert!(rp.cleanup(), "shrinker regression test failed");
}

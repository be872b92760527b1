//! PNG frame support
//!
//! Frames are stored as 8-bit grayscale, grayscale-alpha, RGB or RGBA
//! depending on their channel count. Reading expands palettes and low bit
//! depths and strips 16-bit samples, so every PNG loads as 8-bit frame.

use crate::{IoError, IoResult};
use inpaint_core::{Frame, FrameView, PixelOrigin};
use png::{BitDepth, ColorType, Decoder, Encoder, Transformations};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Seek, Write};
use std::path::Path;

fn channels_of(color_type: ColorType) -> IoResult<u32> {
    match color_type {
        ColorType::Grayscale => Ok(1),
        ColorType::GrayscaleAlpha => Ok(2),
        ColorType::Rgb => Ok(3),
        ColorType::Rgba => Ok(4),
        ColorType::Indexed => Err(IoError::UnsupportedFormat(
            "indexed PNG left unexpanded".to_string(),
        )),
    }
}

fn color_type_of(channels: u32) -> IoResult<ColorType> {
    match channels {
        1 => Ok(ColorType::Grayscale),
        2 => Ok(ColorType::GrayscaleAlpha),
        3 => Ok(ColorType::Rgb),
        4 => Ok(ColorType::Rgba),
        _ => Err(IoError::UnsupportedFormat(format!(
            "{} channels cannot be stored as PNG",
            channels
        ))),
    }
}

/// Read a PNG image into an upper-left origin frame
pub fn read_png<R: BufRead + Seek>(reader: R) -> IoResult<Frame<u8>> {
    let mut decoder = Decoder::new(reader);
    decoder.set_transformations(Transformations::normalize_to_color8());
    let mut reader = decoder
        .read_info()
        .map_err(|e| IoError::DecodeError(format!("PNG decode error: {}", e)))?;

    let (color_type, bit_depth) = reader.output_color_type();
    if bit_depth != BitDepth::Eight {
        return Err(IoError::UnsupportedFormat(format!(
            "unsupported PNG output depth: {:?}",
            bit_depth
        )));
    }
    let channels = channels_of(color_type)?;

    let buf_size = reader
        .output_buffer_size()
        .ok_or_else(|| IoError::DecodeError("failed to get output buffer size".to_string()))?;
    let mut buf = vec![0; buf_size];
    let output_info = reader
        .next_frame(&mut buf)
        .map_err(|e| IoError::DecodeError(format!("PNG frame error: {}", e)))?;

    let width = output_info.width;
    let height = output_info.height;
    let mut frame = Frame::new(width, height, channels, PixelOrigin::UpperLeft)?;
    let row_elements = frame.row_elements();
    for (y, line) in buf[..output_info.buffer_size()]
        .chunks(output_info.line_size)
        .take(height as usize)
        .enumerate()
    {
        let row = frame.row_mut(y as u32);
        row.copy_from_slice(&line[..row_elements]);
    }

    log::debug!("read {}x{} PNG with {} channels", width, height, channels);
    Ok(frame)
}

/// Write an 8-bit frame with 1 to 4 channels as PNG
///
/// Lower-left origin frames are flipped so the image appears upright.
pub fn write_png<W: Write>(frame: FrameView<'_, u8>, writer: W) -> IoResult<()> {
    let color_type = color_type_of(frame.channels())?;

    let mut encoder = Encoder::new(writer, frame.width(), frame.height());
    encoder.set_color(color_type);
    encoder.set_depth(BitDepth::Eight);
    let mut writer = encoder
        .write_header()
        .map_err(|e| IoError::EncodeError(format!("PNG header error: {}", e)))?;

    let row_elements = frame.width() as usize * frame.channels() as usize;
    let mut data = Vec::with_capacity(row_elements * frame.height() as usize);
    for y in 0..frame.height() {
        let y = match frame.origin() {
            PixelOrigin::UpperLeft => y,
            PixelOrigin::LowerLeft => frame.height() - 1 - y,
        };
        data.extend_from_slice(frame.row(y));
    }

    writer
        .write_image_data(&data)
        .map_err(|e| IoError::EncodeError(format!("PNG write error: {}", e)))?;
    writer
        .finish()
        .map_err(|e| IoError::EncodeError(format!("PNG finish error: {}", e)))?;
    Ok(())
}

/// Read a frame from a PNG file
pub fn read_png_file<P: AsRef<Path>>(path: P) -> IoResult<Frame<u8>> {
    let file = File::open(path.as_ref())?;
    read_png(BufReader::new(file))
}

/// Write a frame to a PNG file, replacing an existing file
pub fn write_png_file<P: AsRef<Path>>(frame: FrameView<'_, u8>, path: P) -> IoResult<()> {
    let file = File::create(path.as_ref())?;
    write_png(frame, BufWriter::new(file))?;
    log::debug!("wrote {}", path.as_ref().display());
    Ok(())
}

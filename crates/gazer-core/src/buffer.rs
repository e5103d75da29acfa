use crate::consts::TEXTURE_CHANNELS;
use crate::error::{GazerError, Result};

/// Sample layout of a decoded image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SampleFormat {
    /// 8-bit integer RGB.
    Rgb8,
    /// 16-bit integer RGB, native byte order.
    Rgb16,
    /// 32-bit float RGBA.
    RgbaF32,
}

impl SampleFormat {
    pub fn channels(&self) -> usize {
        match self {
            SampleFormat::Rgb8 | SampleFormat::Rgb16 => 3,
            SampleFormat::RgbaF32 => 4,
        }
    }

    pub fn bit_depth(&self) -> u8 {
        match self {
            SampleFormat::Rgb8 => 8,
            SampleFormat::Rgb16 => 16,
            SampleFormat::RgbaF32 => 32,
        }
    }
}

/// Interleaved pixel samples, row-major.
#[derive(Clone, Debug, PartialEq)]
pub enum PixelData {
    Rgb8(Vec<u8>),
    Rgb16(Vec<u16>),
    RgbaF32(Vec<f32>),
}

impl PixelData {
    pub fn format(&self) -> SampleFormat {
        match self {
            PixelData::Rgb8(_) => SampleFormat::Rgb8,
            PixelData::Rgb16(_) => SampleFormat::Rgb16,
            PixelData::RgbaF32(_) => SampleFormat::RgbaF32,
        }
    }

    /// Number of scalar samples (not pixels).
    pub fn len(&self) -> usize {
        match self {
            PixelData::Rgb8(v) => v.len(),
            PixelData::Rgb16(v) => v.len(),
            PixelData::RgbaF32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A decoded image, ready for texture upload.
///
/// Row 0 is the bottom row of the picture unless `flip_y` is set, in which
/// case row 0 is the top row and the renderer has to mirror it.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageBuffer {
    width: u32,
    height: u32,
    pixels: PixelData,
    /// Row order is top-first and must be mirrored for display.
    pub flip_y: bool,
}

impl ImageBuffer {
    /// Wrap decoded samples, checking that the sample count matches the
    /// dimensions.
    pub fn new(width: u32, height: u32, pixels: PixelData, flip_y: bool) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(GazerError::InvalidDimensions { width, height });
        }
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(pixels.format().channels()))
            .ok_or(GazerError::InvalidDimensions { width, height })?;
        if pixels.len() != expected {
            return Err(GazerError::Decode(format!(
                "{}x{} {:?} image needs {} samples, got {}",
                width,
                height,
                pixels.format(),
                expected,
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
            flip_y,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &PixelData {
        &self.pixels
    }

    pub fn sample_format(&self) -> SampleFormat {
        self.pixels.format()
    }

    pub fn bit_depth(&self) -> u8 {
        self.pixels.format().bit_depth()
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Normalise to linear RGBA floats in stored row order.
    /// Integer sources map full scale to 1.0 and get an opaque alpha.
    pub fn to_rgba_f32(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.pixel_count() * TEXTURE_CHANNELS);
        self.extend_rgba_f32(&mut out);
        out
    }

    /// Append the normalised RGBA samples to `out`, reusing its allocation.
    pub fn extend_rgba_f32(&self, out: &mut Vec<f32>) {
        out.reserve(self.pixel_count() * TEXTURE_CHANNELS);
        match &self.pixels {
            PixelData::Rgb8(v) => {
                for px in v.chunks_exact(3) {
                    out.extend_from_slice(&[
                        px[0] as f32 / 255.0,
                        px[1] as f32 / 255.0,
                        px[2] as f32 / 255.0,
                        1.0,
                    ]);
                }
            }
            PixelData::Rgb16(v) => {
                for px in v.chunks_exact(3) {
                    out.extend_from_slice(&[
                        px[0] as f32 / 65535.0,
                        px[1] as f32 / 65535.0,
                        px[2] as f32 / 65535.0,
                        1.0,
                    ]);
                }
            }
            PixelData::RgbaF32(v) => out.extend_from_slice(v),
        }
    }
}

/// Swap rows top-for-bottom in a row-major slice.
pub fn reverse_rows<T>(data: &mut [T], row_len: usize) {
    if row_len == 0 {
        return;
    }
    let rows = data.len() / row_len;
    for top in 0..rows / 2 {
        let bottom = rows - 1 - top;
        let (head, tail) = data.split_at_mut(bottom * row_len);
        head[top * row_len..(top + 1) * row_len].swap_with_slice(&mut tail[..row_len]);
    }
}

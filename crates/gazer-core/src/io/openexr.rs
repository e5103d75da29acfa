//! OpenEXR reader.
//!
//! Only the first RGBA layer is consumed; a layer holding just luminance
//! (`Y`, optionally `A`) is expanded to grey. The buffer is sized to the layer's
//! data window and keeps the file's top-to-bottom scanline order, so the
//! result is always flagged for a vertical flip.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::debug;

use crate::buffer::{ImageBuffer, PixelData};
use crate::consts::{EXR_EXTENSION, EXR_MAGIC, TEXTURE_CHANNELS};
use crate::error::{GazerError, Result};

use super::DecodeStrategy;

pub struct ExrDecoder;

impl ExrDecoder {
    /// Extension match is case-sensitive.
    pub fn claims(path: &Path) -> bool {
        path.extension().and_then(|e| e.to_str()) == Some(EXR_EXTENSION)
    }
}

impl DecodeStrategy for ExrDecoder {
    fn name(&self) -> &'static str {
        "openexr"
    }

    fn try_decode(&self, path: &Path) -> Result<Option<ImageBuffer>> {
        if !Self::claims(path) {
            return Ok(None);
        }
        read_exr(path).map(Some)
    }
}

/// Check the four-byte magic number without parsing the header.
pub fn is_openexr_file(path: &Path) -> Result<bool> {
    let mut magic = [0u8; 4];
    let mut file = File::open(path)?;
    match file.read_exact(&mut magic) {
        Ok(()) => Ok(magic == EXR_MAGIC),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e.into()),
    }
}

struct ExrPixels {
    width: usize,
    samples: Vec<f32>,
}

/// One decoded layer, already expanded to RGBA.
struct ExrLayer {
    width: usize,
    height: usize,
    origin: exr::math::Vec2<i32>,
    samples: Vec<f32>,
}

/// Read the first RGBA layer of an OpenEXR file into an RGBA float buffer.
/// Luminance-only files are expanded to grey RGB.
pub fn read_exr(path: &Path) -> Result<ImageBuffer> {
    if !is_openexr_file(path)? {
        return Err(GazerError::Format(format!(
            "{} is not an OpenEXR file",
            path.display()
        )));
    }

    let format_error = |e: exr::error::Error| GazerError::Format(format!("{}: {e}", path.display()));
    let layer = match read_rgba(path) {
        Ok(layer) => layer,
        Err(rgba_err) => match read_luminance(path).map_err(format_error)? {
            Some(layer) => layer,
            None => return Err(format_error(rgba_err)),
        },
    };

    let (width, height) = (layer.width as u32, layer.height as u32);
    debug!(
        path = %path.display(),
        min_x = layer.origin.x(),
        min_y = layer.origin.y(),
        max_x = layer.origin.x() + width as i32 - 1,
        max_y = layer.origin.y() + height as i32 - 1,
        "EXR data window"
    );

    ImageBuffer::new(width, height, PixelData::RgbaF32(layer.samples), true)
}

fn read_rgba(path: &Path) -> exr::error::Result<ExrLayer> {
    let image = exr::prelude::read_first_rgba_layer_from_file(
        path,
        |resolution, _channels| ExrPixels {
            width: resolution.width(),
            samples: vec![0.0; resolution.area() * TEXTURE_CHANNELS],
        },
        |pixels: &mut ExrPixels, position, (r, g, b, a): (f32, f32, f32, f32)| {
            let idx = (position.y() * pixels.width + position.x()) * TEXTURE_CHANNELS;
            pixels.samples[idx..idx + TEXTURE_CHANNELS].copy_from_slice(&[r, g, b, a]);
        },
    )?;

    let layer = image.layer_data;
    Ok(ExrLayer {
        width: layer.size.width(),
        height: layer.size.height(),
        origin: layer.attributes.layer_position,
        samples: layer.channel_data.pixels.samples,
    })
}

/// Fallback for files without R, G and B channels. Returns `None` when the
/// first layer has no full-resolution `Y` channel either.
fn read_luminance(path: &Path) -> exr::error::Result<Option<ExrLayer>> {
    use exr::prelude::*;

    let image = read()
        .no_deep_data()
        .largest_resolution_level()
        .all_channels()
        .first_valid_layer()
        .all_attributes()
        .from_file(path)?;

    let layer = image.layer_data;
    let pixel_count = layer.size.area();
    let channel = |name: &str| {
        layer
            .channel_data
            .list
            .iter()
            .find(|c| c.name.to_string() == name && c.sampling == Vec2(1, 1))
            .map(|c| flat_samples_f32(&c.sample_data))
            .filter(|values| values.len() == pixel_count)
    };
    let Some(luma) = channel("Y") else {
        return Ok(None);
    };
    let alpha = channel("A");

    let mut samples = Vec::with_capacity(pixel_count * TEXTURE_CHANNELS);
    for (i, y) in luma.iter().enumerate() {
        let a = alpha.as_ref().map_or(1.0, |a| a[i]);
        samples.extend_from_slice(&[*y, *y, *y, a]);
    }

    Ok(Some(ExrLayer {
        width: layer.size.width(),
        height: layer.size.height(),
        origin: layer.attributes.layer_position,
        samples,
    }))
}

fn flat_samples_f32(samples: &exr::prelude::FlatSamples) -> Vec<f32> {
    use exr::prelude::FlatSamples;
    match samples {
        FlatSamples::F16(v) => v.iter().map(|s| s.to_f32()).collect(),
        FlatSamples::F32(v) => v.clone(),
        FlatSamples::U32(v) => v.iter().map(|&s| s as f32).collect(),
    }
}

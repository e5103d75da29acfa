use std::path::Path;

use image::{DynamicImage, ImageReader};

use crate::buffer::{reverse_rows, ImageBuffer, PixelData};
use crate::error::{GazerError, Result};

use super::DecodeStrategy;

/// Generic bitmap formats (PNG, JPEG, TIFF, ...) via the `image` crate.
///
/// Rows are stored bottom-first so the result never needs a flip.
pub struct BitmapDecoder;

impl DecodeStrategy for BitmapDecoder {
    fn name(&self) -> &'static str {
        "bitmap"
    }

    fn try_decode(&self, path: &Path) -> Result<Option<ImageBuffer>> {
        let img = ImageReader::open(path)?
            .with_guessed_format()?
            .decode()
            .map_err(|e| GazerError::Decode(format!("{}: {e}", path.display())))?;
        from_dynamic(img).map(Some)
    }
}

/// Convert an already decoded image, keeping 16-bit and float precision.
pub fn from_dynamic(img: DynamicImage) -> Result<ImageBuffer> {
    let (width, height) = (img.width(), img.height());
    if width == 0 || height == 0 {
        return Err(GazerError::Decode("decoded image is empty".into()));
    }

    let pixels = match img {
        DynamicImage::ImageRgb32F(_) | DynamicImage::ImageRgba32F(_) => {
            let mut v = img.to_rgba32f().into_raw();
            reverse_rows(&mut v, width as usize * 4);
            PixelData::RgbaF32(v)
        }
        DynamicImage::ImageLuma16(_)
        | DynamicImage::ImageLumaA16(_)
        | DynamicImage::ImageRgb16(_)
        | DynamicImage::ImageRgba16(_) => {
            let mut v = img.to_rgb16().into_raw();
            reverse_rows(&mut v, width as usize * 3);
            PixelData::Rgb16(v)
        }
        _ => {
            let mut v = img.to_rgb8().into_raw();
            reverse_rows(&mut v, width as usize * 3);
            PixelData::Rgb8(v)
        }
    };

    ImageBuffer::new(width, height, pixels, false)
}

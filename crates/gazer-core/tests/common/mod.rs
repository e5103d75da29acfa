#![allow(dead_code)]

use std::path::{Path, PathBuf};

use gazer_core::buffer::{ImageBuffer, PixelData};
use gazer_core::config::{GazerConfig, RawDecoderConfig};
use gazer_core::controller::ViewerHost;

/// Raw decoder program name that is never installed.
pub const MISSING_DECODER: &str = "gazer-test-no-such-decoder";

/// Config whose raw decoder cannot be spawned, so tests never depend on a
/// locally installed tool.
pub fn config_without_raw_decoder() -> GazerConfig {
    let mut config = GazerConfig::default();
    config.raw_decoder.program = MISSING_DECODER.to_string();
    config
}

/// Write an 8-bit RGB PNG, whatever the extension says. Pixel (x, y) is
/// `f(x, y)` with y = 0 at the top.
pub fn write_png(path: &Path, width: u32, height: u32, f: impl Fn(u32, u32) -> [u8; 3]) {
    let img = image::RgbImage::from_fn(width, height, |x, y| image::Rgb(f(x, y)));
    img.save_with_format(path, image::ImageFormat::Png).unwrap();
}

/// Write a 16-bit RGB PNG.
pub fn write_png16(path: &Path, width: u32, height: u32, f: impl Fn(u32, u32) -> [u16; 3]) {
    let img = image::ImageBuffer::<image::Rgb<u16>, Vec<u16>>::from_fn(width, height, |x, y| {
        image::Rgb(f(x, y))
    });
    img.save_with_format(path, image::ImageFormat::Png).unwrap();
}

/// Write a single-layer RGBA OpenEXR file.
pub fn write_exr(path: &Path, width: usize, height: usize, f: impl Fn(usize, usize) -> [f32; 4] + Sync) {
    exr::prelude::write_rgba_file(path, width, height, |x, y| {
        let [r, g, b, a] = f(x, y);
        (r, g, b, a)
    })
    .unwrap();
}

/// Write an RGBA OpenEXR file whose data window starts at `origin`.
pub fn write_exr_at(
    path: &Path,
    origin: (i32, i32),
    width: usize,
    height: usize,
    f: impl Fn(usize, usize) -> [f32; 4] + Sync,
) {
    use exr::prelude::*;
    let layer = Layer::new(
        (width, height),
        LayerAttributes {
            layer_position: Vec2(origin.0, origin.1),
            ..LayerAttributes::default()
        },
        Encoding::FAST_LOSSLESS,
        SpecificChannels::rgba(|pos: Vec2<usize>| {
            let [r, g, b, a] = f(pos.x(), pos.y());
            (r, g, b, a)
        }),
    );
    Image::from_layer(layer).write().to_file(path).unwrap();
}

/// Write a single-channel luminance (`Y`) OpenEXR file.
pub fn write_luminance_exr(path: &Path, width: usize, height: usize, f: impl Fn(usize, usize) -> f32) {
    use exr::prelude::*;
    let values: Vec<f32> = (0..height)
        .flat_map(|y| (0..width).map(move |x| (x, y)))
        .map(|(x, y)| f(x, y))
        .collect();
    let mut list = SmallVec::<[AnyChannel<FlatSamples>; 4]>::new();
    list.push(AnyChannel::new("Y", FlatSamples::F32(values)));
    let image = Image::from_channels((width, height), AnyChannels::sort(list));
    image.write().to_file(path).unwrap();
}

/// Serialise a 16-bit binary pixel map the way the raw decoder emits it.
pub fn build_pixel_map(width: u32, height: u32, max_value: u32, samples: &[u16]) -> Vec<u8> {
    let mut buf = format!("P6\n{width} {height}\n{max_value}\n").into_bytes();
    for s in samples {
        buf.extend_from_slice(&s.to_be_bytes());
    }
    buf
}

/// Samples 0, 1, 2, ... for a `width` x `height` RGB image.
pub fn ramp_samples(width: u32, height: u32) -> Vec<u16> {
    (0..width * height * 3).map(|i| i as u16).collect()
}

pub fn rgb8_image(width: u32, height: u32, flip_y: bool, f: impl Fn(u32, u32) -> [u8; 3]) -> ImageBuffer {
    let mut v = Vec::with_capacity((width * height * 3) as usize);
    for y in 0..height {
        for x in 0..width {
            v.extend_from_slice(&f(x, y));
        }
    }
    ImageBuffer::new(width, height, PixelData::Rgb8(v), flip_y).unwrap()
}

/// Shell script standing in for the raw decoder: identify mode succeeds,
/// decode mode prints `pixel_map`.
#[cfg(unix)]
pub fn fake_raw_decoder(dir: &Path, pixel_map: &[u8]) -> RawDecoderConfig {
    let data = dir.join("decoded.ppm");
    std::fs::write(&data, pixel_map).unwrap();
    let script = format!(
        "#!/bin/sh\nif [ \"$1\" = \"-i\" ]; then exit 0; fi\ncat \"{}\"\n",
        data.display()
    );
    write_script(dir, "fake-raw-decoder", &script)
}

/// Decoder that recognises nothing.
#[cfg(unix)]
pub fn declining_raw_decoder(dir: &Path) -> RawDecoderConfig {
    write_script(dir, "declining-decoder", "#!/bin/sh\nexit 1\n")
}

/// Decoder that identifies every file but then crashes while decoding.
#[cfg(unix)]
pub fn crashing_raw_decoder(dir: &Path) -> RawDecoderConfig {
    write_script(
        dir,
        "crashing-decoder",
        "#!/bin/sh\nif [ \"$1\" = \"-i\" ]; then exit 0; fi\nexit 3\n",
    )
}

#[cfg(unix)]
fn write_script(dir: &Path, name: &str, body: &str) -> RawDecoderConfig {
    use std::os::unix::fs::PermissionsExt;

    let path: PathBuf = dir.join(name);
    std::fs::write(&path, body).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    RawDecoderConfig {
        program: path.display().to_string(),
        ..RawDecoderConfig::default()
    }
}

/// Host that records every request.
#[derive(Default)]
pub struct RecordingHost {
    pub messages: Vec<(String, u32)>,
    pub navigations: Vec<i32>,
    pub repaints: usize,
}

impl ViewerHost for RecordingHost {
    fn status_message(&mut self, text: &str, timeout_ms: u32) {
        self.messages.push((text.to_string(), timeout_ms));
    }

    fn navigate(&mut self, steps: i32) {
        self.navigations.push(steps);
    }

    fn request_repaint(&mut self) {
        self.repaints += 1;
    }
}

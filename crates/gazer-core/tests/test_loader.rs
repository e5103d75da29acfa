mod common;

use std::path::Path;

use gazer_core::buffer::{ImageBuffer, PixelData, SampleFormat};
use gazer_core::config::RawDecoderConfig;
use gazer_core::error::{GazerError, Result};
use gazer_core::io::openexr::{is_openexr_file, ExrDecoder};
use gazer_core::io::{BitmapDecoder, DecodeStrategy, ImageLoader};

use common::*;

fn loader() -> ImageLoader {
    ImageLoader::new(&config_without_raw_decoder().raw_decoder)
}

#[test]
fn test_default_strategy_order() {
    assert_eq!(loader().strategy_names(), vec!["openexr", "raw", "bitmap"]);
}

#[test]
fn test_exr_matches_data_window_and_flips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scene.exr");
    write_exr(&path, 37, 21, |x, y| [x as f32, y as f32, 0.5, 1.0]);

    let image = loader().load(&path).unwrap();
    assert_eq!(image.width(), 37);
    assert_eq!(image.height(), 21);
    assert!(image.flip_y);
    assert_eq!(image.sample_format(), SampleFormat::RgbaF32);
    assert_eq!(image.bit_depth(), 32);

    // Rows stay in file order: row 0 is the top scanline.
    let PixelData::RgbaF32(v) = image.pixels() else {
        panic!("expected float samples");
    };
    let at = |x: usize, y: usize| &v[(y * 37 + x) * 4..(y * 37 + x) * 4 + 4];
    assert_eq!(at(0, 0), &[0.0, 0.0, 0.5, 1.0]);
    assert_eq!(at(5, 3), &[5.0, 3.0, 0.5, 1.0]);
    assert_eq!(at(36, 20), &[36.0, 20.0, 0.5, 1.0]);
}

#[test]
fn test_exr_offset_data_window() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("window.exr");
    write_exr_at(&path, (-5, 7), 6, 3, |x, y| [x as f32, y as f32, 0.0, 1.0]);

    let image = loader().load(&path).unwrap();
    assert_eq!((image.width(), image.height()), (6, 3));
    assert!(image.flip_y);

    // Sample (0, 0) is the window's first pixel, not the image origin.
    let rgba = image.to_rgba_f32();
    assert_eq!(rgba.len(), 6 * 3 * 4);
    assert_eq!(&rgba[..4], &[0.0, 0.0, 0.0, 1.0]);
    assert_eq!(&rgba[(2 * 6 + 5) * 4..(2 * 6 + 5) * 4 + 4], &[5.0, 2.0, 0.0, 1.0]);
}

#[test]
fn test_luminance_exr_expands_to_grey() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gray.exr");
    write_luminance_exr(&path, 8, 4, |x, y| (y * 8 + x) as f32 * 0.5);

    let image = loader().load(&path).unwrap();
    assert_eq!((image.width(), image.height()), (8, 4));
    assert!(image.flip_y);
    assert_eq!(image.sample_format(), SampleFormat::RgbaF32);

    let rgba = image.to_rgba_f32();
    assert_eq!(&rgba[..4], &[0.0, 0.0, 0.0, 1.0]);
    let last = 31 * 4;
    assert_eq!(&rgba[last..last + 4], &[15.5, 15.5, 15.5, 1.0]);
}

#[test]
fn test_exr_keeps_hdr_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bright.exr");
    write_exr(&path, 2, 2, |_, _| [12.5, 0.0, 300.0, 1.0]);

    let rgba = loader().load(&path).unwrap().to_rgba_f32();
    assert_eq!(&rgba[..4], &[12.5, 0.0, 300.0, 1.0]);
}

#[test]
fn test_corrupt_exr_is_format_error_without_fallback() {
    let dir = tempfile::tempdir().unwrap();

    // A real PNG behind an .exr name must not silently decode as a bitmap.
    let disguised = dir.path().join("photo.exr");
    write_png(&disguised, 4, 4, |_, _| [10, 20, 30]);
    assert!(!is_openexr_file(&disguised).unwrap());
    assert!(matches!(loader().load(&disguised), Err(GazerError::Format(_))));

    let truncated = dir.path().join("truncated.exr");
    std::fs::write(&truncated, [0x76, 0x2f, 0x31, 0x01, 2, 0, 0, 0]).unwrap();
    assert!(is_openexr_file(&truncated).unwrap());
    assert!(matches!(loader().load(&truncated), Err(GazerError::Format(_))));
}

#[test]
fn test_exr_extension_is_case_sensitive() {
    assert!(ExrDecoder::claims(Path::new("a/b/image.exr")));
    assert!(!ExrDecoder::claims(Path::new("image.EXR")));
    assert!(!ExrDecoder::claims(Path::new("exr")));

    // An upper-case EXR name falls through to the bitmap codecs.
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("IMAGE.EXR");
    write_png(&path, 3, 2, |_, _| [1, 2, 3]);
    let image = loader().load(&path).unwrap();
    assert_eq!(image.sample_format(), SampleFormat::Rgb8);
    assert!(!image.flip_y);
}

#[test]
fn test_short_file_is_not_openexr() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tiny.exr");
    std::fs::write(&path, [0x76, 0x2f]).unwrap();
    assert!(!is_openexr_file(&path).unwrap());
}

#[test]
fn test_bitmap_rows_bottom_first() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stripe.png");
    // Only the top row is white.
    write_png(&path, 2, 3, |_, y| if y == 0 { [255; 3] } else { [0; 3] });

    let image = loader().load(&path).unwrap();
    assert_eq!((image.width(), image.height()), (2, 3));
    assert!(!image.flip_y);
    let PixelData::Rgb8(v) = image.pixels() else {
        panic!("expected 8-bit samples");
    };
    assert_eq!(v.len(), 2 * 3 * 3);
    assert_eq!(v[0], 0);
    assert_eq!(v[2 * 2 * 3], 255);
}

#[test]
fn test_bitmap_keeps_16_bit() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("deep.png");
    write_png16(&path, 4, 4, |x, _| [x as u16 * 1000, 65535, 0]);

    let image = loader().load(&path).unwrap();
    assert_eq!(image.sample_format(), SampleFormat::Rgb16);
    let rgba = image.to_rgba_f32();
    assert!((rgba[4] - 1000.0 / 65535.0).abs() < 1e-6);
    assert_eq!(rgba[5], 1.0);
    assert_eq!(rgba[7], 1.0);
}

#[test]
fn test_unreadable_file_is_decode_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, b"definitely not pixels").unwrap();
    assert!(matches!(loader().load(&path), Err(GazerError::Decode(_))));
}

#[test]
fn test_missing_decoder_falls_through_to_bitmap() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plain.png");
    write_png(&path, 5, 5, |_, _| [7, 7, 7]);

    let image = loader().load(&path).unwrap();
    assert_eq!(image.pixel_count(), 25);
    assert!(!image.flip_y);
}

struct Declines;

impl DecodeStrategy for Declines {
    fn name(&self) -> &'static str {
        "declines"
    }

    fn try_decode(&self, _path: &Path) -> Result<Option<ImageBuffer>> {
        Ok(None)
    }
}

struct Unavailable;

impl DecodeStrategy for Unavailable {
    fn name(&self) -> &'static str {
        "unavailable"
    }

    fn try_decode(&self, _path: &Path) -> Result<Option<ImageBuffer>> {
        Err(GazerError::SubprocessUnavailable("not installed".into()))
    }
}

#[test]
fn test_no_strategy_accepts() {
    let loader = ImageLoader::with_strategies(vec![Box::new(Declines), Box::new(Unavailable)]);
    let err = loader.load(Path::new("whatever.bin")).unwrap_err();
    assert!(matches!(err, GazerError::Decode(msg) if msg.contains("no decoder accepted")));
}

#[test]
fn test_unavailable_strategy_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ok.png");
    write_png(&path, 1, 1, |_, _| [0, 0, 0]);

    let loader = ImageLoader::with_strategies(vec![Box::new(Unavailable), Box::new(BitmapDecoder)]);
    assert!(loader.load(&path).is_ok());
}

#[cfg(unix)]
#[test]
fn test_raw_decoder_subprocess() {
    let dir = tempfile::tempdir().unwrap();
    let map = build_pixel_map(100, 50, 65535, &ramp_samples(100, 50));
    let raw = fake_raw_decoder(dir.path(), &map);

    let path = dir.path().join("IMG_0001.CR2");
    std::fs::write(&path, b"sensor data").unwrap();

    let image = ImageLoader::new(&raw).load(&path).unwrap();
    assert_eq!((image.width(), image.height()), (100, 50));
    assert!(image.flip_y);
    let PixelData::Rgb16(v) = image.pixels() else {
        panic!("expected 16-bit samples");
    };
    assert_eq!(v.len(), 100 * 50 * 3);
    assert_eq!(&v[..4], &[0, 1, 2, 3]);
    assert_eq!(v[300], 300);
}

#[cfg(unix)]
#[test]
fn test_declining_raw_decoder_falls_through() {
    let dir = tempfile::tempdir().unwrap();
    let raw = declining_raw_decoder(dir.path());
    let path = dir.path().join("pic.png");
    write_png(&path, 2, 2, |_, _| [9, 9, 9]);

    let image = ImageLoader::new(&raw).load(&path).unwrap();
    assert_eq!(image.sample_format(), SampleFormat::Rgb8);
}

#[cfg(unix)]
#[test]
fn test_raw_decode_failure_is_terminal() {
    let dir = tempfile::tempdir().unwrap();
    let raw = crashing_raw_decoder(dir.path());
    let path = dir.path().join("pic.png");
    write_png(&path, 2, 2, |_, _| [9, 9, 9]);

    assert!(matches!(
        ImageLoader::new(&raw).load(&path),
        Err(GazerError::Format(_))
    ));
}

#[cfg(unix)]
#[test]
fn test_raw_decoder_bad_header_is_format_error() {
    let dir = tempfile::tempdir().unwrap();
    let map = build_pixel_map(4, 4, 255, &ramp_samples(4, 4));
    let raw = fake_raw_decoder(dir.path(), &map);
    let path = dir.path().join("x.nef");
    std::fs::write(&path, b"raw").unwrap();

    assert!(matches!(
        ImageLoader::new(&raw).load(&path),
        Err(GazerError::Format(_))
    ));
}

#[test]
fn test_raw_decoder_config_defaults() {
    let raw = RawDecoderConfig::default();
    assert_eq!(raw.program, "dcraw");
    assert_eq!(raw.identify_args, vec!["-i"]);
    assert_eq!(raw.decode_args, vec!["-c", "-w", "-6"]);
}

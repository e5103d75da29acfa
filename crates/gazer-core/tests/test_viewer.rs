mod common;

use gazer_core::config::MipmapPreference;
use gazer_core::controller::InputEvent;
use gazer_core::error::GazerError;
use gazer_core::gpu::software::SoftwareBackend;
use gazer_core::gpu::{Capabilities, TextureBackend};
use gazer_core::viewer::Viewer;

use common::*;

fn viewer() -> Viewer<RecordingHost> {
    Viewer::new(
        &config_without_raw_decoder(),
        Box::new(SoftwareBackend::default()),
        RecordingHost::default(),
    )
}

#[test]
fn test_pan_preserved_across_loads() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.png");
    let b = dir.path().join("b.exr");
    write_png(&a, 256, 256, |x, y| [x as u8, y as u8, 0]);
    write_exr(&b, 128, 128, |_, _| [2.0, 1.0, 0.5, 1.0]);

    let mut viewer = viewer();
    viewer.load_path(&a).unwrap();
    assert!(!viewer.view().flip_y);
    assert_eq!(viewer.view().centering_offset(), [128.0, 128.0]);

    // Drag right by 10 and down the screen by 5.
    viewer.handle_event(InputEvent::PointerDown { x: 50.0, y: 50.0 });
    viewer.handle_event(InputEvent::PointerMove { x: 60.0, y: 55.0 });
    viewer.handle_event(InputEvent::PointerUp);
    assert_eq!(viewer.view().pan, [10.0, -5.0]);

    viewer.load_path(&b).unwrap();
    assert_eq!(viewer.view().pan, [10.0, -5.0]);
    assert_eq!(viewer.view().centering_offset(), [64.0, 64.0]);
    assert_eq!(viewer.view().image_size, [128.0, 128.0]);
    assert!(viewer.view().flip_y);

    let texture = viewer.texture().unwrap();
    assert_eq!((texture.width, texture.height), (128, 128));
    assert!(texture.flip_y);
}

#[test]
fn test_failed_load_keeps_previous_image() {
    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("good.png");
    let bad = dir.path().join("bad.exr");
    write_png(&good, 16, 8, |_, _| [100, 100, 100]);
    std::fs::write(&bad, b"garbage").unwrap();

    let mut viewer = viewer();
    viewer.load_path(&good).unwrap();
    let id = viewer.texture().unwrap().id;
    let view = viewer.view().clone();

    let err = viewer.load_path(&bad).unwrap_err();
    assert!(matches!(err, GazerError::Format(_)));
    assert_eq!(viewer.texture().unwrap().id, id);
    assert_eq!(viewer.view(), &view);

    let (message, timeout) = viewer.host().messages.last().unwrap();
    assert!(message.starts_with("Could not open bad.exr"));
    assert_eq!(*timeout, 2000);
}

#[test]
fn test_oversized_image_keeps_previous_image() {
    let backend = SoftwareBackend::new(Capabilities {
        framebuffer_mipmap: true,
        sampler_mipmap: true,
        max_texture_dimension: 32,
    });
    let mut viewer = Viewer::new(
        &config_without_raw_decoder(),
        Box::new(backend),
        RecordingHost::default(),
    );
    viewer
        .load_image(rgb8_image(32, 32, false, |_, _| [0; 3]))
        .unwrap();

    let err = viewer
        .load_image(rgb8_image(33, 8, false, |_, _| [0; 3]))
        .unwrap_err();
    assert!(matches!(err, GazerError::Render(_)));
    assert_eq!(viewer.texture().unwrap().width, 32);
    assert_eq!(viewer.view().image_size, [32.0, 32.0]);
}

#[test]
fn test_load_requests_repaint() {
    let mut viewer = viewer();
    viewer
        .load_image(rgb8_image(4, 4, false, |_, _| [0; 3]))
        .unwrap();
    assert_eq!(viewer.host().repaints, 1);
}

#[test]
fn test_resize_centres_until_dragged() {
    let mut viewer = viewer();
    viewer.resize(800, 600);
    assert_eq!(viewer.view().pan, [400.0, 300.0]);

    viewer.handle_event(InputEvent::PointerDown { x: 0.0, y: 0.0 });
    viewer.handle_event(InputEvent::PointerMove { x: 4.0, y: 0.0 });
    viewer.resize(1024, 768);
    assert_eq!(viewer.view().pan, [404.0, 300.0]);
}

#[test]
fn test_host_mipmap_clears_flip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hdr.exr");
    write_exr(&path, 8, 4, |_, y| [y as f32, 0.0, 0.0, 1.0]);

    let mut config = config_without_raw_decoder();
    config.render.mipmap = MipmapPreference::Host;
    let mut viewer = Viewer::new(
        &config,
        Box::new(SoftwareBackend::default()),
        RecordingHost::default(),
    );
    viewer.load_path(&path).unwrap();

    assert!(!viewer.view().flip_y);
    let texture = viewer.texture().unwrap();
    assert!(!texture.flip_y);

    // The bottom scanline (y = 3 in the file) is now row 0.
    let base = viewer.backend().read_level(&texture.storage, 0).unwrap();
    assert_eq!(base[0], 3.0);
}

#[test]
fn test_keys_reach_tonemap_state() {
    let mut viewer = viewer();
    viewer.handle_event(InputEvent::Key('S'));
    assert!(!viewer.tonemap().enabled);
    viewer.handle_event(InputEvent::Wheel { steps: 2 });
    assert_eq!(viewer.host().navigations, vec![-2]);
}

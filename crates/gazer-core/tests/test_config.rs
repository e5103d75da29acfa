use gazer_core::config::{GazerConfig, MipmapPreference};
use gazer_core::error::GazerError;

#[test]
fn test_defaults() {
    let config = GazerConfig::default();
    assert_eq!(config.raw_decoder.program, "dcraw");
    assert_eq!(config.view.zoom_step, 0.1);
    assert_eq!(config.view.min_zoom, 0.1);
    assert_eq!(config.view.max_zoom, 20.0);
    assert!(config.tonemap.enabled);
    assert_eq!(config.tonemap.exposure, 1.1);
    assert_eq!(config.tonemap.exposure_step, 0.1);
    assert_eq!(config.render.mipmap, MipmapPreference::Auto);
    assert_eq!(config.status.timeout_ms, 2000);
}

#[test]
fn test_empty_file_is_default() {
    assert_eq!(GazerConfig::from_toml("").unwrap(), GazerConfig::default());
}

#[test]
fn test_partial_sections() {
    let config = GazerConfig::from_toml(
        r#"
[view]
max_zoom = 8.0

[render]
mipmap = "host"

[raw_decoder]
program = "/opt/bin/dcraw"
"#,
    )
    .unwrap();
    assert_eq!(config.view.max_zoom, 8.0);
    assert_eq!(config.view.zoom_step, 0.1);
    assert_eq!(config.render.mipmap, MipmapPreference::Host);
    assert_eq!(config.raw_decoder.program, "/opt/bin/dcraw");
    assert_eq!(config.raw_decoder.decode_args, vec!["-c", "-w", "-6"]);
}

#[test]
fn test_round_trip() {
    let mut config = GazerConfig::default();
    config.tonemap.exposure = 3.5;
    config.render.mipmap = MipmapPreference::Sampler;
    config.status.timeout_ms = 750;

    let text = config.to_toml().unwrap();
    assert!(text.contains("mipmap = \"sampler\""));
    assert_eq!(GazerConfig::from_toml(&text).unwrap(), config);
}

#[test]
fn test_malformed_is_config_error() {
    assert!(matches!(
        GazerConfig::from_toml("[view\nzoom_step = "),
        Err(GazerError::Config(_))
    ));
    assert!(matches!(
        GazerConfig::from_toml("[render]\nmipmap = \"magic\""),
        Err(GazerError::Config(_))
    ));
}

#[test]
fn test_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gazer.toml");
    std::fs::write(&path, "[tonemap]\nenabled = false\n").unwrap();

    let config = GazerConfig::load(&path).unwrap();
    assert!(!config.tonemap.enabled);

    let missing = GazerConfig::load(&dir.path().join("missing.toml"));
    assert!(matches!(missing, Err(GazerError::Io(_))));
}

#[test]
fn test_inverted_zoom_range_rejected() {
    let err = GazerConfig::from_toml("[view]\nmin_zoom = 5.0\nmax_zoom = 2.0").unwrap_err();
    assert!(matches!(err, GazerError::Config(ref msg) if msg.contains("max_zoom")));
}

#[test]
fn test_non_positive_zoom_rejected() {
    for text in ["[view]\nmin_zoom = -1.0", "[view]\nmin_zoom = 0.0", "[view]\nzoom_step = 0.0"] {
        assert!(
            matches!(GazerConfig::from_toml(text), Err(GazerError::Config(_))),
            "{text}"
        );
    }
}

#[test]
fn test_exposure_bounds_validated() {
    assert!(matches!(
        GazerConfig::from_toml("[tonemap]\nmin_exposure = 4.0\nmax_exposure = 1.0"),
        Err(GazerError::Config(_))
    ));
    assert!(matches!(
        GazerConfig::from_toml("[tonemap]\nexposure_step = -0.5"),
        Err(GazerError::Config(_))
    ));
    assert!(matches!(
        GazerConfig::from_toml("[tonemap]\nexposure = nan"),
        Err(GazerError::Config(_))
    ));

    // A single-point range is allowed.
    let config = GazerConfig::from_toml("[tonemap]\nmin_exposure = 2.0\nmax_exposure = 2.0").unwrap();
    assert_eq!(config.tonemap.max_exposure, 2.0);
}

#[test]
fn test_default_config_is_valid() {
    GazerConfig::default().validate().unwrap();
}

#[test]
fn test_invalid_file_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gazer.toml");
    std::fs::write(&path, "[view]\nmin_zoom = 3.0\nmax_zoom = 1.0\n").unwrap();
    assert!(matches!(GazerConfig::load(&path), Err(GazerError::Config(_))));
}

//! Integration tests for configuration system

use stickercam_core::config::{sample_config, CaptureConfig, ConfigFile, SourceConfig};
use stickercam_core::encode::VideoFormat;
use stickercam_core::filter::FilterKind;
use stickercam_core::types::CaptureMode;
use tempfile::TempDir;

#[test]
fn test_capture_config_builder() {
    let config = CaptureConfig::default()
        .with_size(320, 240)
        .with_fps(15)
        .with_glyph_size(32)
        .with_filter(FilterKind::Sepia)
        .with_mode(CaptureMode::Continuous)
        .with_frame_queue(4)
        .with_output_dir("/tmp/clips");

    assert_eq!((config.width, config.height), (320, 240));
    assert_eq!(config.fps, 15);
    assert_eq!(config.glyph_size, 32);
    assert_eq!(config.filter, FilterKind::Sepia);
    assert_eq!(config.mode, CaptureMode::Continuous);
    assert_eq!(config.frame_queue, 4);
    assert_eq!(config.output_dir.to_str(), Some("/tmp/clips"));
    assert!(config.validate_strict().is_ok());
}

#[test]
fn test_capture_config_validation() {
    assert!(CaptureConfig::default().with_fps(0).validate_strict().is_err());
    assert!(CaptureConfig::default().with_fps(241).validate_strict().is_err());
    assert!(CaptureConfig::default().with_glyph_size(0).validate_strict().is_err());
    assert!(CaptureConfig::default().with_frame_queue(0).validate_strict().is_err());
    assert!(CaptureConfig::default().with_size(8000, 480).validate_strict().is_err());

    let config = CaptureConfig::default().with_source(SourceConfig::TestPattern {
        width: 0,
        height: 720,
        fps: 30,
    });
    assert!(config.validate_strict().is_err());
}

#[test]
fn test_capture_config_warnings() {
    assert!(CaptureConfig::default().validate().is_empty());

    let config = CaptureConfig::default().with_fps(60).with_source(SourceConfig::TestPattern {
        width: 320,
        height: 240,
        fps: 15,
    });
    let warnings = config.validate();
    assert!(warnings.iter().any(|w| w.contains("frames will repeat")));
}

#[test]
fn test_config_file_save_load() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("nested").join("config.toml");

    let mut config = ConfigFile::default();
    config.surface.width = 320;
    config.surface.height = 240;
    config.capture.filter = "grayscale".to_string();
    config.capture.mode = "continuous".to_string();
    config.source.kind = "image".to_string();
    config.source.path = Some(temp_dir.path().join("face.png"));

    config.save_to(config_path.clone()).unwrap();
    assert!(config_path.exists());

    let loaded = ConfigFile::load_from(config_path).unwrap();
    assert_eq!(loaded.surface.width, 320);
    assert_eq!(loaded.capture.filter, "grayscale");
    assert_eq!(loaded.source.path, config.source.path);

    let runtime = CaptureConfig::from_file(&loaded).unwrap();
    assert_eq!(runtime.filter, FilterKind::Grayscale);
    assert_eq!(runtime.mode, CaptureMode::Continuous);
    assert!(matches!(runtime.source, SourceConfig::Image { .. }));
}

#[test]
fn test_missing_config_file_uses_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let loaded = ConfigFile::load_from(temp_dir.path().join("absent.toml")).unwrap();
    assert_eq!(loaded.surface.width, 640);
}

#[test]
fn test_malformed_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(&path, "[surface\nwidth = ").unwrap();

    let err = ConfigFile::load_from(path).unwrap_err();
    assert!(err.to_string().contains("Failed to parse config file"));
}

#[test]
fn test_sample_config_builds_runtime_config() {
    let file: ConfigFile = toml::from_str(&sample_config()).unwrap();
    let config = CaptureConfig::from_file(&file).unwrap();

    assert_eq!((config.width, config.height), (640, 480));
    assert_eq!(config.filter, FilterKind::None);
    assert_eq!(config.mode, CaptureMode::Still);
    assert_eq!(config.video_format, VideoFormat::Mjpeg);
    assert!(matches!(
        config.source,
        SourceConfig::TestPattern {
            width: 640,
            height: 480,
            fps: 30
        }
    ));
}

#[test]
fn test_from_file_rejects_bad_values() {
    let mut file = ConfigFile::default();
    file.capture.filter = "blur".to_string();
    assert!(CaptureConfig::from_file(&file).is_err());

    let mut file = ConfigFile::default();
    file.source.kind = "webcam".to_string();
    let err = CaptureConfig::from_file(&file).unwrap_err();
    assert!(err.to_string().contains("Unknown source kind"));

    let mut file = ConfigFile::default();
    file.source.kind = "image".to_string();
    assert!(CaptureConfig::from_file(&file).is_err());

    let mut file = ConfigFile::default();
    file.surface.width = 0;
    assert!(CaptureConfig::from_file(&file).is_err());
}

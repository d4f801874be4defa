//! Tests configuration serialization and deserialization stability.

use dualcam_core::{
    Alignment, FrameSize, PixelFormat, PlacementPoint, SynthesisConfig,
};

#[test]
fn config_codec_tests_round_trip_json() {
    let config = SynthesisConfig::uniform(
        FrameSize::new(1920, 1080),
        FrameSize::new(384, 216),
        FrameSize::new(1920, 1080),
        Alignment::new(64, 16),
        PlacementPoint::new(333, 444),
        PixelFormat::Nv21,
    );

    let encoded = config.to_json_bytes().expect("encoding should succeed");
    let decoded = SynthesisConfig::from_json_bytes(&encoded).expect("decoding should succeed");
    assert_eq!(decoded, config);
}

#[test]
fn config_codec_tests_derive_parity_instead_of_trusting_input() {
    let raw = br#"{
        "front":  {"width": 8, "height": 8, "buffer_size": 96, "format": "nv12"},
        "scaled": {"width": 4, "height": 4, "buffer_size": 96, "format": "nv12"},
        "back":   {"width": 8, "height": 8, "buffer_size": 96, "format": "nv12"},
        "placement": {"x": 3, "y": 2, "on_odd_row": true, "on_odd_col": false}
    }"#;

    let config = SynthesisConfig::from_json_bytes(raw).expect("decoding should succeed");
    assert!(config.placement.on_odd_col());
    assert!(!config.placement.on_odd_row());
    assert_eq!(config.front.stride, 0);
}

#[test]
fn config_codec_tests_map_unknown_formats_to_unsupported() {
    let raw = br#"{
        "front":  {"width": 8, "height": 8, "buffer_size": 96, "format": "i420"},
        "scaled": {"width": 4, "height": 4, "buffer_size": 96, "format": "nv12"},
        "back":   {"width": 8, "height": 8, "buffer_size": 96, "format": "nv21"},
        "placement": {"x": 0, "y": 0}
    }"#;

    let config = SynthesisConfig::from_json_bytes(raw).expect("decoding should succeed");
    assert_eq!(config.front.format, PixelFormat::Unsupported);
    assert_eq!(config.back.format, PixelFormat::Nv21);
}

#[test]
fn config_codec_tests_reject_malformed_json() {
    assert!(SynthesisConfig::from_json_bytes(b"{\"front\": 1}").is_err());
}

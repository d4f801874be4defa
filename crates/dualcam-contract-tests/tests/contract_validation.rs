//! Validates configuration fixtures and the codec output against the frozen
//! JSON schema.

use dualcam_core::{
    Alignment, FrameSize, PixelFormat, PlacementPoint, SynthesisConfig,
};
use jsonschema::JSONSchema;
use serde_json::Value;

const SCHEMA: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../../contracts/synthesis-config.schema.json"
);
const VALID_FIXTURE: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../../contracts/fixtures/synthesis-config.valid.json"
);
const INVALID_FIXTURE: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../../contracts/fixtures/synthesis-config.invalid.json"
);

fn load_json(path: &str) -> Value {
    let raw = std::fs::read_to_string(path).expect("json file should be readable");
    serde_json::from_str(&raw).expect("json file should be valid")
}

fn compile_validator() -> JSONSchema {
    let schema = load_json(SCHEMA);
    JSONSchema::compile(&schema).expect("schema should compile")
}

#[test]
fn valid_fixture_matches_schema() {
    let validator = compile_validator();
    let fixture = load_json(VALID_FIXTURE);
    assert!(
        validator.is_valid(&fixture),
        "valid fixture should validate against schema"
    );
}

#[test]
fn invalid_fixture_is_rejected_with_both_violations() {
    let validator = compile_validator();
    let fixture = load_json(INVALID_FIXTURE);
    let errors: Vec<String> = match validator.validate(&fixture) {
        Ok(()) => Vec::new(),
        Err(errors) => errors.map(|error| error.instance_path.to_string()).collect(),
    };

    assert!(errors.iter().any(|path| path == "/front/format"), "{errors:?}");
    assert!(errors.iter().any(|path| path == "/placement/x"), "{errors:?}");
}

#[test]
fn valid_fixture_decodes_with_core_codec() {
    let raw = std::fs::read(VALID_FIXTURE).expect("fixture should be readable");
    let config = SynthesisConfig::from_json_bytes(&raw).expect("fixture should decode");

    assert_eq!(config.back.format, PixelFormat::Nv21);
    assert_eq!(config.placement, PlacementPoint::new(333, 444));
    assert!(config.placement.on_odd_col());
    assert!(config.front.has_room_for_frame());
}

#[test]
fn codec_output_matches_schema() {
    let config = SynthesisConfig::uniform(
        FrameSize::new(1280, 720),
        FrameSize::new(320, 180),
        FrameSize::new(1280, 720),
        Alignment::new(64, 16),
        PlacementPoint::new(17, 9),
        PixelFormat::Nv21,
    );
    let encoded = config.to_json_bytes().expect("config should encode");
    let value: Value = serde_json::from_slice(&encoded).expect("codec output should be json");

    let validator = compile_validator();
    assert!(validator.is_valid(&value), "codec output should validate: {value}");
}
